pub mod lifecycle;
pub mod order_index;
pub mod palette;

pub use palette::ColorPalette;
