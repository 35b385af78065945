pub mod list;
pub mod task;
pub mod user;

pub use list::*;
pub use task::*;
pub use user::*;
