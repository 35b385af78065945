use serde::{Deserialize, Serialize};

/// Fixed palette used to colour-tag backlog lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

impl ListColor {
    /// Allocation order.
    pub const ALL: [ListColor; 8] = [
        Self::Blue,
        Self::Green,
        Self::Orange,
        Self::Purple,
        Self::Red,
        Self::Teal,
        Self::Pink,
        Self::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Teal => "teal",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "red" => Some(Self::Red),
            "orange" => Some(Self::Orange),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "teal" => Some(Self::Teal),
            "blue" => Some(Self::Blue),
            "purple" => Some(Self::Purple),
            "pink" => Some(Self::Pink),
            _ => None,
        }
    }
}

/// Where a list sits in the plan → work → done flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListRole {
    Backlog,
    Intermediate,
    Done,
}

impl ListRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Intermediate => "intermediate",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub order_index: f64,
    pub is_backlog: bool,
    pub is_done: bool,
    pub color: Option<ListColor>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskList {
    pub fn role(&self) -> ListRole {
        if self.is_done {
            ListRole::Done
        } else if self.is_backlog {
            ListRole::Backlog
        } else {
            ListRole::Intermediate
        }
    }

    pub fn is_intermediate(&self) -> bool {
        self.role() == ListRole::Intermediate
    }
}
