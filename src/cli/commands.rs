use clap::{Args, Parser, Subcommand};

use crate::service::views::{DEFAULT_STATS_DAYS, DEFAULT_STATS_WEEKS};

const VERSION: &str = env!("PLANWORK_VERSION");

#[derive(Parser)]
#[command(
    name = "planwork",
    version = VERSION,
    about = "Plan / work / done task lists",
    after_help = "\
NOTE:
  Data lives in <dir>/.planwork/planwork.db, where <dir> is $PLANWORK_DIR or the
  nearest ancestor of the working directory containing .planwork/.
  Run `planwork init` before any other command, then `planwork user create <name>`.

EXIT CODES:
  0  Success
  1  Error (not found, invariant violation, validation, database, etc.)

LIST RULES:
  Every user has exactly one Done list and at least one backlog list.
  The Done list cannot be renamed, reordered, toggled or deleted.
  Deleting the last backlog promotes the leftmost other list to backlog.
  Moving a task into Done completes it; completed tasks are immutable.

LOGGING:
  Set PLANWORK_LOG (e.g. `info`, `planwork=debug`) to log to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user (name or ID) instead of the active one
    #[arg(long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize planwork in this directory
    Init,

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// List management
    #[command(subcommand)]
    List(ListCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Completed tasks, newest first, grouped by day
    Archive {
        /// Entries per page (1-100, default from config)
        #[arg(long)]
        limit: Option<u32>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Daily and weekly completion counts
    #[command(after_help = "\
NOTE:
  Days and weeks are UTC. Weeks start on Monday (ISO 8601).")]
    Stats {
        #[arg(long, default_value_t = DEFAULT_STATS_DAYS)]
        days: u32,
        #[arg(long, default_value_t = DEFAULT_STATS_WEEKS)]
        weeks: u32,
    },

    /// Show the active user's lists and counts
    Status,

    /// Delete completed tasks older than the retention period
    #[command(after_help = "\
NOTE:
  Applies to every user. Meant to be run once a day, e.g. from cron:
    0 3 * * *  cd /path && planwork cleanup")]
    Cleanup {
        /// Override `retention_days` from config
        #[arg(long)]
        retention_days: Option<u32>,
    },

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user with Backlog, Today and Done lists
    #[command(after_help = "\
NOTE:
  Auto-activates if no valid active user exists (none set, or stale reference).")]
    Create {
        /// User name (slug: lowercase alphanumeric with hyphens)
        name: String,
    },
    /// List all users
    List,
    /// Show user details
    Show {
        /// User name or ID
        reference: String,
    },
    /// Set active user
    Activate {
        /// User name or ID
        reference: String,
    },
    /// Delete a user with all lists and tasks
    Delete {
        /// User name or ID
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// Create a list (placed after the existing lists, before Done)
    Create {
        name: String,
        /// Make it a backlog list
        #[arg(long)]
        backlog: bool,
        /// Backlog colour (red, orange, yellow, green, teal, blue, purple, pink)
        #[arg(long, requires = "backlog")]
        color: Option<String>,
    },
    /// List all lists
    #[command(name = "ls")]
    Ls,
    /// Show a list with its tasks
    Show {
        /// List name or ID
        reference: String,
    },
    /// Rename a list
    Rename {
        reference: String,
        name: String,
    },
    /// Set a backlog's colour (`none` clears it)
    Color {
        reference: String,
        color: String,
    },
    /// Flip a list between backlog and regular
    #[command(after_help = "\
NOTE:
  The last remaining backlog cannot be turned off. The Done list cannot be toggled.")]
    ToggleBacklog {
        reference: String,
    },
    /// Move a list (first position when no flag is given)
    Reorder {
        reference: String,
        #[command(flatten)]
        position: ListPosition,
    },
    /// Delete a list, relocating its tasks
    #[command(after_help = "\
NOTE:
  Without --destination, tasks go to the leftmost regular list, else the leftmost
  other backlog. Deleting the only backlog promotes the leftmost regular list.")]
    Delete {
        reference: String,
        /// List to receive the tasks
        #[arg(long)]
        destination: Option<String>,
    },
    /// Renumber a list's tasks evenly
    Reindex {
        reference: String,
    },
}

#[derive(Args)]
#[group(multiple = false)]
pub struct ListPosition {
    /// Explicit order index
    #[arg(long)]
    pub index: Option<f64>,
    /// Place directly after this list
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task (default: first backlog)
    Add {
        title: String,
        /// List name or ID
        #[arg(long)]
        list: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Insert at the top instead of the bottom
        #[arg(long)]
        top: bool,
    },
    /// List tasks of one list, or of every list
    #[command(name = "ls")]
    Ls {
        #[arg(long)]
        list: Option<String>,
    },
    /// Show task details
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Edit title or description (open tasks only)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// New description; an empty string clears it
        #[arg(long)]
        description: Option<String>,
    },
    /// Move a task to another list (moving into Done completes it)
    Move {
        id: String,
        /// Destination list name or ID
        #[arg(long)]
        list: String,
        #[command(flatten)]
        position: TaskPosition,
    },
    /// Reorder a task within its list (bottom when no flag is given)
    Reorder {
        id: String,
        #[command(flatten)]
        position: TaskPosition,
        /// Explicit order index
        #[arg(long, conflicts_with_all = ["after", "top"])]
        index: Option<f64>,
    },
    /// Complete a task (moves it to the top of Done)
    Complete {
        id: String,
    },
    /// Delete a task
    Delete {
        id: String,
    },
}

#[derive(Args)]
pub struct TaskPosition {
    /// Place directly after this task
    #[arg(long, conflicts_with = "top")]
    pub after: Option<String>,
    /// Place at the top
    #[arg(long)]
    pub top: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Set `retention_days` or `archive_page_size`
    Set {
        key: String,
        value: String,
    },
}
