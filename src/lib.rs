#[macro_use]
mod macros;

pub mod attachments;
pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod desk;
pub mod display;
pub mod error;
pub mod forms;
pub mod gateway;
pub mod list;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
pub mod summary;
#[cfg(test)]
mod test_guards;
pub mod time;
pub mod types;
pub mod worknote;

pub use config::Config;
pub use desk::Desk;
pub use error::{DeskError, Result};
pub use model::{Category, CurrentUser, Project, Ticket, User, Worknote};
pub use types::{Priority, ProjectStatus, Severity, TicketId, TicketStatus};
