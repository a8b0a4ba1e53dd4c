//! Page Commands
//!
//! The operations the presentation layer calls, organized by page. Each
//! controller owns its list in memory and talks to a repository.

mod job_cmd;
mod rate_limit;
mod todo_cmd;

// Re-export all public items
pub use job_cmd::*;
pub use rate_limit::*;
pub use todo_cmd::*;
