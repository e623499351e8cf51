//! Command implementations.

pub mod analyze;
pub mod config;
pub mod history;
pub mod show;
pub mod stats;
pub mod taxonomy;

pub use self::analyze::execute_analyze;
pub use self::config::execute_config;
pub use self::history::execute_history;
pub use self::show::execute_show;
pub use self::stats::execute_stats;
pub use self::taxonomy::{execute_explain, execute_kinds};
