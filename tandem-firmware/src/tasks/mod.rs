//! Embassy async tasks
//!
//! Each task runs independently and reaches the link context through
//! `node::with_node`.

pub mod report;
pub mod sync_monitor;
pub mod watchdog;

pub use report::report_task;
pub use sync_monitor::sync_monitor_task;
pub use watchdog::watchdog_task;
