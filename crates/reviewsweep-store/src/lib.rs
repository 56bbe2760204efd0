//! ReviewSweep Store: JSON persistence for filed reports.
//!
//! Both stores are whole-file JSON rewrites. A missing or corrupt file
//! loads as empty.

pub mod history;
pub mod log;

pub use history::{HistoryEntry, ReportHistory, HISTORY_DATE_FORMAT};
pub use log::{ReportRecord, SubmittedLog};
