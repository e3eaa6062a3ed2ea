//! Statement monitoring and hooks.
//!
//! - Timing and result reporting through [`QueryMonitor`]
//! - Inspecting, rewriting or aborting statements through [`QueryHook`]
//! - `tracing` output through [`TracingSqlHook`] (feature `tracing`)
//!
//! # Example
//!
//! ```
//! use sqlfold::monitor::{MonitorConfig, StatsMonitor};
//! use sqlfold::testing::RecordingDriver;
//! use sqlfold::Database;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let mut db = Database::from_driver(RecordingDriver::new())
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_secs(1))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor_arc(stats.clone());
//!
//! db.query("SELECT 1").run(&mut db)?;
//! assert_eq!(stats.stats().select_count, 1);
//! # Ok::<(), sqlfold::SqlError>(())
//! ```

mod config;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;


pub use config::MonitorConfig;
pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
