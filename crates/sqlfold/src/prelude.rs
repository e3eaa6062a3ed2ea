//! Convenient imports for typical `sqlfold` usage.
//!
//! ```
//! use sqlfold::prelude::*;
//! ```

pub use crate::{
    ConnectionConfig, Database, Driver, ExecutionResult, Order, Query, SqlError, SqlResult,
    StatementBuilder, Value, delete, insert, query, select, update,
};
