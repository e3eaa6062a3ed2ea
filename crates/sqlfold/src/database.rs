//! A connected session plus statement entry points.

use crate::builder::{StatementBuilder, StatementKind};
use crate::client::Driver;
use crate::config::ConnectionConfig;
use crate::error::{SqlError, SqlResult};
use crate::escape::Escaper;
use crate::monitor::{
    CompositeHook, HookAction, MonitorConfig, NoopMonitor, QueryContext, QueryHook, QueryMonitor,
    QueryResult,
};
use crate::query::Query;
use crate::result::ExecutionResult;
use crate::value::Value;
use std::sync::Arc;
use std::time::Instant;

/// A database session wrapping a [`Driver`].
///
/// Statements run synchronously and borrow the session mutably for their
/// whole execution. Monitoring must be explicitly enabled via
/// [`MonitorConfig::enable_monitoring`]; hooks' `before_query` always runs.
pub struct Database<D> {
    driver: D,
    escaper: Escaper,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
}

impl<D: Driver> Database<D> {
    /// Open a session and apply the configured charset.
    pub fn connect(config: &ConnectionConfig) -> SqlResult<Self> {
        let mut driver = D::connect(config).map_err(|e| SqlError::Connection(e.to_string()))?;
        driver
            .set_charset(&config.charset)
            .map_err(|e| SqlError::Charset(format!("{}: {e}", config.charset)))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlfold",
            host = %config.host,
            database = %config.database,
            charset = %config.charset,
            "connected",
        );

        Ok(Self::from_driver(driver).with_escaper(Escaper::new(config.dialect.clone())))
    }
}

impl<D> Database<D> {
    /// Wrap an already connected driver, using the default dialect.
    pub fn from_driver(driver: D) -> Self {
        Self {
            driver,
            escaper: Escaper::default(),
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_escaper(mut self, escaper: Escaper) -> Self {
        self.escaper = escaper;
        self
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set the query hook, replacing any existing one.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a query hook.
    ///
    /// If a hook is already set, this composes it with the new hook (existing first).
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn escaper(&self) -> &Escaper {
        &self.escaper
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    // ==================== Statement entry points ====================

    fn builder(&self, kind: StatementKind, table: &str, alias: Option<&str>) -> StatementBuilder {
        StatementBuilder::new(kind, self.escaper.clone(), table, alias)
    }

    pub fn select(&self, table: &str) -> StatementBuilder {
        self.builder(StatementKind::Select, table, None)
    }

    pub fn select_as(&self, table: &str, alias: &str) -> StatementBuilder {
        self.builder(StatementKind::Select, table, Some(alias))
    }

    pub fn update(&self, table: &str) -> StatementBuilder {
        self.builder(StatementKind::Update, table, None)
    }

    pub fn update_as(&self, table: &str, alias: &str) -> StatementBuilder {
        self.builder(StatementKind::Update, table, Some(alias))
    }

    pub fn insert(&self, table: &str) -> StatementBuilder {
        self.builder(StatementKind::Insert, table, None)
    }

    pub fn insert_as(&self, table: &str, alias: &str) -> StatementBuilder {
        self.builder(StatementKind::Insert, table, Some(alias))
    }

    pub fn delete(&self, table: &str) -> StatementBuilder {
        self.builder(StatementKind::Delete, table, None)
    }

    pub fn delete_as(&self, table: &str, alias: &str) -> StatementBuilder {
        self.builder(StatementKind::Delete, table, Some(alias))
    }

    /// Raw SQL, optionally with named parameters bound later.
    pub fn query(&self, sql: impl Into<String>) -> Query {
        Query::new(sql)
    }

    /// Raw SQL with named parameters substituted using this session's dialect.
    pub fn query_with_params<K: AsRef<str>>(
        &self,
        sql: &str,
        params: &[(K, Value)],
    ) -> SqlResult<Query> {
        Query::with_params(&self.escaper, sql, params)
    }

    fn apply_hook(&self, ctx: &mut QueryContext) -> SqlResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };
        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::ModifySql(sql) => {
                ctx.kind = StatementKind::detect(&sql).or(ctx.kind);
                ctx.sql = sql;
                Ok(())
            }
            HookAction::Abort(reason) => Err(SqlError::Aborted(reason)),
        }
    }

    fn report_result(&self, ctx: &QueryContext, started: Instant, result: &QueryResult) {
        if !self.config.monitoring_enabled {
            return;
        }
        let duration = started.elapsed();
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }
        self.monitor.on_query_complete(ctx, duration, result);
        if self
            .config
            .slow_query_threshold
            .is_some_and(|threshold| duration >= threshold)
        {
            self.monitor.on_slow_query(ctx, duration);
        }
    }
}

impl<D: Driver> Database<D> {
    /// Send final SQL text to the driver, running hooks and monitors around it.
    pub(crate) fn execute(&mut self, mut ctx: QueryContext) -> SqlResult<ExecutionResult> {
        self.apply_hook(&mut ctx)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }
        let started = Instant::now();

        match self.driver.execute(&ctx.sql) {
            Ok(raw) => {
                let outcome = if raw.records.columns().is_empty() {
                    QueryResult::Affected(raw.affected_rows)
                } else {
                    QueryResult::Rows(raw.records.len())
                };
                self.report_result(&ctx, started, &outcome);
                Ok(ExecutionResult::new(ctx.sql, raw))
            }
            Err(err) => {
                let error = SqlError::statement(err.code, err.message, ctx.sql.clone());
                self.report_result(&ctx, started, &QueryResult::error(error.to_string()));
                Err(error)
            }
        }
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for Database<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.driver)
            .field("escaper", &self.escaper)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
