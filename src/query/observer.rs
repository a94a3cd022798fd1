//! Query audit hooks.

use tracing::info;

/// Called with the query text before each execution.
pub trait QueryObserver: Send + Sync {
    fn before_execute(&self, sql: &str);
}

/// Logs every query through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn before_execute(&self, sql: &str) {
        info!(sql = %sql, "exec sql");
    }
}

/// Ignores every query.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl QueryObserver for NoopObserver {
    fn before_execute(&self, _sql: &str) {}
}

impl<F> QueryObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn before_execute(&self, sql: &str) {
        self(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_observer_receives_sql() {
        let seen = Mutex::new(Vec::new());
        let observer = |sql: &str| seen.lock().unwrap().push(sql.to_string());

        observer.before_execute("SELECT 1");
        NoopObserver.before_execute("SELECT 2");

        assert_eq!(*seen.lock().unwrap(), vec!["SELECT 1".to_string()]);
    }
}
