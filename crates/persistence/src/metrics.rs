//! Query timing and pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times one repository query and records it under
/// `database_query_duration_seconds{query=...}`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_cluster_by_id");
/// let row = sqlx::query_as::<_, ClusterEntity>(..).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("database_query_duration_seconds", "query" => self.query_name)
            .record(self.start.elapsed().as_secs_f64());
    }
}

/// Publishes pool size gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("count_graves_by_cluster");
        assert_eq!(timer.query_name, "count_graves_by_cluster");
        timer.record();
    }
}
