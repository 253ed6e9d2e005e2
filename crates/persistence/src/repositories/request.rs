//! Service request repository for database operations.
//!
//! A request owns one status row and an append-only log. Every write that
//! touches more than one of these tables runs in a single transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::request::{status_change_log_message, RequestStatus};

use crate::entities::{RequestDetailEntity, RequestEntity, RequestLogEntity};
use crate::metrics::QueryTimer;

pub(crate) const REQUEST_DETAIL_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.grave_id, r.details, r.created_at, r.updated_at,
           s.status, s.remark AS status_remark, s.updated_by AS status_updated_by,
           s.updated_at AS status_updated_at,
           u.display_name AS requester_name,
           g.cluster_id AS grave_cluster_id, c.name AS grave_cluster_name,
           g.details AS grave_details
    FROM requests r
    JOIN users u ON u.id = r.user_id
    LEFT JOIN request_status s ON s.request_id = r.id
    LEFT JOIN grave_details g ON g.id = r.grave_id
    LEFT JOIN grave_clusters c ON c.id = g.cluster_id
"#;

/// Result of a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: Option<RequestStatus>,
    pub current: RequestStatus,
    pub log_message: String,
}

/// Repository for service requests, their status and logs.
#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the request, its `pending` status row and the submission log.
    pub async fn create(
        &self,
        user_id: Uuid,
        grave_id: Option<Uuid>,
        details: &str,
        submission_message: &str,
    ) -> Result<RequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_request");
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RequestEntity>(
            r#"
            INSERT INTO requests (user_id, grave_id, details)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(grave_id)
        .bind(details)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO request_status (request_id, status, updated_by)
            VALUES ($1, 'pending', $2)
            "#,
        )
        .bind(request.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO request_logs (request_id, user_id, message) VALUES ($1, $2, $3)")
            .bind(request.id)
            .bind(user_id)
            .bind(submission_message)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_request_by_id");
        let result = sqlx::query_as::<_, RequestEntity>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<RequestDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_request_detail");
        let result = sqlx::query_as::<_, RequestDetailEntity>(&format!(
            "{REQUEST_DETAIL_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Log entries of a request, newest first.
    pub async fn list_logs(&self, request_id: Uuid) -> Result<Vec<RequestLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_request_logs");
        let result = sqlx::query_as::<_, RequestLogEntity>(
            r#"
            SELECT l.id, l.request_id, l.user_id, u.display_name AS user_name,
                   l.message, l.created_at
            FROM request_logs l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.request_id = $1
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Requests submitted by one user, newest first.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<RequestDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_requests_by_user");
        let result = sqlx::query_as::<_, RequestDetailEntity>(&format!(
            "{REQUEST_DETAIL_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One page of all requests, optionally filtered by status, with the
    /// total matching count.
    pub async fn list_paginated(
        &self,
        status: Option<RequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RequestDetailEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_requests_paginated");
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, RequestDetailEntity>(&format!(
            r#"
            {REQUEST_DETAIL_SELECT}
            WHERE ($1::text IS NULL OR COALESCE(s.status, 'pending') = $1)
            ORDER BY r.created_at DESC, r.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM requests r
            LEFT JOIN request_status s ON s.request_id = r.id
            WHERE ($1::text IS NULL OR COALESCE(s.status, 'pending') = $1)
            "#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((rows, total.0))
    }

    /// `(status, count, overdue)` per stored status. Requests without a
    /// status row count as pending; pending ones created before
    /// `overdue_before` are counted as overdue.
    pub async fn status_counts(
        &self,
        overdue_before: DateTime<Utc>,
    ) -> Result<Vec<(String, i64, i64)>, sqlx::Error> {
        let timer = QueryTimer::new("request_status_counts");
        let result = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT COALESCE(s.status, 'pending') AS status,
                   COUNT(*) AS count,
                   COUNT(*) FILTER (
                       WHERE COALESCE(s.status, 'pending') = 'pending'
                         AND r.created_at < $1
                   ) AS overdue
            FROM requests r
            LEFT JOIN request_status s ON s.request_id = r.id
            GROUP BY 1
            "#,
        )
        .bind(overdue_before)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets the status, upserting the single status row, and appends a log
    /// entry describing the change. Any status may follow any other.
    ///
    /// Returns `None` when the request does not exist.
    pub async fn update_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        remark: Option<&str>,
        actor_id: Uuid,
    ) -> Result<Option<StatusChange>, sqlx::Error> {
        let timer = QueryTimer::new("update_request_status");
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM requests WHERE id = $1 FOR UPDATE")
                .bind(request_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            timer.record();
            return Ok(None);
        }

        let previous: Option<(String,)> =
            sqlx::query_as("SELECT status FROM request_status WHERE request_id = $1")
                .bind(request_id)
                .fetch_optional(&mut *tx)
                .await?;
        let previous = previous.and_then(|(s,)| s.parse::<RequestStatus>().ok());

        sqlx::query(
            r#"
            INSERT INTO request_status (request_id, status, remark, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (request_id) DO UPDATE SET
                status = EXCLUDED.status,
                remark = EXCLUDED.remark,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            "#,
        )
        .bind(request_id)
        .bind(status.as_str())
        .bind(remark)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;

        let log_message = status_change_log_message(previous, status, remark);
        sqlx::query("INSERT INTO request_logs (request_id, user_id, message) VALUES ($1, $2, $3)")
            .bind(request_id)
            .bind(actor_id)
            .bind(&log_message)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE requests SET updated_at = NOW() WHERE id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(StatusChange {
            previous,
            current: status,
            log_message,
        }))
    }

    /// Appends a free-form log entry. An unknown request surfaces as a
    /// foreign key violation.
    pub async fn append_log(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        message: &str,
    ) -> Result<RequestLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("append_request_log");
        let result = sqlx::query_as::<_, RequestLogEntity>(
            r#"
            WITH inserted AS (
                INSERT INTO request_logs (request_id, user_id, message)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT i.id, i.request_id, i.user_id, u.display_name AS user_name,
                   i.message, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(request_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a request together with its logs, its status row and the
    /// relations that were granted for it.
    ///
    /// Returns `false` when the request does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_request");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM request_logs WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM request_status WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM grave_related_users WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(false);
        }

        tx.commit().await?;
        timer.record();
        Ok(true)
    }
}
