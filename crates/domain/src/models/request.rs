//! Service request domain models and lifecycle rules.
//!
//! A request carries a free-text payload serialized as JSON into a single
//! text column, one mutable status row and an append-only log.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::{PaginationMeta, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::grave::GraveSummary;
use super::user::UserBrief;

/// A pending request older than this is reported as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

/// Urgency chosen by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPriority::Low => "low",
            RequestPriority::Medium => "medium",
            RequestPriority::High => "high",
        }
    }
}

/// Lifecycle state of a request.
///
/// Any state may be set from any other; there is no terminal lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Processing,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Processing => "processing",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "processing" => Ok(RequestStatus::Processing),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requests created before this instant and still pending are overdue.
pub fn overdue_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(OVERDUE_AFTER_DAYS)
}

/// Whether a request counts as overdue at `now`.
///
/// Derived on every read and never persisted.
pub fn is_overdue(status: RequestStatus, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == RequestStatus::Pending && created_at < overdue_cutoff(now)
}

/// The JSON document stored in the request's text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub details: String,
    #[serde(default)]
    pub priority: RequestPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_contact_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

impl RequestDetails {
    /// Reads a stored payload.
    ///
    /// Older rows hold plain text rather than JSON. Anything that does not
    /// parse as a details document is returned verbatim as `details` with
    /// default priority.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str::<RequestDetails>(raw).unwrap_or_else(|_| RequestDetails {
            details: raw.to_string(),
            priority: RequestPriority::default(),
            contact_phone: None,
            preferred_contact_time: None,
            additional_notes: None,
        })
    }

    /// Serializes for storage.
    pub fn serialize(&self) -> String {
        // Only string and enum fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| self.details.clone())
    }
}

/// Log entry written when a request is submitted.
pub fn submission_log_message(priority: RequestPriority) -> String {
    format!("Request submitted with {} priority", priority.as_str())
}

/// Log entry written on every status update, including no-op updates.
pub fn status_change_log_message(
    previous: Option<RequestStatus>,
    next: RequestStatus,
    remark: Option<&str>,
) -> String {
    let mut message = match previous {
        Some(prev) => format!("Status changed from {} to {}", prev, next),
        None => format!("Status set to {}", next),
    };
    if let Some(remark) = remark.map(str::trim).filter(|r| !r.is_empty()) {
        message.push_str(": ");
        message.push_str(remark);
    }
    message
}

/// A stored service request.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub grave_id: Option<Uuid>,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current status row of a request.
#[derive(Debug, Clone)]
pub struct RequestStatusRecord {
    pub status: RequestStatus,
    pub remark: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// An audit entry on a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Submission payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub grave_id: Option<Uuid>,

    #[validate(
        length(min = 1, max = 5000, message = "Details must be 1-5000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub details: String,

    #[serde(default)]
    pub priority: RequestPriority,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub contact_phone: Option<String>,

    #[validate(length(max = 100, message = "Preferred contact time must be at most 100 characters"))]
    pub preferred_contact_time: Option<String>,

    #[validate(length(max = 2000, message = "Additional notes must be at most 2000 characters"))]
    pub additional_notes: Option<String>,
}

impl CreateServiceRequest {
    pub fn to_details(&self) -> RequestDetails {
        RequestDetails {
            details: self.details.trim().to_string(),
            priority: self.priority,
            contact_phone: self.contact_phone.clone(),
            preferred_contact_time: self.preferred_contact_time.clone(),
            additional_notes: self.additional_notes.clone(),
        }
    }
}

/// Admin status update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,

    #[validate(length(max = 1000, message = "Remark must be at most 1000 characters"))]
    pub remark: Option<String>,
}

/// Admin log entry.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppendLogRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Message must be 1-2000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub message: String,
}

/// Query for the paginated admin request list.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 1000000, message = "Page must be between 1 and 1000000"))]
    pub page: i64,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i64,

    pub status: Option<RequestStatus>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT.min(MAX_PAGE_LIMIT)
}

/// Request as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<UserBrief>,
    pub grave_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grave: Option<GraveSummary>,
    pub details: RequestDetails,
    pub status: RequestStatus,
    pub status_remark: Option<String>,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<RequestLog>>,
}

impl RequestResponse {
    /// Builds the response, classifying overdue against `now`.
    pub fn build(
        request: ServiceRequest,
        status: Option<RequestStatusRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        // A missing status row only happens for rows predating status tracking.
        let (status, remark) = status
            .map(|s| (s.status, s.remark))
            .unwrap_or((RequestStatus::Pending, None));
        Self {
            id: request.id,
            user_id: request.user_id,
            requester: None,
            grave_id: request.grave_id,
            grave: None,
            details: RequestDetails::parse(&request.details),
            status,
            status_remark: remark,
            is_overdue: is_overdue(status, request.created_at, now),
            created_at: request.created_at,
            updated_at: request.updated_at,
            logs: None,
        }
    }
}

/// A page of requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedRequests {
    pub data: Vec<RequestResponse>,
    pub pagination: PaginationMeta,
}

/// Request counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub approved: i64,
    pub rejected: i64,
    pub overdue: i64,
}

impl RequestStats {
    /// Builds the stats from per-status `(status, count, overdue)` rows.
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (RequestStatus, i64, i64)>,
    {
        let mut stats = RequestStats::default();
        for (status, count, overdue) in rows {
            stats.total += count;
            match status {
                RequestStatus::Pending => stats.pending += count,
                RequestStatus::Processing => stats.processing += count,
                RequestStatus::Approved => stats.approved += count,
                RequestStatus::Rejected => stats.rejected += count,
            }
            stats.overdue += overdue;
        }
        stats
    }
}
