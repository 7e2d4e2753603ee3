//! Work-order lifecycle status.
//!
//! Any status may move to any other, including re-opening a completed order.
//! The only rule tied to a transition is the completion timestamp: it is set
//! when an order becomes [`WorkOrderStatus::Completed`] and cleared for every
//! other status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a status name is outside the four known values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid work order status: {0} (expected open, in_progress, completed or cancelled)")]
pub struct StatusError(pub String);

/// Repair work-order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "workshop.work_order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    /// Newly opened, not yet on the bench.
    #[default]
    Open,
    /// A technician is working on it.
    InProgress,
    /// Repair finished.
    Completed,
    /// Abandoned by the customer or the shop.
    Cancelled,
}

impl WorkOrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Open,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Stored snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for listings and printed documents.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Completion timestamp an order must carry after moving to this status.
    ///
    /// `Some(now)` for [`WorkOrderStatus::Completed`], `None` otherwise,
    /// whatever the previous status was.
    #[must_use]
    pub const fn completion_timestamp(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Completed => Some(now),
            Self::Open | Self::InProgress | Self::Cancelled => None,
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_completed_always_stamps() {
        assert_eq!(
            WorkOrderStatus::Completed.completion_timestamp(at(9)),
            Some(at(9))
        );
        // Repeating the transition re-stamps with the new time
        assert_eq!(
            WorkOrderStatus::Completed.completion_timestamp(at(10)),
            Some(at(10))
        );
    }

    #[test]
    fn test_other_statuses_always_clear() {
        for status in [
            WorkOrderStatus::Open,
            WorkOrderStatus::InProgress,
            WorkOrderStatus::Cancelled,
        ] {
            assert_eq!(status.completion_timestamp(at(9)), None, "{status}");
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "in_progress".parse::<WorkOrderStatus>().unwrap(),
            WorkOrderStatus::InProgress
        );
        assert_eq!(
            "In Progress".parse::<WorkOrderStatus>().unwrap(),
            WorkOrderStatus::InProgress
        );
        assert_eq!(
            " COMPLETED ".parse::<WorkOrderStatus>().unwrap(),
            WorkOrderStatus::Completed
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "aberta".parse::<WorkOrderStatus>().unwrap_err();
        assert_eq!(err, StatusError("aberta".to_owned()));
        assert!("".parse::<WorkOrderStatus>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for status in WorkOrderStatus::ALL {
            assert_eq!(status.to_string().parse::<WorkOrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_default_is_open() {
        assert_eq!(WorkOrderStatus::default(), WorkOrderStatus::Open);
        assert_eq!(WorkOrderStatus::Cancelled.label(), "Cancelled");
    }
}
