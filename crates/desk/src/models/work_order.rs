//! Work-order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use workbench_core::{CustomerId, OperatorId, Price, WorkOrderId, WorkOrderStatus};

/// Free-text description of the machine brought in for repair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub processor: Option<String>,
    pub motherboard: Option<String>,
    pub memory: Option<String>,
    pub storage: Option<String>,
    pub graphics: Option<String>,
    pub other_components: Option<String>,
}

impl HardwareProfile {
    /// Labelled non-blank fields, in printing order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Processor", &self.processor),
            ("Motherboard", &self.motherboard),
            ("Memory", &self.memory),
            ("Storage", &self.storage),
            ("Graphics", &self.graphics),
            ("Other components", &self.other_components),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }

    /// True when no field holds any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Trim every field and drop blank ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        Self {
            processor: clean(self.processor),
            motherboard: clean(self.motherboard),
            memory: clean(self.memory),
            storage: clean(self.storage),
            graphics: clean(self.graphics),
            other_components: clean(self.other_components),
        }
    }
}

/// A stored work order.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    /// Store-assigned display number, e.g. `OS0042`.
    pub number: String,
    pub customer_id: CustomerId,
    pub operator_id: OperatorId,
    pub reported_fault: String,
    pub hardware: HardwareProfile,
    pub estimated_price: Option<Price>,
    pub due_date: Option<NaiveDate>,
    pub status: WorkOrderStatus,
    /// Append-only technician notes.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly when `status` is completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A work order joined with its customer and operator, as listed and printed.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderDetail {
    pub order: WorkOrder,
    pub customer_given_name: String,
    pub customer_family_name: String,
    pub customer_cpf: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub operator_name: String,
}

impl WorkOrderDetail {
    /// Customer given and family name joined by a space.
    #[must_use]
    pub fn customer_full_name(&self) -> String {
        format!("{} {}", self.customer_given_name, self.customer_family_name)
    }
}

/// New work-order fields as typed at the desk, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderInput {
    pub customer_id: CustomerId,
    pub reported_fault: String,
    pub hardware: HardwareProfile,
    /// Price as typed; comma or dot decimal separator.
    pub estimated_price: Option<String>,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub due_date: Option<String>,
    /// Initial technician notes, stored as given.
    pub notes: Option<String>,
}

/// A validated work order ready to insert.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub customer_id: CustomerId,
    pub operator_id: OperatorId,
    pub reported_fault: String,
    pub hardware: HardwareProfile,
    pub estimated_price: Option<Price>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Sparse work-order edit as typed at the desk.
///
/// `None` leaves a field untouched; a blank value clears an optional field.
/// `note` is appended to the notes, never replacing them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderPatch {
    pub reported_fault: Option<String>,
    pub processor: Option<String>,
    pub motherboard: Option<String>,
    pub memory: Option<String>,
    pub storage: Option<String>,
    pub graphics: Option<String>,
    pub other_components: Option<String>,
    pub estimated_price: Option<String>,
    pub due_date: Option<String>,
    pub note: Option<String>,
}

/// A validated sparse edit. `Some(None)` clears a column.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct WorkOrderChanges {
    pub reported_fault: Option<String>,
    pub processor: Option<Option<String>>,
    pub motherboard: Option<Option<String>>,
    pub memory: Option<Option<String>>,
    pub storage: Option<Option<String>>,
    pub graphics: Option<Option<String>>,
    pub other_components: Option<Option<String>>,
    pub estimated_price: Option<Option<Price>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub note: Option<String>,
}

impl WorkOrderChanges {
    /// True when the edit would not touch any column.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.reported_fault.is_none()
            && self.processor.is_none()
            && self.motherboard.is_none()
            && self.memory.is_none()
            && self.storage.is_none()
            && self.graphics.is_none()
            && self.other_components.is_none()
            && self.estimated_price.is_none()
            && self.due_date.is_none()
            && self.note.is_none()
    }
}

/// Work-order counts, overall and per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct WorkOrderStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl WorkOrderStats {
    /// Count for a single status.
    #[must_use]
    pub const fn count(&self, status: WorkOrderStatus) -> i64 {
        match status {
            WorkOrderStatus::Open => self.open,
            WorkOrderStatus::InProgress => self.in_progress,
            WorkOrderStatus::Completed => self.completed,
            WorkOrderStatus::Cancelled => self.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_entries_skip_blank_fields() {
        let hardware = HardwareProfile {
            processor: Some("Ryzen 5 5600".to_owned()),
            memory: Some("   ".to_owned()),
            storage: Some(" SSD 480GB ".to_owned()),
            ..HardwareProfile::default()
        };

        assert_eq!(
            hardware.entries(),
            vec![("Processor", "Ryzen 5 5600"), ("Storage", "SSD 480GB")]
        );
        assert!(!hardware.is_empty());
    }

    #[test]
    fn test_hardware_blank_is_empty() {
        let hardware = HardwareProfile {
            graphics: Some(String::new()),
            ..HardwareProfile::default()
        };
        assert!(hardware.is_empty());
        assert_eq!(hardware.normalized(), HardwareProfile::default());
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(WorkOrderChanges::default().is_empty());
        let changes = WorkOrderChanges {
            due_date: Some(None),
            ..WorkOrderChanges::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_stats_count_by_status() {
        let stats = WorkOrderStats {
            total: 6,
            open: 1,
            in_progress: 2,
            completed: 3,
            cancelled: 0,
        };
        assert_eq!(stats.count(WorkOrderStatus::InProgress), 2);
        assert_eq!(
            WorkOrderStatus::ALL
                .iter()
                .map(|s| stats.count(*s))
                .sum::<i64>(),
            stats.total
        );
    }
}
