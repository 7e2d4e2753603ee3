//! Work-order lifecycle service.
//!
//! Opening, editing and closing repair jobs. Status changes keep the
//! completion timestamp in step with the status, and notes only ever grow:
//! each addition is stamped with the desk's local time and appended.

mod error;

pub use error::WorkOrderError;

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use workbench_core::{CustomerId, OperatorId, Price, WorkOrderId, WorkOrderStatus};

use super::required;
use crate::db::RepositoryError;
use crate::db::customers::CustomerRepository;
use crate::db::operators::OperatorRepository;
use crate::db::work_orders::{CUSTOMER_FOREIGN_KEY, OPERATOR_FOREIGN_KEY, WorkOrderRepository};
use crate::models::work_order::{
    NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderDetail, WorkOrderInput,
    WorkOrderPatch, WorkOrderStats,
};

/// Default number of rows returned by [`WorkOrderService::list`].
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Work-order lifecycle service.
pub struct WorkOrderService<'a> {
    orders: WorkOrderRepository<'a>,
    customers: CustomerRepository<'a>,
    operators: OperatorRepository<'a>,
}

impl<'a> WorkOrderService<'a> {
    /// Create a new work-order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: WorkOrderRepository::new(pool),
            customers: CustomerRepository::new(pool),
            operators: OperatorRepository::new(pool),
        }
    }

    /// Open a work order for a customer on behalf of an operator.
    ///
    /// The store assigns the number; the status starts as open.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank fault, a bad price or due date,
    /// an unknown customer, or an unknown or inactive operator.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create(
        &self,
        operator_id: OperatorId,
        input: &WorkOrderInput,
    ) -> Result<WorkOrderDetail, WorkOrderError> {
        let order = validate_new(operator_id, input)?;

        if self.customers.get_by_id(order.customer_id).await?.is_none() {
            return Err(WorkOrderError::UnknownCustomer(order.customer_id));
        }
        match self.operators.get_by_id(operator_id).await? {
            None => return Err(WorkOrderError::UnknownOperator(operator_id)),
            Some(operator) if !operator.active => {
                return Err(WorkOrderError::InactiveOperator(operator_id));
            }
            Some(_) => {}
        }

        let created = self
            .orders
            .create(&order)
            .await
            .map_err(|e| missing_reference(e, &order))?;

        tracing::info!(
            work_order_id = %created.id,
            number = %created.number,
            "Work order opened"
        );
        self.get(created.id).await
    }

    /// Get a work order with its customer and operator.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::NotFound` if the work order doesn't exist.
    pub async fn get(&self, id: WorkOrderId) -> Result<WorkOrderDetail, WorkOrderError> {
        self.orders
            .get_detail(id)
            .await?
            .ok_or_else(|| WorkOrderError::NotFound(id.to_string()))
    }

    /// Get a work order by display number, case-insensitively (`os0001` works).
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::NotFound` if no work order has that number.
    pub async fn get_by_number(&self, number: &str) -> Result<WorkOrderDetail, WorkOrderError> {
        let number = normalize_number(number);
        self.orders
            .get_detail_by_number(&number)
            .await?
            .ok_or(WorkOrderError::NotFound(number))
    }

    /// List work orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::Repository` if the query fails.
    pub async fn list(
        &self,
        status: Option<WorkOrderStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<WorkOrderDetail>, WorkOrderError> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(self.orders.list(status, limit).await?)
    }

    /// Every work order of one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::Repository` if the query fails.
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<WorkOrderDetail>, WorkOrderError> {
        Ok(self.orders.list_by_customer(customer_id).await?)
    }

    /// Counts overall and per status.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::Repository` if the query fails.
    pub async fn statistics(&self) -> Result<WorkOrderStats, WorkOrderError> {
        Ok(self.orders.stats().await?)
    }

    /// Move a work order to `status`, optionally appending a note.
    ///
    /// Completing stamps the completion time; any other status clears it.
    /// Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::NotFound` if the work order doesn't exist.
    #[instrument(skip(self, note))]
    pub async fn update_status(
        &self,
        id: WorkOrderId,
        status: WorkOrderStatus,
        note: Option<&str>,
    ) -> Result<WorkOrder, WorkOrderError> {
        let completed_at = status.completion_timestamp(Utc::now());
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        let updated = self
            .orders
            .update_status(id, status, completed_at, note.map(|n| (n, local_now())))
            .await
            .map_err(|e| not_found_as_order(e, id))?;

        tracing::info!(work_order_id = %id, status = %status, "Work order status changed");
        Ok(updated)
    }

    /// Append a timestamped note.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError::BlankNote` if the note is blank.
    /// Returns `WorkOrderError::NotFound` if the work order doesn't exist.
    #[instrument(skip(self, note))]
    pub async fn add_note(&self, id: WorkOrderId, note: &str) -> Result<WorkOrder, WorkOrderError> {
        let note = required(note).ok_or(WorkOrderError::BlankNote)?;

        let updated = self
            .orders
            .append_note(id, &note, local_now())
            .await
            .map_err(|e| not_found_as_order(e, id))?;

        tracing::info!(work_order_id = %id, "Note added");
        Ok(updated)
    }

    /// Apply a sparse edit. Supplying nothing returns the work order unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad price or due date.
    /// Returns `WorkOrderError::NotFound` if the work order doesn't exist.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: WorkOrderId,
        patch: &WorkOrderPatch,
    ) -> Result<WorkOrder, WorkOrderError> {
        let changes = validate_patch(patch)?;
        if changes.is_empty() {
            tracing::warn!("No work order fields to update");
            return self.get(id).await.map(|detail| detail.order);
        }

        let updated = self
            .orders
            .update(id, &changes, local_now())
            .await
            .map_err(|e| not_found_as_order(e, id))?;

        tracing::info!(work_order_id = %id, "Work order updated");
        Ok(updated)
    }
}

fn not_found_as_order(e: RepositoryError, id: WorkOrderId) -> WorkOrderError {
    match e {
        RepositoryError::NotFound => WorkOrderError::NotFound(id.to_string()),
        other => WorkOrderError::Repository(other),
    }
}

/// Name the side of a work order whose row vanished before the insert.
fn missing_reference(e: RepositoryError, order: &NewWorkOrder) -> WorkOrderError {
    match e {
        RepositoryError::MissingReference(ref key) if key == CUSTOMER_FOREIGN_KEY => {
            WorkOrderError::UnknownCustomer(order.customer_id)
        }
        RepositoryError::MissingReference(ref key) if key == OPERATOR_FOREIGN_KEY => {
            WorkOrderError::UnknownOperator(order.operator_id)
        }
        other => WorkOrderError::Repository(other),
    }
}

/// Note timestamps use the desk's wall clock.
fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn normalize_number(number: &str) -> String {
    number.trim().to_uppercase()
}

/// Validate a new work order.
///
/// # Errors
///
/// Returns `WorkOrderError::BlankFault`, `InvalidPrice` or `InvalidDueDate`.
pub fn validate_new(
    operator_id: OperatorId,
    input: &WorkOrderInput,
) -> Result<NewWorkOrder, WorkOrderError> {
    let reported_fault = required(&input.reported_fault).ok_or(WorkOrderError::BlankFault)?;
    let estimated_price = parse_price(input.estimated_price.as_deref())?.flatten();
    let due_date = parse_optional_date(input.due_date.as_deref())?.flatten();
    let notes = input
        .notes
        .clone()
        .filter(|n| !n.trim().is_empty());

    Ok(NewWorkOrder {
        customer_id: input.customer_id,
        operator_id,
        reported_fault,
        hardware: input.hardware.clone().normalized(),
        estimated_price,
        due_date,
        notes,
    })
}

/// Validate a sparse edit.
///
/// A blank fault is ignored since the fault can't be cleared; blank hardware,
/// price and due date values clear their column. A blank note is ignored.
///
/// # Errors
///
/// Returns `WorkOrderError::InvalidPrice` or `InvalidDueDate`.
pub fn validate_patch(patch: &WorkOrderPatch) -> Result<WorkOrderChanges, WorkOrderError> {
    let text = |value: &Option<String>| value.as_deref().map(required);

    Ok(WorkOrderChanges {
        reported_fault: patch.reported_fault.as_deref().and_then(required),
        processor: text(&patch.processor),
        motherboard: text(&patch.motherboard),
        memory: text(&patch.memory),
        storage: text(&patch.storage),
        graphics: text(&patch.graphics),
        other_components: text(&patch.other_components),
        estimated_price: parse_price(patch.estimated_price.as_deref())?,
        due_date: parse_optional_date(patch.due_date.as_deref())?,
        note: patch.note.as_deref().and_then(required),
    })
}

/// `None` when not supplied, `Some(None)` when blank.
#[allow(clippy::option_option)]
fn parse_price(input: Option<&str>) -> Result<Option<Option<Price>>, WorkOrderError> {
    Ok(input.map(Price::parse_input).transpose()?)
}

/// `None` when not supplied, `Some(None)` when blank.
#[allow(clippy::option_option)]
fn parse_optional_date(input: Option<&str>) -> Result<Option<Option<NaiveDate>>, WorkOrderError> {
    input
        .map(|value| {
            let value = value.trim();
            if value.is_empty() {
                Ok(None)
            } else {
                parse_due_date(value).map(Some)
            }
        })
        .transpose()
}

/// Parse a due date typed as `YYYY-MM-DD` or `DD/MM/YYYY`.
///
/// # Errors
///
/// Returns `WorkOrderError::InvalidDueDate` for anything else.
pub fn parse_due_date(input: &str) -> Result<NaiveDate, WorkOrderError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .map_err(|_| WorkOrderError::InvalidDueDate(input.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::work_order::HardwareProfile;

    fn input() -> WorkOrderInput {
        WorkOrderInput {
            customer_id: CustomerId::new(7),
            reported_fault: "  Não liga  ".to_owned(),
            hardware: HardwareProfile {
                processor: Some(" Intel i5-10400 ".to_owned()),
                memory: Some(String::new()),
                ..HardwareProfile::default()
            },
            estimated_price: Some("150,00".to_owned()),
            due_date: Some("25/12/2025".to_owned()),
            notes: None,
        }
    }

    #[test]
    fn test_validate_new_normalizes() {
        let order = validate_new(OperatorId::new(1), &input()).unwrap();
        assert_eq!(order.reported_fault, "Não liga");
        assert_eq!(order.hardware.processor.as_deref(), Some("Intel i5-10400"));
        assert!(order.hardware.memory.is_none());
        assert_eq!(
            order.estimated_price.unwrap().amount(),
            Decimal::new(15000, 2)
        );
        assert_eq!(order.due_date, NaiveDate::from_ymd_opt(2025, 12, 25));
    }

    #[test]
    fn test_validate_new_requires_fault() {
        let err = validate_new(
            OperatorId::new(1),
            &WorkOrderInput {
                reported_fault: " \n ".to_owned(),
                ..input()
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkOrderError::BlankFault));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_new_rejects_negative_price() {
        let err = validate_new(
            OperatorId::new(1),
            &WorkOrderInput {
                estimated_price: Some("-10".to_owned()),
                ..input()
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkOrderError::InvalidPrice(_)));
    }

    #[test]
    fn test_validate_new_blank_price_is_none() {
        let order = validate_new(
            OperatorId::new(1),
            &WorkOrderInput {
                estimated_price: Some("  ".to_owned()),
                due_date: None,
                ..input()
            },
        )
        .unwrap();
        assert!(order.estimated_price.is_none());
        assert!(order.due_date.is_none());
    }

    #[test]
    fn test_parse_due_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_due_date("2025-03-09").unwrap(), expected);
        assert_eq!(parse_due_date("09/03/2025").unwrap(), expected);
        assert!(matches!(
            parse_due_date("31/02/2025"),
            Err(WorkOrderError::InvalidDueDate(_))
        ));
        assert!(parse_due_date("next friday").is_err());
    }

    #[test]
    fn test_validate_patch_clears_and_skips() {
        let changes = validate_patch(&WorkOrderPatch {
            reported_fault: Some(String::new()),
            graphics: Some(" ".to_owned()),
            storage: Some("HD 1TB".to_owned()),
            estimated_price: Some(String::new()),
            note: Some("   ".to_owned()),
            ..WorkOrderPatch::default()
        })
        .unwrap();

        assert!(changes.reported_fault.is_none());
        assert_eq!(changes.graphics, Some(None));
        assert_eq!(changes.storage, Some(Some("HD 1TB".to_owned())));
        assert!(changes.processor.is_none());
        assert_eq!(changes.estimated_price, Some(None));
        assert!(changes.due_date.is_none());
        assert!(changes.note.is_none());
    }

    #[test]
    fn test_validate_patch_empty() {
        assert!(validate_patch(&WorkOrderPatch::default()).unwrap().is_empty());
    }

    #[test]
    fn test_validate_patch_bad_date() {
        let err = validate_patch(&WorkOrderPatch {
            due_date: Some("2025/13/01".to_owned()),
            ..WorkOrderPatch::default()
        })
        .unwrap_err();
        assert!(matches!(err, WorkOrderError::InvalidDueDate(_)));
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number(" os0042 "), "OS0042");
    }

    #[test]
    fn test_missing_reference_names_the_right_side() {
        let order = validate_new(OperatorId::new(3), &input()).unwrap();

        let err = missing_reference(
            RepositoryError::MissingReference(OPERATOR_FOREIGN_KEY.to_owned()),
            &order,
        );
        assert!(matches!(err, WorkOrderError::UnknownOperator(id) if id == OperatorId::new(3)));

        let err = missing_reference(
            RepositoryError::MissingReference(CUSTOMER_FOREIGN_KEY.to_owned()),
            &order,
        );
        assert!(matches!(err, WorkOrderError::UnknownCustomer(id) if id == CustomerId::new(7)));

        let err = missing_reference(
            RepositoryError::MissingReference("other_fkey".to_owned()),
            &order,
        );
        assert!(matches!(err, WorkOrderError::Repository(_)));
    }

    #[test]
    fn test_repository_error_is_not_prefixed_twice() {
        let err = WorkOrderError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.to_string().matches("database error").count(), 1);
    }

    #[test]
    fn test_not_found_kind() {
        let err = not_found_as_order(RepositoryError::NotFound, WorkOrderId::new(9));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "work order 9 not found");
    }
}
