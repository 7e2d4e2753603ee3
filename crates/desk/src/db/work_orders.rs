//! Work-order repository for database operations.
//!
//! Status changes and note appends lock the work-order row (`FOR UPDATE`)
//! and write status, completion time and notes in one statement, so a note
//! can never be lost to a concurrent append.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use workbench_core::{CustomerId, OperatorId, Price, WorkOrderId, WorkOrderStatus, append_note};

use super::{RepositoryError, map_foreign_key_violation};
use crate::models::work_order::{
    HardwareProfile, NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderDetail, WorkOrderStats,
};

/// Foreign key from a work order to its customer.
pub const CUSTOMER_FOREIGN_KEY: &str = "work_order_customer_id_fkey";

/// Foreign key from a work order to the operator who opened it.
pub const OPERATOR_FOREIGN_KEY: &str = "work_order_operator_id_fkey";

/// Columns of `workshop.work_order` in [`WorkOrderRow`] order.
const WORK_ORDER_COLUMNS: &str = r"
    id, number, customer_id, operator_id, reported_fault,
    processor, motherboard, memory, storage, graphics, other_components,
    estimated_price, due_date, status, notes, created_at, completed_at
";

/// Work order joined with customer and operator, ready for a `WHERE` clause.
const DETAIL_SELECT: &str = r"
    SELECT w.id, w.number, w.customer_id, w.operator_id, w.reported_fault,
           w.processor, w.motherboard, w.memory, w.storage, w.graphics, w.other_components,
           w.estimated_price, w.due_date, w.status, w.notes, w.created_at, w.completed_at,
           c.given_name  AS customer_given_name,
           c.family_name AS customer_family_name,
           c.cpf         AS customer_cpf,
           c.phone       AS customer_phone,
           c.email       AS customer_email,
           o.display_name AS operator_name
    FROM workshop.work_order w
    INNER JOIN workshop.customer c ON c.id = w.customer_id
    INNER JOIN workshop.operator o ON o.id = w.operator_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` work-order queries.
#[derive(Debug, sqlx::FromRow)]
struct WorkOrderRow {
    id: i32,
    number: String,
    customer_id: i32,
    operator_id: i32,
    reported_fault: String,
    processor: Option<String>,
    motherboard: Option<String>,
    memory: Option<String>,
    storage: Option<String>,
    graphics: Option<String>,
    other_components: Option<String>,
    estimated_price: Option<Decimal>,
    due_date: Option<NaiveDate>,
    status: WorkOrderStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WorkOrderRow> for WorkOrder {
    type Error = RepositoryError;

    fn try_from(row: WorkOrderRow) -> Result<Self, Self::Error> {
        if row.completed_at.is_some() != (row.status == WorkOrderStatus::Completed) {
            return Err(RepositoryError::DataCorruption(format!(
                "work order {} has status {} but completed_at {:?}",
                row.number, row.status, row.completed_at
            )));
        }

        let estimated_price = row
            .estimated_price
            .map(Price::new)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })?;

        Ok(Self {
            id: WorkOrderId::new(row.id),
            number: row.number,
            customer_id: CustomerId::new(row.customer_id),
            operator_id: OperatorId::new(row.operator_id),
            reported_fault: row.reported_fault,
            hardware: HardwareProfile {
                processor: row.processor,
                motherboard: row.motherboard,
                memory: row.memory,
                storage: row.storage,
                graphics: row.graphics,
                other_components: row.other_components,
            },
            estimated_price,
            due_date: row.due_date,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// Internal row type for joined work-order queries.
#[derive(Debug, sqlx::FromRow)]
struct WorkOrderDetailRow {
    #[sqlx(flatten)]
    order: WorkOrderRow,
    customer_given_name: String,
    customer_family_name: String,
    customer_cpf: String,
    customer_phone: String,
    customer_email: Option<String>,
    operator_name: String,
}

impl TryFrom<WorkOrderDetailRow> for WorkOrderDetail {
    type Error = RepositoryError;

    fn try_from(row: WorkOrderDetailRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order: row.order.try_into()?,
            customer_given_name: row.customer_given_name,
            customer_family_name: row.customer_family_name,
            customer_cpf: row.customer_cpf,
            customer_phone: row.customer_phone,
            customer_email: row.customer_email,
            operator_name: row.operator_name,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for work-order database operations.
pub struct WorkOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkOrderRepository<'a> {
    /// Create a new work-order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new work order. The store assigns its number and `open` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` with [`CUSTOMER_FOREIGN_KEY`]
    /// or [`OPERATOR_FOREIGN_KEY`] if the customer or operator doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewWorkOrder) -> Result<WorkOrder, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO workshop.work_order (
                customer_id, operator_id, reported_fault,
                processor, motherboard, memory, storage, graphics, other_components,
                estimated_price, due_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {WORK_ORDER_COLUMNS}
            "
        );
        let hardware = &order.hardware;

        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(order.customer_id)
            .bind(order.operator_id)
            .bind(&order.reported_fault)
            .bind(hardware.processor.as_deref())
            .bind(hardware.motherboard.as_deref())
            .bind(hardware.memory.as_deref())
            .bind(hardware.storage.as_deref())
            .bind(hardware.graphics.as_deref())
            .bind(hardware.other_components.as_deref())
            .bind(order.estimated_price)
            .bind(order.due_date)
            .bind(order.notes.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(map_foreign_key_violation)?;

        row.try_into()
    }

    /// Get a work order with customer and operator details by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_detail(
        &self,
        id: WorkOrderId,
    ) -> Result<Option<WorkOrderDetail>, RepositoryError> {
        let sql = format!("{DETAIL_SELECT} WHERE w.id = $1");
        let row = sqlx::query_as::<_, WorkOrderDetailRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a work order with details by its display number (e.g. `OS0001`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_detail_by_number(
        &self,
        number: &str,
    ) -> Result<Option<WorkOrderDetail>, RepositoryError> {
        let sql = format!("{DETAIL_SELECT} WHERE w.number = $1");
        let row = sqlx::query_as::<_, WorkOrderDetailRow>(&sql)
            .bind(number)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List work orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        status: Option<WorkOrderStatus>,
        limit: i64,
    ) -> Result<Vec<WorkOrderDetail>, RepositoryError> {
        let sql = format!(
            r"
            {DETAIL_SELECT}
            WHERE ($1::workshop.work_order_status IS NULL OR w.status = $1)
            ORDER BY w.created_at DESC, w.id DESC
            LIMIT $2
            "
        );
        let rows = sqlx::query_as::<_, WorkOrderDetailRow>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List every work order of one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<WorkOrderDetail>, RepositoryError> {
        let sql = format!(
            r"
            {DETAIL_SELECT}
            WHERE w.customer_id = $1
            ORDER BY w.created_at DESC, w.id DESC
            "
        );
        let rows = sqlx::query_as::<_, WorkOrderDetailRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set the status and completion time, appending an optional note.
    ///
    /// `completed_at` must already follow the status rule; the table CHECK
    /// rejects a mismatch.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: WorkOrderId,
        status: WorkOrderStatus,
        completed_at: Option<DateTime<Utc>>,
        note: Option<(&str, NaiveDateTime)>,
    ) -> Result<WorkOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = lock_notes(&mut tx, id).await?;
        let notes = match note {
            Some((text, at)) => Some(append_note(existing.as_deref(), text, at)),
            None => existing,
        };

        let sql = format!(
            r"
            UPDATE workshop.work_order
            SET status = $2, completed_at = $3, notes = $4
            WHERE id = $1
            RETURNING {WORK_ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id)
            .bind(status)
            .bind(completed_at)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Append a timestamped note.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn append_note(
        &self,
        id: WorkOrderId,
        note: &str,
        at: NaiveDateTime,
    ) -> Result<WorkOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = lock_notes(&mut tx, id).await?;
        let notes = append_note(existing.as_deref(), note, at);

        let sql = format!(
            r"
            UPDATE workshop.work_order
            SET notes = $2
            WHERE id = $1
            RETURNING {WORK_ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Apply a sparse edit; only supplied columns are written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: WorkOrderId,
        changes: &WorkOrderChanges,
        note_at: NaiveDateTime,
    ) -> Result<WorkOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = lock_notes(&mut tx, id).await?;
        let notes = match changes.note.as_deref() {
            Some(text) => Some(append_note(existing.as_deref(), text, note_at)),
            None => existing,
        };

        let sql = format!(
            r"
            UPDATE workshop.work_order
            SET reported_fault   = COALESCE($2, reported_fault),
                processor        = CASE WHEN $3  THEN $4  ELSE processor END,
                motherboard      = CASE WHEN $5  THEN $6  ELSE motherboard END,
                memory           = CASE WHEN $7  THEN $8  ELSE memory END,
                storage          = CASE WHEN $9  THEN $10 ELSE storage END,
                graphics         = CASE WHEN $11 THEN $12 ELSE graphics END,
                other_components = CASE WHEN $13 THEN $14 ELSE other_components END,
                estimated_price  = CASE WHEN $15 THEN $16 ELSE estimated_price END,
                due_date         = CASE WHEN $17 THEN $18 ELSE due_date END,
                notes            = $19
            WHERE id = $1
            RETURNING {WORK_ORDER_COLUMNS}
            "
        );

        let (set_processor, processor) = column_change(&changes.processor);
        let (set_motherboard, motherboard) = column_change(&changes.motherboard);
        let (set_memory, memory) = column_change(&changes.memory);
        let (set_storage, storage) = column_change(&changes.storage);
        let (set_graphics, graphics) = column_change(&changes.graphics);
        let (set_other, other_components) = column_change(&changes.other_components);

        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id)
            .bind(changes.reported_fault.as_deref())
            .bind(set_processor)
            .bind(processor)
            .bind(set_motherboard)
            .bind(motherboard)
            .bind(set_memory)
            .bind(memory)
            .bind(set_storage)
            .bind(storage)
            .bind(set_graphics)
            .bind(graphics)
            .bind(set_other)
            .bind(other_components)
            .bind(changes.estimated_price.is_some())
            .bind(changes.estimated_price.flatten())
            .bind(changes.due_date.is_some())
            .bind(changes.due_date.flatten())
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Count work orders overall and per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<WorkOrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, WorkOrderStats>(
            r"
            SELECT COUNT(*)                                         AS total,
                   COUNT(*) FILTER (WHERE status = 'open')          AS open,
                   COUNT(*) FILTER (WHERE status = 'in_progress')   AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'completed')     AS completed,
                   COUNT(*) FILTER (WHERE status = 'cancelled')     AS cancelled
            FROM workshop.work_order
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}

/// Split a nullable text change into its "write this column" flag and value.
#[allow(clippy::option_option)]
fn column_change(field: &Option<Option<String>>) -> (bool, Option<&str>) {
    (field.is_some(), field.as_ref().and_then(Option::as_deref))
}

/// Lock a work-order row and return its current notes.
async fn lock_notes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: WorkOrderId,
) -> Result<Option<String>, RepositoryError> {
    let row: Option<(Option<String>,)> = sqlx::query_as(
        r"
        SELECT notes FROM workshop.work_order
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(|(notes,)| notes).ok_or(RepositoryError::NotFound)
}
