//! Printable work-order document.
//!
//! One page of HTML, rendered with Askama and meant to be printed from a
//! browser. All values are formatted before they reach the template.

use std::path::{Path, PathBuf};

use askama::Template;
use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use workbench_core::format_phone;

use crate::error::ErrorKind;
use crate::models::work_order::WorkOrderDetail;

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Errors that can occur while producing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Template rendering error.
    #[error("template error: {0}")]
    Render(#[from] askama::Error),

    /// The file could not be written.
    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Infrastructure
    }
}

/// A labelled line in the hardware block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareLine {
    pub label: &'static str,
    pub value: String,
}

/// Work-order document, ready to render.
#[derive(Debug, Clone, Template)]
#[template(path = "work_order.html")]
pub struct WorkOrderDocument {
    pub business_name: String,
    pub number: String,
    pub opened_at: String,
    pub status: String,
    pub operator: String,
    pub estimated_price: Option<String>,
    pub due_date: Option<String>,
    pub completed_at: Option<String>,
    pub customer_name: String,
    pub customer_cpf: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub hardware: Vec<HardwareLine>,
    pub reported_fault: String,
    pub notes: Option<String>,
    pub generated_at: String,
}

impl WorkOrderDocument {
    /// Build the document for a work order, stamped with `generated_at`.
    #[must_use]
    pub fn new(business_name: &str, detail: &WorkOrderDetail, generated_at: NaiveDateTime) -> Self {
        let order = &detail.order;
        let local = |at: chrono::DateTime<chrono::Utc>| {
            at.with_timezone(&Local).format(DATE_TIME_FORMAT).to_string()
        };

        Self {
            business_name: business_name.to_owned(),
            number: order.number.clone(),
            opened_at: local(order.created_at),
            status: order.status.label().to_owned(),
            operator: detail.operator_name.clone(),
            estimated_price: order.estimated_price.map(|p| p.to_string()),
            due_date: order.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            completed_at: order.completed_at.map(local),
            customer_name: detail.customer_full_name(),
            customer_cpf: detail.customer_cpf.clone(),
            customer_phone: format_phone(&detail.customer_phone),
            customer_email: detail
                .customer_email
                .clone()
                .filter(|e| !e.trim().is_empty()),
            hardware: order
                .hardware
                .entries()
                .into_iter()
                .map(|(label, value)| HardwareLine {
                    label,
                    value: value.to_owned(),
                })
                .collect(),
            reported_fault: order.reported_fault.clone(),
            notes: order
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            generated_at: generated_at.format(DATE_TIME_FORMAT).to_string(),
        }
    }

    /// Render to an HTML string.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Render` if the template fails.
    pub fn to_html(&self) -> Result<String, DocumentError> {
        Ok(self.render()?)
    }

    /// Render and write into `dir` under [`default_file_name`], creating the
    /// directory if needed. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Render` or `DocumentError::Io`.
    pub async fn write_to(&self, dir: &Path, now: NaiveDateTime) -> Result<PathBuf, DocumentError> {
        let html = self.to_html()?;
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(default_file_name(&self.number, now));
        tokio::fs::write(&path, html).await?;

        tracing::info!(number = %self.number, path = %path.display(), "Document written");
        Ok(path)
    }
}

/// Suggested file name, e.g. `OS_OS0042_20250301_143000.html`.
#[must_use]
pub fn default_file_name(number: &str, now: NaiveDateTime) -> String {
    format!("OS_{number}_{}.html", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use workbench_core::{CustomerId, OperatorId, Price, WorkOrderId, WorkOrderStatus};

    use super::*;
    use crate::models::work_order::{HardwareProfile, WorkOrder};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn detail() -> WorkOrderDetail {
        WorkOrderDetail {
            order: WorkOrder {
                id: WorkOrderId::new(42),
                number: "OS0042".to_owned(),
                customer_id: CustomerId::new(1),
                operator_id: OperatorId::new(1),
                reported_fault: "Tela azul ao iniciar".to_owned(),
                hardware: HardwareProfile {
                    processor: Some("Ryzen 5 5600".to_owned()),
                    graphics: Some("  ".to_owned()),
                    ..HardwareProfile::default()
                },
                estimated_price: Some(Price::new(Decimal::new(25000, 2)).unwrap()),
                due_date: NaiveDate::from_ymd_opt(2025, 3, 10),
                status: WorkOrderStatus::Open,
                notes: None,
                created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                completed_at: None,
            },
            customer_given_name: "Maria".to_owned(),
            customer_family_name: "Souza".to_owned(),
            customer_cpf: "529.982.247-25".to_owned(),
            customer_phone: "11987654321".to_owned(),
            customer_email: Some(String::new()),
            operator_name: "Técnico".to_owned(),
        }
    }

    #[test]
    fn test_document_fields() {
        let doc = WorkOrderDocument::new("GF Informática", &detail(), at(14, 30));

        assert_eq!(doc.status, "Open");
        assert_eq!(doc.customer_name, "Maria Souza");
        assert_eq!(doc.customer_phone, "(11) 98765-4321");
        assert_eq!(doc.estimated_price.as_deref(), Some("R$ 250,00"));
        assert_eq!(doc.due_date.as_deref(), Some("10/03/2025"));
        assert!(doc.customer_email.is_none());
        assert!(doc.completed_at.is_none());
        assert_eq!(
            doc.hardware,
            vec![HardwareLine {
                label: "Processor",
                value: "Ryzen 5 5600".to_owned()
            }]
        );
        assert_eq!(doc.generated_at, "01/03/2025 14:30");
    }

    #[test]
    fn test_render_includes_mandatory_blocks() {
        let html = WorkOrderDocument::new("GF Informática", &detail(), at(14, 30))
            .to_html()
            .unwrap();

        assert!(html.contains("GF Informática"));
        assert!(html.contains("OS0042"));
        assert!(html.contains("Tela azul ao iniciar"));
        assert!(html.contains("Ryzen 5 5600"));
        assert!(!html.contains("Graphics"));
        assert!(!html.contains("Notes"));
        assert!(html.contains("01/03/2025 14:30"));
    }

    #[test]
    fn test_render_notes_and_escapes() {
        let mut detail = detail();
        detail.order.notes = Some("[01/03/2025 15:00] <b>fonte</b> trocada".to_owned());

        let html = WorkOrderDocument::new("GF", &detail, at(16, 0))
            .to_html()
            .unwrap();

        assert!(html.contains("Notes"));
        assert!(html.contains("&lt;b&gt;fonte&lt;/b&gt;") || html.contains("&#60;b&#62;fonte"));
        assert!(!html.contains("<b>fonte</b>"));
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(
            default_file_name("OS0042", at(14, 30)),
            "OS_OS0042_20250301_143000.html"
        );
    }

    #[test]
    fn test_document_error_kind() {
        let err = DocumentError::from(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
