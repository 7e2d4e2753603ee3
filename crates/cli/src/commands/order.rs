//! Work-order commands.
//!
//! Orders are referred to by id (`12`) or number (`OS0012`).
//!
//! # Usage
//!
//! ```bash
//! # Open a work order as operator `balcao`
//! WORKBENCH_PASSWORD=... wb order create -u balcao --customer 1 \
//!     --fault "Não liga" --processor "Ryzen 5 5600" --price 150,00 --due 10/03/2025
//!
//! wb order list --status open
//! wb order status OS0001 completed --note "Fonte substituída"
//! wb order note OS0001 "Cliente avisado por telefone"
//! wb order update OS0001 --price "" --storage "SSD 480GB"
//! wb order print OS0001 --output-dir ./documentos
//! wb order stats
//! ```

use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Subcommand};

use workbench_core::{CustomerId, WorkOrderId, WorkOrderStatus};
use workbench_desk::document::WorkOrderDocument;
use workbench_desk::models::{HardwareProfile, WorkOrderDetail, WorkOrderInput, WorkOrderPatch};
use workbench_desk::services::{WorkOrderError, WorkOrderService};
use workbench_desk::{DeskConfig, DeskError};

use crate::output;

/// Free-text hardware fields shared by `create` and `update`.
#[derive(Args)]
pub struct HardwareArgs {
    #[arg(long)]
    processor: Option<String>,

    #[arg(long)]
    motherboard: Option<String>,

    #[arg(long)]
    memory: Option<String>,

    #[arg(long)]
    storage: Option<String>,

    #[arg(long)]
    graphics: Option<String>,

    #[arg(long)]
    other_components: Option<String>,
}

impl From<HardwareArgs> for HardwareProfile {
    fn from(args: HardwareArgs) -> Self {
        Self {
            processor: args.processor,
            motherboard: args.motherboard,
            memory: args.memory,
            storage: args.storage,
            graphics: args.graphics,
            other_components: args.other_components,
        }
    }
}

#[derive(Subcommand)]
pub enum OrderAction {
    /// Open a work order
    Create {
        /// Acting operator; password is read from WORKBENCH_PASSWORD
        #[arg(short, long, env = "WORKBENCH_USER")]
        username: String,

        /// Customer id
        #[arg(long)]
        customer: CustomerId,

        /// Fault as described by the customer
        #[arg(long)]
        fault: String,

        #[command(flatten)]
        hardware: HardwareArgs,

        /// Estimated price, e.g. 150,00
        #[arg(long)]
        price: Option<String>,

        /// Due date, YYYY-MM-DD or DD/MM/YYYY
        #[arg(long)]
        due: Option<String>,

        /// Initial technician notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one work order
    Show { reference: String },
    /// List work orders, newest first
    List {
        /// Only this status (open, in-progress, completed, cancelled)
        #[arg(short, long)]
        status: Option<WorkOrderStatus>,

        /// Only this customer's work orders
        #[arg(short, long)]
        customer: Option<CustomerId>,

        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Change the status, optionally with a note
    Status {
        reference: String,

        status: WorkOrderStatus,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Append a timestamped note
    Note { reference: String, text: String },
    /// Change some fields; pass an empty value to clear an optional field
    Update {
        reference: String,

        #[arg(long)]
        fault: Option<String>,

        #[command(flatten)]
        hardware: HardwareArgs,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        due: Option<String>,

        /// Note appended with the edit
        #[arg(long)]
        note: Option<String>,
    },
    /// Counts per status
    Stats,
    /// Write the printable document
    Print {
        reference: String,

        /// Defaults to DOCUMENT_DIR
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Run a work-order subcommand.
pub async fn run(config: &DeskConfig, action: OrderAction) -> Result<(), DeskError> {
    let pool = super::connect(config).await?;
    let orders = WorkOrderService::new(&pool);

    match action {
        OrderAction::Create {
            username,
            customer,
            fault,
            hardware,
            price,
            due,
            notes,
        } => {
            let operator = super::login(&pool, &username).await?;
            let detail = orders
                .create(
                    operator.id,
                    &WorkOrderInput {
                        customer_id: customer,
                        reported_fault: fault,
                        hardware: hardware.into(),
                        estimated_price: price,
                        due_date: due,
                        notes,
                    },
                )
                .await?;
            output::line(&output::order_detail(&detail));
        }
        OrderAction::Show { reference } => {
            let detail = resolve(&orders, &reference).await?;
            output::line(&output::order_detail(&detail));
        }
        OrderAction::List {
            status,
            customer,
            limit,
        } => {
            let found = match customer {
                Some(customer_id) => {
                    let mut found = orders.list_by_customer(customer_id).await?;
                    found.retain(|d| status.is_none_or(|s| d.order.status == s));
                    found
                }
                None => orders.list(status, limit).await?,
            };
            output::line(&output::order_table(&found));
        }
        OrderAction::Status {
            reference,
            status,
            note,
        } => {
            let id = resolve(&orders, &reference).await?.order.id;
            let order = orders.update_status(id, status, note.as_deref()).await?;
            output::line(&output::order_summary(&order));
        }
        OrderAction::Note { reference, text } => {
            let id = resolve(&orders, &reference).await?.order.id;
            let order = orders.add_note(id, &text).await?;
            output::line(&format!("Note added to {}", order.number));
        }
        OrderAction::Update {
            reference,
            fault,
            hardware,
            price,
            due,
            note,
        } => {
            let id = resolve(&orders, &reference).await?.order.id;
            let patch = WorkOrderPatch {
                reported_fault: fault,
                processor: hardware.processor,
                motherboard: hardware.motherboard,
                memory: hardware.memory,
                storage: hardware.storage,
                graphics: hardware.graphics,
                other_components: hardware.other_components,
                estimated_price: price,
                due_date: due,
                note,
            };
            orders.update(id, &patch).await?;
            output::line(&output::order_detail(&orders.get(id).await?));
        }
        OrderAction::Stats => {
            let stats = orders.statistics().await?;
            output::line(&output::stats(&stats));
        }
        OrderAction::Print {
            reference,
            output_dir,
        } => {
            let detail = resolve(&orders, &reference).await?;
            let now = Local::now().naive_local();
            let document = WorkOrderDocument::new(&config.app_name, &detail, now);
            let dir = output_dir.unwrap_or_else(|| config.document_dir.clone());

            let path = document.write_to(&dir, now).await?;
            output::line(&format!("Document written to {}", path.display()));
        }
    }

    Ok(())
}

/// Look up a work order by id or by number.
async fn resolve(
    orders: &WorkOrderService<'_>,
    reference: &str,
) -> Result<WorkOrderDetail, WorkOrderError> {
    match reference.parse::<WorkOrderId>() {
        Ok(id) => orders.get(id).await,
        Err(_) => orders.get_by_number(reference).await,
    }
}
