//! Customer directory commands.
//!
//! # Usage
//!
//! ```bash
//! wb customer create --given-name Maria --family-name Souza \
//!     --cpf 529.982.247-25 --phone 11987654321 --email maria@email.com
//! wb customer search souza
//! wb customer search 52998224725
//! wb customer update 1 --phone "(11) 3333-4444" --email ""
//! wb customer show 1
//! wb customer delete 1
//! wb customer check-cpf 52998224725
//! ```

use clap::Subcommand;

use workbench_core::{Cpf, CustomerId};
use workbench_desk::models::{CustomerInput, CustomerPatch};
use workbench_desk::services::{CustomerError, CustomerService, WorkOrderService};
use workbench_desk::{DeskConfig, DeskError};

use crate::output;

#[derive(Subcommand)]
pub enum CustomerAction {
    /// Register a new customer
    Create {
        #[arg(long)]
        given_name: String,

        #[arg(long)]
        family_name: String,

        /// CPF, with or without punctuation
        #[arg(long)]
        cpf: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        email: Option<String>,
    },
    /// Change some fields of a customer; pass an empty email to clear it
    Update {
        id: CustomerId,

        #[arg(long)]
        given_name: Option<String>,

        #[arg(long)]
        family_name: Option<String>,

        #[arg(long)]
        cpf: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a customer with no work orders
    Delete { id: CustomerId },
    /// Show a customer and their work orders
    Show { id: CustomerId },
    /// Search by CPF or by part of a name
    Search { term: String },
    /// List every customer
    List,
    /// Validate and format a CPF without touching the database
    CheckCpf { cpf: String },
}

/// Run a customer subcommand.
pub async fn run(config: &DeskConfig, action: CustomerAction) -> Result<(), DeskError> {
    // Pure validation, no connection needed
    if let CustomerAction::CheckCpf { cpf } = &action {
        return check_cpf(cpf);
    }

    let pool = super::connect(config).await?;
    let customers = CustomerService::new(&pool);

    match action {
        CustomerAction::Create {
            given_name,
            family_name,
            cpf,
            phone,
            email,
        } => {
            let customer = customers
                .create(&CustomerInput {
                    given_name,
                    family_name,
                    cpf,
                    phone,
                    email,
                })
                .await?;
            output::line(&output::customer_detail(&customer));
        }
        CustomerAction::Update {
            id,
            given_name,
            family_name,
            cpf,
            phone,
            email,
        } => {
            let customer = customers
                .update(
                    id,
                    &CustomerPatch {
                        given_name,
                        family_name,
                        cpf,
                        phone,
                        email,
                    },
                )
                .await?;
            output::line(&output::customer_detail(&customer));
        }
        CustomerAction::Delete { id } => {
            customers.delete(id).await?;
            output::line(&format!("Customer {id} deleted"));
        }
        CustomerAction::Show { id } => {
            let customer = customers.get(id).await?;
            let orders = WorkOrderService::new(&pool).list_by_customer(id).await?;
            output::line(&output::customer_detail(&customer));
            output::line("");
            output::line(&output::order_table(&orders));
        }
        CustomerAction::Search { term } => {
            let found = customers.search(&term).await?;
            output::line(&output::customer_table(&found));
        }
        CustomerAction::List => {
            let all = customers.list_all().await?;
            output::line(&output::customer_table(&all));
        }
        CustomerAction::CheckCpf { cpf } => check_cpf(&cpf)?,
    }

    Ok(())
}

fn check_cpf(cpf: &str) -> Result<(), DeskError> {
    let formatted = Cpf::parse(cpf).map_err(CustomerError::from)?;
    output::line(&format!("{formatted} is valid"));
    Ok(())
}
