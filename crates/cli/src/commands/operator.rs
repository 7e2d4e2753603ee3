//! Operator account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an operator; without --password a temporary one is generated
//! wb operator create -u balcao -n "Balcão" -e balcao@gfinformatica.com.br
//!
//! # Disable and re-enable an account
//! wb operator disable balcao
//! wb operator enable balcao
//!
//! # Administrator password reset
//! wb operator reset-password balcao
//!
//! # Change your own password (current one from WORKBENCH_PASSWORD)
//! WORKBENCH_PASSWORD=old wb operator passwd -u balcao --new-password nova
//! ```

use clap::Subcommand;
use rand::{Rng, distr::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};

use workbench_desk::models::OperatorInput;
use workbench_desk::services::AuthService;
use workbench_desk::{DeskConfig, DeskError};

use crate::output;

/// Length of generated temporary passwords.
const TEMP_PASSWORD_LENGTH: usize = 12;

#[derive(Subcommand)]
pub enum OperatorAction {
    /// Create a new operator
    Create {
        /// Login name (at least 3 characters)
        #[arg(short, long)]
        username: String,

        /// Name shown on work orders
        #[arg(short, long)]
        name: String,

        /// Contact email
        #[arg(short, long)]
        email: String,

        /// Initial password; a temporary one is generated when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List operators
    List,
    /// Allow an operator to log in again
    Enable { username: String },
    /// Prevent an operator from logging in
    Disable { username: String },
    /// Set a new password without the current one
    ResetPassword {
        username: String,

        /// New password; a temporary one is generated when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Change your own password
    Passwd {
        #[arg(short, long, env = "WORKBENCH_USER")]
        username: String,

        #[arg(long)]
        new_password: String,
    },
}

/// Run an operator subcommand.
pub async fn run(config: &DeskConfig, action: OperatorAction) -> Result<(), DeskError> {
    let pool = super::connect(config).await?;
    let auth = AuthService::new(&pool);

    match action {
        OperatorAction::Create {
            username,
            name,
            email,
            password,
        } => {
            let (password, generated) = password_or_temporary(password);
            let operator = auth
                .create_operator(&OperatorInput {
                    username,
                    password: password.expose_secret().to_owned(),
                    display_name: name,
                    email,
                })
                .await?;

            output::line(&format!(
                "Operator {} created (id {})",
                operator.username, operator.id
            ));
            if generated {
                output::line(&format!(
                    "Temporary password: {}",
                    password.expose_secret()
                ));
            }
        }
        OperatorAction::List => {
            let operators = auth.list_operators().await?;
            output::line(&output::operator_table(&operators));
        }
        OperatorAction::Enable { username } => {
            let operator = auth.set_active(&username, true).await?;
            output::line(&format!("Operator {} enabled", operator.username));
        }
        OperatorAction::Disable { username } => {
            let operator = auth.set_active(&username, false).await?;
            output::line(&format!("Operator {} disabled", operator.username));
        }
        OperatorAction::ResetPassword { username, password } => {
            let (password, generated) = password_or_temporary(password);
            let operator = auth
                .reset_password(&username, password.expose_secret())
                .await?;

            output::line(&format!("Password reset for {}", operator.username));
            if generated {
                output::line(&format!(
                    "Temporary password: {}",
                    password.expose_secret()
                ));
            }
        }
        OperatorAction::Passwd {
            username,
            new_password,
        } => {
            let operator = super::login(&pool, &username).await?;
            let current = SecretString::from(std::env::var(super::PASSWORD_VAR).unwrap_or_default());
            auth.change_password(operator.id, current.expose_secret(), &new_password)
                .await?;
            output::line("Password changed");
        }
    }

    Ok(())
}

/// Use the given password, or generate a temporary one.
fn password_or_temporary(password: Option<String>) -> (SecretString, bool) {
    match password {
        Some(p) => (SecretString::from(p), false),
        None => (SecretString::from(temporary_password()), true),
    }
}

fn temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = temporary_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, temporary_password());
    }

    #[test]
    fn test_given_password_is_kept() {
        let (password, generated) = password_or_temporary(Some("s3nha".to_owned()));
        assert_eq!(password.expose_secret(), "s3nha");
        assert!(!generated);

        let (_, generated) = password_or_temporary(None);
        assert!(generated);
    }
}
