//! Integration tests for operator authentication.
//!
//! These tests require a `PostgreSQL` database at `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p workbench-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use workbench_desk::ErrorKind;
use workbench_desk::models::OperatorInput;
use workbench_desk::services::{AuthError, AuthService};
use workbench_integration_tests::{OPERATOR_PASSWORD, TestContext, unique_suffix};

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_login_success() {
    let ctx = TestContext::new().await;
    let operator = ctx.operator().await;

    let logged_in = AuthService::new(&ctx.pool)
        .authenticate(&operator.username, OPERATOR_PASSWORD)
        .await
        .unwrap();

    assert_eq!(logged_in.id, operator.id);
    assert!(logged_in.active);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    let operator = ctx.operator().await;
    let auth = AuthService::new(&ctx.pool);

    for (username, password) in [
        (operator.username.as_str(), "senha-errada"),
        ("ninguem_aqui", OPERATOR_PASSWORD),
        ("", ""),
    ] {
        let err = auth.authenticate(username, password).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_inactive_operator_cannot_login() {
    let ctx = TestContext::new().await;
    let operator = ctx.operator().await;
    let auth = AuthService::new(&ctx.pool);

    auth.set_active(&operator.username, false).await.unwrap();
    assert!(matches!(
        auth.authenticate(&operator.username, OPERATOR_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));

    auth.set_active(&operator.username, true).await.unwrap();
    assert!(auth.authenticate(&operator.username, OPERATOR_PASSWORD).await.is_ok());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_duplicate_username_conflicts() {
    let ctx = TestContext::new().await;
    let operator = ctx.operator().await;

    let err = AuthService::new(&ctx.pool)
        .create_operator(&OperatorInput {
            username: operator.username.clone(),
            password: "1234".to_owned(),
            display_name: "Outro".to_owned(),
            email: format!("{}@outro.com", unique_suffix()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains(&operator.username));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_change_and_reset_password() {
    let ctx = TestContext::new().await;
    let operator = ctx.operator().await;
    let auth = AuthService::new(&ctx.pool);

    assert!(matches!(
        auth.change_password(operator.id, "errada", "nova-senha").await,
        Err(AuthError::InvalidCredentials)
    ));

    auth.change_password(operator.id, OPERATOR_PASSWORD, "nova-senha")
        .await
        .unwrap();
    assert!(auth.authenticate(&operator.username, OPERATOR_PASSWORD).await.is_err());
    assert!(auth.authenticate(&operator.username, "nova-senha").await.is_ok());

    auth.reset_password(&operator.username, "redefinida").await.unwrap();
    assert!(auth.authenticate(&operator.username, "redefinida").await.is_ok());

    assert!(matches!(
        auth.reset_password("nao_existe", "redefinida").await,
        Err(AuthError::OperatorNotFound)
    ));
}
