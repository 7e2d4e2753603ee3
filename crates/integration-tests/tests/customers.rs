//! Integration tests for the customer directory.
//!
//! These tests require a `PostgreSQL` database at `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p workbench-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use workbench_core::Cpf;
use workbench_desk::ErrorKind;
use workbench_desk::models::{CustomerInput, CustomerPatch};
use workbench_desk::services::{CustomerError, CustomerService};
use workbench_integration_tests::{TestContext, random_cpf};

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_create_stores_formatted_cpf() {
    let ctx = TestContext::new().await;
    let cpf = random_cpf();

    let customer = CustomerService::new(&ctx.pool)
        .create(&CustomerInput {
            given_name: "Ana".to_owned(),
            family_name: "Lima".to_owned(),
            cpf: cpf.digits(),
            phone: "1133334444".to_owned(),
            email: Some("ana@lima.com".to_owned()),
        })
        .await
        .unwrap();

    assert_eq!(customer.cpf, cpf);
    assert_eq!(customer.cpf.as_str().len(), 14);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_duplicate_cpf_conflicts() {
    let ctx = TestContext::new().await;
    let existing = ctx.customer("Maria").await;
    let service = CustomerService::new(&ctx.pool);

    let err = service
        .create(&CustomerInput {
            given_name: "Outra".to_owned(),
            family_name: "Pessoa".to_owned(),
            cpf: existing.cpf.digits(),
            phone: "11999990000".to_owned(),
            email: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerError::DuplicateCpf(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_update_to_taken_cpf_conflicts() {
    let ctx = TestContext::new().await;
    let first = ctx.customer("Primeiro").await;
    let second = ctx.customer("Segundo").await;

    let err = CustomerService::new(&ctx.pool)
        .update(
            second.id,
            &CustomerPatch {
                cpf: Some(first.cpf.to_string()),
                ..CustomerPatch::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerError::DuplicateCpf(_)));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_update_keeps_own_cpf_and_clears_email() {
    let ctx = TestContext::new().await;
    let customer = ctx.customer("Carlos").await;
    let service = CustomerService::new(&ctx.pool);

    let updated = service
        .update(
            customer.id,
            &CustomerPatch {
                cpf: Some(customer.cpf.digits()),
                phone: Some("(11) 2222-3333".to_owned()),
                email: Some(String::new()),
                ..CustomerPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.cpf, customer.cpf);
    assert_eq!(updated.phone, "(11) 2222-3333");
    assert!(updated.email.is_none());
    assert_eq!(updated.given_name, "Carlos");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_search_by_name_and_cpf() {
    let ctx = TestContext::new().await;
    let customer = ctx.customer("Bartolomeu").await;
    let service = CustomerService::new(&ctx.pool);

    let by_name = service.search(&customer.family_name.to_uppercase()).await.unwrap();
    assert!(by_name.iter().any(|c| c.id == customer.id));

    let by_cpf = service.search(&customer.cpf.digits()).await.unwrap();
    assert_eq!(by_cpf.len(), 1);
    assert_eq!(by_cpf[0].id, customer.id);

    let found = service.find_by_cpf(customer.cpf.as_str()).await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(customer.id));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_blocked_by_work_orders() {
    let ctx = TestContext::new().await;
    let customer = ctx.customer("Joana").await;
    let operator = ctx.operator().await;
    ctx.work_order(customer.id, &operator).await;
    ctx.work_order(customer.id, &operator).await;

    let service = CustomerService::new(&ctx.pool);
    let err = service.delete(customer.id).await.unwrap_err();

    assert!(matches!(err, CustomerError::HasWorkOrders { count: 2 }));
    assert!(service.get(customer.id).await.is_ok());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_then_not_found() {
    let ctx = TestContext::new().await;
    let customer = ctx.customer("Pedro").await;
    let service = CustomerService::new(&ctx.pool);

    service.delete(customer.id).await.unwrap();

    let err = service.get(customer.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        service.delete(customer.id).await,
        Err(CustomerError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_invalid_cpf_writes_nothing() {
    let ctx = TestContext::new().await;
    let service = CustomerService::new(&ctx.pool);

    let err = service
        .create(&CustomerInput {
            given_name: "Zé".to_owned(),
            family_name: "Ninguém".to_owned(),
            cpf: "123.456.789-00".to_owned(),
            phone: "11900000000".to_owned(),
            email: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!Cpf::is_valid("123.456.789-00"));
}
