//! SqliteOrderRepo tests against in-memory SQLite.

use orders_types::{
    NewOrder, OrderFilter, OrderPatch, OrderRepository, OrderStatus, PaymentMethod, RepoError,
};

use crate::SqliteOrderRepo;

async fn repo() -> SqliteOrderRepo {
    SqliteOrderRepo::new("sqlite::memory:").await.unwrap()
}

fn new_order(reference: &str) -> NewOrder {
    NewOrder {
        plan_id: "basic".into(),
        description: "Basic package".into(),
        status: OrderStatus::PendingPix,
        payment_method: PaymentMethod::Pix,
        amount_cents: 4990,
        external_reference: reference.into(),
        customer_name: "Maria Silva".into(),
        customer_email: "maria@example.com".into(),
        customer_phone: "11987654321".into(),
        personalization: serde_json::json!({"message": "Parabens"}),
    }
}

#[tokio::test]
async fn create_and_get_roundtrip() {
    let repo = repo().await;
    let created = repo.create_order(new_order("ref-1")).await.unwrap();

    let fetched = repo.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.external_reference, "ref-1");
    assert_eq!(fetched.status, OrderStatus::PendingPix);
    assert_eq!(fetched.payment_method, PaymentMethod::Pix);
    assert_eq!(fetched.amount_cents, 4990);
    assert_eq!(fetched.personalization["message"], "Parabens");
    assert!(fetched.gateway_payment_id.is_none());
}

#[tokio::test]
async fn duplicate_external_reference_conflicts() {
    let repo = repo().await;
    repo.create_order(new_order("ref-dup")).await.unwrap();

    let err = repo.create_order(new_order("ref-dup")).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[tokio::test]
async fn empty_external_reference_is_rejected() {
    let repo = repo().await;
    let mut order = new_order("");
    order.external_reference = "  ".into();
    assert!(matches!(
        repo.create_order(order).await,
        Err(RepoError::Conflict(_))
    ));
}

#[tokio::test]
async fn find_by_external_reference() {
    let repo = repo().await;
    let created = repo.create_order(new_order("ref-find")).await.unwrap();

    let found = repo
        .find_by_external_reference("ref-find")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);

    assert!(
        repo.find_by_external_reference("ref-nope")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn find_by_gateway_payment_id_after_patch() {
    let repo = repo().await;
    let created = repo.create_order(new_order("ref-gw")).await.unwrap();

    repo.update_order(
        created.id,
        OrderPatch {
            gateway_payment_id: Some("pay-77".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let found = repo
        .find_by_gateway_payment_id("pay-77")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
async fn update_is_a_merge_patch() {
    let repo = repo().await;
    let created = repo.create_order(new_order("ref-patch")).await.unwrap();

    // Patch only the status; method and gateway id must survive untouched.
    let updated = repo
        .update_order(
            created.id,
            OrderPatch {
                status: Some(OrderStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Paid);
    assert_eq!(updated.payment_method, PaymentMethod::Pix);
    assert_eq!(updated.external_reference, "ref-patch");
    assert_eq!(updated.customer_name, "Maria Silva");
    assert!(updated.updated_at >= updated.created_at);
}

#[tokio::test]
async fn update_unknown_id_is_none() {
    let repo = repo().await;
    let result = repo
        .update_order(
            orders_types::OrderId::new(),
            OrderPatch {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn list_orders_filters_by_status() {
    let repo = repo().await;
    let a = repo.create_order(new_order("ref-a")).await.unwrap();
    repo.create_order(new_order("ref-b")).await.unwrap();

    repo.update_order(
        a.id,
        OrderPatch {
            status: Some(OrderStatus::Paid),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let paid = repo
        .list_orders(OrderFilter {
            status: Some(OrderStatus::Paid),
            payment_method: None,
        })
        .await
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].id, a.id);

    let all = repo.list_orders(OrderFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn stats_count_statuses_and_revenue() {
    let repo = repo().await;
    let a = repo.create_order(new_order("ref-s1")).await.unwrap();
    let b = repo.create_order(new_order("ref-s2")).await.unwrap();
    repo.create_order(new_order("ref-s3")).await.unwrap();

    for (id, status) in [(a.id, OrderStatus::Paid), (b.id, OrderStatus::Cancelled)] {
        repo.update_order(
            id,
            OrderPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let stats = repo.order_stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.paid, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.pending_pix, 1);
    assert_eq!(stats.revenue_cents, 4990);
}
