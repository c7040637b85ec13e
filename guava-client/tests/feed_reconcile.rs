//! Realtime feed driving the admin order board.

use guava_client::board::{Applied, OrderBoard};
use guava_client::feed::{ConnectionState, FeedClient, OrderFeedEvent};
use shared::message::FeedMessage;
use shared::order::{DeliveryType, Order, OrderItem, OrderStatus, PaymentInfo, PaymentStatus};
use tokio::sync::broadcast;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn order(id: &str, created_at: i64) -> Order {
    Order {
        order_id: id.to_string(),
        customer_name: "Ana".to_string(),
        customer_phone: "5551234567".to_string(),
        items: vec![OrderItem {
            dish_name: "Guava Punch".to_string(),
            price: 15.0,
            quantity: 1,
            special_instructions: None,
        }],
        total_amount: 15.0,
        status: OrderStatus::Pending,
        delivery_type: DeliveryType::DineIn,
        payment: PaymentInfo {
            method: "CASH".to_string(),
            status: PaymentStatus::Pending,
            transaction_id: None,
        },
        created_at,
    }
}

fn apply(board: &mut OrderBoard, event: OrderFeedEvent) -> Applied {
    match event {
        OrderFeedEvent::OrderCreated(order) => board.apply(order),
        OrderFeedEvent::OrderStatusChanged { order_id, status } => {
            board.apply_status(&order_id, status)
        }
    }
}

#[tokio::test]
async fn pushed_orders_reconcile_with_dedup() {
    init_tracing();
    let (server_tx, _keep) = broadcast::channel(16);
    let (client_tx, _server_rx) = broadcast::channel(16);
    let client = FeedClient::connect_memory(&server_tx, &client_tx, "admin-test")
        .await
        .unwrap();
    let mut sub = client.subscribe();
    let mut board = OrderBoard::new();

    // The server redelivers the creation push.
    server_tx.send(FeedMessage::order_created(&order("ord-1", 100))).unwrap();
    server_tx.send(FeedMessage::order_created(&order("ord-1", 100))).unwrap();
    server_tx
        .send(FeedMessage::order_status_changed("ord-1", OrderStatus::Confirmed))
        .unwrap();

    assert_eq!(apply(&mut board, sub.recv().await.unwrap()), Applied::Inserted);
    assert_eq!(apply(&mut board, sub.recv().await.unwrap()), Applied::Updated);
    assert_eq!(apply(&mut board, sub.recv().await.unwrap()), Applied::Updated);

    assert_eq!(board.len(), 1);
    assert_eq!(board.get("ord-1").unwrap().status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn status_push_before_fetch_is_corrected_by_sync() {
    init_tracing();
    let (server_tx, _keep) = broadcast::channel(16);
    let (client_tx, _server_rx) = broadcast::channel(16);
    let client = FeedClient::connect_memory(&server_tx, &client_tx, "admin-test")
        .await
        .unwrap();
    let mut sub = client.subscribe();
    let mut board = OrderBoard::new();

    // Status push races ahead of the initial REST fetch.
    server_tx
        .send(FeedMessage::order_status_changed("ord-9", OrderStatus::Ready))
        .unwrap();
    assert_eq!(apply(&mut board, sub.recv().await.unwrap()), Applied::Unknown);
    assert!(board.is_empty());

    // The fetch lands afterwards carrying the current state.
    let mut fetched = order("ord-9", 100);
    fetched.status = OrderStatus::Ready;
    board.sync(vec![fetched]);
    assert_eq!(board.get("ord-9").unwrap().status, OrderStatus::Ready);

    // A redelivered creation push for the fetched order is not a new arrival.
    server_tx.send(FeedMessage::order_created(&order("ord-9", 100))).unwrap();
    assert_eq!(apply(&mut board, sub.recv().await.unwrap()), Applied::Updated);
}

#[tokio::test]
async fn dropping_one_subscriber_keeps_the_feed_alive() {
    init_tracing();
    let (server_tx, _keep) = broadcast::channel(16);
    let (client_tx, _server_rx) = broadcast::channel(16);
    let client = FeedClient::connect_memory(&server_tx, &client_tx, "admin-test")
        .await
        .unwrap();

    let board_sub = client.subscribe();
    let mut toast_sub = client.subscribe();
    drop(board_sub);

    assert_eq!(client.state(), ConnectionState::Connected);

    // The remaining subscriber still receives pushes.
    server_tx.send(FeedMessage::order_created(&order("ord-2", 200))).unwrap();
    match toast_sub.recv().await.unwrap() {
        OrderFeedEvent::OrderCreated(o) => assert_eq!(o.order_id, "ord-2"),
        other => panic!("unexpected event: {other:?}"),
    }
}
