//! Queue integration tests
//!
//! Exercises the queue through its public API only, the way a downstream
//! crate would use it.

mod common;

use chanqueue::queue::api::{Queue, QueueConfig, QueueError};
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::test]
async fn test_queue_from_config_file() {
    let file = common::write_config(
        r#"
        name = "jobs"
        initial_capacity = 128
        high_water_mark = 1000
        "#,
    );

    let config = QueueConfig::load(file.path()).unwrap();
    let queue = Queue::with_config(config).unwrap();
    assert_eq!(queue.name(), "jobs");

    queue.push("first");
    queue.push("second");
    let popper = queue.pop();
    assert_eq!(popper.recv().await, Some("first"));
    assert_eq!(popper.recv().await, Some("second"));

    queue.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_file_is_rejected() {
    let file = common::write_config("name = \"\"\n");

    let config = QueueConfig::load(file.path()).unwrap();
    assert!(matches!(
        Queue::<u8>::with_config(config),
        Err(QueueError::Config { .. })
    ));
}

#[tokio::test]
async fn test_producer_consumer_pipeline() {
    let queue = Arc::new(Queue::new());

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            for i in 0..1_000u32 {
                queue.push(i);
            }
        })
    };

    let popper = queue.pop();
    let consumer = tokio::spawn(async move {
        let mut received = Vec::new();
        while received.len() < 1_000 {
            match popper.recv().await {
                Some(item) => received.push(item),
                None => break,
            }
        }
        received
    });

    producer.await.unwrap();
    let received = consumer.await.unwrap();
    assert_eq!(received, (0..1_000).collect::<Vec<_>>());

    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.pushed, 1_000);
    assert_eq!(stats.delivered, 1_000);
    assert_eq!(stats.in_flight(), 0);

    queue.close().await.unwrap();
}

#[tokio::test]
async fn test_discard_flush_and_close_sequence() {
    let queue = Queue::new();
    let popper = queue.pop();

    queue.push(1);
    queue.discard(true).await;
    queue.push(2);
    queue.discard(false).await;
    queue.push(3);
    assert_eq!(popper.recv().await, Some(1));

    queue.flush().await;
    assert_eq!(
        popper.recv_timeout(Duration::from_millis(20)).await,
        Err(QueueError::Empty)
    );

    queue.close().await.unwrap();
    assert_eq!(popper.recv().await, None);
    assert_eq!(popper.try_recv().await, Err(QueueError::Closed));
}
