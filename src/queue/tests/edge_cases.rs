//! Edge case and use-after-close tests for the queue system
//!
//! These tests verify that the queue handles closed state, cancelled
//! receivers and large backlogs without hanging, losing or duplicating items.

#[cfg(test)]
mod tests {
    use crate::queue::api::{Queue, QueueError};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_push_without_consumers_never_blocks() {
        let queue = Queue::new();

        let pushed = timeout(Duration::from_secs(5), async {
            for i in 0..100_000u32 {
                queue.push(i);
            }
        })
        .await;
        assert!(pushed.is_ok(), "pushing without consumers should not block");

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.backlog_len, 100_000);
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_after_close_are_noops() {
        let queue = Queue::new();
        let popper = queue.pop();
        queue.push(1);
        queue.close().await.unwrap();

        // None of these may panic or hang
        queue.push(2);
        queue.flush().await;
        queue.discard(true).await;

        assert_eq!(popper.recv().await, None);
        assert_eq!(popper.try_recv().await, Err(QueueError::Closed));
        assert_eq!(
            popper.recv_timeout(Duration::from_secs(1)).await,
            Err(QueueError::Closed)
        );
        assert_eq!(queue.stats().await, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn test_popper_taken_after_close() {
        let queue = Queue::<u8>::new();
        queue.close().await.unwrap();

        let popper = queue.pop();
        assert!(popper.is_closed());
        assert_eq!(popper.recv().await, None);
    }

    #[tokio::test]
    async fn test_double_close() {
        let queue = Queue::new();
        queue.push("left behind");

        queue.close().await.unwrap();
        let second = timeout(Duration::from_secs(1), queue.close()).await;
        assert_eq!(second, Ok(Ok(())), "second close should return immediately");
    }

    #[tokio::test]
    async fn test_timed_out_receivers_do_not_swallow_items() {
        let queue = Queue::new();
        let popper = queue.pop();

        // Leave a pile of abandoned waiters behind
        for _ in 0..10 {
            assert_eq!(
                popper.recv_timeout(Duration::from_millis(1)).await,
                Err(QueueError::Empty)
            );
        }

        queue.push("a");
        queue.push("b");
        assert_eq!(popper.recv().await, Some("a"));
        assert_eq!(popper.recv().await, Some("b"));
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_receive_returns_item_to_head() {
        let queue = Queue::new();
        let popper = queue.pop();
        for i in 1..=3 {
            queue.push(i);
        }

        {
            let mut pending = Box::pin(popper.recv());
            // Register the waiter, then let the arbiter hand the head over
            if let std::task::Poll::Ready(item) = futures::poll!(&mut pending) {
                panic!("receive completed before the arbiter ran: {item:?}");
            }
            tokio::task::yield_now().await;
            // Dropped here, possibly holding item 1
        }

        assert_eq!(popper.recv().await, Some(1));
        assert_eq!(popper.recv().await, Some(2));
        assert_eq!(popper.recv().await, Some(3));
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_item_returned_after_flush_is_not_redelivered() {
        let queue = Queue::new();
        let popper = queue.pop();
        for i in 1..=3 {
            queue.push(i);
        }

        let mut pending = Box::pin(popper.recv());
        assert!(futures::poll!(&mut pending).is_pending());
        tokio::task::yield_now().await;

        // The hand-off of item 1 predates the flush, so it must not come back
        queue.flush().await;
        drop(pending);

        assert_eq!(
            popper.recv_timeout(Duration::from_millis(50)).await,
            Err(QueueError::Empty)
        );
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.flushed, 3);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.in_flight(), 0);
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_hand_off_is_not_overtaken() {
        let queue = Queue::new();
        let first = queue.pop();
        let second = queue.pop();
        for i in 1..=3 {
            queue.push(i);
        }

        let mut pending_first = Box::pin(first.recv());
        assert!(futures::poll!(&mut pending_first).is_pending());
        tokio::task::yield_now().await;

        let mut pending_second = Box::pin(second.recv());
        assert!(futures::poll!(&mut pending_second).is_pending());
        tokio::task::yield_now().await;

        drop(pending_first);
        assert_eq!(pending_second.await, Some(1));
        assert_eq!(second.recv().await, Some(2));
        assert_eq!(first.recv().await, Some(3));
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_receives_do_not_delay_delivery() {
        let queue = Queue::new();
        let popper = queue.pop();

        for _ in 0..20_000 {
            let mut pending = Box::pin(popper.recv());
            assert!(futures::poll!(&mut pending).is_pending());
        }
        tokio::task::yield_now().await;
        assert_eq!(queue.stats().await.unwrap().waiting, 0);

        queue.push("fresh");
        let delivered = timeout(Duration::from_millis(500), popper.recv()).await;
        assert_eq!(delivered, Ok(Some("fresh")));
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_flush_and_discard_on_idle_queue_are_acknowledged() {
        let queue = Queue::<u32>::new();

        let acked = timeout(Duration::from_secs(1), async {
            queue.flush().await;
            queue.discard(true).await;
            queue.discard(true).await;
            queue.discard(false).await;
            queue.flush().await;
        })
        .await;

        assert!(acked.is_ok(), "control requests on an empty queue must not hang");
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_on_empty_queue_drops_pushes() {
        let queue = Queue::new();
        let popper = queue.pop();

        queue.discard(true).await;
        queue.push(1);
        queue.push(2);

        assert_eq!(popper.try_recv().await, Err(QueueError::Empty));
        assert_eq!(queue.stats().await.unwrap().discarded, 2);
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_high_water_mark_does_not_limit_capacity() {
        use crate::queue::api::QueueConfig;

        let queue =
            Queue::with_config(QueueConfig::named("bounded-warning").with_high_water_mark(10))
                .unwrap();
        for i in 0..100 {
            queue.push(i);
        }

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.backlog_len, 100, "the mark only warns, it never rejects");
        queue.close().await.unwrap();
    }
}
