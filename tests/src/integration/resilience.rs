//! Failure-mode scenarios: spurious and duplicate replies, late replies
//! after timeout, abandoned waiters, and the background sweep.

#[cfg(test)]
mod tests {
    use crate::integration::ServiceHarness;
    use courier_bus::{InMemoryQueueBus, QueueSender, QueueSubscriber};
    use courier_client::{sweep_task, PendingRequestStore, ResponseListener, RpcClient, RpcError};
    use courier_dispatch::OperationTable;
    use courier_types::{decode_request, encode_response, CorrelationId, ResponseEnvelope};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    fn echo_table() -> OperationTable {
        let mut table = OperationTable::new();
        table.register_fn("ECHO", |payload| async move { Ok(payload) });
        table
    }

    #[tokio::test]
    async fn test_spurious_responses_around_a_real_call() {
        let harness = ServiceHarness::start_default(echo_table());
        let response_queue = "courier.responses";

        // Spurious response before any call is in flight.
        let ghost = ResponseEnvelope::success(CorrelationId::new(), json!("ghost"));
        harness
            .bus
            .send(response_queue, encode_response(&ghost).unwrap())
            .await
            .unwrap();

        let data = harness
            .client
            .invoke("ECHO", json!({"real": true}), None)
            .await
            .unwrap();
        assert_eq!(data, json!({"real": true}));

        // Spurious response after the call completed.
        let ghost = ResponseEnvelope::failure(CorrelationId::new(), "ghost again");
        harness
            .bus
            .send(response_queue, encode_response(&ghost).unwrap())
            .await
            .unwrap();

        // Registry stays clean and the channel keeps working.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.registry.pending_count(), 0);
        let data = harness
            .client
            .invoke("ECHO", json!({"still": "alive"}), None)
            .await
            .unwrap();
        assert_eq!(data, json!({"still": "alive"}));
    }

    #[tokio::test]
    async fn test_late_reply_after_timeout_is_discarded() {
        let mut table = OperationTable::new();
        table.register_fn("SLOW", |payload| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(payload)
        });
        let harness = ServiceHarness::start(table, Default::default());

        let result = harness
            .client
            .invoke("SLOW", json!(1), Some(Duration::from_millis(50)))
            .await;
        assert!(matches!(result, Err(RpcError::Timeout(_))));
        assert_eq!(harness.registry.pending_count(), 0);

        // The handler finishes anyway and its reply arrives late; the
        // registry must discard it without effect.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(harness.registry.pending_count(), 0);
        assert!(
            harness
                .registry
                .stats()
                .total_unmatched
                .load(Ordering::Relaxed)
                >= 1
        );
    }

    #[tokio::test]
    async fn test_duplicate_reply_is_discarded() {
        let bus = Arc::new(InMemoryQueueBus::new());
        let registry = Arc::new(PendingRequestStore::new());

        let listener = ResponseListener::attach(registry.clone(), bus.as_ref(), "svc.responses");
        tokio::spawn(listener.run());

        // Responder that answers every request twice.
        let mut requests = bus.subscribe("svc.requests");
        {
            let bus = bus.clone();
            tokio::spawn(async move {
                while let Some(bytes) = requests.recv().await {
                    let request = decode_request(&bytes).expect("decodable");
                    let response =
                        ResponseEnvelope::success(request.correlation_id, request.payload);
                    let encoded = encode_response(&response).unwrap();
                    bus.send("svc.responses", encoded.clone()).await.unwrap();
                    bus.send("svc.responses", encoded).await.unwrap();
                }
            });
        }

        let client = RpcClient::new(
            registry.clone(),
            bus.clone(),
            "svc.requests",
            Duration::from_secs(5),
        );

        let data = client.invoke("ECHO", json!({"n": 1}), None).await.unwrap();
        assert_eq!(data, json!({"n": 1}));

        // Let the duplicate drain through the listener.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.stats().total_unmatched.load(Ordering::Relaxed), 1);
        assert_eq!(registry.stats().total_completed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_is_swept() {
        let mut table = OperationTable::new();
        table.register_fn("HANG", |_| async move {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(json!(null))
        });
        let harness = ServiceHarness::start_default(table);

        // A caller that "crashes" mid-call: the invoke task is aborted,
        // so its timeout path never runs and expire is never called.
        let client = harness.client.clone();
        let doomed = tokio::spawn(async move {
            client
                .invoke("HANG", json!(null), Some(Duration::from_secs(600)))
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.registry.pending_count(), 1);
        doomed.abort();
        let _ = doomed.await;

        // The entry survives the crash; only the sweep can collect it.
        assert_eq!(harness.registry.pending_count(), 1);

        tokio::spawn(sweep_task(
            harness.registry.clone(),
            Duration::from_millis(20),
            Duration::from_millis(100),
        ));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(harness.registry.pending_count(), 0);
        assert!(
            harness
                .registry
                .stats()
                .total_swept
                .load(Ordering::Relaxed)
                >= 1
        );
    }
}
