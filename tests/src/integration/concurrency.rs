//! Parallel invocation scenarios: correlation uniqueness, worker-pool
//! throughput, and independence of concurrent calls.

#[cfg(test)]
mod tests {
    use crate::integration::ServiceHarness;
    use courier_bus::{InMemoryQueueBus, QueueSender, QueueSubscriber};
    use courier_client::{PendingRequestStore, ResponseListener, RpcClient};
    use courier_dispatch::OperationTable;
    use courier_types::{decode_request, encode_response, ResponseEnvelope, ServiceConfig};
    use futures::future::join_all;
    use rand::Rng;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::sync::Mutex;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_thousand_concurrent_invokes_through_fifty_workers() {
        let mut table = OperationTable::new();
        table.register_fn("WORK", |payload| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(payload)
        });

        let config = ServiceConfig {
            max_concurrent_handlers: 50,
            ..Default::default()
        };
        let harness = ServiceHarness::start(table, config);

        let started = Instant::now();
        let calls = (0..1000).map(|i| {
            let client = harness.client.clone();
            async move {
                client
                    .invoke("WORK", json!({"i": i}), Some(Duration::from_secs(30)))
                    .await
            }
        });
        let results = join_all(calls).await;
        let elapsed = started.elapsed();

        for (i, result) in results.into_iter().enumerate() {
            let data = result.unwrap_or_else(|e| panic!("call {i} failed: {e}"));
            assert_eq!(data, json!({"i": i}));
        }

        // 1000 calls of 10ms through 50 workers is ~200ms of handler
        // time; allow generous scheduling slack but reject anything near
        // serial execution (10s).
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        assert_eq!(harness.registry.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_correlation_ids_never_collide_under_load() {
        let bus = Arc::new(InMemoryQueueBus::new());
        let registry = Arc::new(PendingRequestStore::new());

        let listener = ResponseListener::attach(registry.clone(), bus.as_ref(), "svc.responses");
        tokio::spawn(listener.run());

        // Manual responder that records every correlation id it sees.
        let seen: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
        let mut requests = bus.subscribe("svc.requests");
        {
            let bus = bus.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                while let Some(bytes) = requests.recv().await {
                    let request = decode_request(&bytes).expect("decodable");
                    let fresh = seen
                        .lock()
                        .await
                        .insert(request.correlation_id.to_string());
                    assert!(fresh, "correlation id collision: {}", request.correlation_id);

                    let response =
                        ResponseEnvelope::success(request.correlation_id, request.payload);
                    bus.send("svc.responses", encode_response(&response).unwrap())
                        .await
                        .unwrap();
                }
            });
        }

        let client = RpcClient::new(
            registry.clone(),
            bus.clone(),
            "svc.requests",
            Duration::from_secs(10),
        );

        let calls = (0..500).map(|_| {
            let client = client.clone();
            let nonce: u64 = rand::thread_rng().gen();
            async move { client.invoke("FUZZ", json!({"nonce": nonce}), None).await }
        });
        let results = join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(seen.lock().await.len(), 500);
        assert_eq!(registry.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_complete_out_of_order_without_crosstalk() {
        let mut table = OperationTable::new();
        table.register_fn("SLEEP_THEN_ECHO", |payload| async move {
            let ms = payload.get("ms").and_then(|v| v.as_u64()).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(payload)
        });
        let harness = ServiceHarness::start_default(table);

        let slow_client = harness.client.clone();
        let slow = tokio::spawn(async move {
            slow_client
                .invoke("SLEEP_THEN_ECHO", json!({"ms": 200, "who": "slow"}), None)
                .await
        });

        // Give the slow call a head start so it is in flight first.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast_started = Instant::now();
        let fast = harness
            .client
            .invoke("SLEEP_THEN_ECHO", json!({"ms": 0, "who": "fast"}), None)
            .await
            .unwrap();
        let fast_elapsed = fast_started.elapsed();

        // The fast call overtakes the slow one; each gets its own reply.
        assert_eq!(fast, json!({"ms": 0, "who": "fast"}));
        assert!(fast_elapsed < Duration::from_millis(150), "took {fast_elapsed:?}");

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, json!({"ms": 200, "who": "slow"}));
        assert_eq!(harness.registry.pending_count(), 0);
    }
}
