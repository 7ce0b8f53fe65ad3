//! End-to-end hub behaviour: ordering, isolation, eviction, shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use hubcast::{
    ClientHandle, Event, EventKind, Hub, HubConfig, HubError, LagPolicy, LeaveReason,
    OverflowPolicy, Subscribe, TryRecvError,
};

fn hub_with(f: impl FnOnce(&mut HubConfig)) -> Hub {
    let mut cfg = HubConfig::default();
    f(&mut cfg);
    Hub::new(cfg)
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn drain(client: &mut ClientHandle) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(msg) = client.try_recv() {
        out.push(msg.as_str().unwrap_or_default().to_string());
    }
    out
}

#[tokio::test]
async fn all_clients_observe_the_same_order() {
    let hub = hub_with(|c| c.client_capacity = 128);
    let mut clients: Vec<ClientHandle> = (0..3).map(|_| hub.join().expect("join")).collect();

    for i in 0..50 {
        hub.publish(format!("m{i}")).await.expect("publish");
    }
    hub.shutdown().await.expect("shutdown");

    let expected: Vec<String> = (0..50).map(|i| format!("m{i}")).collect();
    let mut seqs_per_client = Vec::new();
    for client in &mut clients {
        let mut seqs = Vec::new();
        let mut payloads = Vec::new();
        while let Some(msg) = client.recv().await {
            seqs.push(msg.seq());
            payloads.push(msg.as_str().unwrap_or_default().to_string());
        }
        assert_eq!(payloads, expected);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        seqs_per_client.push(seqs);
    }
    assert!(seqs_per_client.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn late_joiner_gets_no_replay() {
    let hub = Hub::new(HubConfig::default());
    let mut early = hub.join().expect("join early");

    hub.publish("m1").await.expect("publish");
    wait_until(|| hub.stats().delivered == 1).await;

    let mut late = hub.join().expect("join late");
    hub.publish("m2").await.expect("publish");
    hub.shutdown().await.expect("shutdown");

    assert_eq!(drain(&mut early), vec!["m1", "m2"]);
    assert_eq!(drain(&mut late), vec!["m2"]);
}

#[tokio::test]
async fn stalled_client_does_not_hold_back_others() {
    const K: usize = 4;
    let hub = hub_with(|c| c.client_capacity = K);
    let stalled = hub.join().expect("join a");
    let mut b = hub.join().expect("join b");
    let mut c = hub.join().expect("join c");

    for i in 0..K + 5 {
        // Non-blocking: succeeds even though `stalled` never drains.
        hub.try_publish(i.to_string()).expect("try_publish");
        assert_eq!(b.recv().await.expect("b open").as_str(), Some(i.to_string().as_str()));
        assert_eq!(c.recv().await.expect("c open").as_str(), Some(i.to_string().as_str()));
    }

    assert_eq!(stalled.pending(), K);
    assert_eq!(stalled.dropped(), 5);
    assert_eq!(b.dropped(), 0);
    assert_eq!(c.dropped(), 0);
    assert_eq!(stalled.close_reason(), None);
}

#[tokio::test]
async fn drop_newest_scenario_with_capacity_two() {
    let hub = hub_with(|c| c.client_capacity = 2);
    let mut h1 = hub.join().expect("join");

    hub.publish("a").await.expect("publish");
    hub.publish("b").await.expect("publish");
    hub.publish("c").await.expect("publish");
    wait_until(|| hub.stats().dropped == 1).await;

    assert_eq!(h1.dropped(), 1);
    assert_eq!(h1.recv().await.expect("a").as_str(), Some("a"));
    assert_eq!(h1.recv().await.expect("b").as_str(), Some("b"));

    let blocked = tokio::time::timeout(Duration::from_millis(50), h1.recv()).await;
    assert!(blocked.is_err(), "recv should block on an empty open queue");
}

#[tokio::test]
async fn drop_oldest_keeps_the_freshest_messages() {
    let hub = hub_with(|c| {
        c.client_capacity = 2;
        c.overflow = OverflowPolicy::DropOldest;
    });
    let mut h1 = hub.join().expect("join");

    for m in ["a", "b", "c"] {
        hub.publish(m).await.expect("publish");
    }
    wait_until(|| hub.stats().dropped == 1).await;

    assert_eq!(h1.dropped(), 1);
    assert_eq!(drain(&mut h1), vec!["b", "c"]);
}

#[tokio::test]
async fn lagging_client_is_evicted_after_threshold() {
    let hub = hub_with(|c| {
        c.client_capacity = 1;
        c.lag = LagPolicy {
            max_drops: 3,
            window: Duration::from_secs(60),
        };
    });
    let mut h = hub.join().expect("join");
    let mut healthy = hub.join().expect("join healthy");

    for i in 0..4 {
        hub.publish(format!("m{i}")).await.expect("publish");
        healthy.recv().await.expect("healthy open");
    }
    wait_until(|| hub.stats().evicted == 1).await;

    assert_eq!(h.close_reason(), Some(LeaveReason::Lagged));
    assert_eq!(h.try_recv().unwrap_err(), TryRecvError::Closed(LeaveReason::Lagged));
    assert_eq!(h.dropped(), 3);
    assert_eq!(hub.client_count(), 1);

    // Later publishes no longer target the evicted client.
    hub.publish("after").await.expect("publish");
    assert_eq!(healthy.recv().await.expect("healthy open").as_str(), Some("after"));
    assert_eq!(h.dropped(), 3);
    assert_eq!(hub.stats().dropped, 3);

    // Leaving an evicted client is a harmless no-op.
    assert!(!hub.leave(h.id()));
    h.leave();
}

#[tokio::test]
async fn leave_is_idempotent() {
    let hub = Hub::new(HubConfig::default());
    let mut h = hub.join().expect("join");
    let id = h.id();

    assert!(hub.leave(id));
    assert!(!hub.leave(id));
    h.leave();
    assert_eq!(h.close_reason(), Some(LeaveReason::Client));
    assert!(h.recv().await.is_none());
    assert_eq!(hub.client_count(), 0);
    assert_eq!(hub.stats().evicted, 0);
}

#[tokio::test]
async fn leave_wakes_a_blocked_reader() {
    let hub = Hub::new(HubConfig::default());
    let mut h = hub.join().expect("join");
    let id = h.id();

    let reader = tokio::spawn(async move { h.recv().await });
    tokio::task::yield_now().await;
    assert!(hub.leave(id));

    let got = tokio::time::timeout(Duration::from_secs(1), reader)
        .await
        .expect("reader woke")
        .expect("reader task");
    assert!(got.is_none());
}

#[tokio::test]
async fn dropping_the_handle_leaves() {
    let hub = Hub::new(HubConfig::default());
    let h = hub.join().expect("join");
    assert_eq!(hub.client_count(), 1);
    drop(h);
    assert_eq!(hub.client_count(), 0);
}

#[tokio::test]
async fn shutdown_drains_then_closes() {
    let hub = hub_with(|c| c.client_capacity = 3);
    let mut h = hub.join().expect("join");

    for i in 1..=5 {
        hub.publish(format!("M{i}")).await.expect("publish");
    }
    hub.shutdown().await.expect("shutdown");

    // Capacity 3 with drop-newest: M4 and M5 never fit.
    assert_eq!(drain(&mut h), vec!["M1", "M2", "M3"]);
    assert!(h.recv().await.is_none());
    assert_eq!(h.close_reason(), Some(LeaveReason::Shutdown));

    assert!(hub.is_closed());
    assert_eq!(hub.join().unwrap_err(), HubError::HubClosed);
    assert_eq!(hub.publish("late").await.unwrap_err(), HubError::HubClosed);
    assert_eq!(hub.try_publish("late").unwrap_err(), HubError::HubClosed);

    // Second shutdown is a no-op.
    hub.shutdown().await.expect("second shutdown");
}

#[tokio::test]
async fn client_limit_is_enforced() {
    let hub = hub_with(|c| c.max_clients = 2);
    let a = hub.join().expect("join a");
    let _b = hub.join().expect("join b");

    assert_eq!(
        hub.join().unwrap_err(),
        HubError::ResourceExhausted { max: 2 }
    );

    drop(a);
    let _c = hub.join().expect("slot freed by leave");
}

#[tokio::test]
async fn try_publish_reports_full_inbound() {
    let hub = hub_with(|c| c.inbound_capacity = 1);
    let _h = hub.join().expect("join");

    // Current-thread runtime: the dispatcher cannot run until we yield.
    hub.try_publish("one").expect("first fits");
    let err = hub.try_publish("two").unwrap_err();
    assert_eq!(err, HubError::InboundFull);
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn idle_reader_is_evicted() {
    let hub = hub_with(|c| c.idle_timeout = Duration::from_secs(1));
    let stale = hub.join().expect("join stale");
    let mut live = hub.join().expect("join live");

    hub.publish("x").await.expect("publish");
    assert_eq!(live.recv().await.expect("live open").as_str(), Some("x"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    wait_until(|| hub.stats().evicted == 1).await;

    assert_eq!(stale.close_reason(), Some(LeaveReason::Idle));
    assert_eq!(live.close_reason(), None);
    assert_eq!(hub.client_count(), 1);
}

#[tokio::test]
async fn events_describe_client_lifecycle() {
    let hub = hub_with(|c| c.client_capacity = 1);
    let mut events = hub.events();

    let h = hub.join().expect("join");
    let id = h.id();
    hub.publish("a").await.expect("publish");
    hub.publish("b").await.expect("publish");
    wait_until(|| hub.stats().dropped == 1).await;
    drop(h);

    let kinds: Vec<Event> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    let joined = kinds.iter().find(|e| e.kind == EventKind::ClientJoined).expect("joined");
    assert_eq!(joined.client, Some(id));
    let dropped = kinds.iter().find(|e| e.kind == EventKind::MessageDropped).expect("dropped");
    assert_eq!(dropped.reason.as_deref(), Some("drop_newest"));
    let left = kinds.iter().find(|e| e.kind == EventKind::ClientLeft).expect("left");
    assert_eq!(left.reason.as_deref(), Some("client"));
    assert_eq!(left.dropped, Some(1));
}

#[derive(Default)]
struct JoinCounter(AtomicUsize);

#[async_trait]
impl Subscribe for JoinCounter {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::ClientJoined {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
    fn name(&self) -> &'static str {
        "join-counter"
    }
}

#[tokio::test]
async fn builder_subscribers_receive_events() {
    let counter = Arc::new(JoinCounter::default());
    let hub = Hub::builder(HubConfig::default())
        .with_subscriber(counter.clone())
        .build();

    let _a = hub.join().expect("join");
    let _b = hub.join().expect("join");
    wait_until(|| counter.0.load(Ordering::SeqCst) == 2).await;

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn handle_as_stream() {
    let hub = Hub::new(HubConfig::default());
    let stream = hub.join().expect("join").into_stream();

    for m in ["x", "y", "z"] {
        hub.publish(m).await.expect("publish");
    }
    hub.shutdown().await.expect("shutdown");

    let got: Vec<String> = stream
        .map(|m| m.as_str().unwrap_or_default().to_string())
        .collect()
        .await;
    assert_eq!(got, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn dropping_every_hub_clone_closes_clients() {
    let hub = Hub::new(HubConfig::default());
    let mut h = hub.join().expect("join");
    hub.publish("last").await.expect("publish");
    drop(hub);

    assert_eq!(h.recv().await.expect("drained").as_str(), Some("last"));
    assert!(h.recv().await.is_none());
    assert_eq!(h.close_reason(), Some(LeaveReason::Shutdown));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_join_leave_during_publish() {
    let hub = hub_with(|c| c.client_capacity = 8);

    let mut workers = Vec::new();
    for _ in 0..8 {
        let hub = hub.clone();
        workers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let Ok(mut h) = hub.join() else { break };
                let _ = tokio::time::timeout(Duration::from_millis(1), h.recv()).await;
                if h.id().as_u64() % 2 == 0 {
                    hub.leave(h.id());
                }
            }
        }));
    }

    for i in 0..1_000 {
        hub.publish(i.to_string()).await.expect("publish");
    }
    for w in workers {
        w.await.expect("worker");
    }

    assert_eq!(hub.client_count(), 0);
    hub.shutdown().await.expect("shutdown");
    assert_eq!(hub.stats().published, 1_000);
}

#[tokio::test]
async fn handles_from_another_hub_are_unknown() {
    let first = Hub::new(HubConfig::default());
    let second = Hub::new(HubConfig::default());
    let from_first = first.join().expect("join first");
    let mut from_second = second.join().expect("join second");
    assert_ne!(from_first.id(), from_second.id());

    assert!(!second.leave(from_first.id()));
    assert_eq!(from_second.close_reason(), None);
    assert_eq!(second.client_count(), 1);

    second.publish("still here").await.expect("publish");
    assert_eq!(
        from_second.recv().await.expect("open").as_str(),
        Some("still here")
    );
    assert_eq!(first.client_count(), 1);
}

#[tokio::test]
async fn huge_idle_timeout_keeps_the_hub_running() {
    let hub = hub_with(|c| c.idle_timeout = Duration::MAX);
    let mut h = hub.join().expect("join");

    hub.publish("tick").await.expect("publish");
    let got = tokio::time::timeout(Duration::from_secs(1), h.recv())
        .await
        .expect("delivered");
    assert_eq!(got.expect("open").as_str(), Some("tick"));
    assert!(!hub.is_closed());

    hub.shutdown().await.expect("shutdown");
    assert!(h.recv().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn join_racing_shutdown_never_misses_the_close() {
    let hub = Hub::new(HubConfig::default());

    let mut joiners = Vec::new();
    for _ in 0..4 {
        let hub = hub.clone();
        joiners.push(tokio::spawn(async move {
            let mut handles = Vec::new();
            loop {
                match hub.join() {
                    Ok(h) => handles.push(h),
                    Err(e) => {
                        assert_eq!(e, HubError::HubClosed);
                        break;
                    }
                }
                tokio::task::yield_now().await;
            }
            handles
        }));
    }

    tokio::time::sleep(Duration::from_millis(5)).await;
    hub.shutdown().await.expect("shutdown");

    let mut joined = 0;
    for j in joiners {
        for mut h in j.await.expect("joiner") {
            let end = tokio::time::timeout(Duration::from_secs(5), async {
                while h.recv().await.is_some() {}
            })
            .await;
            assert!(end.is_ok(), "{} never saw end-of-stream", h.id());
            assert_eq!(h.close_reason(), Some(LeaveReason::Shutdown));
            joined += 1;
        }
    }
    assert!(joined > 0);
    assert_eq!(hub.client_count(), 0);
}
