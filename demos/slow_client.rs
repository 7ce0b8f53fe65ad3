//! # Example: slow_client
//!
//! One fast reader, one reader that stalls, and the built-in [`LogWriter`]
//! reporting what the hub does about it.
//!
//! Demonstrates how to:
//! - Attach subscribers through [`Hub::builder`].
//! - Bound per-client memory with a small queue and [`OverflowPolicy`].
//! - Evict a chronically lagging client with [`LagPolicy`].
//!
//! ## Flow
//! ```text
//! publisher ──► Hub ──► fast   (keeps up, sees every message)
//!                  └──► slow   (queue full ─► MessageDropped ×N ─► ClientEvicted{lagged})
//! Bus ──► LogWriter ──► tracing fmt
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example slow_client --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use hubcast::{Hub, HubConfig, LagPolicy, LogWriter, OverflowPolicy, Subscribe};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(true).init();

    let cfg = HubConfig {
        client_capacity: 4,
        overflow: OverflowPolicy::DropOldest,
        lag: LagPolicy {
            max_drops: 8,
            window: Duration::from_secs(5),
        },
        ..HubConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let hub = Hub::builder(cfg).with_subscribers(subs).build();

    let mut fast = hub.join()?;
    let fast_task = tokio::spawn(async move {
        let mut seen = 0u32;
        while fast.recv().await.is_some() {
            seen += 1;
        }
        seen
    });

    let mut slow = hub.join()?;
    let slow_task = tokio::spawn(async move {
        let mut seen = 0u32;
        while slow.recv().await.is_some() {
            seen += 1;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        println!(
            "[slow] closed: reason={:?} dropped={}",
            slow.close_reason(),
            slow.dropped()
        );
        seen
    });

    for i in 0..40 {
        hub.publish(format!("update #{i}")).await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    hub.shutdown().await?;
    let fast_seen = fast_task.await?;
    let slow_seen = slow_task.await?;
    println!("[fast] saw {fast_seen} messages, [slow] saw {slow_seen}");
    println!("{:?}", hub.stats());
    Ok(())
}
