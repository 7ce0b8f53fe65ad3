//! # Example: ticker
//!
//! A clock broadcast to a few SSE-style readers.
//!
//! Demonstrates how to:
//! - Start a [`Hub`] and join clients from independent tasks.
//! - Publish from a timer loop.
//! - Frame each message the way an event-stream handler would (`data: ...\n\n`).
//! - Shut down gracefully so every reader drains and sees end-of-stream.
//!
//! ## Flow
//! ```text
//! ticker ──► Hub::publish(now) ──► Dispatcher ──► queue(reader-1..3) ──► stdout
//!   (after N ticks)
//! main ──► Hub::shutdown() ──► drain ──► close_all ──► readers exit
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example ticker
//! RUST_LOG=hubcast=debug cargo run --example ticker
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hubcast::{Hub, HubConfig};
use tracing_subscriber::EnvFilter;

const TICKS: u32 = 5;
const READERS: usize = 3;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let hub = Hub::new(HubConfig {
        client_capacity: 16,
        ..HubConfig::default()
    });

    let mut readers = Vec::with_capacity(READERS);
    for n in 1..=READERS {
        let mut client = hub.join()?;
        readers.push(tokio::spawn(async move {
            let mut frames = 0usize;
            while let Some(msg) = client.recv().await {
                print!("[reader-{n}] data: {}\n\n", msg.as_str().unwrap_or("<binary>"));
                frames += 1;
            }
            println!("[reader-{n}] end of stream after {frames} frames");
        }));
    }

    let mut tick = tokio::time::interval(Duration::from_millis(200));
    for _ in 0..TICKS {
        tick.tick().await;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        hub.publish(format!("{{\"now_ms\":{now}}}")).await?;
    }

    hub.shutdown().await?;
    for r in readers {
        r.await?;
    }

    let stats = hub.stats();
    println!(
        "published={} delivered={} dropped={}",
        stats.published, stats.delivered, stats.dropped
    );
    Ok(())
}
