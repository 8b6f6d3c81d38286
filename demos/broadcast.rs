//! # Example: broadcast
//!
//! Asynchronous multicast with a [`BroadcastStream`].
//!
//! Demonstrates how to:
//! - Attach consumers at different points of the stream.
//! - Observe an abort with both [`AbortPolicy`] values.
//! - Use `flush()` so spawned consumers catch up before the producer goes on.
//!
//! ## Flow
//! ```text
//! early  (attached at start)  ─► 1, 2, 3, then Err("upstream lost")
//! late   (attached after 2)   ─► 3, then Err("upstream lost")
//! eager  (Immediate, early)   ─► 1, 2, 3 or fewer, then Err as soon as abort lands
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example broadcast
//! ```

use std::time::Duration;

use futures::StreamExt;
use tidings::{AbortPolicy, BroadcastStream, Chunks};
use tokio::task::JoinHandle;

fn consume(name: &'static str, mut chunks: Chunks<u32, String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(item) = chunks.next().await {
            match item {
                Ok(v) => println!("[{name}] data {v}"),
                Err(reason) => println!("[{name}] aborted: {reason}"),
            }
        }
        println!("[{name}] done");
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stream = BroadcastStream::<u32, String>::new();

    let early = consume("early", stream.iterate(AbortPolicy::InOrder));
    let eager = consume("eager", stream.iterate(AbortPolicy::Immediate));

    stream.emit(1);
    stream.emit(2);
    stream.flush().await;

    let late = consume("late", stream.subscribe());

    stream.emit(3);
    tokio::time::sleep(Duration::from_millis(10)).await;
    stream.abort("upstream lost".to_string());

    for h in [early, eager, late] {
        h.await?;
    }

    println!(
        "[main] state={:?} emitted={}",
        stream.state(),
        stream.emitted()
    );
    Ok(())
}
