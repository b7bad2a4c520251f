//! Built-in scheduler.
//!
//! Runs the pipeline on a fixed interval until Ctrl-C. Every tick is an
//! independent run: a failed run is logged and the next tick proceeds as
//! usual, relying on the draft marker to skip pages already handled.
//!
//! A Ctrl-C that arrives while a run is in progress lets that run finish and
//! then stops the loop.

use anyhow::{bail, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::pipeline::Drafter;

pub async fn run_watch(drafter: &Drafter, interval_secs: u64) -> Result<()> {
    watch_until(drafter, interval_secs, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Runs the pipeline every `interval_secs` until `shutdown` completes.
pub async fn watch_until<F>(drafter: &Drafter, interval_secs: u64, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    if interval_secs == 0 {
        bail!("--interval must be > 0");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    // A slow run should not cause a burst of catch-up runs.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Polled across iterations so a signal during a run is not lost.
    tokio::pin!(shutdown);

    println!("watching every {}s (Ctrl-C to stop)", interval_secs);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                println!("stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                let run = drafter.run();
                tokio::pin!(run);
                let result = tokio::select! {
                    result = &mut run => result,
                    _ = &mut shutdown => {
                        // Finish the in-flight run, then stop.
                        report(run.await);
                        println!("stopping");
                        return Ok(());
                    }
                };
                report(result);
            }
        }
    }
}

fn report(result: Result<usize>) {
    match result {
        Ok(processed) => println!(
            "[{}] processed {} request(s)",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            processed
        ),
        Err(e) => tracing::error!("run failed: {e:#}"),
    }
}
