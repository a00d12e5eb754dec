//! Run motion sampling cycles from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use citycam_common::config::AppConfig;
use citycam_geo_model::CategoryFilter;
use citycam_motion_core::ActivitySummary;
use citycam_stream_engine::{
    score_channel, CycleOutcome, GstStreamSource, MotionScheduler, SchedulerConfig,
};

use super::load_registry;

pub async fn run(
    config: AppConfig,
    registry_path: Option<PathBuf>,
    cycles: Option<usize>,
    base_url: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let registry = Arc::new(load_registry(registry_path)?);
    if registry.is_empty() {
        anyhow::bail!("Registry has no cameras");
    }

    let mut sched_config = SchedulerConfig::from(&config.motion);
    if let Some(url) = base_url {
        sched_config.stream_base_url = url;
    }
    let cycles = cycles.unwrap_or(registry.len());
    let base = sched_config.stream_base_url.clone();

    let source = GstStreamSource::new().map_err(|e| anyhow::anyhow!("{e}"))?;
    let (publisher, reader) = score_channel();
    let mut scheduler = MotionScheduler::new(
        Arc::clone(&registry),
        Box::new(source),
        sched_config,
        publisher,
    );

    tracing::info!(cycles, %base, "Scanning cameras");

    for _ in 0..cycles {
        let report = tokio::select! {
            report = scheduler.next_cycle() => report,
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
        };
        let Some(report) = report else { break };
        let name = registry
            .get(report.camera_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        match &report.outcome {
            CycleOutcome::Scored { score } => {
                println!("[{:>2}] {:<32} score {score:.3}", report.index, name)
            }
            CycleOutcome::Skipped(reason) => {
                println!("[{:>2}] {:<32} skipped ({reason:?})", report.index, name)
            }
            CycleOutcome::Failed { error } => {
                println!("[{:>2}] {:<32} failed: {error}", report.index, name)
            }
        }
    }
    // Dropping the scheduler closes any session left open by an interrupt.
    drop(scheduler);

    let scores = reader.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(scores.as_ref())?);
        return Ok(());
    }

    let summary = ActivitySummary::compute(&registry.visible(&CategoryFilter::all()), &scores);
    println!();
    println!(
        "Activity: {} ({}/{} scanned{})",
        summary.level.label(),
        summary.scanned,
        summary.total,
        summary
            .mean
            .map(|m| format!(", mean {:.0}%", m * 100.0))
            .unwrap_or_default()
    );
    for cam in &summary.top {
        println!("  {:<32} {:.0}%", cam.name, cam.score * 100.0);
    }
    Ok(())
}
