use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{CycleStats, ProcessingOutcome, TrackCandidate};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::fallback::{self, FallbackReason};
use crate::marker;
use crate::settings::CycleSettings;
use crate::{Clock, Pipeline};

pub fn scan_folder(folder: &Path) -> io::Result<Vec<TrackCandidate>> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(candidate) = TrackCandidate::from_path(entry.into_path()) {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

pub fn estimated_hours_remaining(total: usize, max_per_cycle: usize, interval: Duration) -> f64 {
    if max_per_cycle == 0 {
        return 0.0;
    }
    let cycles = total.div_ceil(max_per_cycle);
    cycles as f64 * interval.as_secs_f64() / 3600.0
}

/// Interval-anchored: a slow cycle shortens the nap, it never triggers a catch-up.
pub fn sleep_duration(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

#[derive(Clone, Debug, PartialEq)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub stats: CycleStats,
    pub estimated_hours_remaining: Option<f64>,
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl Pipeline {
    pub async fn run_folder(&self, settings: &CycleSettings, folder: &Path) -> io::Result<FolderReport> {
        let candidates = scan_folder(folder)?;
        let mut stats = CycleStats {
            total: candidates.len(),
            ..CycleStats::default()
        };
        debug!("{} candidates in {}", candidates.len(), folder.display());

        for candidate in &candidates {
            if marker::is_marked(self.tags.as_ref(), &candidate.path, &settings.marker_token) {
                debug!("Skipping marked file '{}'", candidate.file_name());
                stats.record(&ProcessingOutcome::Skipped);
                continue;
            }
            if !settings.rename_and_move_only && stats.processed >= settings.max_queue_size {
                stats.deferred += 1;
                continue;
            }

            let outcome = if settings.rename_and_move_only {
                fallback::resolve(
                    self.tags.as_ref(),
                    settings,
                    folder,
                    candidate,
                    &FallbackReason::RenameOnly,
                )
            } else {
                stats.processed += 1;
                self.identify(settings, folder, candidate).await
            };
            debug!("'{}' -> {}", candidate.file_name(), outcome.label());
            self.notify_track(&settings.notifications, &outcome).await;
            stats.record(&outcome);
        }

        if stats.deferred > 0 {
            info!(
                "Queue cap of {} reached in {}; {} files left for later",
                settings.max_queue_size,
                folder.display(),
                stats.deferred
            );
        }
        let estimated_hours_remaining = (stats.deferred > 0).then(|| {
            estimated_hours_remaining(stats.total, settings.max_queue_size, settings.check_interval)
        });
        Ok(FolderReport {
            folder: folder.to_path_buf(),
            stats,
            estimated_hours_remaining,
        })
    }

    pub async fn run_cycle(&self, settings: &CycleSettings) -> Vec<FolderReport> {
        let mut reports = Vec::with_capacity(settings.monitored_paths.len());
        for folder in &settings.monitored_paths {
            let report = match self.run_folder(settings, folder).await {
                Ok(report) => report,
                Err(err) => {
                    warn!("Failed to scan {}: {}", folder.display(), err);
                    continue;
                }
            };
            let stats = &report.stats;
            info!(
                "{}: total={} processed={} skipped={} fallback={} manual={} renamed={} failed={} deferred={}",
                folder.display(),
                stats.total,
                stats.processed,
                stats.skipped,
                stats.fallback,
                stats.fallback_manual,
                stats.renamed,
                stats.failed,
                stats.deferred
            );
            self.notify_summary(&settings.notifications, &report).await;
            reports.push(report);
        }
        reports
    }

    pub async fn run<L, E>(&self, clock: &dyn Clock, mut reload: L) -> E
    where
        L: FnMut() -> Result<CycleSettings, E>,
    {
        loop {
            let settings = match reload() {
                Ok(settings) => settings,
                Err(err) => return err,
            };
            let started = clock.now();
            self.run_cycle(&settings).await;
            let elapsed = clock.now().saturating_duration_since(started);
            let pause = sleep_duration(settings.check_interval, elapsed);
            info!("Cycle took {:.1}s; next in {:.1}s", elapsed.as_secs_f64(), pause.as_secs_f64());
            clock.sleep(pause).await;
        }
    }
}
