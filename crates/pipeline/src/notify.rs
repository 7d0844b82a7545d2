use common::{CycleStats, ProcessingOutcome};
use tracing::{debug, warn};

use crate::scheduler::FolderReport;
use crate::settings::NotificationSettings;
use crate::Pipeline;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotifyOptions {
    pub silent: bool,
    pub attachment_image: Option<String>,
}

pub type Fields = Vec<(String, String)>;

fn field(label: &str, value: impl ToString) -> (String, String) {
    (label.to_string(), value.to_string())
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("Unknown").to_string()
}

pub fn track_message(outcome: &ProcessingOutcome) -> Option<(Fields, NotifyOptions)> {
    match outcome {
        ProcessingOutcome::Recognized { track, .. } => Some((
            vec![
                field("title", or_unknown(track.title.as_deref())),
                field("artist", or_unknown(track.artist.as_deref())),
                field("album", or_unknown(track.album.as_deref())),
            ],
            NotifyOptions {
                silent: true,
                attachment_image: track.cover_art_url.clone(),
            },
        )),
        ProcessingOutcome::FallbackSalvaged { title, artist, .. } => Some((
            vec![
                field("title", or_unknown(title.as_deref())),
                field("artist", or_unknown(artist.as_deref())),
                field("album", "Unknown"),
            ],
            NotifyOptions {
                silent: true,
                attachment_image: None,
            },
        )),
        ProcessingOutcome::RenameOnly { path } => Some((
            vec![field(
                "renamed",
                path.file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            )],
            NotifyOptions {
                silent: true,
                attachment_image: None,
            },
        )),
        _ => None,
    }
}

pub fn summary_message(report: &FolderReport) -> Fields {
    let stats = &report.stats;
    let mut fields = vec![
        field("folder", report.folder.display()),
        field("total", stats.total),
        field("processed", stats.processed),
        field("skipped", stats.skipped),
        field("fallback", stats.fallback),
        field("fallback_manual", stats.fallback_manual),
        field("renamed", stats.renamed),
        field("failed", stats.failed),
        field("deferred", stats.deferred),
    ];
    if let Some(hours) = report.estimated_hours_remaining {
        fields.push(field("estimated_hours_remaining", format!("{:.2}", hours)));
    }
    fields
}

// Rename-only passthroughs count as activity; they never raise `processed`.
fn activity(stats: &CycleStats) -> usize {
    stats.processed + stats.renamed
}

pub fn should_send_summary(settings: &NotificationSettings, stats: &CycleStats) -> bool {
    let active = activity(stats);
    settings.enabled && active > 0 && active >= settings.summary_min
}

impl Pipeline {
    pub(crate) async fn notify_track(&self, settings: &NotificationSettings, outcome: &ProcessingOutcome) {
        if !(settings.enabled && settings.each_song) {
            return;
        }
        if let Some((fields, options)) = track_message(outcome) {
            self.deliver(settings, &fields, &options).await;
        }
    }

    pub(crate) async fn notify_summary(&self, settings: &NotificationSettings, report: &FolderReport) {
        if !should_send_summary(settings, &report.stats) {
            debug!(
                "No summary for {} ({} processed, {} renamed)",
                report.folder.display(),
                report.stats.processed,
                report.stats.renamed
            );
            return;
        }
        let fields = summary_message(report);
        self.deliver(settings, &fields, &NotifyOptions::default()).await;
    }

    async fn deliver(&self, settings: &NotificationSettings, fields: &[(String, String)], options: &NotifyOptions) {
        if let Err(err) = self.notifier.notify(&settings.target, fields, options).await {
            warn!("Notification failed: {}", err);
        }
    }
}
