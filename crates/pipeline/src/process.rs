use std::path::Path;

use common::{ProcessingOutcome, TrackCandidate, TrackMatch};
use metadata::TagFields;
use tracing::{debug, info, warn};

use crate::fallback::{self, FallbackReason};
use crate::marker;
use crate::relocate::relocate;
use crate::settings::CycleSettings;
use crate::Pipeline;

fn failed(step: &str, err: impl std::fmt::Display) -> ProcessingOutcome {
    ProcessingOutcome::Failed {
        reason: format!("{} failed: {}", step, err),
    }
}

impl Pipeline {
    pub(crate) async fn identify(
        &self,
        settings: &CycleSettings,
        folder: &Path,
        candidate: &TrackCandidate,
    ) -> ProcessingOutcome {
        info!("Recognizing '{}'", candidate.file_name());
        let reason = match self.recognizer.recognize(&candidate.path).await {
            Ok(Some(track)) => return self.commit_match(settings, candidate, track).await,
            Ok(None) => {
                info!("No match for '{}'", candidate.file_name());
                FallbackReason::NoMatch
            }
            Err(err) => {
                warn!("Recognition failed for '{}': {}", candidate.file_name(), err);
                FallbackReason::RecognizerFailed(err.to_string())
            }
        };
        fallback::resolve(self.tags.as_ref(), settings, folder, candidate, &reason)
    }

    async fn commit_match(
        &self,
        settings: &CycleSettings,
        candidate: &TrackCandidate,
        track: TrackMatch,
    ) -> ProcessingOutcome {
        let path = &candidate.path;
        info!(
            "Matched '{}' as {} - {}",
            candidate.file_name(),
            track.artist.as_deref().unwrap_or("?"),
            track.title.as_deref().unwrap_or("?")
        );

        if let Err(err) = self.tags.strip_to_minimal(path) {
            warn!("Failed to strip tags from {}: {}", path.display(), err);
            return failed("strip", err);
        }
        let fields = TagFields {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            date: track.release_date.clone(),
        };
        if let Err(err) = self.tags.write_tags(path, &fields) {
            warn!("Failed to write tags to {}: {}", path.display(), err);
            return failed("tag write", err);
        }

        if let Some(url) = &track.cover_art_url {
            self.attach_cover(path, url).await;
        }

        let moved = match relocate(
            path,
            track.artist.as_deref(),
            track.title.as_deref(),
            settings.artist_subfolders,
        ) {
            Ok(moved) => moved,
            Err(err) => {
                warn!("Failed to relocate {}: {}", path.display(), err);
                return failed("relocation", err);
            }
        };
        if let Err(err) = marker::stamp(self.tags.as_ref(), &moved, &settings.marker_token) {
            warn!("Failed to mark {}: {}", moved.display(), err);
            return failed("marking", err);
        }
        ProcessingOutcome::Recognized { path: moved, track }
    }

    async fn attach_cover(&self, path: &Path, url: &str) {
        let cover = match self.covers.fetch_cover(url).await {
            Ok(cover) => cover,
            Err(err) => {
                warn!("Cover download failed for {}: {}", url, err);
                return;
            }
        };
        match self.tags.embed_cover_art(path, &cover) {
            Ok(()) => debug!("Embedded cover art into {}", path.display()),
            Err(err) => warn!("Failed to embed cover art into {}: {}", path.display(), err),
        }
    }
}
