use std::path::Path;

use common::{ProcessingOutcome, TrackCandidate};
use metadata::{TagFields, TagStore};
use tracing::{debug, info, warn};

use crate::marker;
use crate::relocate::{move_into, relocate};
use crate::settings::{CycleSettings, MANUAL_INPUT_DIR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoMatch,
    RecognizerFailed(String),
    RenameOnly,
}

pub fn resolve(
    tags: &dyn TagStore,
    settings: &CycleSettings,
    folder: &Path,
    candidate: &TrackCandidate,
    reason: &FallbackReason,
) -> ProcessingOutcome {
    debug!("Fallback for '{}' ({:?})", candidate.file_name(), reason);
    if settings.rename_and_move_only {
        return rename_only(tags, settings, candidate);
    }

    let fields = read_fields(tags, &candidate.path);
    if fields.has_minimal() {
        salvage(tags, settings, candidate)
    } else {
        queue_for_manual_input(folder, candidate)
    }
}

fn rename_only(
    tags: &dyn TagStore,
    settings: &CycleSettings,
    candidate: &TrackCandidate,
) -> ProcessingOutcome {
    let fields = read_fields(tags, &candidate.path);
    match relocate(
        &candidate.path,
        fields.artist.as_deref(),
        fields.title.as_deref(),
        settings.artist_subfolders,
    ) {
        Ok(path) => ProcessingOutcome::RenameOnly { path },
        Err(err) => {
            warn!("Failed to rename '{}': {}", candidate.file_name(), err);
            ProcessingOutcome::Failed {
                reason: format!("rename failed: {}", err),
            }
        }
    }
}

fn salvage(
    tags: &dyn TagStore,
    settings: &CycleSettings,
    candidate: &TrackCandidate,
) -> ProcessingOutcome {
    info!("Minimal tags in place for '{}'; salvaging", candidate.file_name());
    let kept = match tags.strip_to_minimal(&candidate.path) {
        Ok(kept) => kept,
        Err(err) => {
            warn!("Failed to strip tags from '{}': {}", candidate.file_name(), err);
            return ProcessingOutcome::Failed {
                reason: format!("strip failed: {}", err),
            };
        }
    };
    let path = match relocate(
        &candidate.path,
        kept.artist.as_deref(),
        kept.title.as_deref(),
        settings.artist_subfolders,
    ) {
        Ok(path) => path,
        Err(err) => {
            warn!("Failed to relocate '{}': {}", candidate.file_name(), err);
            return ProcessingOutcome::Failed {
                reason: format!("relocation failed: {}", err),
            };
        }
    };
    if let Err(err) = marker::stamp(tags, &path, &settings.marker_token) {
        warn!("Failed to mark {}: {}", path.display(), err);
        return ProcessingOutcome::Failed {
            reason: format!("marking failed: {}", err),
        };
    }
    ProcessingOutcome::FallbackSalvaged {
        path,
        title: kept.title,
        artist: kept.artist,
    }
}

fn queue_for_manual_input(folder: &Path, candidate: &TrackCandidate) -> ProcessingOutcome {
    let queue = folder.join(MANUAL_INPUT_DIR);
    match move_into(&candidate.path, &queue) {
        Ok(path) => {
            info!("Moved '{}' for manual input", candidate.file_name());
            ProcessingOutcome::ManualQueued { path }
        }
        Err(err) => {
            warn!("Failed to queue '{}' for manual input: {}", candidate.file_name(), err);
            ProcessingOutcome::Failed {
                reason: format!("manual queue failed: {}", err),
            }
        }
    }
}

fn read_fields(tags: &dyn TagStore, path: &Path) -> TagFields {
    match tags.read_tags(path) {
        Ok(info) => info.fields,
        Err(err) => {
            debug!("No readable tags in {}: {}", path.display(), err);
            TagFields::default()
        }
    }
}
