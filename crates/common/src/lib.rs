use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    M4a,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Ogg,
    ];

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "m4a" => Some(AudioFormat::M4a),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackCandidate {
    pub path: PathBuf,
    pub format: AudioFormat,
}

impl TrackCandidate {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let format = AudioFormat::from_path(&path)?;
        Some(Self { path, format })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub release_date: Option<String>,
    pub cover_art_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Recognized {
        path: PathBuf,
        track: TrackMatch,
    },
    FallbackSalvaged {
        path: PathBuf,
        title: Option<String>,
        artist: Option<String>,
    },
    ManualQueued {
        path: PathBuf,
    },
    RenameOnly {
        path: PathBuf,
    },
    Skipped,
    /// Tag or filesystem work failed; the file stays where it was and is not marked.
    Failed {
        reason: String,
    },
}

impl ProcessingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingOutcome::Recognized { .. } => "recognized",
            ProcessingOutcome::FallbackSalvaged { .. } => "fallback",
            ProcessingOutcome::ManualQueued { .. } => "manual",
            ProcessingOutcome::RenameOnly { .. } => "renamed",
            ProcessingOutcome::Skipped => "skipped",
            ProcessingOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub fallback: usize,
    pub fallback_manual: usize,
    pub renamed: usize,
    pub failed: usize,
    pub deferred: usize,
}

impl CycleStats {
    pub fn record(&mut self, outcome: &ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Recognized { .. } => {}
            ProcessingOutcome::FallbackSalvaged { .. } => {
                self.fallback += 1;
            }
            ProcessingOutcome::ManualQueued { .. } => {
                self.fallback += 1;
                self.fallback_manual += 1;
            }
            ProcessingOutcome::RenameOnly { .. } => {
                self.renamed += 1;
            }
            ProcessingOutcome::Skipped => {
                self.skipped += 1;
            }
            ProcessingOutcome::Failed { .. } => {
                self.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioFormat, CycleStats, ProcessingOutcome, TrackCandidate};
    use std::path::{Path, PathBuf};

    #[test]
    fn audio_format_ignores_extension_case() {
        assert_eq!(AudioFormat::from_path(Path::new("a/B.MP3")), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path(Path::new("x.Flac")), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_path(Path::new("cover.jpg")), None);
        assert_eq!(AudioFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn candidate_requires_supported_extension() {
        assert!(TrackCandidate::from_path(PathBuf::from("notes.txt")).is_none());
        let candidate = TrackCandidate::from_path(PathBuf::from("/music/song.m4a")).unwrap();
        assert_eq!(candidate.format, AudioFormat::M4a);
        assert_eq!(candidate.file_name(), "song.m4a");
    }

    #[test]
    fn manual_queue_counts_as_fallback() {
        let mut stats = CycleStats::default();
        stats.record(&ProcessingOutcome::ManualQueued {
            path: PathBuf::from("manual_input/a.mp3"),
        });
        stats.record(&ProcessingOutcome::FallbackSalvaged {
            path: PathBuf::from("A - B.mp3"),
            title: Some("B".to_string()),
            artist: Some("A".to_string()),
        });
        stats.record(&ProcessingOutcome::Skipped);
        stats.record(&ProcessingOutcome::Failed {
            reason: "io".to_string(),
        });
        assert_eq!(stats.fallback, 2);
        assert_eq!(stats.fallback_manual, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed, 0);
    }
}
