//! In-memory collaborators for the pipeline tests.
//!
//! `JsonTagStore` keeps a file's "tags" as JSON inside the file itself, so tags
//! travel with the file when the relocator renames it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{AudioFormat, TrackMatch};
use metadata::{CoverArt, MetadataError, TagFields, TagInfo, TagStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Clock, CoverSource, Notifier, NotifyOptions, NotifyTarget, Pipeline, RecognizeError, Recognizer};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FakeTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
    #[serde(default)]
    pub cover: Option<Vec<u8>>,
}

pub fn write_fake(path: &Path, tags: &FakeTags) {
    fs::write(path, serde_json::to_vec(tags).unwrap()).unwrap();
}

pub fn read_fake(path: &Path) -> FakeTags {
    load(path).unwrap()
}

fn load(path: &Path) -> Result<FakeTags, MetadataError> {
    if AudioFormat::from_path(path).is_none() {
        return Err(MetadataError::Unsupported(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Ok(FakeTags::default());
    }
    serde_json::from_slice(&bytes)
        .map_err(|err| MetadataError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

#[derive(Default)]
pub struct JsonTagStore {
    read_only: Mutex<HashSet<String>>,
}

impl JsonTagStore {
    pub fn fail_writes_for(&self, file_name: &str) {
        self.read_only.lock().insert(file_name.to_string());
    }

    fn update<F: FnOnce(&mut FakeTags)>(&self, path: &Path, change: F) -> Result<(), MetadataError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.read_only.lock().contains(&name) {
            return Err(MetadataError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only file",
            )));
        }
        let mut tags = load(path)?;
        change(&mut tags);
        fs::write(path, serde_json::to_vec(&tags).unwrap())?;
        Ok(())
    }
}

impl TagStore for JsonTagStore {
    fn read_tags(&self, path: &Path) -> Result<TagInfo, MetadataError> {
        let tags = load(path)?;
        Ok(TagInfo {
            fields: TagFields {
                title: tags.title,
                artist: tags.artist,
                album: tags.album,
                date: tags.date,
            },
            comments: tags.comments.clone(),
            extra_fields: tags.extra.keys().cloned().collect(),
            has_embedded_cover: tags.cover.is_some(),
        })
    }

    fn write_tags(&self, path: &Path, fields: &TagFields) -> Result<(), MetadataError> {
        self.update(path, |tags| {
            if let Some(title) = &fields.title {
                tags.title = Some(title.clone());
            }
            if let Some(artist) = &fields.artist {
                tags.artist = Some(artist.clone());
            }
            if let Some(album) = &fields.album {
                tags.album = Some(album.clone());
            }
            if let Some(date) = &fields.date {
                tags.date = Some(date.clone());
            }
        })
    }

    fn strip_to_minimal(&self, path: &Path) -> Result<TagFields, MetadataError> {
        let before = load(path)?;
        self.update(path, |tags| {
            tags.comments.clear();
            tags.extra.clear();
        })?;
        Ok(TagFields {
            title: before.title,
            artist: before.artist,
            album: before.album,
            date: before.date,
        })
    }

    fn embed_cover_art(&self, path: &Path, cover: &CoverArt) -> Result<(), MetadataError> {
        self.update(path, |tags| tags.cover = Some(cover.data.clone()))
    }

    fn add_comment(&self, path: &Path, text: &str) -> Result<(), MetadataError> {
        self.update(path, |tags| tags.comments.push(text.to_string()))
    }

    fn comments(&self, path: &Path) -> Result<Vec<String>, MetadataError> {
        Ok(load(path)?.comments)
    }
}

#[derive(Clone, Debug)]
pub enum Reply {
    Match(TrackMatch),
    NoMatch,
    Fail,
}

/// Answers by file name; unknown names get no match.
#[derive(Default)]
pub struct FakeRecognizer {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRecognizer {
    pub fn reply(&self, file_name: &str, reply: Reply) {
        self.replies.lock().insert(file_name.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn recognize(&self, path: &Path) -> Result<Option<TrackMatch>, RecognizeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.calls.lock().push(name.clone());
        let reply = self.replies.lock().get(&name).cloned().unwrap_or(Reply::NoMatch);
        match reply {
            Reply::Match(track) => Ok(Some(track)),
            Reply::NoMatch => Ok(None),
            Reply::Fail => Err(RecognizeError::Transport("connection refused".to_string())),
        }
    }
}

pub const COVER_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];

#[derive(Default)]
pub struct FakeCovers {
    pub fail: Mutex<bool>,
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl CoverSource for FakeCovers {
    async fn fetch_cover(&self, url: &str) -> Result<CoverArt, String> {
        self.fetched.lock().push(url.to_string());
        if *self.fail.lock() {
            return Err("http 404".to_string());
        }
        Ok(CoverArt {
            data: COVER_BYTES.to_vec(),
            mime: Some("image/jpeg".to_string()),
        })
    }
}

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub fields: Vec<(String, String)>,
    pub options: NotifyOptions,
}

impl SentMessage {
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: Mutex<bool>,
    pub sent: Mutex<Vec<SentMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        _target: &NotifyTarget,
        fields: &[(String, String)],
        options: &NotifyOptions,
    ) -> Result<(), String> {
        if *self.fail.lock() {
            return Err("endpoint unreachable".to_string());
        }
        self.sent.lock().push(SentMessage {
            fields: fields.to_vec(),
            options: options.clone(),
        });
        Ok(())
    }
}

/// Every `now()` call moves time forward by `tick`; `sleep` records and advances.
pub struct FakeClock {
    now: Mutex<Instant>,
    tick: Duration,
    pub sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            tick,
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let mut now = self.now.lock();
        *now += self.tick;
        *now
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        *self.now.lock() += duration;
    }
}

pub struct Harness {
    pub recognizer: Arc<FakeRecognizer>,
    pub tags: Arc<JsonTagStore>,
    pub covers: Arc<FakeCovers>,
    pub notifier: Arc<RecordingNotifier>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new() -> Self {
        let recognizer = Arc::new(FakeRecognizer::default());
        let tags = Arc::new(JsonTagStore::default());
        let covers = Arc::new(FakeCovers::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = Pipeline::new(
            recognizer.clone(),
            tags.clone(),
            covers.clone(),
            notifier.clone(),
        );
        Self {
            recognizer,
            tags,
            covers,
            notifier,
            pipeline,
        }
    }
}

pub fn track(artist: &str, title: &str) -> TrackMatch {
    TrackMatch {
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        album: None,
        release_date: None,
        cover_art_url: None,
    }
}
