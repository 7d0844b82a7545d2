use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use common::TrackMatch;
use pipeline::{RecognizeError, Recognizer};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRecognizer {
    pub fn new(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(&self, path: &Path) -> Result<Option<TrackMatch>, RecognizeError> {
        let audio = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!("Uploading {} bytes of '{}'", audio.len(), file_name);
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("X-Filename", file_name)
            .body(audio)
            .send()
            .await
            .map_err(|err| RecognizeError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RecognizeError::Status(response.status().as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| RecognizeError::Transport(err.to_string()))?;
        track_match_from_response(&body)
    }
}

#[derive(Deserialize)]
struct RecognitionResponse {
    #[serde(default)]
    track: Option<RecognizedTrack>,
}

#[derive(Deserialize)]
struct RecognizedTrack {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    sections: Vec<TrackSection>,
    images: Option<TrackImages>,
}

#[derive(Deserialize)]
struct TrackSection {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    metadata: Vec<SectionMetadata>,
}

#[derive(Deserialize)]
struct SectionMetadata {
    text: Option<String>,
}

#[derive(Deserialize)]
struct TrackImages {
    coverart: Option<String>,
}

/// Album is the first metadata entry of the first `SONG` section and the release
/// date the third; missing entries are simply `None`.
pub fn track_match_from_response(body: &[u8]) -> Result<Option<TrackMatch>, RecognizeError> {
    let response: RecognitionResponse =
        serde_json::from_slice(body).map_err(|err| RecognizeError::Decode(err.to_string()))?;
    let Some(track) = response.track else {
        return Ok(None);
    };

    let song = track
        .sections
        .iter()
        .find(|section| section.kind.as_deref() == Some("SONG"));
    let ordinal = |index: usize| {
        song.and_then(|section| section.metadata.get(index))
            .and_then(|entry| entry.text.clone())
    };

    Ok(Some(TrackMatch {
        album: ordinal(0),
        release_date: ordinal(2),
        title: track.title,
        artist: track.subtitle,
        cover_art_url: track.images.and_then(|images| images.coverart),
    }))
}
