mod family;

use std::path::{Path, PathBuf};

use common::AudioFormat;
use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::file::TaggedFile;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, ItemKey, TagExt, TaggedFileExt};
use lofty::tag::{ItemValue, Tag, TagItem, TagType};
use tracing::debug;

pub use family::TagFamily;
use family::is_minimal_key;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
}

impl TagFields {
    pub fn has_minimal(&self) -> bool {
        is_present(&self.title) && is_present(&self.artist)
    }
}

#[derive(Debug, Default, Clone)]
pub struct TagInfo {
    pub fields: TagFields,
    pub comments: Vec<String>,
    pub extra_fields: Vec<String>,
    pub has_embedded_cover: bool,
}

#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
    Unsupported(PathBuf),
    NoTag(TagType),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
            MetadataError::Unsupported(path) => {
                write!(f, "unsupported audio format: {}", path.display())
            }
            MetadataError::NoTag(tag_type) => {
                write!(f, "file cannot hold a {:?} tag", tag_type)
            }
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub trait TagStore: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<TagInfo, MetadataError>;

    /// Sets every field that is `Some`; `None` leaves the existing value alone.
    fn write_tags(&self, path: &Path, fields: &TagFields) -> Result<(), MetadataError>;

    fn strip_to_minimal(&self, path: &Path) -> Result<TagFields, MetadataError>;

    fn embed_cover_art(&self, path: &Path, cover: &CoverArt) -> Result<(), MetadataError>;

    fn add_comment(&self, path: &Path, text: &str) -> Result<(), MetadataError>;

    fn comments(&self, path: &Path) -> Result<Vec<String>, MetadataError>;

    fn has_comment_containing(&self, path: &Path, token: &str) -> Result<bool, MetadataError> {
        let needle = token.to_lowercase();
        let comments = self.comments(path)?;
        Ok(comments
            .iter()
            .any(|comment| comment.to_lowercase().contains(&needle)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagStore;

impl LoftyTagStore {
    fn open(&self, path: &Path) -> Result<(TaggedFile, TagFamily), MetadataError> {
        let format = AudioFormat::from_path(path)
            .ok_or_else(|| MetadataError::Unsupported(path.to_path_buf()))?;
        let tagged_file = lofty::read_from_path(path)?;
        Ok((tagged_file, TagFamily::for_format(format)))
    }
}

impl TagStore for LoftyTagStore {
    fn read_tags(&self, path: &Path) -> Result<TagInfo, MetadataError> {
        let (tagged_file, family) = self.open(path)?;
        let mut info = TagInfo {
            fields: fields_of(&tagged_file, family),
            comments: collect_comments(&tagged_file, family),
            ..TagInfo::default()
        };
        for tag in tagged_file.tags() {
            if !tag.pictures().is_empty() {
                info.has_embedded_cover = true;
            }
            for item in tag.items() {
                if !is_minimal_key(item.key()) && !family.is_container_key(item.key()) {
                    info.extra_fields.push(format!("{:?}", item.key()));
                }
            }
        }
        Ok(info)
    }

    fn write_tags(&self, path: &Path, fields: &TagFields) -> Result<(), MetadataError> {
        let (mut tagged_file, family) = self.open(path)?;
        let tag = writable_tag(&mut tagged_file, family)?;
        apply_fields(tag, fields);
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }

    fn strip_to_minimal(&self, path: &Path) -> Result<TagFields, MetadataError> {
        let (mut tagged_file, family) = self.open(path)?;
        let kept = fields_of(&tagged_file, family);

        let foreign: Vec<TagType> = tagged_file
            .tags()
            .iter()
            .map(|tag| tag.tag_type())
            .filter(|tag_type| *tag_type != family.tag_type())
            .collect();
        for tag_type in foreign {
            debug!("Removing {:?} tag from {}", tag_type, path.display());
            tag_type.remove_from_path(path)?;
        }

        let tag = writable_tag(&mut tagged_file, family)?;
        tag.retain(|item| is_minimal_key(item.key()) || family.is_container_key(item.key()));
        apply_fields(tag, &kept);
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(kept)
    }

    fn embed_cover_art(&self, path: &Path, cover: &CoverArt) -> Result<(), MetadataError> {
        let (mut tagged_file, family) = self.open(path)?;
        let tag = writable_tag(&mut tagged_file, family)?;
        let mime = cover
            .mime
            .clone()
            .or_else(|| guess_mime(&cover.data))
            .unwrap_or_else(|| "image/jpeg".to_string());
        let picture = Picture::new_unchecked(
            PictureType::CoverFront,
            Some(mime_type(&mime)),
            Some("Cover".to_string()),
            cover.data.clone(),
        );
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(picture);
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }

    fn add_comment(&self, path: &Path, text: &str) -> Result<(), MetadataError> {
        let (mut tagged_file, family) = self.open(path)?;
        let tag = writable_tag(&mut tagged_file, family)?;
        // Pushed, not inserted, so existing comments survive.
        tag.push(TagItem::new(ItemKey::Comment, ItemValue::Text(text.to_string())));
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }

    fn comments(&self, path: &Path) -> Result<Vec<String>, MetadataError> {
        let (mut tagged_file, family) = self.open(path)?;
        if family.repairs_missing_container() && tagged_file.tag(family.tag_type()).is_none() {
            tagged_file.insert_tag(Tag::new(family.tag_type()));
            if let Some(tag) = tagged_file.tag(family.tag_type()) {
                if let Err(err) = tag.save_to_path(path, WriteOptions::default()) {
                    debug!("Failed to persist empty tag for {}: {}", path.display(), err);
                }
            }
        }
        Ok(collect_comments(&tagged_file, family))
    }
}

pub fn guess_mime(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png".to_string())
    } else {
        None
    }
}

fn writable_tag(tagged_file: &mut TaggedFile, family: TagFamily) -> Result<&mut Tag, MetadataError> {
    let tag_type = family.tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    tagged_file
        .tag_mut(tag_type)
        .ok_or(MetadataError::NoTag(tag_type))
}

fn fields_of(tagged_file: &TaggedFile, family: TagFamily) -> TagFields {
    let tag = match tagged_file
        .tag(family.tag_type())
        .or_else(|| tagged_file.primary_tag())
        .or_else(|| tagged_file.first_tag())
    {
        Some(tag) => tag,
        None => return TagFields::default(),
    };
    TagFields {
        title: clean_text(tag.title().map(|v| v.to_string())),
        artist: clean_text(tag.artist().map(|v| v.to_string())),
        album: clean_text(tag.album().map(|v| v.to_string())),
        date: clean_text(
            tag.get_string(&ItemKey::RecordingDate)
                .or_else(|| tag.get_string(&ItemKey::Year))
                .map(|v| v.to_string()),
        ),
    }
}

fn apply_fields(tag: &mut Tag, fields: &TagFields) {
    if let Some(title) = fields.title.as_deref() {
        tag.insert_text(ItemKey::TrackTitle, title.to_string());
    }
    if let Some(artist) = fields.artist.as_deref() {
        tag.insert_text(ItemKey::TrackArtist, artist.to_string());
    }
    if let Some(album) = fields.album.as_deref() {
        tag.insert_text(ItemKey::AlbumTitle, album.to_string());
    }
    if let Some(date) = fields.date.as_deref() {
        tag.insert_text(ItemKey::RecordingDate, date.to_string());
    }
}

fn collect_comments(tagged_file: &TaggedFile, family: TagFamily) -> Vec<String> {
    let mut out = Vec::new();
    for tag in tagged_file.tags() {
        for item in tag.items() {
            if !family.is_comment_key(item.key()) {
                continue;
            }
            if let Some(text) = item.value().text() {
                out.push(text.to_string());
            }
        }
    }
    // Some containers only surface their comment through the generic accessor.
    if let Some(tag) = tagged_file.primary_tag() {
        if let Some(comment) = tag.comment() {
            if !out.iter().any(|existing| existing.as_str() == comment.as_ref()) {
                out.push(comment.to_string());
            }
        }
    }
    out
}

fn mime_type(value: &str) -> MimeType {
    match value.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => MimeType::Jpeg,
        "image/png" => MimeType::Png,
        "image/gif" => MimeType::Gif,
        "image/bmp" => MimeType::Bmp,
        "image/tiff" => MimeType::Tiff,
        other => MimeType::Unknown(other.to_string()),
    }
}

fn is_present(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
