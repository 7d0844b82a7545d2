use common::AudioFormat;
use lofty::prelude::ItemKey;
use lofty::tag::TagType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFamily {
    Id3v2,
    VorbisComments,
    Mp4,
}

impl TagFamily {
    pub fn for_format(format: AudioFormat) -> Self {
        match format {
            AudioFormat::Mp3 | AudioFormat::Wav => TagFamily::Id3v2,
            AudioFormat::Flac | AudioFormat::Ogg => TagFamily::VorbisComments,
            AudioFormat::M4a => TagFamily::Mp4,
        }
    }

    pub fn tag_type(self) -> TagType {
        match self {
            TagFamily::Id3v2 => TagType::Id3v2,
            TagFamily::VorbisComments => TagType::VorbisComments,
            TagFamily::Mp4 => TagType::Mp4Ilst,
        }
    }

    /// ID3v2 readers choke on files without a tag, so an empty one gets written on first read.
    pub fn repairs_missing_container(self) -> bool {
        matches!(self, TagFamily::Id3v2)
    }

    fn native_comment_keys(self) -> &'static [&'static str] {
        match self {
            TagFamily::Id3v2 => &["COMM"],
            TagFamily::VorbisComments => &["COMMENT", "DESCRIPTION"],
            TagFamily::Mp4 => &["\u{a9}cmt"],
        }
    }

    /// Items the container itself owns, such as the Vorbis vendor string lofty
    /// surfaces as `EncoderSoftware`. They survive stripping and are not reported.
    pub fn is_container_key(self, key: &ItemKey) -> bool {
        matches!((self, key), (TagFamily::VorbisComments, ItemKey::EncoderSoftware))
    }

    pub fn is_comment_key(self, key: &ItemKey) -> bool {
        match key {
            ItemKey::Comment => true,
            ItemKey::Unknown(name) => {
                let name = name.trim();
                self.native_comment_keys()
                    .iter()
                    .any(|candidate| name.eq_ignore_ascii_case(candidate))
            }
            _ => false,
        }
    }
}

pub(crate) fn is_minimal_key(key: &ItemKey) -> bool {
    matches!(
        key,
        ItemKey::TrackTitle
            | ItemKey::TrackArtist
            | ItemKey::AlbumTitle
            | ItemKey::RecordingDate
            | ItemKey::Year
    )
}
