use std::path::Path;

use metadata::{MetadataError, TagStore};
use tracing::debug;

/// Files that cannot be read count as unmarked.
pub fn is_marked(tags: &dyn TagStore, path: &Path, token: &str) -> bool {
    match tags.has_comment_containing(path, token) {
        Ok(marked) => marked,
        Err(err) => {
            debug!("Treating {} as unmarked: {}", path.display(), err);
            false
        }
    }
}

pub fn stamp(tags: &dyn TagStore, path: &Path, token: &str) -> Result<(), MetadataError> {
    tags.add_comment(path, token)
}

#[cfg(test)]
mod tests {
    use super::{is_marked, stamp};
    use crate::test_support::{write_fake, FakeTags, JsonTagStore};

    #[test]
    fn stamped_file_is_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        write_fake(&path, &FakeTags::default());
        let store = JsonTagStore::default();

        assert!(!is_marked(&store, &path, "roybatty"));
        stamp(&store, &path, "roybatty").unwrap();
        assert!(is_marked(&store, &path, "roybatty"));
    }

    #[test]
    fn marker_match_ignores_case_and_surrounding_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.flac");
        write_fake(
            &path,
            &FakeTags {
                comments: vec!["processed by RoyBatty v2".to_string()],
                ..FakeTags::default()
            },
        );
        assert!(is_marked(&JsonTagStore::default(), &path, "roybatty"));
    }

    #[test]
    fn unreadable_file_is_unmarked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(!is_marked(&JsonTagStore::default(), &path, "roybatty"));
        assert!(!is_marked(&JsonTagStore::default(), &dir.path().join("missing.mp3"), "roybatty"));
    }
}
