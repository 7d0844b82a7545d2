use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub const UNKNOWN: &str = "Unknown";
const MAX_COLLISION_SUFFIX: u32 = 10_000;

pub fn safe_component(value: Option<&str>) -> String {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return UNKNOWN.to_string();
    }
    let cleaned = trimmed.replace(['/', '\\'], "_");
    if cleaned.chars().all(|ch| ch == '.') {
        return cleaned.replace('.', "_");
    }
    cleaned
}

pub fn target_file_name(artist: Option<&str>, title: Option<&str>, source: &Path) -> String {
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!(
        "{} - {}{}",
        safe_component(artist),
        safe_component(title),
        extension
    )
}

pub fn relocate(
    path: &Path,
    artist: Option<&str>,
    title: Option<&str>,
    artist_subfolders: bool,
) -> io::Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = if artist_subfolders {
        let dir = parent.join(safe_component(artist));
        fs::create_dir_all(&dir)?;
        dir
    } else {
        parent.to_path_buf()
    };
    let desired = dir.join(target_file_name(artist, title, path));
    move_to(path, &desired)
}

pub fn move_into(path: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name: {}", path.display()),
        )
    })?;
    fs::create_dir_all(dir)?;
    move_to(path, &dir.join(name))
}

/// First of `desired`, `desired (1)`, `desired (2)`, ... that is either free or
/// the source itself.
pub fn free_path(source: &Path, desired: &Path) -> io::Result<PathBuf> {
    for n in 0..=MAX_COLLISION_SUFFIX {
        let candidate = if n == 0 {
            desired.to_path_buf()
        } else {
            with_suffix(desired, n)
        };
        if candidate == source || !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {}", desired.display()),
    ))
}

fn move_to(source: &Path, desired: &Path) -> io::Result<PathBuf> {
    let target = free_path(source, desired)?;
    if target == source {
        debug!("Filename already correct: {}", source.display());
        return Ok(target);
    }
    fs::rename(source, &target)?;
    info!("Moved {} -> {}", source.display(), target.display());
    Ok(target)
}

fn with_suffix(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::{move_into, relocate, safe_component, target_file_name};
    use std::fs;
    use std::path::Path;

    #[test]
    fn builds_name_from_artist_and_title() {
        let name = target_file_name(Some("AC/DC"), Some("Back In Black"), Path::new("x/track01.MP3"));
        assert_eq!(name, "AC_DC - Back In Black.MP3");
    }

    #[test]
    fn missing_parts_become_unknown() {
        assert_eq!(target_file_name(None, Some("  "), Path::new("a.flac")), "Unknown - Unknown.flac");
        assert_eq!(safe_component(Some("..")), "__");
        assert_eq!(safe_component(Some(" Drift ")), "Drift");
    }

    #[test]
    fn renames_alongside_original() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("track01.mp3");
        fs::write(&source, b"audio").unwrap();

        let moved = relocate(&source, Some("Drift"), Some("Neon"), false).unwrap();
        assert_eq!(moved, dir.path().join("Drift - Neon.mp3"));
        assert!(moved.exists());
        assert!(!source.exists());
    }

    #[test]
    fn already_named_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Drift - Neon.mp3");
        fs::write(&source, b"audio").unwrap();

        let moved = relocate(&source, Some("Drift"), Some("Neon"), false).unwrap();
        assert_eq!(moved, source);
        assert_eq!(fs::read(&source).unwrap(), b"audio");
    }

    #[test]
    fn collisions_get_a_counter_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("Drift - Neon.mp3");
        fs::write(&existing, b"first").unwrap();
        let source = dir.path().join("other.mp3");
        fs::write(&source, b"second").unwrap();

        let moved = relocate(&source, Some("Drift"), Some("Neon"), false).unwrap();
        assert_eq!(moved, dir.path().join("Drift - Neon (1).mp3"));
        assert_eq!(fs::read(&existing).unwrap(), b"first");
        assert_eq!(fs::read(&moved).unwrap(), b"second");

        // A second pass over the suffixed file keeps its name.
        let again = relocate(&moved, Some("Drift"), Some("Neon"), false).unwrap();
        assert_eq!(again, moved);
    }

    #[test]
    fn artist_subfolder_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("track.ogg");
        fs::write(&source, b"audio").unwrap();

        let moved = relocate(&source, Some("Drift"), Some("Neon"), true).unwrap();
        assert_eq!(moved, dir.path().join("Drift").join("Drift - Neon.ogg"));
        assert!(moved.exists());
    }

    #[test]
    fn move_into_keeps_basename() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mystery.wav");
        fs::write(&source, b"audio").unwrap();
        let queue = dir.path().join("manual_input");

        let moved = move_into(&source, &queue).unwrap();
        assert_eq!(moved, queue.join("mystery.wav"));
        assert!(!source.exists());
    }
}
