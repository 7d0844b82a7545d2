use std::env;
use std::path::PathBuf;

use metadata::{LoftyTagStore, TagStore};
use pipeline::marker::is_marked;
use pipeline::scan_folder;
use pipeline::settings::DEFAULT_MARKER_TOKEN;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let folder = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: marker_report <folder> [token]")?;
    let token = args.next().unwrap_or_else(|| DEFAULT_MARKER_TOKEN.to_string());

    let store = LoftyTagStore;
    let candidates = scan_folder(&folder)?;
    let mut marked = 0;
    for candidate in &candidates {
        let done = is_marked(&store, &candidate.path, &token);
        if done {
            marked += 1;
        }
        let fields = match store.read_tags(&candidate.path) {
            Ok(info) => info.fields,
            Err(err) => {
                debug!("Cannot read tags from {}: {}", candidate.path.display(), err);
                Default::default()
            }
        };
        println!(
            "{}\t{}\tartist={}\ttitle={}\talbum={}\tdate={}",
            if done { "marked" } else { "open" },
            candidate.file_name(),
            fields.artist.as_deref().unwrap_or("-"),
            fields.title.as_deref().unwrap_or("-"),
            fields.album.as_deref().unwrap_or("-"),
            fields.date.as_deref().unwrap_or("-"),
        );
    }

    println!(
        "{} files, {} marked, {} open",
        candidates.len(),
        marked,
        candidates.len() - marked
    );
    Ok(())
}
