use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// Bytes read from the start of each file for type detection.
const SNIFF_LEN: u64 = 8192;

/// MIME type of a file, detected from its content.
///
/// Magic bytes decide first. Unrecognized content is `text/plain` when it
/// reads as text; otherwise the extension is the last resort.
pub fn mime_type(path: &Path) -> anyhow::Result<String> {
    let mut head = Vec::new();
    File::open(path)
        .and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head))
        .with_context(|| format!("reading {} to detect its type", path.display()))?;
    Ok(sniff(&head, path))
}

fn sniff(head: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if head.is_empty() {
        return "inode/x-empty".to_string();
    }
    if looks_like_text(head) {
        return "text/plain".to_string();
    }
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// UTF-8 without NULs. A character cut off at the sniff boundary is allowed.
fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Case-insensitive substring match of `filter` against the type's first
/// `;`-delimited token, so `image` matches `image/jpeg; charset=binary`.
pub fn mime_matches(mime: &str, filter: &str) -> bool {
    let head = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    head.contains(&filter.to_lowercase())
}

/// Every regular file under `root` whose MIME type matches `filter`, sorted by path.
pub fn discover_files(root: &Path, filter: &str) -> anyhow::Result<Vec<PathBuf>> {
    if !root.exists() {
        anyhow::bail!("{} does not exist", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match mime_type(path) {
            Ok(mime) if mime_matches(&mime, filter) => files.push(path.to_path_buf()),
            Ok(mime) => log::trace!("{} ({}) filtered out", path.display(), mime),
            Err(e) => log::warn!("skipping {:#}", e),
        }
    }

    files.sort();
    Ok(files)
}
