pub mod date;
pub mod discover;
pub mod gps;
pub mod hash;
pub mod raw;
pub mod record;
pub mod source;
pub mod store;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use record::ImageRecord;
pub use source::{Extractor, MetadataSource};
pub use store::Catalog;

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_database() -> PathBuf {
    PathBuf::from("images.db")
}

fn default_mime_filter() -> String {
    "image".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Directory (or single file) to scan
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// SQLite catalog file
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Case-insensitive MIME type substring, e.g. "image" or "image/jpeg"
    #[serde(default = "default_mime_filter")]
    pub mime_filter: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            root: default_root(),
            database: default_database(),
            mime_filter: default_mime_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexResult {
    /// Files matching the MIME filter
    pub discovered: u64,
    /// Records written to the catalog
    pub indexed: u64,
    /// Files skipped because their content couldn't be read
    pub failed: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

/// Records keyed by path, plus the files that couldn't be recorded.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: BTreeMap<String, ImageRecord>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Build a record for every path. Unhashable files are reported and skipped;
/// a repeated path replaces the earlier record.
pub fn build_batch(
    paths: &[PathBuf],
    source: &dyn MetadataSource,
    progress: &ProgressCallback<'_>,
) -> Batch {
    let total = paths.len() as u64;
    let mut batch = Batch::default();

    for (i, path) in paths.iter().enumerate() {
        progress("extract", i as u64, total, &path.display().to_string());
        match record::build_record(path, source) {
            Ok(rec) => {
                if let Some(old) = batch.records.insert(rec.path.clone(), rec) {
                    log::warn!("{} seen twice, keeping the later record", old.path);
                }
            }
            Err(e) => {
                log::warn!("skipping {}: {:#}", path.display(), e);
                batch.failures.push((path.clone(), format!("{:#}", e)));
            }
        }
    }
    progress(
        "extract",
        total,
        total,
        &format!("{} records built", batch.records.len()),
    );

    batch
}

/// Scan `options.root`, build the batch, then flush it into `catalog` in one go.
///
/// Per-file failures end up in the result's warnings; a catalog error
/// (e.g. a path that is already indexed) aborts the run.
pub fn index(
    options: &IndexOptions,
    catalog: &mut Catalog,
    source: &dyn MetadataSource,
    progress: &ProgressCallback<'_>,
) -> anyhow::Result<IndexResult> {
    // Stage 1: discover
    let paths = discover::discover_files(&options.root, &options.mime_filter)?;
    progress(
        "discover",
        paths.len() as u64,
        paths.len() as u64,
        &format!("{} files match '{}'", paths.len(), options.mime_filter),
    );

    // Stage 2: extract + normalize
    let batch = build_batch(&paths, source, progress);

    // Stage 3: persist
    let total = batch.records.len() as u64;
    progress(
        "store",
        0,
        total,
        &format!("writing {}", options.database.display()),
    );
    let indexed = catalog.insert_batch(&batch.records)? as u64;
    progress("store", indexed, total, "committed");

    Ok(IndexResult {
        discovered: paths.len() as u64,
        indexed,
        failed: batch.failures.len() as u64,
        warnings: batch
            .failures
            .into_iter()
            .map(|(path, e)| format!("{}: {}", path.display(), e))
            .collect(),
    })
}
