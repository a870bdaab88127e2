pub mod exif;
pub mod exiftool;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::raw::RawMetadata;

pub use self::exif::ExifReader;
pub use self::exiftool::ExifTool;

/// Anything that can turn a file into raw metadata fields.
///
/// Implementations never fail: unsupported or unreadable files yield an
/// empty (or partial) map, since missing fields are the normal case.
pub trait MetadataSource {
    fn read(&self, path: &Path) -> RawMetadata;
}

/// Which extraction engine to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Extractor {
    /// exiftool if it is installed, otherwise the built-in EXIF reader
    #[default]
    Auto,
    /// External `exiftool` process
    Exiftool,
    /// Built-in EXIF reader
    Exif,
}

impl Extractor {
    /// Build the configured source. `exiftool_bin` is only used by the
    /// exiftool-backed variants.
    pub fn build(self, exiftool_bin: &Path) -> anyhow::Result<Box<dyn MetadataSource>> {
        match self {
            Extractor::Exif => Ok(Box::new(ExifReader::new())),
            Extractor::Exiftool => match ExifTool::probe(exiftool_bin) {
                Some(tool) => Ok(Box::new(tool)),
                None => anyhow::bail!("exiftool not found at {}", exiftool_bin.display()),
            },
            Extractor::Auto => match ExifTool::probe(exiftool_bin) {
                Some(tool) => Ok(Box::new(tool)),
                None => {
                    log::info!("exiftool unavailable, using built-in EXIF reader");
                    Ok(Box::new(ExifReader::new()))
                }
            },
        }
    }
}
