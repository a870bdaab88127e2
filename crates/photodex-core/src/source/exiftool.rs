use std::path::{Path, PathBuf};
use std::process::Command;

use crate::raw::{RawMetadata, RawValue};

use super::MetadataSource;

/// Runs `exiftool -j -G <file>` per file and keeps scalar fields.
#[derive(Debug, Clone)]
pub struct ExifTool {
    bin: PathBuf,
}

impl ExifTool {
    /// Check that the binary runs; returns `None` if it doesn't.
    pub fn probe(bin: &Path) -> Option<Self> {
        let output = Command::new(bin).arg("-ver").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        log::debug!("found exiftool {} at {}", version, bin.display());
        Some(Self {
            bin: bin.to_path_buf(),
        })
    }

    fn run(&self, path: &Path) -> anyhow::Result<RawMetadata> {
        let output = Command::new(&self.bin)
            .args(["-j", "-G"])
            .arg(path)
            .output()?;

        // exiftool exits 1 for files it can't parse but still prints what it knows
        if output.stdout.is_empty() {
            anyhow::bail!(
                "exiftool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_json(&output.stdout)
    }
}

impl MetadataSource for ExifTool {
    fn read(&self, path: &Path) -> RawMetadata {
        match self.run(path) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("exiftool failed on {}: {:#}", path.display(), e);
                RawMetadata::new()
            }
        }
    }
}

/// exiftool's `-j` output is an array with one object per file.
fn parse_json(stdout: &[u8]) -> anyhow::Result<RawMetadata> {
    let value: serde_json::Value = serde_json::from_slice(stdout)?;
    let Some(object) = value
        .as_array()
        .and_then(|a| a.first())
        .and_then(|v| v.as_object())
    else {
        return Ok(RawMetadata::new());
    };

    Ok(object
        .iter()
        .filter_map(|(key, v)| match v {
            serde_json::Value::String(s) => Some((key.clone(), RawValue::Text(s.clone()))),
            serde_json::Value::Number(n) => Some((key.clone(), RawValue::Number(n.clone()))),
            _ => None,
        })
        .collect())
}
