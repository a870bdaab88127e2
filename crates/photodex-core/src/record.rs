use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::date::resolve::{self, CreationCandidates};
use crate::date::Timestamps;
use crate::gps::{self, GpsPosition};
use crate::hash;
use crate::raw::{fields, RawMetadata};
use crate::source::MetadataSource;

/// One catalogued file, as stored in the `images` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Just the filename
    pub filename: String,
    /// Path as found during discovery; the record's identity
    pub path: String,
    /// SHA-256 of the content, lowercase hex
    pub sha256: String,
    pub model: Option<String>,
    pub vendor: Option<String>,
    /// Inode change time
    pub create_inode: Option<String>,
    /// Best original-capture time
    pub create_orig: Option<String>,
    pub gps_position: Option<String>,
    pub gps_latitude: Option<String>,
    pub gps_longitude: Option<String>,
    pub gps_time: Option<String>,
    pub gps_position_dec: Option<GpsPosition>,
    pub gps_latitude_dec: Option<f64>,
    pub gps_longitude_dec: Option<f64>,
}

impl ImageRecord {
    /// Pure transform of raw metadata into a canonical record.
    pub fn from_raw(path: &str, sha256: String, raw: &RawMetadata) -> Self {
        let filename = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();

        let timestamps = Timestamps::from_raw(raw);
        let candidates = CreationCandidates::from_timestamps(&timestamps, raw);
        let resolved = resolve::resolve(&candidates);
        if let Some(r) = &resolved {
            log::debug!("{}: creation date {} from {:?}", path, r.value, r.source);
        }

        let gps_position = raw.text(fields::GPS_POSITION);
        let gps_latitude = raw.text(fields::GPS_LATITUDE);
        let gps_longitude = raw.text(fields::GPS_LONGITUDE);

        Self {
            filename,
            path: path.to_string(),
            sha256,
            model: raw.text(fields::MODEL),
            vendor: raw.text(fields::MAKE),
            create_inode: timestamps
                .get(fields::FILE_INODE_CHANGE_DATE)
                .map(str::to_string),
            create_orig: resolved.map(|r| r.value),
            gps_position_dec: gps_position.as_deref().and_then(gps::parse_position),
            gps_latitude_dec: gps_latitude.as_deref().and_then(gps::parse_coordinate),
            gps_longitude_dec: gps_longitude.as_deref().and_then(gps::parse_coordinate),
            gps_position,
            gps_latitude,
            gps_longitude,
            gps_time: timestamps.get(fields::GPS_DATE_TIME).map(str::to_string),
        }
    }
}

/// Extract, hash and normalize one file. Fails only if the content can't be hashed.
pub fn build_record(path: &Path, source: &dyn MetadataSource) -> anyhow::Result<ImageRecord> {
    let raw = source.read(path);
    let sha256 = hash::sha256_file(path)?;
    Ok(ImageRecord::from_raw(&path.to_string_lossy(), sha256, &raw))
}
