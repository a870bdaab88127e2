use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field names as reported by exiftool with `-G` (group-prefixed).
/// The in-process reader emits the same keys for the fields it recovers.
pub mod fields {
    pub const MODEL: &str = "EXIF:Model";
    pub const MAKE: &str = "EXIF:Make";

    pub const FILE_MODIFY_DATE: &str = "File:FileModifyDate";
    pub const FILE_INODE_CHANGE_DATE: &str = "File:FileInodeChangeDate";
    pub const CREATE_DATE: &str = "EXIF:CreateDate";
    pub const OFFSET_TIME_DIGITIZED: &str = "EXIF:OffsetTimeDigitized";
    pub const SUBSEC_DATE_TIME_ORIGINAL: &str = "Composite:SubSecDateTimeOriginal";
    pub const SUBSEC_CREATE_DATE: &str = "Composite:SubSecCreateDate";
    pub const DATE_TIME_ORIGINAL: &str = "EXIF:DateTimeOriginal";
    pub const MODIFY_DATE: &str = "EXIF:ModifyDate";
    pub const MEDIA_CREATE_DATE: &str = "QuickTime:CreateDate";
    pub const TRACK_CREATE_DATE: &str = "QuickTime:TrackCreateDate";
    pub const GPS_DATE_TIME: &str = "Composite:GPSDateTime";

    pub const GPS_POSITION: &str = "Composite:GPSPosition";
    pub const GPS_LATITUDE: &str = "Composite:GPSLatitude";
    pub const GPS_LONGITUDE: &str = "Composite:GPSLongitude";

    /// Every field that carries a timestamp and goes through the date normalizer.
    pub const TIMESTAMPS: &[&str] = &[
        FILE_MODIFY_DATE,
        FILE_INODE_CHANGE_DATE,
        CREATE_DATE,
        SUBSEC_DATE_TIME_ORIGINAL,
        SUBSEC_CREATE_DATE,
        DATE_TIME_ORIGINAL,
        MODIFY_DATE,
        MEDIA_CREATE_DATE,
        TRACK_CREATE_DATE,
        GPS_DATE_TIME,
    ];
}

/// A single raw value: extractors report either strings or JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

/// Unstructured field -> value mapping for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMetadata(BTreeMap<String, RawValue>);

impl RawMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    /// Value rendered as text, with blank strings treated as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        let s = self.0.get(key)?.to_string();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
