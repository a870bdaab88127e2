pub mod resolve;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::raw::{fields, RawMetadata};

/// `<date> <time>[.fraction][zone]` with any single non-digit date separator.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<y>\d{4})\D(?P<m>\d{2})\D(?P<d>\d{2})\s+(?P<time>\d{2}:\d{2}:\d{2})(?:\.\d+)?\s*(?P<zone>Z|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .unwrap()
});

/// exiftool prints this for date fields a device never filled in
static UNSET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0000\D00\D00").unwrap());

/// Normalize an extractor timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// Date separators become hyphens and a sub-second fraction is dropped.
/// A zone designator (`Z`, `+02:00`, `-0500`) already present is kept
/// after the seconds. Returns `None` if `raw` is not a timestamp.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let caps = TIMESTAMP_RE.captures(raw.trim())?;
    let zone = caps.name("zone").map_or("", |z| z.as_str());
    Some(format!(
        "{}-{}-{} {}{}",
        &caps["y"], &caps["m"], &caps["d"], &caps["time"], zone
    ))
}

/// Normalized values of every timestamp field present in a file's raw metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timestamps(BTreeMap<&'static str, String>);

impl Timestamps {
    pub fn from_raw(raw: &RawMetadata) -> Self {
        let mut out = BTreeMap::new();
        for &field in fields::TIMESTAMPS {
            let Some(value) = raw.text(field) else {
                continue;
            };
            if UNSET_RE.is_match(&value) {
                continue;
            }
            // Unrecognized shapes are kept as reported rather than dropped
            let normalized = normalize_timestamp(&value).unwrap_or(value);
            out.insert(field, normalized);
        }
        Self(out)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_exif_style() {
        assert_eq!(
            normalize_timestamp("2019:05:09 15:47:33").as_deref(),
            Some("2019-05-09 15:47:33")
        );
        assert_eq!(
            normalize_timestamp("2019:05:09 15:47:33.123456").as_deref(),
            Some("2019-05-09 15:47:33")
        );
        assert_eq!(
            normalize_timestamp("2019/05/09 15:47:33.5").as_deref(),
            Some("2019-05-09 15:47:33")
        );
    }

    #[test]
    fn test_normalize_keeps_zone() {
        assert_eq!(
            normalize_timestamp("2023:01:01 10:00:00.42+02:00").as_deref(),
            Some("2023-01-01 10:00:00+02:00")
        );
        assert_eq!(
            normalize_timestamp("2019:05:09 13:47:33Z").as_deref(),
            Some("2019-05-09 13:47:33Z")
        );
        assert_eq!(
            normalize_timestamp("2019:05:09 13:47:33-0500").as_deref(),
            Some("2019-05-09 13:47:33-0500")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "2019:05:09 15:47:33.000001",
            "2023:01:01 10:00:00+02:00",
            "2020.12.31 23:59:59.9Z",
        ] {
            let once = normalize_timestamp(raw).unwrap();
            assert_eq!(normalize_timestamp(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_normalize_rejects_non_timestamps() {
        assert_eq!(normalize_timestamp(""), None);
        assert_eq!(normalize_timestamp("2019:05:09"), None);
        assert_eq!(normalize_timestamp("yesterday at noon"), None);
        assert_eq!(normalize_timestamp("2019:05:09 15:47"), None);
    }

    #[test]
    fn test_timestamps_from_raw() {
        let raw: RawMetadata = [
            (fields::DATE_TIME_ORIGINAL, "2019:05:09 15:47:33"),
            (fields::SUBSEC_CREATE_DATE, "2019:05:09 15:47:33.12+02:00"),
            (fields::MEDIA_CREATE_DATE, "0000:00:00 00:00:00"),
            (fields::MODIFY_DATE, "not a date"),
            (fields::MODEL, "2019:05:09 15:47:33"),
        ]
        .into_iter()
        .collect();

        let ts = Timestamps::from_raw(&raw);
        assert_eq!(ts.get(fields::DATE_TIME_ORIGINAL), Some("2019-05-09 15:47:33"));
        assert_eq!(
            ts.get(fields::SUBSEC_CREATE_DATE),
            Some("2019-05-09 15:47:33+02:00")
        );
        assert_eq!(ts.get(fields::MEDIA_CREATE_DATE), None);
        assert_eq!(ts.get(fields::MODIFY_DATE), Some("not a date"));
        assert_eq!(ts.get(fields::MODEL), None);
        assert_eq!(ts.get(fields::GPS_DATE_TIME), None);
    }
}
