use crate::raw::{fields, RawMetadata};

use super::Timestamps;

/// Which field supplied the resolved creation date, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreationSource {
    CameraCreateDate,
    SubSecDateTimeOriginal,
    SubSecCreateDate,
    DateTimeOriginal,
    ModifyDate,
    MediaCreateDate,
    TrackCreateDate,
    FileModifyDate,
}

/// The competing "original creation" fields for one file, already normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreationCandidates {
    pub camera_create: Option<String>,
    /// Zone offset that belongs to `camera_create`, e.g. `+02:00`.
    pub camera_offset: Option<String>,
    pub subsec_original: Option<String>,
    pub subsec_create: Option<String>,
    pub original: Option<String>,
    pub modify: Option<String>,
    pub media_create: Option<String>,
    pub track_create: Option<String>,
    pub file_modify: Option<String>,
}

impl CreationCandidates {
    pub fn from_timestamps(timestamps: &Timestamps, raw: &RawMetadata) -> Self {
        let get = |field: &str| timestamps.get(field).map(str::to_string);
        Self {
            camera_create: get(fields::CREATE_DATE),
            camera_offset: raw.text(fields::OFFSET_TIME_DIGITIZED),
            subsec_original: get(fields::SUBSEC_DATE_TIME_ORIGINAL),
            subsec_create: get(fields::SUBSEC_CREATE_DATE),
            original: get(fields::DATE_TIME_ORIGINAL),
            modify: get(fields::MODIFY_DATE),
            media_create: get(fields::MEDIA_CREATE_DATE),
            track_create: get(fields::TRACK_CREATE_DATE),
            file_modify: get(fields::FILE_MODIFY_DATE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: String,
    pub source: CreationSource,
}

/// Pick the best original-capture timestamp.
///
/// Device-embedded fields outrank container and filesystem dates, which
/// usually reflect copy time. The camera create date gets its offset field
/// appended unless its time part already carries a zone.
pub fn resolve(c: &CreationCandidates) -> Option<Resolved> {
    if let Some(create) = &c.camera_create {
        let value = match &c.camera_offset {
            Some(offset) if !has_zone(create) => format!("{}{}", create, offset),
            _ => create.clone(),
        };
        return Some(Resolved {
            value,
            source: CreationSource::CameraCreateDate,
        });
    }

    let ordered = [
        (&c.subsec_original, CreationSource::SubSecDateTimeOriginal),
        (&c.subsec_create, CreationSource::SubSecCreateDate),
        (&c.original, CreationSource::DateTimeOriginal),
        (&c.modify, CreationSource::ModifyDate),
        (&c.media_create, CreationSource::MediaCreateDate),
        (&c.track_create, CreationSource::TrackCreateDate),
        (&c.file_modify, CreationSource::FileModifyDate),
    ];
    ordered.into_iter().find_map(|(value, source)| {
        value.as_ref().map(|v| Resolved {
            value: v.clone(),
            source,
        })
    })
}

/// A `Z` suffix or a signed offset after the time. Hyphens in the date part
/// are separators, and a value without a date/time separator has no zone.
fn has_zone(timestamp: &str) -> bool {
    let Some((_, time)) = timestamp.split_once([' ', 'T']) else {
        return false;
    };
    time.ends_with(['Z', 'z']) || time.contains(['+', '-'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_empty_resolves_to_none() {
        assert_eq!(resolve(&CreationCandidates::default()), None);
    }

    #[test]
    fn test_offset_only_is_not_a_date() {
        let c = CreationCandidates {
            camera_offset: s("+02:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c), None);
    }

    #[test]
    fn test_precedence_picks_earliest_present() {
        let c = CreationCandidates {
            subsec_original: s("2021-01-01 00:00:02"),
            modify: s("2021-01-01 00:00:05"),
            track_create: s("2021-01-01 00:00:07"),
            ..Default::default()
        };
        let r = resolve(&c).unwrap();
        assert_eq!(r.value, "2021-01-01 00:00:02");
        assert_eq!(r.source, CreationSource::SubSecDateTimeOriginal);
    }

    #[test]
    fn test_each_fallback_in_turn() {
        let mut c = CreationCandidates {
            file_modify: s("8"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().source, CreationSource::FileModifyDate);
        c.track_create = s("7");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::TrackCreateDate);
        c.media_create = s("6");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::MediaCreateDate);
        c.modify = s("5");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::ModifyDate);
        c.original = s("4");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::DateTimeOriginal);
        c.subsec_create = s("3");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::SubSecCreateDate);
        c.subsec_original = s("2");
        assert_eq!(resolve(&c).unwrap().source, CreationSource::SubSecDateTimeOriginal);
        c.camera_create = s("1");
        let r = resolve(&c).unwrap();
        assert_eq!(r.source, CreationSource::CameraCreateDate);
        assert_eq!(r.value, "1");
    }

    #[test]
    fn test_offset_appended_to_camera_date() {
        let c = CreationCandidates {
            camera_create: s("2023-01-01 10:00:00"),
            camera_offset: s("+02:00"),
            original: s("2020-01-01 00:00:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00+02:00");
    }

    #[test]
    fn test_offset_ignored_when_already_zoned() {
        let c = CreationCandidates {
            camera_create: s("2023-01-01 10:00:00+01:00"),
            camera_offset: s("+02:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00+01:00");

        let c = CreationCandidates {
            camera_create: s("2023-01-01 10:00:00-05:00"),
            camera_offset: s("+02:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00-05:00");

        let c = CreationCandidates {
            camera_create: s("2023-01-01 10:00:00Z"),
            camera_offset: s("+02:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00Z");
    }

    #[test]
    fn test_date_hyphens_are_not_a_zone() {
        let c = CreationCandidates {
            camera_create: s("2019-05-09T10:00:00"),
            camera_offset: s("+02:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2019-05-09T10:00:00+02:00");

        let c = CreationCandidates {
            camera_create: s("2019-05-09"),
            camera_offset: s("-03:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2019-05-09-03:00");
    }

    #[test]
    fn test_offset_never_applies_to_fallbacks() {
        let c = CreationCandidates {
            camera_offset: s("+02:00"),
            original: s("2023-01-01 10:00:00"),
            ..Default::default()
        };
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00");
    }

    #[test]
    fn test_from_timestamps() {
        let raw: RawMetadata = [
            (fields::CREATE_DATE, "2023:01:01 10:00:00"),
            (fields::OFFSET_TIME_DIGITIZED, "+02:00"),
            (fields::FILE_MODIFY_DATE, "2024:02:02 12:00:00+01:00"),
        ]
        .into_iter()
        .collect();
        let ts = Timestamps::from_raw(&raw);
        let c = CreationCandidates::from_timestamps(&ts, &raw);

        assert_eq!(c.camera_create.as_deref(), Some("2023-01-01 10:00:00"));
        assert_eq!(c.camera_offset.as_deref(), Some("+02:00"));
        assert_eq!(c.file_modify.as_deref(), Some("2024-02-02 12:00:00+01:00"));
        assert_eq!(resolve(&c).unwrap().value, "2023-01-01 10:00:00+02:00");
    }
}
