use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local};
use exif::{Context, Exif, In, Reader, Tag, Value};
use filetime::FileTime;

use crate::gps::{self, Axis};
use crate::raw::{fields, RawMetadata};

use super::MetadataSource;

const OFFSET_TIME_ORIGINAL: Tag = Tag(Context::Exif, 0x9011);
const OFFSET_TIME_DIGITIZED: Tag = Tag(Context::Exif, 0x9012);

/// In-process reader built on kamadak-exif, for when exiftool isn't installed.
///
/// Emits the same group-prefixed keys exiftool would for the subset of
/// fields it understands, plus the `File:` dates from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl ExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for ExifReader {
    fn read(&self, path: &Path) -> RawMetadata {
        let mut raw = RawMetadata::new();

        if let Err(e) = file_fields(path, &mut raw) {
            log::debug!("no file times for {}: {}", path.display(), e);
        }

        match read_exif(path) {
            Ok(exif) => exif_fields(&exif, &mut raw),
            Err(e) => log::debug!("no EXIF in {}: {}", path.display(), e),
        }

        raw
    }
}

fn read_exif(path: &Path) -> anyhow::Result<Exif> {
    let file = File::open(path)?;
    let exif = Reader::new().read_from_container(&mut BufReader::new(file))?;
    Ok(exif)
}

fn file_fields(path: &Path, raw: &mut RawMetadata) -> anyhow::Result<()> {
    let meta = fs::metadata(path)?;
    let mtime = FileTime::from_last_modification_time(&meta);

    #[cfg(unix)]
    let ctime = {
        use std::os::unix::fs::MetadataExt;
        FileTime::from_unix_time(meta.ctime(), meta.ctime_nsec() as u32)
    };
    #[cfg(not(unix))]
    let ctime = mtime;

    if let Some(s) = format_file_time(mtime) {
        raw.insert(fields::FILE_MODIFY_DATE, s);
    }
    if let Some(s) = format_file_time(ctime) {
        raw.insert(fields::FILE_INODE_CHANGE_DATE, s);
    }
    Ok(())
}

/// Local time with offset, as exiftool prints `File:` dates.
fn format_file_time(ft: FileTime) -> Option<String> {
    let utc = DateTime::from_timestamp(ft.unix_seconds(), ft.nanoseconds())?;
    Some(
        utc.with_timezone(&Local)
            .format("%Y:%m:%d %H:%M:%S%:z")
            .to_string(),
    )
}

fn exif_fields(exif: &Exif, raw: &mut RawMetadata) {
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            raw.insert(key, v);
        }
    };

    put(fields::MAKE, ascii(exif, Tag::Make));
    put(fields::MODEL, ascii(exif, Tag::Model));

    let modify = ascii(exif, Tag::DateTime);
    let original = ascii(exif, Tag::DateTimeOriginal);
    let digitized = ascii(exif, Tag::DateTimeDigitized);
    let offset_digitized = ascii(exif, OFFSET_TIME_DIGITIZED);

    put(
        fields::SUBSEC_DATE_TIME_ORIGINAL,
        subsec_composite(
            original.as_deref(),
            ascii(exif, Tag::SubSecTimeOriginal).as_deref(),
            ascii(exif, OFFSET_TIME_ORIGINAL).as_deref(),
        ),
    );
    put(
        fields::SUBSEC_CREATE_DATE,
        subsec_composite(
            digitized.as_deref(),
            ascii(exif, Tag::SubSecTimeDigitized).as_deref(),
            offset_digitized.as_deref(),
        ),
    );

    put(fields::MODIFY_DATE, modify);
    put(fields::DATE_TIME_ORIGINAL, original);
    put(fields::CREATE_DATE, digitized);
    put(fields::OFFSET_TIME_DIGITIZED, offset_digitized);

    let lat = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
    let lon = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);
    let lat_text = lat.map(|v| gps::to_sexagesimal(v, Axis::Latitude));
    let lon_text = lon.map(|v| gps::to_sexagesimal(v, Axis::Longitude));
    if let (Some(la), Some(lo)) = (&lat_text, &lon_text) {
        put(fields::GPS_POSITION, Some(format!("{}, {}", la, lo)));
    }
    put(fields::GPS_LATITUDE, lat_text);
    put(fields::GPS_LONGITUDE, lon_text);
    put(fields::GPS_DATE_TIME, gps_date_time(exif));
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(ref parts) = field.value else {
        return None;
    };
    parts
        .iter()
        .map(|p| String::from_utf8_lossy(p).trim_matches(['\0', ' ']).to_string())
        .find(|s| !s.is_empty())
}

fn rationals(exif: &Exif, tag: Tag) -> Option<Vec<f64>> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Rational(ref v) if !v.is_empty() => Some(v.iter().map(|r| r.to_f64()).collect()),
        _ => None,
    }
}

/// Degrees, minutes, seconds with the hemisphere ref applied.
fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let dms = rationals(exif, value_tag)?;
    let magnitude = dms[0]
        + dms.get(1).copied().unwrap_or(0.0) / 60.0
        + dms.get(2).copied().unwrap_or(0.0) / 3600.0;
    if !magnitude.is_finite() {
        return None;
    }
    match ascii(exif, ref_tag)?.to_ascii_uppercase().as_str() {
        "N" | "E" => Some(magnitude),
        "S" | "W" => Some(-magnitude),
        _ => None,
    }
}

/// exiftool's Composite:GPSDateTime, always UTC.
fn gps_date_time(exif: &Exif) -> Option<String> {
    let date = ascii(exif, Tag::GPSDateStamp)?;
    let hms = rationals(exif, Tag::GPSTimeStamp)?;
    if hms.len() < 3 || hms.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(format!(
        "{} {:02}:{:02}:{:02}Z",
        date, hms[0] as u32, hms[1] as u32, hms[2] as u32
    ))
}

/// Mirrors exiftool's SubSec composites: only present when the base date
/// exists and there is a fraction or an offset to add.
fn subsec_composite(
    base: Option<&str>,
    subsec: Option<&str>,
    offset: Option<&str>,
) -> Option<String> {
    let base = base?;
    if subsec.is_none() && offset.is_none() {
        return None;
    }
    let mut out = base.to_string();
    if let Some(s) = subsec {
        out.push('.');
        out.push_str(s);
    }
    if let Some(o) = offset {
        out.push_str(o);
    }
    Some(out)
}
