use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::gps::GpsPosition;
use crate::record::ImageRecord;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    filename          TEXT NOT NULL,
    path              TEXT NOT NULL PRIMARY KEY,
    sha256            TEXT,
    model             TEXT,
    vendor            TEXT,
    create_inode      TEXT,
    create_orig       TEXT,
    gps_position      TEXT,
    gps_latitude      TEXT,
    gps_longitude     TEXT,
    gps_time          TEXT,
    gps_position_dec  TEXT,
    gps_latitude_dec  TEXT,
    gps_longitude_dec TEXT
);
"#;

const INSERT: &str = "INSERT INTO images (
    filename, path, sha256, model, vendor, create_inode, create_orig,
    gps_position, gps_latitude, gps_longitude, gps_time,
    gps_position_dec, gps_latitude_dec, gps_longitude_dec
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

const SELECT: &str = "SELECT
    filename, path, sha256, model, vendor, create_inode, create_orig,
    gps_position, gps_latitude, gps_longitude, gps_time,
    gps_position_dec, gps_latitude_dec, gps_longitude_dec
FROM images";

/// Handle to the image catalog. Opened once per run, closed on drop.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create the catalog file; the table is created if missing.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening catalog {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert every record in path order, all or nothing.
    ///
    /// A path that is already catalogued is a constraint violation: the whole
    /// batch is rolled back and the error names the offending path.
    pub fn insert_batch(&mut self, batch: &BTreeMap<String, ImageRecord>) -> anyhow::Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT)?;
            for rec in batch.values() {
                stmt.execute(params![
                    rec.filename,
                    rec.path,
                    rec.sha256,
                    rec.model,
                    rec.vendor,
                    rec.create_inode,
                    rec.create_orig,
                    rec.gps_position,
                    rec.gps_latitude,
                    rec.gps_longitude,
                    rec.gps_time,
                    rec.gps_position_dec.map(|p| p.to_string()),
                    rec.gps_latitude_dec.map(|v| v.to_string()),
                    rec.gps_longitude_dec.map(|v| v.to_string()),
                ])
                .with_context(|| format!("inserting {}", rec.path))?;
            }
        }
        tx.commit()?;
        Ok(batch.len())
    }

    pub fn get(&self, path: &str) -> anyhow::Result<Option<ImageRecord>> {
        let rec = self
            .conn
            .query_row(&format!("{} WHERE path = ?1", SELECT), [path], row_to_record)
            .optional()?;
        Ok(rec)
    }

    pub fn count(&self) -> anyhow::Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// All records ordered by path.
    pub fn all(&self) -> anyhow::Result<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY path", SELECT))?;
        let rows = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Decimal columns hold text; anything unparsable reads back as absent.
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    let position: Option<String> = row.get(11)?;
    let latitude: Option<String> = row.get(12)?;
    let longitude: Option<String> = row.get(13)?;
    Ok(ImageRecord {
        filename: row.get(0)?,
        path: row.get(1)?,
        sha256: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        model: row.get(3)?,
        vendor: row.get(4)?,
        create_inode: row.get(5)?,
        create_orig: row.get(6)?,
        gps_position: row.get(7)?,
        gps_latitude: row.get(8)?,
        gps_longitude: row.get(9)?,
        gps_time: row.get(10)?,
        gps_position_dec: position.and_then(|s| s.parse::<GpsPosition>().ok()),
        gps_latitude_dec: latitude.and_then(|s| s.parse().ok()),
        gps_longitude_dec: longitude.and_then(|s| s.parse().ok()),
    })
}

/// True if `err` (or anything in its chain) is a SQLite constraint violation.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(path: &str) -> ImageRecord {
        ImageRecord {
            filename: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            sha256: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".to_string(),
            model: Some("Pixel 3".to_string()),
            vendor: None,
            create_inode: Some("2020-01-02 03:04:05+01:00".to_string()),
            create_orig: Some("2019-05-09 15:47:33".to_string()),
            gps_position: Some(r#"48 deg 51' 29.50" N, 2 deg 17' 40.20" E"#.to_string()),
            gps_latitude: Some(r#"48 deg 51' 29.50" N"#.to_string()),
            gps_longitude: Some(r#"2 deg 17' 40.20" E"#.to_string()),
            gps_time: None,
            gps_position_dec: Some(GpsPosition {
                latitude: 48.858194444444444,
                longitude: 2.2945,
            }),
            gps_latitude_dec: Some(48.858194444444444),
            gps_longitude_dec: Some(2.2945),
        }
    }

    fn batch(paths: &[&str]) -> BTreeMap<String, ImageRecord> {
        paths.iter().map(|p| (p.to_string(), record(p))).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let mut cat = Catalog::open_in_memory().unwrap();
        assert_eq!(cat.insert_batch(&batch(&["b/2.jpg", "a/1.jpg"])).unwrap(), 2);
        assert_eq!(cat.count().unwrap(), 2);

        let got = cat.get("a/1.jpg").unwrap().unwrap();
        assert_eq!(got, record("a/1.jpg"));
        assert!(cat.get("c/3.jpg").unwrap().is_none());

        let all: Vec<String> = cat.all().unwrap().into_iter().map(|r| r.path).collect();
        assert_eq!(all, vec!["a/1.jpg", "b/2.jpg"]);
    }

    #[test]
    fn test_absent_fields_round_trip_as_none() {
        let mut cat = Catalog::open_in_memory().unwrap();
        let mut rec = record("bare.png");
        rec.model = None;
        rec.create_orig = None;
        rec.gps_position = None;
        rec.gps_position_dec = None;
        rec.gps_latitude = None;
        rec.gps_latitude_dec = None;
        let b: BTreeMap<_, _> = [(rec.path.clone(), rec.clone())].into_iter().collect();
        cat.insert_batch(&b).unwrap();
        assert_eq!(cat.get("bare.png").unwrap().unwrap(), rec);
    }

    #[test]
    fn test_duplicate_path_rolls_back_batch() {
        let mut cat = Catalog::open_in_memory().unwrap();
        cat.insert_batch(&batch(&["b.jpg"])).unwrap();

        let err = cat.insert_batch(&batch(&["a.jpg", "b.jpg", "c.jpg"])).unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(format!("{:#}", err).contains("b.jpg"));

        // "a.jpg" went in before the failure but was rolled back
        assert_eq!(cat.count().unwrap(), 1);
        assert!(cat.get("a.jpg").unwrap().is_none());
    }

    #[test]
    fn test_schema_created_once_per_file() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("sub/images.db");
        {
            let mut cat = Catalog::open(&db).unwrap();
            cat.insert_batch(&batch(&["x.jpg"])).unwrap();
        }
        let cat = Catalog::open(&db).unwrap();
        assert_eq!(cat.count().unwrap(), 1);
        assert_eq!(cat.get("x.jpg").unwrap().unwrap(), record("x.jpg"));
    }
}
