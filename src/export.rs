//! Tab separated result files.

use crate::error::Result;
use crate::statistics::StatisticsRecord;
use crate::track::{TrackRow, TrackSet};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const RESULTS_HEADER: [&str; 8] = [
    "video",
    "date",
    "symbiont",
    "dpf",
    "dpi",
    "average velocity [px/s]",
    "total distance",
    "average static time",
];

pub const TRACK_POINTS_HEADER: [&str; 5] = ["frame", "track", "x", "y", "distance"];

fn tsv_writer<W: Write>(writer: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

/*-----------------------------------------------------------------------------
ResultsTable
-----------------------------------------------------------------------------*/

/// Append-only results table shared by every video of a batch.
///
/// Rows are written whole under a lock, so several pipelines can append
/// concurrently through a shared reference.
pub struct ResultsTable {
    path: PathBuf,
    writer: Mutex<Writer<File>>,
}

impl fmt::Debug for ResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsTable")
            .field("path", &self.path)
            .finish()
    }
}

impl ResultsTable {
    /// Truncate `path` and write a fresh header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = tsv_writer(File::create(&path)?);
        writer.write_record(RESULTS_HEADER)?;
        writer.flush()?;
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    /// Open `path` for appending; the header is written only to a new or
    /// empty file.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut writer = tsv_writer(file);
        if is_empty {
            writer.write_record(RESULTS_HEADER)?;
            writer.flush()?;
        }
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &StatisticsRecord) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.serialize(record)?;
        writer.flush()?;
        log::debug!(
            "appended statistics of {} to {}",
            record.video_id,
            self.path.display()
        );
        Ok(())
    }
}

/// Read every row of a results table written by [`ResultsTable`].
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<StatisticsRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path.as_ref())?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/*-----------------------------------------------------------------------------
Track points
-----------------------------------------------------------------------------*/

/// Write every point of `tracks` as one row, ordered by frame.
pub fn write_track_points<W: Write>(tracks: &TrackSet, writer: W) -> Result<()> {
    let mut writer = tsv_writer(writer);
    writer.write_record(TRACK_POINTS_HEADER)?;
    for row in tracks.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the track point table of a video to `path`, replacing it.
pub fn save_track_points(tracks: &TrackSet, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_track_points(tracks, file)
}

/// Read a track point table back into rows.
pub fn read_track_points(path: impl AsRef<Path>) -> Result<Vec<TrackRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path.as_ref())?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreParams;
    use crate::point::Point;
    use crate::track::Track;
    use nearly_eq::assert_nearly_eq;
    use std::sync::Arc;

    fn record(id: &str) -> StatisticsRecord {
        StatisticsRecord {
            video_id: id.to_string(),
            date: "2016-12-02".to_string(),
            label: "SSB01".to_string(),
            dpf: 5,
            dpi: 1,
            avg_velocity: 1.5,
            total_distance: 90.0,
            avg_static_time: 3.25,
        }
    }

    #[test]
    fn test_record_field_names_match_header() {
        let mut buffer = Vec::new();
        {
            let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(&mut buffer);
            writer.serialize(record("a")).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().next().unwrap(), RESULTS_HEADER.join("\t"));
    }

    #[test]
    fn test_create_writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        let table = ResultsTable::create(&path).unwrap();
        table.append(&record("a")).unwrap();
        table.append(&record("b")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RESULTS_HEADER.join("\t"));
        assert!(lines[1].starts_with("a\t2016-12-02\tSSB01\t5\t1\t"));
        assert!(lines[2].starts_with("b\t"));

        let records = read_results(&path).unwrap();
        assert_eq!(records, vec![record("a"), record("b")]);
    }

    #[test]
    fn test_open_append_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        {
            let table = ResultsTable::open_append(&path).unwrap();
            table.append(&record("first")).unwrap();
        }
        let table = ResultsTable::open_append(&path).unwrap();
        table.append(&record("second")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        let ids: Vec<String> = read_results(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.video_id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        let table = Arc::new(ResultsTable::create(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        table.append(&record(&format!("v{i}_{j}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = read_results(&path).unwrap();
        assert_eq!(records.len(), 200);
        for r in records {
            assert_eq!(r.label, "SSB01");
            assert_nearly_eq!(r.avg_static_time, 3.25, 1e-12);
        }
    }

    #[test]
    fn test_track_points_table() {
        let params = ScoreParams::default();
        let a = Point::new(1.0, 2.0, 5.0, 3, None, &params);
        let b = Point::new(4.0, 6.0, 5.0, 4, Some(&a), &params);
        let tracks = TrackSet::new(vec![Track::new(vec![a, b])]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.txt");
        save_track_points(&tracks, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), "frame\ttrack\tx\ty\tdistance");
        assert_eq!(text.lines().count(), 3);

        let rows = read_track_points(&path).unwrap();
        assert_eq!(rows, tracks.rows());
        assert_nearly_eq!(rows[1].distance, 5.0, 1e-12);
    }

    #[test]
    fn test_empty_track_set_writes_header_only() {
        let mut buffer = Vec::new();
        write_track_points(&TrackSet::default(), &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "frame\ttrack\tx\ty\tdistance\n");
    }
}
