//! Full-overwrite CSV snapshots.
//!
//! A snapshot is written to a temporary file next to its destination and renamed over
//! it, so readers see either the previous file or the complete new one.

use crate::pipeline::error::SnapshotError;
use log::info;
use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

pub const WEATHER_SNAPSHOT: &str = "weather.csv";
pub const ENERGY_SNAPSHOT: &str = "energy.csv";

/// Stacks per-city frames in order. `None` when there are no rows at all.
pub fn stack_frames(
    name: &str,
    frames: impl IntoIterator<Item = DataFrame>,
) -> Result<Option<DataFrame>, SnapshotError> {
    let mut stacked: Option<DataFrame> = None;
    for frame in frames.into_iter().filter(|f| f.height() > 0) {
        match stacked.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&frame)
                    .map_err(|e| SnapshotError::Stack(name.to_string(), e))?;
            }
            None => stacked = Some(frame),
        }
    }
    Ok(stacked)
}

/// Replaces `dir/file_name` with `df` as CSV with a header row.
pub async fn write_snapshot(
    mut df: DataFrame,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| SnapshotError::DirCreation(dir.to_path_buf(), e))?;

    let dir = dir.to_path_buf();
    let target = dir.join(file_name);
    let rows = df.height();

    let written = task::spawn_blocking(move || {
        let mut temp_file =
            NamedTempFile::new_in(&dir).map_err(|e| SnapshotError::WriteIo(target.clone(), e))?;
        CsvWriter::new(&mut temp_file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| SnapshotError::WritePolars(target.clone(), e))?;
        temp_file
            .flush()
            .map_err(|e| SnapshotError::WriteIo(target.clone(), e))?;
        temp_file
            .persist(&target)
            .map_err(|e| SnapshotError::Persist(target.clone(), e.error))?;
        Ok::<PathBuf, SnapshotError>(target)
    })
    .await??;

    info!("Wrote {} rows to {:?}", rows, written);
    Ok(written)
}
