use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::DataIngestionError;
use crate::observation::{InstrumentSeries, Observation, validate_observation};
use crate::schema::ColumnMap;

/// File names look like `RELIANCE__EQ__NSE__NSE__MINUTE.csv`; the instrument
/// id is everything before the first delimiter.
pub const INSTRUMENT_DELIMITER: &str = "__";

/// Reads every bar from a headed CSV source. The header is validated before
/// any record is parsed.
pub fn read_observations<R: Read>(
    reader: R,
    origin: &str,
) -> Result<Vec<Observation>, DataIngestionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers, origin)?;

    let mut observations = Vec::new();
    let mut suspicious = 0usize;
    for (idx, row) in rdr.records().enumerate() {
        let row = row?;
        let observation = columns.parse_record(&row, idx + 1, origin)?;
        if !validate_observation(&observation) {
            suspicious += 1;
        }
        observations.push(observation);
    }

    if suspicious > 0 {
        warn!("{origin}: {suspicious} bars carry negative prices or volume");
    }
    debug!("{origin}: read {} bars", observations.len());
    Ok(observations)
}

pub fn read_series_file(path: &Path) -> Result<InstrumentSeries, DataIngestionError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DataIngestionError::MissingInput(path.to_path_buf()),
        _ => DataIngestionError::IoError(e),
    })?;
    let origin = path.display().to_string();
    let observations = read_observations(file, &origin)?;
    Ok(InstrumentSeries::new(instrument_id(path), observations))
}

/// Falls back to the file stem when the name has no non-empty prefix.
pub fn instrument_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.split_once(INSTRUMENT_DELIMITER) {
        Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
        _ => stem,
    }
}

/// `*.csv` files directly inside `dir`, sorted by file name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, DataIngestionError> {
    if !dir.exists() {
        return Err(DataIngestionError::MissingInput(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(DataIngestionError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one series per CSV file in `dir`. An empty directory yields an
/// empty batch.
pub fn scan_dataset(dir: &Path) -> Result<Vec<InstrumentSeries>, DataIngestionError> {
    let files = list_csv_files(dir)?;
    if files.is_empty() {
        warn!("No CSV files found in {}", dir.display());
        return Ok(Vec::new());
    }

    let mut batch = Vec::with_capacity(files.len());
    for file in files {
        info!("Processing {}...", file.display());
        batch.push(read_series_file(&file)?);
    }
    Ok(batch)
}
