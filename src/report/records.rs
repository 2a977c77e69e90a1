//! CSV record persistence.
//!
//! Records are written with their serde field order as the header.

use std::fs::{self, File};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ReportError;

pub(crate) fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes `records` to `path`, creating parent directories.
pub fn write_csv<T: Serialize>(records: &[T], path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads every record of a CSV file with a header row.
pub fn read_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(File::open(path.as_ref())?);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerConfig;
    use crate::swarm::EpochCost;

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/costs.csv");
        let costs = vec![
            EpochCost {
                epoch: 0,
                min: 1.0,
                max: 3.0,
                mean: 2.0,
                std: 1.0,
            },
            EpochCost {
                epoch: 1,
                min: 0.5,
                max: 2.5,
                mean: 1.5,
                std: 1.0,
            },
        ];
        write_csv(&costs, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("epoch,min,max,mean,std\n"));
        let back: Vec<EpochCost> = read_csv(&path).unwrap();
        assert_eq!(back, costs);
    }

    #[test]
    fn test_config_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.csv");
        write_csv(&[SchedulerConfig::default()], &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("reconfig_min_gain,reconfig_max_share,power_off_idle\n"));
        let back: Vec<SchedulerConfig> = read_csv(&path).unwrap();
        assert_eq!(back, vec![SchedulerConfig::default()]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Vec<SchedulerConfig>, _> = read_csv(dir.path().join("nope.csv"));
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}
