//! Data validation utilities.

use std::fs;
use std::path::{Path, PathBuf};

use imperium_core::data::GameData;
use imperium_core::error::GameError;

use crate::error::{Result, ToolError};

/// Outcome of checking one data file.
#[derive(Debug)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Every problem found. Empty means the file is valid.
    pub errors: Vec<GameError>,
}

impl FileReport {
    /// Whether the file passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse one RON file and collect every validation error.
///
/// A parse failure is reported as the file's single error.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn validate_data_file(path: &Path) -> Result<FileReport> {
    let source = fs::read_to_string(path).map_err(|e| ToolError::io(path, e))?;
    let errors = match ron::from_str::<GameData>(&source) {
        Ok(data) => data.validation_errors(),
        Err(e) => vec![GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        }],
    };
    Ok(FileReport {
        path: path.to_path_buf(),
        errors,
    })
}

/// Validate a RON file, or every `.ron` file in a directory.
///
/// Files are checked in name order and each error is logged.
///
/// # Errors
///
/// Returns [`ToolError::ValidationFailed`] if any file has errors, or an
/// IO error if the path cannot be read.
pub fn validate_data_path(path: &Path) -> Result<Vec<FileReport>> {
    let files = if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| ToolError::io(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let report = validate_data_file(file)?;
        for error in &report.errors {
            tracing::error!(file = %file.display(), "{error}");
        }
        if report.is_valid() {
            tracing::info!(file = %file.display(), "Valid");
        }
        reports.push(report);
    }

    let failed = reports.iter().filter(|r| !r.is_valid()).count();
    if failed > 0 {
        return Err(ToolError::ValidationFailed {
            checked: reports.len(),
            failed,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_builtin_data_validates() {
        let dir = tempfile::tempdir().unwrap();
        let ron = GameData::imperium().to_ron_string().unwrap();
        write(dir.path(), "imperium.ron", &ron);

        let reports = validate_data_path(dir.path()).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_valid());
    }

    #[test]
    fn test_all_errors_collected() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = GameData::imperium();
        data.converters[0].base_speed = 0.0;
        data.generators[0].base_output = -1.0;
        let path = write(dir.path(), "broken.ron", &data.to_ron_string().unwrap());

        let report = validate_data_file(&path).unwrap();
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_directory_with_bad_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.ron", &GameData::imperium().to_ron_string().unwrap());
        write(dir.path(), "b.ron", "GameData(");
        write(dir.path(), "notes.txt", "ignored");

        match validate_data_path(dir.path()) {
            Err(ToolError::ValidationFailed { checked, failed }) => {
                assert_eq!(checked, 2);
                assert_eq!(failed, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
