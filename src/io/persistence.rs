//! JSON file persistence helpers.
//!
//! Thin wrappers over `tokio::fs` used by every subcommand: pretty-printed
//! JSON artifacts with parent directories created on demand.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::core::errors::{Result, XcreportError};

/// Load and deserialize a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| XcreportError::io(format!("failed to read {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        XcreportError::Json {
            message: format!("failed to parse {}: {err}", path.display()),
            source: Some(err),
        }
    })
}

/// Load a JSON file, degrading to the type's default when the file is
/// missing or malformed. The degradation is logged, not raised.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not load JSON, using empty data");
            T::default()
        }
    }
}

/// Serialize a value as pretty JSON and write it, creating parent
/// directories as needed.
pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    write_text(&content, path).await
}

/// Write text content, creating parent directories as needed.
pub async fn write_text(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            XcreportError::io(format!("failed to create {}", parent.display()), err)
        })?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|err| XcreportError::io(format!("failed to write {}", path.display()), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::TestReport;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/test-data.json");

        let report = TestReport::from_records(Vec::new(), Some("run.xcresult".into()));
        save_json(&report, &path).await.unwrap();

        let loaded: TestReport = load_json(&path).await.unwrap();
        assert_eq!(loaded, report);
    }

    #[tokio::test]
    async fn missing_file_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let report: TestReport = load_json_or_default(&dir.path().join("absent.json")).await;
        assert_eq!(report, TestReport::default());
    }

    #[tokio::test]
    async fn malformed_file_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "{broken").await.unwrap();

        let report: TestReport = load_json_or_default(&path).await;
        assert_eq!(report, TestReport::default());
    }
}
