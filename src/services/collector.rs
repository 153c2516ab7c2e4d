//! File collection: walks the App's directory trees, classifies entries and
//! hands each blob to the uploader.
//!
//! Collection is best-effort by contract. A single unreadable or malformed
//! file is logged and skipped; only an unlistable root directory fails a
//! call. Every helper returns its own partial result; the orchestrator
//! merges them, so nothing here touches shared mutable state.

use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::upload::{PasteTransport, UploadError, Uploader};
use crate::models::{Instance, InstanceLogEntry, InstanceSummary};

/// Reserved per-instance cache directory, never collected.
const LOCAL_CACHE_DIR: &str = ".localCache";

/// Rotated/archived App logs are date-prefixed and out of scope.
static DATE_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date prefix regex should compile")
});

/// JVM segfault dumps left at the instance root.
const JVM_CRASH_PREFIX: &str = "hs_err_";

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("unable to list {path}: {source}")]
    RootUnreadable {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("file {0} does not exist")]
    NotFound(Utf8PathBuf),

    /// Distinct from the silent skip in bulk scans: an explicitly requested
    /// file being empty is worth telling the user about.
    #[error("file {0} is empty")]
    EmptyFile(Utf8PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Everything the instances walk produced. Parse failures are counted, not
/// fatal; sibling instances keep collecting.
#[derive(Debug, Default)]
pub struct InstanceCollection {
    /// Instance UUID -> manifest summary.
    pub instances: IndexMap<String, InstanceSummary>,
    pub instance_logs: Vec<InstanceLogEntry>,
    pub parse_failures: usize,
}

pub struct Collector<'a, T: PasteTransport> {
    uploader: &'a Uploader<T>,
    cancel: CancellationToken,
}

impl<'a, T: PasteTransport> Collector<'a, T> {
    pub fn new(uploader: &'a Uploader<T>, cancel: CancellationToken) -> Self {
        Self { uploader, cancel }
    }

    /// Walk the instances root: one [`InstanceSummary`] per subdirectory
    /// with a parseable `instance.json`, plus that instance's uploaded log
    /// and crash-report artifacts.
    pub async fn collect_instances(
        &self,
        root: &Utf8Path,
    ) -> Result<InstanceCollection, CollectError> {
        let entries = root.read_dir_utf8().map_err(|source| {
            CollectError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            }
        })?;

        let mut collection = InstanceCollection::default();
        for entry in entries.flatten() {
            if self.cancel.is_cancelled() {
                tracing::warn!("instance collection interrupted");
                break;
            }
            let name = entry.file_name().to_string();
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                tracing::debug!("extra file in instances directory: {name}");
                continue;
            }
            if name == LOCAL_CACHE_DIR {
                continue;
            }

            tracing::info!("found instance: {name}");
            let instance_dir = entry.path();
            let instance = match read_instance_json(instance_dir) {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::error!("skipping {name}, unparseable instance.json: {e}");
                    collection.parse_failures += 1;
                    continue;
                }
            };

            let mut logs = self.scan_log_dir(&instance_dir.join("logs")).await;
            for (log_name, artifact) in self.collect_jvm_crashes(instance_dir).await {
                logs.insert(log_name, artifact);
            }
            let crash_logs = self.scan_log_dir(&instance_dir.join("crash-reports")).await;

            collection
                .instances
                .insert(instance.uuid.clone(), InstanceSummary::from(&instance));
            collection.instance_logs.push(InstanceLogEntry {
                created: chrono::Utc::now().timestamp(),
                name: instance.name.clone(),
                uuid: instance.uuid.clone(),
                mc_version: instance.mc_version.clone(),
                mod_loader: instance.mod_loader.clone(),
                logs,
                crash_logs,
            });
        }
        Ok(collection)
    }

    /// Flat scan of the App's own logs directory. Rotated (date-prefixed)
    /// files are excluded; `.gz` files are decompressed before upload;
    /// empty files are silently skipped.
    pub async fn collect_app_logs(
        &self,
        dir: &Utf8Path,
    ) -> Result<IndexMap<String, String>, CollectError> {
        let entries = dir.read_dir_utf8().map_err(|source| {
            CollectError::RootUnreadable {
                path: dir.to_path_buf(),
                source,
            }
        })?;

        let mut artifacts = IndexMap::new();
        for entry in entries.flatten() {
            if self.cancel.is_cancelled() {
                break;
            }
            let name = entry.file_name().to_string();
            if DATE_PREFIXED.is_match(&name) {
                continue;
            }
            let extension = entry.path().extension().unwrap_or_default();
            if !matches!(extension, "log" | "txt" | "gz") {
                continue;
            }

            let data = match read_maybe_gz(entry.path()) {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!("error reading log file {name}: {e}");
                    continue;
                }
            };
            if data.is_empty() {
                continue;
            }

            match self.uploader.upload(&name, &data).await {
                Ok(artifact) => {
                    artifacts.insert(name, artifact);
                }
                Err(e) => tracing::error!("error uploading {name}: {e}"),
            }
        }
        Ok(artifacts)
    }

    /// Upload one explicitly requested file. Unlike the bulk scans, absence
    /// and emptiness are reported to the caller.
    pub async fn collect_misc_file(&self, path: &Utf8Path) -> Result<String, CollectError> {
        if !path.exists() {
            return Err(CollectError::NotFound(path.to_path_buf()));
        }
        let data = read_maybe_gz(path)?;
        if data.is_empty() {
            return Err(CollectError::EmptyFile(path.to_path_buf()));
        }
        let name = path.file_name().unwrap_or(path.as_str());
        Ok(self.uploader.upload(name, &data).await?)
    }

    /// Scan one instance subdirectory (`logs/` or `crash-reports/`) for
    /// `.log`/`.txt` files. A missing directory is not an error; empty files
    /// are skipped; upload failures skip that file only.
    async fn scan_log_dir(&self, dir: &Utf8Path) -> IndexMap<String, String> {
        let mut artifacts = IndexMap::new();
        let Ok(entries) = dir.read_dir_utf8() else {
            return artifacts;
        };

        for entry in entries.flatten() {
            if self.cancel.is_cancelled() {
                break;
            }
            let name = entry.file_name().to_string();
            if !matches!(entry.path().extension(), Some("log") | Some("txt")) {
                continue;
            }
            let data = match std::fs::read(entry.path()) {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!("error reading log file {name}: {e}");
                    continue;
                }
            };
            if data.is_empty() {
                continue;
            }
            match self.uploader.upload(&name, &data).await {
                Ok(artifact) => {
                    artifacts.insert(name, artifact);
                }
                Err(e) => tracing::error!("error uploading {name}: {e}"),
            }
        }
        artifacts
    }

    /// JVM segfault dumps (`hs_err_*`) land at the instance root rather
    /// than in `logs/`.
    async fn collect_jvm_crashes(&self, instance_dir: &Utf8Path) -> IndexMap<String, String> {
        let mut artifacts = IndexMap::new();
        let Ok(entries) = instance_dir.read_dir_utf8() else {
            return artifacts;
        };
        for entry in entries.flatten() {
            if self.cancel.is_cancelled() {
                break;
            }
            let name = entry.file_name().to_string();
            if !name.starts_with(JVM_CRASH_PREFIX) {
                continue;
            }
            tracing::debug!("found java segfault log: {name}");
            let data = match std::fs::read(entry.path()) {
                Ok(data) if !data.is_empty() => data,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("error reading {name}: {e}");
                    continue;
                }
            };
            match self.uploader.upload(&name, &data).await {
                Ok(artifact) => {
                    artifacts.insert(name, artifact);
                }
                Err(e) => tracing::error!("error uploading {name}: {e}"),
            }
        }
        artifacts
    }
}

fn read_instance_json(instance_dir: &Utf8Path) -> Result<Instance, CollectError> {
    let path = instance_dir.join("instance.json");
    let data = std::fs::read(&path).map_err(|source| CollectError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| CollectError::Parse { path, source })
}

/// Read a file, transparently decompressing `.gz`.
fn read_maybe_gz(path: &Utf8Path) -> Result<Vec<u8>, CollectError> {
    let data = std::fs::read(path).map_err(|source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension() != Some("gz") {
        return Ok(data);
    }
    let mut decoder = GzDecoder::new(data.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|source| CollectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_prefixed_names_are_rotated_logs() {
        assert!(DATE_PREFIXED.is_match("2024-11-02-3.log"));
        assert!(!DATE_PREFIXED.is_match("latest.log"));
        assert!(!DATE_PREFIXED.is_match("debug.log"));
    }
}
