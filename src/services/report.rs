//! Run orchestration and manifest assembly.
//!
//! Every phase feeds [`ReportParts`]; any phase may fail and leave its slot
//! empty. [`assemble`] turns whatever survived into the versioned manifest.
//! The only fatal path in the whole pipeline is serializing or uploading
//! that final manifest; a partial report is always preferable to none.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use super::collector::{Collector, InstanceCollection};
use super::network::NetworkProbe;
use super::sanitize::OWN_OUTPUT_NAME;
use super::upload::{PasteTransport, Uploader};
use crate::logging::LogCapture;
use crate::models::{
    AppDetails, AppMeta, AppSettings, Manifest, MetaDetails, NetworkCheck, Profiles,
    MANIFEST_VERSION,
};
use crate::platform::{self, HostEnv};

/// Settings file locations, newest layout first.
const SETTINGS_CANDIDATES: [&str; 3] = [
    "storage/settings.json",
    "bin/settings.json",
    "app_settings.json",
];

/// Overwolf renderer logs collected alongside the App's own logs.
const OVERWOLF_LOGS: [&str; 3] = ["index.html.log", "background.html.log", "chat.html.log"];

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Target the beta/preview App where install locations differ.
    pub beta: bool,
}

/// Partial results gathered across phases. Everything defaults to empty so
/// a failed phase degrades its manifest section instead of blocking the run.
#[derive(Debug, Default)]
pub struct ReportParts {
    pub app_meta: Option<AppMeta>,
    pub settings: Option<AppSettings>,
    pub profiles: Option<Profiles>,
    pub app_logs: IndexMap<String, String>,
    pub instances: InstanceCollection,
    pub network_checks: Vec<NetworkCheck>,
}

/// Build the manifest from whatever partial results are available.
pub fn assemble(parts: ReportParts) -> Manifest {
    let now = chrono::Utc::now();
    let (added_accounts, has_active_accounts) = match &parts.profiles {
        Some(profiles) => (profiles.profiles.len(), profiles.has_active_account()),
        None => (0, false),
    };
    let app_details = match &parts.app_meta {
        Some(meta) => AppDetails {
            app: meta.commit.clone(),
            shared_version: meta.app_version.clone(),
            meta: meta.clone(),
        },
        None => AppDetails::default(),
    };

    Manifest {
        version: MANIFEST_VERSION.to_string(),
        meta_details: MetaDetails {
            instance_count: parts.instances.instances.len(),
            today: now.format("%Y-%m-%d").to_string(),
            time: now.timestamp(),
            added_accounts,
            has_active_accounts,
        },
        app_details,
        app_logs: parts.app_logs,
        provider_instance_mapping: parts.instances.instances,
        instance_logs: parts.instances.instance_logs,
        network_checks: parts.network_checks,
    }
}

/// Run the full diagnostic pipeline and return the support code.
///
/// Phase order: network probes, App discovery and collection (skipped when
/// the App cannot be located), own-output capture, manifest assembly and
/// the final upload. Cancelling `cancel` stops the probes and collection
/// loops from issuing new work; assembly and the final manifest upload still
/// run with whatever was gathered, so an interrupted run produces a partial
/// report instead of none.
pub async fn run_diagnostics<T: PasteTransport>(
    env: &HostEnv,
    opts: &RunOptions,
    uploader: &Uploader<T>,
    probe: &NetworkProbe,
    capture: &LogCapture,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut parts = ReportParts::default();

    tracing::info!("running network checks");
    parts.network_checks = probe.run(cancel).await;

    match platform::locate_install(env) {
        Ok(install) => collect_app(env, opts, uploader, &install, &mut parts, cancel).await,
        Err(e) => {
            tracing::error!("App checks skipped: {e}");
        }
    }

    if cancel.is_cancelled() {
        tracing::warn!("run interrupted, assembling a partial manifest");
    }

    // The tool's own console capture is itself a diagnostic artifact.
    let own_output = capture.contents();
    if !own_output.is_empty() {
        match uploader.upload(OWN_OUTPUT_NAME, &own_output).await {
            Ok(artifact) => {
                parts.app_logs.insert(OWN_OUTPUT_NAME.to_string(), artifact);
            }
            Err(e) => tracing::error!("failed to upload tool output: {e}"),
        }
    }

    let manifest = assemble(parts);
    let serialized =
        serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;
    let artifact = uploader
        .upload("manifest.json", &serialized)
        .await
        .context("failed to upload manifest")?;
    Ok(format!("dbg:{artifact}"))
}

/// App-dependent collection, gated on a located install directory.
async fn collect_app<T: PasteTransport>(
    env: &HostEnv,
    opts: &RunOptions,
    uploader: &Uploader<T>,
    install: &Utf8Path,
    parts: &mut ReportParts,
    cancel: &CancellationToken,
) {
    tracing::info!("located App at {install}");
    if !install.join("bin").exists() {
        tracing::warn!("App bin directory is missing");
    }

    parts.app_meta = load_app_meta(env, opts.beta);
    parts.settings = load_settings(install);
    parts.profiles = load_profiles(install);

    let collector = Collector::new(uploader, cancel.clone());

    match collector.collect_app_logs(&install.join("logs")).await {
        Ok(logs) => parts.app_logs.extend(logs),
        Err(e) => tracing::error!("failed to collect App logs: {e}"),
    }

    if let Some(settings) = &parts.settings {
        let instance_root = Utf8PathBuf::from(&settings.instance_location);
        tracing::info!("instance location: {instance_root}");
        match collector.collect_instances(&instance_root).await {
            Ok(collection) => {
                if collection.parse_failures > 0 {
                    tracing::warn!(
                        "{} instance(s) had unparseable instance.json",
                        collection.parse_failures
                    );
                }
                parts.instances = collection;
            }
            Err(e) => tracing::error!("failed to collect instances: {e}"),
        }
    }

    let mut misc_files = vec![
        install.join("storage").join("settings.json"),
        install.join("bin").join("runtime").join("installations.json"),
    ];
    if let Some(overwolf_logs) = platform::overwolf_log_dir(env, opts.beta) {
        for name in OVERWOLF_LOGS {
            misc_files.push(overwolf_logs.join(name));
        }
    }
    for path in misc_files {
        if cancel.is_cancelled() {
            break;
        }
        match collector.collect_misc_file(&path).await {
            Ok(artifact) => {
                let name = path.file_name().unwrap_or(path.as_str()).to_string();
                parts.app_logs.insert(name, artifact);
            }
            Err(e) => tracing::error!("error collecting file: {e}"),
        }
    }
}

fn load_app_meta(env: &HostEnv, beta: bool) -> Option<AppMeta> {
    let path = match platform::app_meta_path(env, beta) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("error locating App meta: {e}");
            return None;
        }
    };
    let meta: AppMeta = match read_json(&path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::error!("error reading App meta: {e}");
            return None;
        }
    };
    tracing::info!("App version: {}", meta.app_version);
    tracing::info!("App branch: {}", meta.branch);
    Some(meta)
}

/// Load the settings document from the first legacy location that exists.
fn load_settings(install: &Utf8Path) -> Option<AppSettings> {
    let path = SETTINGS_CANDIDATES
        .iter()
        .map(|candidate| install.join(candidate))
        .find(|path| path.exists())?;

    match read_json::<AppSettings>(&path) {
        Ok(settings) => {
            if !settings.jvmargs.is_empty() {
                tracing::info!("custom JVM args: {}", settings.jvmargs);
            }
            Some(settings)
        }
        Err(e) => {
            tracing::error!("failed to load App settings from {path}: {e}");
            None
        }
    }
}

fn load_profiles(install: &Utf8Path) -> Option<Profiles> {
    let path = install.join("profiles.json");
    if !path.exists() {
        tracing::warn!("profiles.json not found");
        return None;
    }
    match read_json(&path) {
        Ok(profiles) => Some(profiles),
        Err(e) => {
            tracing::error!("failed to load profiles: {e}");
            None
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_slice(&data).with_context(|| format!("failed to parse {path}"))
}
