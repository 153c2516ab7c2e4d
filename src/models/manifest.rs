//! The manifest: the single JSON document a diagnostic run produces.
//!
//! The manifest is assembled once per run from whatever partial results the
//! other services managed to produce, serialized with stable indentation and
//! uploaded as the final artifact. Its id becomes the support code.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::app::{AppMeta, Instance};

/// Schema version tag written into every manifest.
pub const MANIFEST_VERSION: &str = "v2.1.0";

/// Terminal aggregate of a diagnostic run. Constructed once, immutable after
/// serialization; consumed only by the uploader (and the console on failure).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub meta_details: MetaDetails,
    pub app_details: AppDetails,
    /// Logical log name -> artifact reference.
    pub app_logs: IndexMap<String, String>,
    /// Instance UUID -> summary.
    pub provider_instance_mapping: IndexMap<String, InstanceSummary>,
    pub instance_logs: Vec<InstanceLogEntry>,
    pub network_checks: Vec<NetworkCheck>,
}

/// Summary counts shown first in the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaDetails {
    pub instance_count: usize,
    /// UTC date of the run, `YYYY-MM-DD`.
    pub today: String,
    /// Unix timestamp of the run.
    pub time: i64,
    pub added_accounts: usize,
    pub has_active_accounts: bool,
}

/// App build identification, copied out of `meta.json` when it was readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppDetails {
    pub app: String,
    pub shared_version: String,
    pub meta: AppMeta,
}

/// The manifest-facing subset of an [`Instance`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceSummary {
    pub uuid: String,
    pub name: String,
    pub pack_type: i64,
    pub pack_id: i64,
    pub pack_version: i64,
    pub version: String,
    pub mc_version: String,
    pub min_memory: u32,
    pub rec_memory: u32,
    pub memory: u32,
    pub jvm_args: String,
    pub shell_args: String,
    pub embedded_jre: bool,
    pub jre_path: String,
    pub mod_loader: String,
    pub is_modified: bool,
    pub is_import: bool,
    pub has_inst_mods: bool,
    pub install_complete: bool,
    pub release_channel: String,
    pub locked: bool,
    pub last_played: i64,
}

impl From<&Instance> for InstanceSummary {
    fn from(i: &Instance) -> Self {
        Self {
            uuid: i.uuid.clone(),
            name: i.name.clone(),
            pack_type: i.pack_type,
            pack_id: i.id,
            pack_version: i.version_id,
            version: i.version.clone(),
            mc_version: i.mc_version.clone(),
            min_memory: i.min_memory,
            rec_memory: i.rec_memory,
            memory: i.memory,
            jvm_args: i.jvm_args.clone(),
            shell_args: i.shell_args.clone(),
            embedded_jre: i.embedded_jre,
            jre_path: i.jre_path.clone(),
            mod_loader: i.mod_loader.clone(),
            is_modified: i.is_modified,
            is_import: i.is_import,
            has_inst_mods: i.has_inst_mods,
            install_complete: i.install_complete,
            release_channel: i.release_channel.clone(),
            locked: i.locked,
            last_played: i.last_played,
        }
    }
}

/// Per-instance aggregation of uploaded log artifacts, keyed by original
/// filename.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceLogEntry {
    pub created: i64,
    pub name: String,
    pub uuid: String,
    pub mc_version: String,
    pub mod_loader: String,
    pub logs: IndexMap<String, String>,
    pub crash_logs: IndexMap<String, String>,
}

/// Outcome of one endpoint probe.
///
/// `error` marks a hard transport failure; `!success && !error` is a soft
/// failure (the request completed but did not match expectations).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkCheck {
    pub url: String,
    pub success: bool,
    pub error: bool,
    pub status: String,
}
