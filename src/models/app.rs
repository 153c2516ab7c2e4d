//! Serde models for the files the FTB App leaves on disk.
//!
//! Everything here is parsed from partially-untrusted JSON: the App may have
//! been interrupted mid-write, the user may have edited files by hand, and
//! older App versions emit slightly different shapes. All fields therefore
//! carry `#[serde(default)]` so a missing key degrades to a zero value
//! instead of failing the whole document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed replacement written over the session token before a settings file
/// leaves the machine.
pub const SESSION_MASK: &str = "************************";

/// Flat settings document from `storage/settings.json` (or one of its legacy
/// locations, see [`crate::services::report`]).
///
/// The App historically stored every value as a string, so the named fields
/// are strings here too. Keys this tool does not know about are preserved
/// through the `extra` flatten so a sanitized settings file stays complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub enable_analytics: String,
    pub enable_beta: String,
    pub enable_preview: String,
    pub memory: String,
    /// Session/auth token. Must never leave the machine unredacted.
    pub session_string: String,
    pub thread_limit: String,
    pub jvmargs: String,
    pub cache_life: String,
    pub instance_location: String,
    pub speed_limit: String,
    pub verbose: String,
    pub keep_launcher_open: String,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// One `instance.json` under the instances directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Instance {
    #[serde(rename = "_private")]
    pub private: bool,
    pub uuid: String,
    pub id: i64,
    pub name: String,
    #[serde(rename = "versionId")]
    pub version_id: i64,
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
    pub last_played: i64,
    pub is_modified: bool,
    pub is_import: bool,
    pub cloud_saves: bool,
    pub has_inst_mods: bool,
    pub install_complete: bool,
    pub release_channel: String,
    pub locked: bool,
    pub pack_type: i64,
}

/// `meta.json` shipped next to the App binary; identifies the installed
/// App build for the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppMeta {
    pub app_version: String,
    pub commit: String,
    pub branch: String,
    pub released: i64,
    pub runtime: AppMetaRuntime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppMetaRuntime {
    pub version: String,
    pub jar: String,
    pub env: Vec<serde_json::Value>,
    pub jvm_args: Vec<String>,
}

/// Account profiles from `profiles.json`. Only counts and the active-profile
/// linkage reach the manifest; tokens and usernames never do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profiles {
    pub version: String,
    pub profiles: Vec<Profile>,
    pub active_profile: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub uuid: String,
    pub last_login: i64,
    pub not_logged_in: bool,
}

impl Profiles {
    /// Whether the active profile id actually refers to a stored profile.
    pub fn has_active_account(&self) -> bool {
        self.profiles.iter().any(|p| p.uuid == self.active_profile)
    }
}
