//! Platform capability layer: locates the App's install/data directories.
//!
//! The App stores its data under OS-specific well-known locations. Discovery
//! is pure filesystem probing (stat calls only), resolved once at startup.
//! Failure to locate the App is non-fatal for the run: network checks still
//! proceed and the manifest is emitted with empty App sections.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Overwolf extension id of the release App.
pub const OVERWOLF_UID: &str = "cmogmmciplgmocnhikmphehmeecmpaggknkjlbag";
/// Overwolf extension id of the beta/preview App.
pub const OVERWOLF_BETA_UID: &str = "nelapelmednbnaigieobbdgbinpgcgkfmmdjembg";

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("unable to find the App data directory")]
    NotFound,
}

/// Supported OS families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Result<Self, LocateError> {
        match std::env::consts::OS {
            "windows" => Ok(Platform::Windows),
            "macos" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            other => Err(LocateError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Host directories the locator probes against. Detected once from the real
/// environment; constructed directly in tests.
#[derive(Debug, Clone)]
pub struct HostEnv {
    pub platform: Platform,
    pub home: Utf8PathBuf,
    /// `%LOCALAPPDATA%` on Windows, `None` elsewhere.
    pub local_app_data: Option<Utf8PathBuf>,
}

impl HostEnv {
    pub fn detect() -> Result<Self, LocateError> {
        let platform = Platform::current()?;
        let home = dirs::home_dir()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            .ok_or(LocateError::NotFound)?;
        let local_app_data = match platform {
            Platform::Windows => {
                dirs::data_local_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            }
            _ => None,
        };
        Ok(Self {
            platform,
            home,
            local_app_data,
        })
    }
}

/// Candidate App data directories in fixed priority order.
fn install_candidates(env: &HostEnv) -> Vec<Utf8PathBuf> {
    match env.platform {
        Platform::Windows => {
            let mut candidates = Vec::new();
            if let Some(local) = &env.local_app_data {
                candidates.push(local.join(".ftba"));
            }
            candidates.push(env.home.join(".ftba"));
            candidates
        }
        Platform::MacOs => vec![env
            .home
            .join("Library")
            .join("Application Support")
            .join(".ftba")],
        Platform::Linux => vec![env.home.join(".ftba")],
    }
}

/// Resolve the App's data directory: the first candidate that exists on
/// disk. Stat-only, idempotent, safe to call once per run.
pub fn locate_install(env: &HostEnv) -> Result<Utf8PathBuf, LocateError> {
    install_candidates(env)
        .into_iter()
        .find(|p| p.exists())
        .ok_or(LocateError::NotFound)
}

/// Resolve the App's `meta.json` describing the installed build.
///
/// On Windows the Electron install is preferred; when absent, the newest
/// version directory under the Overwolf extension is used. Linux builds ship
/// no meta file.
pub fn app_meta_path(env: &HostEnv, beta: bool) -> Result<Utf8PathBuf, LocateError> {
    match env.platform {
        Platform::Windows => {
            let local = env
                .local_app_data
                .as_deref()
                .ok_or(LocateError::NotFound)?;
            let electron_meta = local
                .join("Programs")
                .join("ftb-app")
                .join("resources")
                .join("meta.json");
            if electron_meta.exists() {
                return Ok(electron_meta);
            }
            let extensions = local.join("Overwolf").join("Extensions").join(if beta {
                OVERWOLF_BETA_UID
            } else {
                OVERWOLF_UID
            });
            let newest = newest_version_dir(&extensions).ok_or(LocateError::NotFound)?;
            let meta = newest.join("meta.json");
            if meta.exists() {
                Ok(meta)
            } else {
                Err(LocateError::NotFound)
            }
        }
        Platform::MacOs => {
            let meta = Utf8PathBuf::from("/Applications")
                .join("FTB Electron App.app")
                .join("contents")
                .join("Resources")
                .join("meta.json");
            if meta.exists() {
                Ok(meta)
            } else {
                Err(LocateError::NotFound)
            }
        }
        Platform::Linux => Err(LocateError::UnsupportedPlatform(
            "no meta.json is shipped on linux".to_string(),
        )),
    }
}

/// Overwolf log directory for the App, Windows only.
pub fn overwolf_log_dir(env: &HostEnv, beta: bool) -> Option<Utf8PathBuf> {
    if env.platform != Platform::Windows {
        return None;
    }
    let app_dir = if beta { "FTB App Preview" } else { "FTB App" };
    let dir = env
        .local_app_data
        .as_deref()?
        .join("Overwolf")
        .join("Log")
        .join("Apps")
        .join(app_dir);
    dir.exists().then_some(dir)
}

/// Pick the subdirectory whose name parses as the highest dotted version.
/// Overwolf keeps one directory per installed extension version.
fn newest_version_dir(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let entries = dir.read_dir_utf8().ok()?;
    let mut best: Option<(Vec<u64>, Utf8PathBuf)> = None;
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Some(version) = parse_version(entry.file_name()) else {
            continue;
        };
        match &best {
            Some((current, _)) if *current >= version => {}
            _ => best = Some((version, entry.path().to_path_buf())),
        }
    }
    best.map(|(_, path)| path)
}

fn parse_version(name: &str) -> Option<Vec<u64>> {
    name.split('.').map(|part| part.parse::<u64>().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn windows_env(home: Utf8PathBuf, local: Utf8PathBuf) -> HostEnv {
        HostEnv {
            platform: Platform::Windows,
            home,
            local_app_data: Some(local),
        }
    }

    #[test]
    fn windows_prefers_local_app_data() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::create_dir(local.path().join(".ftba")).unwrap();
        fs::create_dir(home.path().join(".ftba")).unwrap();

        let env = windows_env(utf8(&home), utf8(&local));
        let located = locate_install(&env).unwrap();
        assert_eq!(located, utf8(&local).join(".ftba"));
    }

    #[test]
    fn windows_falls_back_to_home() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::create_dir(home.path().join(".ftba")).unwrap();

        let env = windows_env(utf8(&home), utf8(&local));
        let located = locate_install(&env).unwrap();
        assert_eq!(located, utf8(&home).join(".ftba"));
    }

    #[test]
    fn missing_install_reports_not_found() {
        let home = TempDir::new().unwrap();
        let env = HostEnv {
            platform: Platform::Linux,
            home: utf8(&home),
            local_app_data: None,
        };
        assert!(matches!(locate_install(&env), Err(LocateError::NotFound)));
    }

    #[test]
    fn macos_probes_application_support() {
        let home = TempDir::new().unwrap();
        let data_dir = home
            .path()
            .join("Library")
            .join("Application Support")
            .join(".ftba");
        fs::create_dir_all(&data_dir).unwrap();

        let env = HostEnv {
            platform: Platform::MacOs,
            home: utf8(&home),
            local_app_data: None,
        };
        let located = locate_install(&env).unwrap();
        assert_eq!(located.as_std_path(), data_dir.as_path());
    }

    #[test]
    fn overwolf_meta_uses_newest_version_dir() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let extensions = local
            .path()
            .join("Overwolf")
            .join("Extensions")
            .join(OVERWOLF_UID);
        for version in ["1.9.3", "1.10.0", "1.2.11"] {
            fs::create_dir_all(extensions.join(version)).unwrap();
        }
        fs::write(extensions.join("1.10.0").join("meta.json"), "{}").unwrap();

        let env = windows_env(utf8(&home), utf8(&local));
        let meta = app_meta_path(&env, false).unwrap();
        assert!(meta.as_str().contains("1.10.0"));
    }

    #[test]
    fn linux_meta_is_unsupported() {
        let home = TempDir::new().unwrap();
        let env = HostEnv {
            platform: Platform::Linux,
            home: utf8(&home),
            local_app_data: None,
        };
        assert!(matches!(
            app_meta_path(&env, false),
            Err(LocateError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn version_parse_rejects_non_numeric_names() {
        assert_eq!(parse_version("1.2.3"), Some(vec![1, 2, 3]));
        assert_eq!(parse_version("nightly"), None);
    }
}
