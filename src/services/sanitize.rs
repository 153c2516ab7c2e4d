//! Redaction applied to every byte blob before it leaves the machine.
//!
//! Rules are keyed by [`FileKind`], inferred from the file's logical name:
//! profile documents get their auth keys deleted, settings files get the
//! session token masked, the tool's own console capture gets ANSI noise
//! stripped. Independent of kind, every blob passes the universal scrub
//! (bearer/session token patterns and home-directory usernames). Home
//! directory names are usually real usernames, so the scrub runs even on
//! this tool's own log.
//!
//! All regexes operate on raw bytes: log files are frequently not valid
//! UTF-8.

use std::sync::LazyLock;

use regex::bytes::Regex;
use thiserror::Error;

use crate::models::{AppSettings, SESSION_MASK};

/// Logical name under which the tool's own captured output is uploaded.
pub const OWN_OUTPUT_NAME: &str = "dbg-tool-output";

/// Known token shapes: JWTs (`ey...`), legacy Microsoft tokens (`Ew...=`)
/// and MSA refresh tokens (`M.R3...`). A leading quote is preserved so JSON
/// documents stay well-formed.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(^|")(ey[a-zA-Z0-9._-]+|Ew[a-zA-Z0-9._+/-]+=|M\.R3[a-zA-Z0-9._+!*$/-]+)"#)
        .expect("token regex should compile")
});

static WINDOWS_HOME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:[A-Za-z]:)\\Users\\)([^/\\\r\n\t\x0B]+)(\\.+)?")
        .expect("windows home regex should compile")
});

static MAC_HOME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/Users/)([^/\\\r\n\t\x0B]+)(/.+)?").expect("mac home regex should compile")
});

static LINUX_HOME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/home/)([^/\\\r\n\t\x0B]+)(/.+)?").expect("linux home regex should compile")
});

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ansi regex should compile"));

/// Content classification for an outbound file, inferred from its logical
/// name. Drives which sanitization rule runs and the upload language hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Launcher/account profile document (auth database, client tokens).
    Profile,
    /// App settings document carrying the session token.
    Settings,
    /// Free-text log file.
    Log,
    /// This tool's own captured console output.
    OwnOutput,
    /// Other JSON document.
    Json,
    /// Anything else.
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        if name == OWN_OUTPUT_NAME {
            return FileKind::OwnOutput;
        }
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        // Compressed logs are decompressed before upload, so classify by the
        // inner name.
        match base.strip_suffix(".gz").unwrap_or(base) {
            "launcher_profiles.json" | "profiles.json" => FileKind::Profile,
            "settings.json" | "app_settings.json" => FileKind::Settings,
            base if base.ends_with(".json") => FileKind::Json,
            base if base.ends_with(".log") || base.ends_with(".txt") => FileKind::Log,
            _ => FileKind::Other,
        }
    }

    /// Language hint passed to the paste service.
    pub fn language(self) -> Option<&'static str> {
        match self {
            FileKind::Profile | FileKind::Settings | FileKind::Json => Some("json"),
            FileKind::Log => Some("log"),
            FileKind::OwnOutput | FileKind::Other => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SanitizeError {
    /// The document had to be parsed for redaction but was not valid JSON.
    /// Passing it through unparsed could leak un-redacted auth data.
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Redact `data` according to `kind`. Every path through this function ends
/// with the universal scrub, so no caller can obtain unscrubbed output.
pub fn sanitize(kind: FileKind, data: &[u8]) -> Result<Vec<u8>, SanitizeError> {
    let staged = match kind {
        FileKind::Profile => sanitize_profile(data)?,
        FileKind::Settings => sanitize_settings(data)?,
        FileKind::OwnOutput => strip_console_noise(data),
        FileKind::Log | FileKind::Json | FileKind::Other => data.to_vec(),
    };
    Ok(scrub_secrets(&staged))
}

/// Universal scrub: token patterns and home-directory usernames.
/// Idempotent; applied to every outbound blob.
pub fn scrub_secrets(data: &[u8]) -> Vec<u8> {
    let clean = TOKEN_PATTERN.replace_all(data, &b"${1}******AUTHTOKEN******"[..]);
    let clean = WINDOWS_HOME.replace_all(&clean, &b"${1}***${3}"[..]);
    let clean = MAC_HOME.replace_all(&clean, &b"${1}***${3}"[..]);
    let clean = LINUX_HOME.replace_all(&clean, &b"${1}***${3}"[..]);
    clean.into_owned()
}

/// Strip ANSI escape sequences and non-printable bytes from the tool's own
/// captured console output. Newline, tab and printable ASCII survive.
pub fn strip_console_noise(data: &[u8]) -> Vec<u8> {
    let stripped = ANSI_ESCAPE.replace_all(data, &b""[..]);
    stripped
        .iter()
        .copied()
        .filter(|&b| b == b'\n' || b == b'\t' || (0x20..=0x7E).contains(&b))
        .collect()
}

/// Remove the authentication database and client token from a launcher
/// profile document. All other keys are preserved.
fn sanitize_profile(data: &[u8]) -> Result<Vec<u8>, SanitizeError> {
    let mut value: serde_json::Value = serde_json::from_slice(data)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("authenticationDatabase");
        map.remove("clientToken");
    }
    Ok(serde_json::to_vec_pretty(&value)?)
}

/// Mask the session token in a settings document with a fixed-length string.
fn sanitize_settings(data: &[u8]) -> Result<Vec<u8>, SanitizeError> {
    let mut settings: AppSettings = serde_json::from_slice(data)?;
    settings.session_string = SESSION_MASK.to_string();
    Ok(serde_json::to_vec_pretty(&settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn as_str(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn kind_inferred_from_logical_name() {
        assert_eq!(FileKind::from_name("profiles.json"), FileKind::Profile);
        assert_eq!(
            FileKind::from_name("launcher_profiles.json"),
            FileKind::Profile
        );
        assert_eq!(FileKind::from_name("settings.json"), FileKind::Settings);
        assert_eq!(
            FileKind::from_name("app_settings.json"),
            FileKind::Settings
        );
        assert_eq!(FileKind::from_name("latest.log"), FileKind::Log);
        assert_eq!(FileKind::from_name("crash-2.txt"), FileKind::Log);
        assert_eq!(
            FileKind::from_name("installations.json"),
            FileKind::Json
        );
        assert_eq!(FileKind::from_name(OWN_OUTPUT_NAME), FileKind::OwnOutput);
        assert_eq!(FileKind::from_name("whatever.bin"), FileKind::Other);
    }

    #[test]
    fn compressed_names_classify_by_inner_name() {
        assert_eq!(FileKind::from_name("old.log.gz"), FileKind::Log);
        assert_eq!(FileKind::from_name("debug.txt.gz"), FileKind::Log);
        assert_eq!(FileKind::from_name("settings.json.gz"), FileKind::Settings);
        assert_eq!(FileKind::from_name("blob.gz"), FileKind::Other);
    }

    #[test]
    fn kind_inferred_from_base_name_within_path() {
        assert_eq!(
            FileKind::from_name("bin/settings.json"),
            FileKind::Settings
        );
        assert_eq!(
            FileKind::from_name(r"C:\app\logs\latest.log"),
            FileKind::Log
        );
    }

    #[test]
    fn settings_session_token_is_masked() {
        let raw = br#"{"sessionString": "secret123", "memory": "8192"}"#;
        let clean = sanitize(FileKind::Settings, raw).unwrap();
        let text = as_str(&clean);
        assert!(!text.contains("secret123"));
        assert!(text.contains(SESSION_MASK));
        assert!(text.contains("8192"));
    }

    #[test]
    fn settings_parse_failure_is_an_error() {
        assert!(sanitize(FileKind::Settings, b"not json{{").is_err());
    }

    #[test]
    fn profile_auth_keys_are_removed() {
        let raw = br#"{
            "authenticationDatabase": {"acc": {"accessToken": "tok"}},
            "clientToken": "abc-def",
            "launcherVersion": "2.2"
        }"#;
        let clean = sanitize(FileKind::Profile, raw).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&clean).unwrap();
        assert!(value.get("authenticationDatabase").is_none());
        assert!(value.get("clientToken").is_none());
        assert_eq!(value["launcherVersion"], "2.2");
    }

    #[test]
    fn profile_without_sensitive_keys_round_trips() {
        let raw = br#"{"launcherVersion": "2.2", "profiles": {"a": {"name": "x"}}}"#;
        let clean = sanitize(FileKind::Profile, raw).unwrap();
        let before: serde_json::Value = serde_json::from_slice(raw).unwrap();
        let after: serde_json::Value = serde_json::from_slice(&clean).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn profile_parse_failure_is_an_error() {
        assert!(sanitize(FileKind::Profile, b"\x00\x01").is_err());
    }

    #[test]
    fn jwt_tokens_are_redacted_in_logs() {
        let raw = b"token: \"eyJhbGciOiJIUzI1NiJ9.payload.sig\" issued";
        let clean = sanitize(FileKind::Log, raw).unwrap();
        let text = as_str(&clean);
        assert!(!text.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(text.contains("\"******AUTHTOKEN******"));
    }

    #[test]
    fn line_leading_tokens_are_redacted() {
        let raw = b"Ew1AbCdEfGh+ij/kl=\nsecond line";
        let clean = sanitize(FileKind::Log, raw).unwrap();
        let text = as_str(&clean);
        assert!(!text.contains("Ew1AbCdEfGh"));
        assert!(text.starts_with("******AUTHTOKEN******"));
        assert!(text.contains("second line"));
    }

    #[test]
    fn windows_home_path_username_is_masked() {
        let raw = br"java.io.FileNotFoundException: C:\Users\steve\ftba\instance.json";
        let clean = scrub_secrets(raw);
        let text = as_str(&clean);
        assert!(!text.contains("steve"));
        assert!(text.contains(r"C:\Users\***\ftba\instance.json"));
    }

    #[test]
    fn mac_home_path_username_is_masked() {
        let clean = scrub_secrets(b"path /Users/steve/Library/file.log missing");
        let text = as_str(&clean);
        assert!(!text.contains("steve"));
        assert!(text.contains("/Users/***/Library/file.log"));
    }

    #[test]
    fn linux_home_path_username_is_masked() {
        let clean = scrub_secrets(b"cwd=/home/steve/.ftba");
        assert_eq!(as_str(&clean), "cwd=/home/***/.ftba");
    }

    #[test]
    fn unknown_kind_still_gets_universal_scrub() {
        let raw = b"data at /home/steve/blob.bin";
        let clean = sanitize(FileKind::Other, raw).unwrap();
        assert!(!as_str(&clean).contains("steve"));
    }

    #[test]
    fn own_output_drops_ansi_and_control_bytes() {
        let raw = b"\x1b[32mSUCCESS\x1b[0m done\x07\r\n\tnext";
        let clean = sanitize(FileKind::OwnOutput, raw).unwrap();
        assert_eq!(as_str(&clean), "SUCCESS done\n\tnext");
    }

    #[test]
    fn scrub_handles_non_utf8_input() {
        let mut raw = vec![0xFF, 0xFE];
        raw.extend_from_slice(b"/home/steve/file");
        let clean = scrub_secrets(&raw);
        assert!(clean.starts_with(&[0xFF, 0xFE]));
        assert!(!clean.windows(5).any(|w| w == b"steve"));
    }

    proptest! {
        #[test]
        fn session_token_never_survives(token in "[a-zA-Z0-9]{8,40}") {
            let raw = format!(r#"{{"sessionString": "{token}"}}"#);
            let clean = sanitize(FileKind::Settings, raw.as_bytes()).unwrap();
            let value: serde_json::Value = serde_json::from_slice(&clean).unwrap();
            prop_assert_eq!(value["sessionString"].as_str().unwrap(), SESSION_MASK);
        }

        #[test]
        fn home_username_never_survives(user in "[a-zA-Z][a-zA-Z0-9_]{2,16}") {
            let raw = format!("at /home/{user}/x and C:\\Users\\{user}\\y");
            let clean = scrub_secrets(raw.as_bytes());
            let text = std::str::from_utf8(&clean).unwrap();
            let home_path = format!("/home/{user}");
            let users_path = format!("Users\\{user}");
            prop_assert!(!text.contains(&home_path));
            prop_assert!(!text.contains(&users_path));
            prop_assert!(text.contains("/home/***"));
            prop_assert!(text.contains("Users\\***"));
        }

        #[test]
        fn scrub_is_idempotent(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let once = scrub_secrets(&data);
            let twice = scrub_secrets(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
