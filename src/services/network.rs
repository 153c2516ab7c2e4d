//! Endpoint reachability probes.
//!
//! A fixed table of vendor and third-party endpoints is probed once per run,
//! one attempt per URL, no retries. Entries are independent; they run
//! through a small bounded worker pool and the merged results are sorted by
//! URL so manifest output is deterministic even though the table itself is
//! an unordered mapping.
//!
//! The auth endpoints are expected to answer 400/401 to an unauthenticated
//! request; reaching them at all is what the check verifies.

use std::time::Duration;

use futures_util::StreamExt;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::NetworkCheck;

/// Parallel in-flight probes. The table is small and fixed; this just keeps
/// a slow endpoint from serializing the whole phase.
const PROBE_CONCURRENCY: usize = 4;

/// Per-request timeout. An unresponsive endpoint must not stall the run.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Placeholder substituted with a fresh v4 UUID before dispatch, for
/// endpoints that require a unique per-request identifier.
const RANDOM_UUID: &str = "RANDOM_UUID";

/// Expected-body validation for a probe.
#[derive(Debug, Clone, Copy)]
pub enum BodyMatch {
    Exact(&'static str),
    Pattern(&'static str),
}

/// One row of the probe table.
#[derive(Debug, Clone, Copy)]
pub struct UrlCheck {
    pub method: &'static str,
    pub expected_status: u16,
    pub expected_body: Option<BodyMatch>,
}

impl UrlCheck {
    const fn head(expected_status: u16) -> Self {
        Self {
            method: "HEAD",
            expected_status,
            expected_body: None,
        }
    }

    const fn get(expected_status: u16) -> Self {
        Self {
            method: "GET",
            expected_status,
            expected_body: None,
        }
    }

    const fn post(expected_status: u16) -> Self {
        Self {
            method: "POST",
            expected_status,
            expected_body: None,
        }
    }
}

/// The static probe table: FTB services, Mojang/Microsoft auth and metadata
/// endpoints, JRE sources and the mod-loader mavens.
pub fn default_checks() -> IndexMap<&'static str, UrlCheck> {
    IndexMap::from([
        ("https://api.feed-the-beast.com/v1", UrlCheck::head(404)),
        (
            "https://meta.feed-the-beast.com/v1/health",
            UrlCheck::get(200),
        ),
        (
            "https://api.modpacks.ch/public/api/ping",
            UrlCheck {
                method: "GET",
                expected_status: 200,
                expected_body: Some(BodyMatch::Exact(
                    r#"{"status":"success","reply":"pong"}"#,
                )),
            },
        ),
        (
            "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json",
            UrlCheck::get(200),
        ),
        (
            "https://launchermeta.mojang.com/mc/game/version_manifest_v2.json",
            UrlCheck::get(200),
        ),
        (
            "https://api.adoptium.net/v3/assets/latest/21/hotspot?architecture=x64&image_type=jre",
            UrlCheck::get(200),
        ),
        (
            "https://github.com/adoptium/temurin21-binaries/releases/download/jdk-21.0.4%2B7/OpenJDK21U-jre_x64_windows_hotspot_21.0.4_7.zip",
            UrlCheck::head(200),
        ),
        ("https://maven.fabricmc.net", UrlCheck::head(200)),
        (
            "https://maven.neoforged.net/net/neoforged/neoforge/maven-metadata.xml",
            UrlCheck::head(200),
        ),
        (
            "https://maven.minecraftforge.net/net/minecraftforge/forge/maven-metadata.xml",
            UrlCheck::head(200),
        ),
        ("https://maven.creeperhost.net", UrlCheck::head(200)),
        ("https://api.creeper.host/api/health", UrlCheck::head(200)),
        (
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode",
            UrlCheck::get(400),
        ),
        (
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/token",
            UrlCheck::post(400),
        ),
        (
            "https://api.minecraftservices.com/authentication/login_with_xbox",
            UrlCheck::post(400),
        ),
        (
            "https://user.auth.xboxlive.com/user/authenticate",
            UrlCheck::post(400),
        ),
        (
            "https://xsts.auth.xboxlive.com/xsts/authorize",
            UrlCheck::post(400),
        ),
        (
            "https://api.minecraftservices.com/entitlements/license?requestId=RANDOM_UUID",
            UrlCheck::get(401),
        ),
        (
            "https://api.minecraftservices.com/entitlements/mcstore",
            UrlCheck::get(401),
        ),
        (
            "https://api.minecraftservices.com/minecraft/profile",
            UrlCheck::get(401),
        ),
    ])
}

/// What a dispatched probe came back with. Body is only read when the table
/// entry asked for body validation.
#[derive(Debug)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Option<String>,
}

pub struct NetworkProbe {
    client: reqwest::Client,
    checks: IndexMap<&'static str, UrlCheck>,
}

impl NetworkProbe {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self {
            client,
            checks: default_checks(),
        })
    }

    pub fn with_checks(
        client: reqwest::Client,
        checks: IndexMap<&'static str, UrlCheck>,
    ) -> Self {
        Self { client, checks }
    }

    /// Probe every entry once, with bounded concurrency, and return the
    /// results sorted by URL. Cancellation aborts the outstanding requests
    /// and keeps whatever results completed before it.
    pub async fn run(&self, cancel: &CancellationToken) -> Vec<NetworkCheck> {
        let mut results: Vec<NetworkCheck> = futures_util::stream::iter(self.checks.iter())
            .map(|(url, check)| self.probe_one(url, check))
            .buffer_unordered(PROBE_CONCURRENCY)
            .take_until(cancel.cancelled())
            .collect()
            .await;
        if cancel.is_cancelled() {
            tracing::warn!("network checks interrupted after {} result(s)", results.len());
        }
        results.sort_by(|a, b| a.url.cmp(&b.url));

        for result in &results {
            if result.error {
                tracing::error!("{}: {}", result.url, result.status);
            } else if !result.success {
                tracing::warn!("{}: {}", result.url, result.status);
            } else {
                tracing::info!("{}: {}", result.url, result.status);
            }
        }
        results
    }

    async fn probe_one(&self, url: &str, check: &UrlCheck) -> NetworkCheck {
        let dispatch_url = url.replacen(RANDOM_UUID, &Uuid::new_v4().to_string(), 1);
        let outcome = self.dispatch(&dispatch_url, check).await;
        classify(url, check, outcome)
    }

    async fn dispatch(&self, url: &str, check: &UrlCheck) -> Result<ProbeResponse, String> {
        let method = reqwest::Method::from_bytes(check.method.as_bytes())
            .map_err(|e| format!("invalid method {}: {e}", check.method))?;
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let body = if check.expected_body.is_some() {
            Some(response.text().await.map_err(|e| e.to_string())?)
        } else {
            None
        };
        Ok(ProbeResponse { status, body })
    }
}

/// Classify one probe outcome: transport failure is a hard error, a
/// completed request that misses expectations is a soft failure.
pub fn classify(
    url: &str,
    check: &UrlCheck,
    outcome: Result<ProbeResponse, String>,
) -> NetworkCheck {
    let response = match outcome {
        Err(message) => {
            return NetworkCheck {
                url: url.to_string(),
                success: false,
                error: true,
                status: format!("request failed: {message}"),
            };
        }
        Ok(response) => response,
    };

    if response.status != check.expected_status {
        return NetworkCheck {
            url: url.to_string(),
            success: false,
            error: false,
            status: format!(
                "expected status {} got {}",
                check.expected_status, response.status
            ),
        };
    }

    if let Some(expected) = &check.expected_body {
        let body = response.body.as_deref().unwrap_or_default();
        let matched = match expected {
            BodyMatch::Exact(want) => body == *want,
            BodyMatch::Pattern(pattern) => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(body),
                Err(e) => {
                    return NetworkCheck {
                        url: url.to_string(),
                        success: false,
                        error: true,
                        status: format!("invalid body pattern: {e}"),
                    };
                }
            },
        };
        if !matched {
            return NetworkCheck {
                url: url.to_string(),
                success: false,
                error: false,
                status: format!("response body did not match: {body}"),
            };
        }
    }

    NetworkCheck {
        url: url.to_string(),
        success: true,
        error: false,
        status: "ok".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: UrlCheck = UrlCheck {
        method: "GET",
        expected_status: 200,
        expected_body: Some(BodyMatch::Exact(r#"{"status":"success","reply":"pong"}"#)),
    };

    #[test]
    fn matching_status_and_body_is_success() {
        let outcome = Ok(ProbeResponse {
            status: 200,
            body: Some(r#"{"status":"success","reply":"pong"}"#.to_string()),
        });
        let result = classify("https://api.example/ping", &PING, outcome);
        assert!(result.success);
        assert!(!result.error);
        assert_eq!(result.status, "ok");
    }

    #[test]
    fn unexpected_status_is_soft_failure() {
        let outcome = Ok(ProbeResponse {
            status: 503,
            body: None,
        });
        let result = classify("https://maven.example", &UrlCheck::head(200), outcome);
        assert!(!result.success);
        assert!(!result.error);
        assert!(result.status.contains("expected status 200 got 503"));
    }

    #[test]
    fn body_mismatch_is_soft_failure() {
        let outcome = Ok(ProbeResponse {
            status: 200,
            body: Some("maintenance".to_string()),
        });
        let result = classify("https://api.example/ping", &PING, outcome);
        assert!(!result.success);
        assert!(!result.error);
        assert!(result.status.contains("did not match"));
    }

    #[test]
    fn transport_failure_is_hard_error() {
        let result = classify(
            "https://api.example/ping",
            &PING,
            Err("dns error".to_string()),
        );
        assert!(!result.success);
        assert!(result.error);
        assert!(result.status.contains("dns error"));
    }

    #[test]
    fn pattern_body_match_accepts_regex() {
        let check = UrlCheck {
            method: "GET",
            expected_status: 200,
            expected_body: Some(BodyMatch::Pattern(r#""reply":\s*"pong""#)),
        };
        let outcome = Ok(ProbeResponse {
            status: 200,
            body: Some(r#"{ "status": "success", "reply": "pong" }"#.to_string()),
        });
        assert!(classify("https://api.example/ping", &check, outcome).success);
    }

    #[test]
    fn expected_error_statuses_count_as_success() {
        // Auth endpoints answer 401 to unauthenticated probes by design.
        let outcome = Ok(ProbeResponse {
            status: 401,
            body: None,
        });
        let result = classify("https://auth.example/profile", &UrlCheck::get(401), outcome);
        assert!(result.success);
    }

    #[test]
    fn default_table_carries_the_uuid_template_once() {
        let checks = default_checks();
        let templated: Vec<_> = checks
            .keys()
            .filter(|url| url.contains(RANDOM_UUID))
            .collect();
        assert_eq!(templated.len(), 1);
    }
}
