//! Services module - the diagnostic pipeline's business logic.
//!
//! Each service owns one phase of a diagnostic run and is usable on its own;
//! [`report`] strings them together. None of them touch the console directly,
//! everything user-visible goes through `tracing`.
//!
//! # Components
//!
//! - [`sanitize`]: pure redaction of auth tokens, session strings and home
//!   paths. Every byte that leaves the machine passes through here first.
//! - [`upload`]: the paste-service transport with its multipart fallback for
//!   oversized blobs, behind the [`upload::PasteTransport`] seam.
//! - [`collector`]: filesystem walks over the App's logs and instances,
//!   handing each qualifying file to the uploader.
//! - [`network`]: one-shot reachability probes against the fixed endpoint
//!   table.
//! - [`report`]: run orchestration and final manifest assembly.

pub mod collector;
pub mod network;
pub mod report;
pub mod sanitize;
pub mod upload;

pub use collector::{CollectError, Collector, InstanceCollection};
pub use network::{NetworkProbe, UrlCheck};
pub use report::{assemble, run_diagnostics, ReportParts, RunOptions};
pub use sanitize::{sanitize, FileKind, SanitizeError};
pub use upload::{HttpPasteTransport, PasteTransport, TransportError, UploadError, Uploader};
