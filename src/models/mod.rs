//! Data models for the diagnostic run.
//!
//! Two families live here:
//! - [`app`]: shapes of the files the FTB App writes to disk (settings,
//!   instances, profiles, build metadata). All are tolerant of missing keys
//!   since the source tree is partially untrusted.
//! - [`manifest`]: the aggregate document this tool produces, plus the
//!   summary records that feed it.

pub mod app;
pub mod manifest;

pub use app::{AppMeta, AppSettings, Instance, Profile, Profiles, SESSION_MASK};
pub use manifest::{
    AppDetails, InstanceLogEntry, InstanceSummary, Manifest, MetaDetails, NetworkCheck,
    MANIFEST_VERSION,
};
