//! Canonical result shape shared by every backend.

use serde::{Serialize, Serializer};

/// Unified service state, regardless of which backend produced it.
///
/// `Unknown` carries the untranslated backend value so diagnostics never
/// lose information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalState {
    Running,
    Stopped,
    StartPending,
    StopPending,
    ContinuePending,
    PausePending,
    Paused,
    Unknown(RawCode),
}

impl CanonicalState {
    /// Lower-cased wire name for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalState::Running => "running",
            CanonicalState::Stopped => "stopped",
            CanonicalState::StartPending => "start_pending",
            CanonicalState::StopPending => "stop_pending",
            CanonicalState::ContinuePending => "continue_pending",
            CanonicalState::PausePending => "pause_pending",
            CanonicalState::Paused => "paused",
            CanonicalState::Unknown(_) => "unknown",
        }
    }
}

impl Serialize for CanonicalState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Backend-native status value: a numeric state code on Windows, a
/// status string elsewhere. Always surfaced next to the canonical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawCode {
    Code(u32),
    Text(String),
}

impl From<u32> for RawCode {
    fn from(code: u32) -> Self {
        RawCode::Code(code)
    }
}

impl From<&str> for RawCode {
    fn from(text: &str) -> Self {
        RawCode::Text(text.to_string())
    }
}

impl From<String> for RawCode {
    fn from(text: String) -> Self {
        RawCode::Text(text)
    }
}

/// Result of a status query. Only ever returned for a service that
/// exists; absence is an error from `status()` and a `false` from
/// `exists()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    /// Service name exactly as the caller gave it.
    pub name: String,
    /// Always true on a successful return.
    pub exists: bool,
    pub state: CanonicalState,
    /// Main process id, 0 when the service has no active process.
    pub pid: u32,
    #[serde(rename = "rawCode")]
    pub raw_code: RawCode,
}

impl ServiceStatus {
    pub fn new(name: &str, state: CanonicalState, pid: u32, raw_code: RawCode) -> Self {
        ServiceStatus {
            name: name.to_string(),
            exists: true,
            state,
            pid,
            raw_code,
        }
    }
}
