//! State normalization tables.
//!
//! One total mapping per backend vocabulary. Unmapped raw codes always
//! degrade to `Unknown` carrying the original value, never to an error,
//! so a status query cannot fail just because the manager reported a
//! vocabulary word this crate has not seen.

use crate::status::{CanonicalState, RawCode};

/// Map a Windows SCM `dwCurrentState` code to the canonical state.
pub fn from_windows_code(code: u32) -> CanonicalState {
    match code {
        1 => CanonicalState::Stopped,
        2 => CanonicalState::StartPending,
        3 => CanonicalState::StopPending,
        4 => CanonicalState::Running,
        5 => CanonicalState::ContinuePending,
        6 => CanonicalState::PausePending,
        7 => CanonicalState::Paused,
        other => CanonicalState::Unknown(RawCode::Code(other)),
    }
}

/// Map a systemd `ActiveState` string to the canonical state.
///
/// `failed` maps to STOPPED: the unit has no running process, which is
/// what callers of a status query care about.
pub fn from_systemd_active_state(active_state: &str) -> CanonicalState {
    match active_state {
        "active" => CanonicalState::Running,
        "activating" => CanonicalState::StartPending,
        "deactivating" => CanonicalState::StopPending,
        "inactive" => CanonicalState::Stopped,
        "failed" => CanonicalState::Stopped,
        "reloading" => CanonicalState::ContinuePending,
        other => CanonicalState::Unknown(RawCode::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_table_round_trip() {
        assert_eq!(from_windows_code(1), CanonicalState::Stopped);
        assert_eq!(from_windows_code(2), CanonicalState::StartPending);
        assert_eq!(from_windows_code(3), CanonicalState::StopPending);
        assert_eq!(from_windows_code(4), CanonicalState::Running);
        assert_eq!(from_windows_code(5), CanonicalState::ContinuePending);
        assert_eq!(from_windows_code(6), CanonicalState::PausePending);
        assert_eq!(from_windows_code(7), CanonicalState::Paused);
    }

    #[test]
    fn test_windows_unmapped_code_preserved() {
        match from_windows_code(99) {
            CanonicalState::Unknown(RawCode::Code(99)) => {}
            other => panic!("expected Unknown(99), got {:?}", other),
        }
        assert_eq!(from_windows_code(0).as_str(), "unknown");
    }

    #[test]
    fn test_systemd_table_round_trip() {
        assert_eq!(from_systemd_active_state("active"), CanonicalState::Running);
        assert_eq!(
            from_systemd_active_state("activating"),
            CanonicalState::StartPending
        );
        assert_eq!(
            from_systemd_active_state("deactivating"),
            CanonicalState::StopPending
        );
        assert_eq!(from_systemd_active_state("inactive"), CanonicalState::Stopped);
        assert_eq!(from_systemd_active_state("failed"), CanonicalState::Stopped);
        assert_eq!(
            from_systemd_active_state("reloading"),
            CanonicalState::ContinuePending
        );
    }

    #[test]
    fn test_systemd_unmapped_state_preserved_exactly() {
        match from_systemd_active_state("maintenance") {
            CanonicalState::Unknown(RawCode::Text(raw)) => assert_eq!(raw, "maintenance"),
            other => panic!("expected Unknown(maintenance), got {:?}", other),
        }
    }
}
