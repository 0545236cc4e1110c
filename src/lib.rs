//! svcstatus - Cross-platform service existence and status queries
//!
//! Answers one question uniformly across operating systems: does a
//! named service exist, and in what state is it? Windows queries go to
//! the Service Control Manager directly; Linux queries go through the
//! detected init system (systemd over the bus with a systemctl
//! fallback, OpenRC and SysV through filesystem probes), and every
//! backend's native vocabulary is normalized into one canonical state.

pub mod backends;
pub mod error;
pub mod fsview;
#[cfg(target_os = "linux")]
pub mod init_system;
pub mod normalize;
pub mod resolver;
pub mod status;

pub use error::{Error, Result};
pub use resolver::ServiceResolver;
pub use status::{CanonicalState, RawCode, ServiceStatus};
