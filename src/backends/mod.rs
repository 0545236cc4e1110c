//! Platform backends and backend selection.

use crate::error::Result;
use crate::status::ServiceStatus;

#[cfg(target_os = "linux")]
pub mod openrc;
#[cfg(target_os = "linux")]
pub mod sysv;
#[cfg(target_os = "linux")]
pub mod systemd;
#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(windows)]
pub mod windows;

/// A service-manager backend.
///
/// `exists` treats an unregistered service as a plain `false`;
/// `status` treats the same condition as `Error::NotFound`. The
/// asymmetry is deliberate: existence checks are error-free by design,
/// status retrieval requires an existing subject.
pub trait StatusBackend: Send + Sync {
    fn exists(&self, name: &str) -> Result<bool>;
    fn status(&self, name: &str) -> Result<ServiceStatus>;
}

/// Select the backend for the running platform.
///
/// Chosen once at startup and injected into the resolver; per-call
/// dispatch below this point (Linux init-system detection, the systemd
/// query cascade) is internal to the selected backend.
#[cfg(windows)]
pub fn platform_backend() -> Box<dyn StatusBackend> {
    log::debug!("selecting Windows SCM backend");
    Box::new(windows::WindowsScmBackend::new())
}

#[cfg(target_os = "linux")]
pub fn platform_backend() -> Box<dyn StatusBackend> {
    log::debug!("selecting Linux backend with per-call init detection");
    Box::new(linux::LinuxBackend::new())
}
