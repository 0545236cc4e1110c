//! Linux backend: init-system detection plus dispatch.
//!
//! Detection runs on every call rather than once, so the answer tracks
//! the host's current mount namespace. The three real backends are
//! constructed up front; the systemd backend's bus connection is the
//! only construction-time resource.

use log::debug;

use crate::error::Result;
use crate::fsview::RealFs;
use crate::init_system::{self, InitSystemKind};
use crate::status::ServiceStatus;

use super::openrc::OpenRcBackend;
use super::systemd::SystemdBackend;
use super::sysv::SysVBackend;
use super::StatusBackend;

pub struct LinuxBackend {
    fs: RealFs,
    systemd: SystemdBackend,
    openrc: OpenRcBackend,
    sysv: SysVBackend,
}

impl LinuxBackend {
    pub fn new() -> Self {
        LinuxBackend {
            fs: RealFs,
            systemd: SystemdBackend::new(),
            openrc: OpenRcBackend::new(),
            sysv: SysVBackend::new(),
        }
    }

    fn select(&self) -> &dyn StatusBackend {
        match init_system::detect(&self.fs) {
            InitSystemKind::Systemd => &self.systemd,
            InitSystemKind::OpenRc => &self.openrc,
            InitSystemKind::SysV => &self.sysv,
        }
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        LinuxBackend::new()
    }
}

impl StatusBackend for LinuxBackend {
    fn exists(&self, name: &str) -> Result<bool> {
        debug!("existence check for {}", name);
        self.select().exists(name)
    }

    fn status(&self, name: &str) -> Result<ServiceStatus> {
        debug!("status query for {}", name);
        self.select().status(name)
    }
}
