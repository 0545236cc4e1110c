//! Legacy SysV init backend.
//!
//! No daemon to ask: existence is the init script, liveness is a pid
//! file cross-checked against the process table, with a lock file as
//! the secondary signal for scripts that never write a pid. Pure
//! classification over an injected filesystem view.

use std::path::PathBuf;

use log::debug;

use crate::error::{Error, Result};
use crate::fsview::{FsView, RealFs};
use crate::status::{CanonicalState, RawCode, ServiceStatus};

use super::StatusBackend;

pub struct SysVBackend<F: FsView = RealFs> {
    fs: F,
}

impl SysVBackend<RealFs> {
    pub fn new() -> Self {
        SysVBackend { fs: RealFs }
    }
}

impl Default for SysVBackend<RealFs> {
    fn default() -> Self {
        SysVBackend::new()
    }
}

impl<F: FsView> SysVBackend<F> {
    pub fn with_fs(fs: F) -> Self {
        SysVBackend { fs }
    }

    fn script_present(&self, name: &str) -> bool {
        self.fs
            .path_exists(&PathBuf::from("/etc/init.d").join(name))
    }

    /// First parseable positive pid from the conventional locations.
    fn read_pid(&self, name: &str) -> Option<u32> {
        let candidates = [
            PathBuf::from(format!("/var/run/{}.pid", name)),
            PathBuf::from(format!("/run/{}.pid", name)),
        ];
        for path in &candidates {
            if let Ok(content) = self.fs.read_to_string(path) {
                if let Ok(pid) = content.trim().parse::<u32>() {
                    if pid > 0 {
                        return Some(pid);
                    }
                }
            }
        }
        None
    }

    fn process_alive(&self, pid: u32) -> bool {
        self.fs.path_exists(&PathBuf::from(format!("/proc/{}", pid)))
    }

    fn lock_present(&self, name: &str) -> bool {
        let candidates = [
            PathBuf::from("/var/lock/subsys").join(name),
            PathBuf::from("/var/lock").join(name),
        ];
        candidates.iter().any(|p| self.fs.path_exists(p))
    }
}

impl<F: FsView + Send + Sync> StatusBackend for SysVBackend<F> {
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.script_present(name))
    }

    fn status(&self, name: &str) -> Result<ServiceStatus> {
        if !self.script_present(name) {
            return Err(Error::NotFound(name.to_string()));
        }

        let (state, pid) = match self.read_pid(name) {
            Some(pid) if self.process_alive(pid) => (CanonicalState::Running, pid),
            Some(stale) => {
                debug!("sysv pid file for {} holds dead pid {}", name, stale);
                (CanonicalState::Stopped, 0)
            }
            // Some scripts only drop a lock file. Its presence is the
            // best liveness signal left, but it names no process.
            None if self.lock_present(name) => (CanonicalState::Running, 0),
            None => (CanonicalState::Stopped, 0),
        };

        let raw = RawCode::Text(state.as_str().to_string());
        Ok(ServiceStatus::new(name, state, pid, raw))
    }
}
