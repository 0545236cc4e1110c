//! OpenRC backend.
//!
//! OpenRC exposes no daemon API for status queries; state is derived
//! entirely from the runtime marker files it maintains under
//! /run/openrc. The backend is a pure classification over an injected
//! filesystem view.

use std::path::PathBuf;

use log::debug;

use crate::error::{Error, Result};
use crate::fsview::{FsView, RealFs};
use crate::status::{CanonicalState, RawCode, ServiceStatus};

use super::StatusBackend;

/// Runtime marker directories, mutually exclusive per service.
const MARKER_STARTED: &str = "/run/openrc/started";
const MARKER_STARTING: &str = "/run/openrc/starting";
const MARKER_STOPPING: &str = "/run/openrc/stopping";

pub struct OpenRcBackend<F: FsView = RealFs> {
    fs: F,
}

impl OpenRcBackend<RealFs> {
    pub fn new() -> Self {
        OpenRcBackend { fs: RealFs }
    }
}

impl Default for OpenRcBackend<RealFs> {
    fn default() -> Self {
        OpenRcBackend::new()
    }
}

impl<F: FsView> OpenRcBackend<F> {
    pub fn with_fs(fs: F) -> Self {
        OpenRcBackend { fs }
    }

    fn script_present(&self, name: &str) -> bool {
        let init_script = PathBuf::from("/etc/init.d").join(name);
        let runlevel_link = PathBuf::from("/etc/runlevels/default").join(name);
        self.fs.path_exists(&init_script) || self.fs.path_exists(&runlevel_link)
    }

    fn classify(&self, name: &str) -> CanonicalState {
        if self.fs.path_exists(&PathBuf::from(MARKER_STARTED).join(name)) {
            CanonicalState::Running
        } else if self.fs.path_exists(&PathBuf::from(MARKER_STARTING).join(name)) {
            CanonicalState::StartPending
        } else if self.fs.path_exists(&PathBuf::from(MARKER_STOPPING).join(name)) {
            CanonicalState::StopPending
        } else {
            CanonicalState::Stopped
        }
    }

    fn read_pid(&self, name: &str) -> u32 {
        let candidates = [
            PathBuf::from(format!("/run/{}.pid", name)),
            PathBuf::from(format!("/var/run/{}.pid", name)),
        ];
        for path in &candidates {
            if let Ok(content) = self.fs.read_to_string(path) {
                if let Ok(pid) = content.trim().parse::<u32>() {
                    return pid;
                }
            }
        }
        0
    }
}

impl<F: FsView + Send + Sync> StatusBackend for OpenRcBackend<F> {
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.script_present(name))
    }

    fn status(&self, name: &str) -> Result<ServiceStatus> {
        if !self.script_present(name) {
            return Err(Error::NotFound(name.to_string()));
        }

        let state = self.classify(name);
        let pid = self.read_pid(name);
        debug!("openrc status for {}: {} (pid {})", name, state.as_str(), pid);

        // OpenRC has no richer native vocabulary than the markers
        // themselves; the raw code is the canonical state name.
        let raw = RawCode::Text(state.as_str().to_string());
        Ok(ServiceStatus::new(name, state, pid, raw))
    }
}
