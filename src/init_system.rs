//! Linux init system detection.
//!
//! Classification is recomputed on every call. Detection is a handful
//! of stat calls, and a cached answer could go stale for callers whose
//! mount namespace changes between calls (containers entered at
//! runtime), so there is no memoized state here.

use std::path::Path;

use log::debug;

use crate::fsview::FsView;

/// Which init system manages services on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSystemKind {
    Systemd,
    OpenRc,
    SysV,
}

/// systemd's private control socket, present when systemd is PID 1.
const SYSTEMD_PRIVATE_SOCKET: &str = "/run/systemd/private";
/// systemd control-group mount, present on cgroup-v1 hosts.
const SYSTEMD_CGROUP_MOUNT: &str = "/sys/fs/cgroup/systemd";
/// OpenRC writes the current runlevel here once it has booted.
const OPENRC_SOFTLEVEL: &str = "/run/openrc/softlevel";
/// OpenRC runtime state directory.
const OPENRC_RUN_DIR: &str = "/run/openrc";

/// Classify the running host's init system from filesystem markers.
///
/// systemd markers win over OpenRC markers; with neither present the
/// host is treated as legacy SysV, which is the weakest assumption and
/// still answers queries through init scripts and pid files.
pub fn detect<F: FsView>(fs: &F) -> InitSystemKind {
    if fs.path_exists(Path::new(SYSTEMD_PRIVATE_SOCKET))
        || fs.path_exists(Path::new(SYSTEMD_CGROUP_MOUNT))
    {
        debug!("init system detected: systemd");
        return InitSystemKind::Systemd;
    }

    if fs.path_exists(Path::new(OPENRC_SOFTLEVEL)) || fs.path_exists(Path::new(OPENRC_RUN_DIR)) {
        debug!("init system detected: OpenRC");
        return InitSystemKind::OpenRc;
    }

    debug!("no systemd or OpenRC markers, assuming SysV");
    InitSystemKind::SysV
}
