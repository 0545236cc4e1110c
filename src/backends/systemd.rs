//! systemd backend.
//!
//! Three-stage cascade: a direct system-bus property read, then a
//! `systemctl show` subprocess bounded by a timeout, then delegation to
//! the SysV backend. Many systemd distributions keep legacy init
//! scripts around, so a unit systemd does not know may still be a real,
//! queryable service.

use std::io;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use zbus::blocking::{Connection, Proxy};

use crate::error::{Error, Result};
use crate::fsview::{FsView, RealFs};
use crate::normalize;
use crate::status::{RawCode, ServiceStatus};

use super::sysv::SysVBackend;
use super::StatusBackend;

const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
const UNIT_PATH_PREFIX: &str = "/org/freedesktop/systemd1/unit/";
const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
const SERVICE_INTERFACE: &str = "org.freedesktop.systemd1.Service";

/// Timeout for `systemctl show`.
const STATUS_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for the `systemctl --version` presence probe.
const PRESENCE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// The four properties every query stage reports.
#[derive(Debug, Clone, Default, PartialEq)]
struct UnitProps {
    load_state: String,
    active_state: String,
    sub_state: String,
    main_pid: u32,
}

impl UnitProps {
    /// Whether systemd actually knows this unit. An empty or
    /// "not-found" LoadState means it does not.
    fn unit_known(&self) -> bool {
        !self.load_state.is_empty() && self.load_state != "not-found"
    }
}

pub struct SystemdBackend<F: FsView + Send + Sync = RealFs> {
    /// System-bus connection, a constructor-time outcome. `None` means
    /// the bus is unreachable and stage 1 is skipped without counting
    /// as a query failure.
    bus: Option<Connection>,
    sysv: SysVBackend<F>,
}

impl SystemdBackend<RealFs> {
    pub fn new() -> Self {
        let bus = match Connection::system() {
            Ok(conn) => Some(conn),
            Err(e) => {
                debug!("system bus unavailable, will fall back to systemctl: {}", e);
                None
            }
        };
        SystemdBackend {
            bus,
            sysv: SysVBackend::new(),
        }
    }
}

impl Default for SystemdBackend<RealFs> {
    fn default() -> Self {
        SystemdBackend::new()
    }
}

impl<F: FsView + Send + Sync> SystemdBackend<F> {
    #[cfg(test)]
    fn without_bus(sysv: SysVBackend<F>) -> Self {
        SystemdBackend { bus: None, sysv }
    }

    /// Stage 1: read the unit properties straight off the bus.
    fn query_bus(&self, conn: &Connection, unit: &str) -> zbus::Result<UnitProps> {
        let path = unit_bus_path(unit);
        let unit_proxy = Proxy::new(conn, SYSTEMD_DESTINATION, path.as_str(), UNIT_INTERFACE)?;
        let load_state: String = unit_proxy.get_property("LoadState")?;
        let active_state: String = unit_proxy.get_property("ActiveState")?;
        let sub_state: String = unit_proxy.get_property("SubState")?;

        // MainPID lives on the Service interface and only exists for
        // service units; a failed read is pid 0, not a stage failure.
        let main_pid: u32 =
            Proxy::new(conn, SYSTEMD_DESTINATION, path.as_str(), SERVICE_INTERFACE)
                .and_then(|p| p.get_property("MainPID"))
                .unwrap_or(0);

        Ok(UnitProps {
            load_state,
            active_state,
            sub_state,
            main_pid,
        })
    }

    /// Stage 2: `systemctl show`, parsed as key=value lines.
    fn query_systemctl(&self, unit: &str) -> io::Result<UnitProps> {
        let mut cmd = Command::new("systemctl");
        cmd.arg("show")
            .arg(unit)
            .arg("--property=LoadState,ActiveState,SubState,MainPID");
        let output = run_with_timeout(cmd, STATUS_QUERY_TIMEOUT)?;
        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("systemctl show exited with {}", output.status),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_show_output(&stdout))
    }

    fn systemctl_available(&self) -> bool {
        let mut cmd = Command::new("systemctl");
        cmd.arg("--version");
        match run_with_timeout(cmd, PRESENCE_PROBE_TIMEOUT) {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Run stages 1 and 2. `None` means both stages failed at the
    /// transport level and nothing definitive was learned.
    fn query_props(&self, unit: &str) -> Option<UnitProps> {
        if let Some(conn) = &self.bus {
            match self.query_bus(conn, unit) {
                Ok(props) => {
                    debug!("bus query for {}: {:?}", unit, props);
                    return Some(props);
                }
                Err(e) => debug!("bus query for {} failed: {}", unit, e),
            }
        }

        if self.systemctl_available() {
            match self.query_systemctl(unit) {
                Ok(props) => {
                    debug!("systemctl query for {}: {:?}", unit, props);
                    return Some(props);
                }
                Err(e) => warn!("systemctl query for {} failed: {}", unit, e),
            }
        } else {
            debug!("systemctl not available on this host");
        }

        None
    }

    /// Decide the final answer from what the query stages produced.
    /// `None` props means transport exhaustion, where a surviving SysV
    /// init script is the last word; without one the manager state is
    /// unknowable and that is a transport error, not a NotFound.
    fn status_from_props(&self, name: &str, props: Option<UnitProps>) -> Result<ServiceStatus> {
        match props {
            Some(props) if props.unit_known() => {
                let state = normalize::from_systemd_active_state(&props.active_state);
                let raw = RawCode::Text(props.active_state.clone());
                Ok(ServiceStatus::new(name, state, props.main_pid, raw))
            }
            Some(_) => {
                debug!("unit {} unknown to systemd, trying legacy init scripts", name);
                self.sysv.status(name)
            }
            None => match self.sysv.status(name) {
                Ok(status) => Ok(status),
                Err(Error::NotFound(_)) => Err(Error::Transport(format!(
                    "systemd unreachable and no init script for '{}'",
                    name
                ))),
                Err(e) => Err(e),
            },
        }
    }

    fn exists_from_props(&self, name: &str, props: Option<UnitProps>) -> Result<bool> {
        match props {
            Some(props) if props.unit_known() => Ok(true),
            Some(_) => self.sysv.exists(name),
            None => {
                if self.sysv.exists(name)? {
                    Ok(true)
                } else {
                    Err(Error::Transport(format!(
                        "systemd unreachable and no init script for '{}'",
                        name
                    )))
                }
            }
        }
    }
}

impl<F: FsView + Send + Sync> StatusBackend for SystemdBackend<F> {
    fn exists(&self, name: &str) -> Result<bool> {
        let unit = unit_name(name);
        let props = self.query_props(&unit);
        self.exists_from_props(name, props)
    }

    fn status(&self, name: &str) -> Result<ServiceStatus> {
        let unit = unit_name(name);
        let props = self.query_props(&unit);
        self.status_from_props(name, props)
    }
}

/// Append the `.service` suffix unless the caller already gave one.
fn unit_name(name: &str) -> String {
    if name.ends_with(".service") {
        name.to_string()
    } else {
        format!("{}.service", name)
    }
}

/// systemd bus-label escaping for the unit object path: every byte
/// outside [A-Za-z0-9], and a digit in the first position, becomes
/// `_xx` with two lowercase hex digits. An empty name escapes to `_`.
fn unit_bus_path(unit: &str) -> String {
    let mut label = String::with_capacity(unit.len());
    if unit.is_empty() {
        label.push('_');
    }
    for (i, byte) in unit.bytes().enumerate() {
        let plain = byte.is_ascii_alphabetic() || (byte.is_ascii_digit() && i != 0);
        if plain {
            label.push(byte as char);
        } else {
            label.push_str(&format!("_{:02x}", byte));
        }
    }
    format!("{}{}", UNIT_PATH_PREFIX, label)
}

fn parse_show_output(stdout: &str) -> UnitProps {
    let mut props = UnitProps::default();
    for line in stdout.lines() {
        if let Some(value) = line.strip_prefix("LoadState=") {
            props.load_state = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("ActiveState=") {
            props.active_state = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("SubState=") {
            props.sub_state = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("MainPID=") {
            props.main_pid = value.trim().parse().unwrap_or(0);
        }
    }
    props
}

/// Run a command to completion, killing it once the deadline passes.
/// A timeout is an error for the calling stage only.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> io::Result<std::process::Output> {
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let start = Instant::now();
    let mut child = cmd.spawn()?;
    loop {
        match child.try_wait()? {
            Some(_) => return child.wait_with_output(),
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("command timed out after {:?}", timeout),
                ));
            }
            None => thread::sleep(Duration::from_millis(20)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsview::fake::FakeFs;
    use crate::status::CanonicalState;

    fn backend_with_fs(fs: FakeFs) -> SystemdBackend<FakeFs> {
        SystemdBackend::without_bus(SysVBackend::with_fs(fs))
    }

    fn props(load: &str, active: &str, sub: &str, pid: u32) -> UnitProps {
        UnitProps {
            load_state: load.to_string(),
            active_state: active.to_string(),
            sub_state: sub.to_string(),
            main_pid: pid,
        }
    }

    #[test]
    fn test_unit_name_suffix() {
        assert_eq!(unit_name("sshd"), "sshd.service");
        assert_eq!(unit_name("sshd.service"), "sshd.service");
    }

    #[test]
    fn test_unit_bus_path_escaping() {
        assert_eq!(
            unit_bus_path("sshd.service"),
            "/org/freedesktop/systemd1/unit/sshd_2eservice"
        );
        assert_eq!(
            unit_bus_path("dbus-org.freedesktop.timesync1.service"),
            "/org/freedesktop/systemd1/unit/dbus_2dorg_2efreedesktop_2etimesync1_2eservice"
        );
        // A leading digit is escaped, later digits are not.
        assert_eq!(
            unit_bus_path("2ping.service"),
            "/org/freedesktop/systemd1/unit/_32ping_2eservice"
        );
        assert_eq!(unit_bus_path(""), "/org/freedesktop/systemd1/unit/_");
    }

    #[test]
    fn test_parse_show_output() {
        let stdout = "LoadState=loaded\nActiveState=active\nSubState=running\nMainPID=1234\n";
        assert_eq!(
            parse_show_output(stdout),
            props("loaded", "active", "running", 1234)
        );
    }

    #[test]
    fn test_parse_show_output_tolerates_noise() {
        let stdout = "LoadState=not-found\nMainPID=garbage\nUnrelated=x\n";
        let parsed = parse_show_output(stdout);
        assert_eq!(parsed.load_state, "not-found");
        assert_eq!(parsed.main_pid, 0);
        assert!(parsed.active_state.is_empty());
    }

    #[test]
    fn test_active_unit_maps_to_running() {
        let backend = backend_with_fs(FakeFs::new());
        let status = backend
            .status_from_props("sshd", Some(props("loaded", "active", "running", 1234)))
            .unwrap();
        assert_eq!(status.name, "sshd");
        assert!(status.exists);
        assert_eq!(status.state, CanonicalState::Running);
        assert_eq!(status.pid, 1234);
        assert_eq!(status.raw_code, RawCode::Text("active".into()));
    }

    #[test]
    fn test_failed_unit_maps_to_stopped() {
        let backend = backend_with_fs(FakeFs::new());
        let status = backend
            .status_from_props("cups", Some(props("loaded", "failed", "failed", 0)))
            .unwrap();
        assert_eq!(status.state, CanonicalState::Stopped);
        assert_eq!(status.raw_code, RawCode::Text("failed".into()));
    }

    #[test]
    fn test_unmapped_active_state_degrades_to_unknown() {
        let backend = backend_with_fs(FakeFs::new());
        let status = backend
            .status_from_props("odd", Some(props("loaded", "maintenance", "x", 7)))
            .unwrap();
        assert_eq!(status.state.as_str(), "unknown");
        assert_eq!(status.raw_code, RawCode::Text("maintenance".into()));
    }

    #[test]
    fn test_not_found_unit_without_init_script() {
        let backend = backend_with_fs(FakeFs::new());
        let err = backend
            .status_from_props("ghost", Some(props("not-found", "inactive", "dead", 0)))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(
            backend
                .exists_from_props("ghost", Some(props("not-found", "inactive", "dead", 0)))
                .unwrap(),
            false
        );
    }

    #[test]
    fn test_not_found_unit_falls_back_to_init_script() {
        let mut fs = FakeFs::new();
        fs.touch("/etc/init.d/legacyd");
        fs.write("/var/run/legacyd.pid", "321");
        fs.touch("/proc/321");
        let backend = backend_with_fs(fs);

        let not_found = Some(props("not-found", "inactive", "dead", 0));
        let status = backend
            .status_from_props("legacyd", not_found.clone())
            .unwrap();
        assert_eq!(status.state, CanonicalState::Running);
        assert_eq!(status.pid, 321);
        assert!(backend.exists_from_props("legacyd", not_found).unwrap());
    }

    #[test]
    fn test_transport_exhaustion_uses_init_script() {
        let mut fs = FakeFs::new();
        fs.touch("/etc/init.d/legacyd");
        fs.write("/run/legacyd.pid", "55");
        fs.touch("/proc/55");
        let backend = backend_with_fs(fs);

        let status = backend.status_from_props("legacyd", None).unwrap();
        assert_eq!(status.state, CanonicalState::Running);
        assert_eq!(status.pid, 55);
    }

    #[test]
    fn test_transport_exhaustion_without_init_script_errors() {
        let backend = backend_with_fs(FakeFs::new());
        assert!(matches!(
            backend.status_from_props("ghost", None),
            Err(Error::Transport(_))
        ));
        assert!(matches!(
            backend.exists_from_props("ghost", None),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_run_with_timeout_kills_slow_command() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_with_timeout(cmd, Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_run_with_timeout_returns_output() {
        let mut cmd = Command::new("echo");
        cmd.arg("LoadState=loaded");
        let output = run_with_timeout(cmd, Duration::from_secs(5)).unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("LoadState=loaded"));
    }
}
