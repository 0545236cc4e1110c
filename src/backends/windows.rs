//! Windows Service Control Manager backend.
//!
//! Direct winsvc calls: connect to the SCM, open the named service
//! with query rights, read the extended status record. Every handle is
//! wrapped in a guard so it is released on all exit paths.

use std::ffi::OsStr;
use std::iter::once;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::ptr;

use log::debug;
use winapi::shared::minwindef::DWORD;
use winapi::shared::winerror::{ERROR_ACCESS_DENIED, ERROR_SERVICE_DOES_NOT_EXIST};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::winsvc::{
    CloseServiceHandle, OpenSCManagerW, OpenServiceW, QueryServiceStatusEx, SC_HANDLE,
    SC_MANAGER_CONNECT, SC_STATUS_PROCESS_INFO, SERVICE_QUERY_STATUS, SERVICE_STATUS_PROCESS,
};

use crate::error::{Error, Result};
use crate::normalize;
use crate::status::{RawCode, ServiceStatus};

use super::StatusBackend;

/// Closes the wrapped SCM or service handle when dropped.
struct ScHandle(SC_HANDLE);

impl Drop for ScHandle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                CloseServiceHandle(self.0);
            }
        }
    }
}

pub struct WindowsScmBackend;

impl WindowsScmBackend {
    pub fn new() -> Self {
        WindowsScmBackend
    }

    fn open_manager(&self) -> Result<ScHandle> {
        let handle = unsafe { OpenSCManagerW(ptr::null(), ptr::null(), SC_MANAGER_CONNECT) };
        if handle.is_null() {
            let err = unsafe { GetLastError() };
            return Err(match err {
                ERROR_ACCESS_DENIED => {
                    Error::Transport("access denied opening Service Control Manager".to_string())
                }
                code => Error::Transport(format!(
                    "failed to open Service Control Manager (error {})",
                    code
                )),
            });
        }
        Ok(ScHandle(handle))
    }

    /// Open the named service with query rights. `Ok(None)` is the
    /// definitive "no such service" answer; other failures are
    /// transport errors.
    fn open_service(&self, manager: &ScHandle, name: &str) -> Result<Option<ScHandle>> {
        let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(once(0)).collect();
        let handle = unsafe { OpenServiceW(manager.0, wide.as_ptr(), SERVICE_QUERY_STATUS) };
        if handle.is_null() {
            let err = unsafe { GetLastError() };
            return match err {
                ERROR_SERVICE_DOES_NOT_EXIST => Ok(None),
                ERROR_ACCESS_DENIED => Err(Error::Transport(format!(
                    "access denied opening service '{}'",
                    name
                ))),
                code => Err(Error::Transport(format!(
                    "failed to open service '{}' (error {})",
                    name, code
                ))),
            };
        }
        Ok(Some(ScHandle(handle)))
    }
}

impl Default for WindowsScmBackend {
    fn default() -> Self {
        WindowsScmBackend::new()
    }
}

impl StatusBackend for WindowsScmBackend {
    fn exists(&self, name: &str) -> Result<bool> {
        let manager = self.open_manager()?;
        Ok(self.open_service(&manager, name)?.is_some())
    }

    fn status(&self, name: &str) -> Result<ServiceStatus> {
        let manager = self.open_manager()?;
        let service = self
            .open_service(&manager, name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let mut ssp: SERVICE_STATUS_PROCESS = unsafe { mem::zeroed() };
        let mut bytes_needed: DWORD = 0;
        let ok = unsafe {
            QueryServiceStatusEx(
                service.0,
                SC_STATUS_PROCESS_INFO,
                &mut ssp as *mut SERVICE_STATUS_PROCESS as *mut u8,
                mem::size_of::<SERVICE_STATUS_PROCESS>() as DWORD,
                &mut bytes_needed,
            )
        };
        if ok == 0 {
            let err = unsafe { GetLastError() };
            return Err(Error::Transport(format!(
                "QueryServiceStatusEx failed for '{}' (error {})",
                name, err
            )));
        }

        // dwProcessId of 0 is valid: no active process for a stopped or
        // pending service.
        let state = normalize::from_windows_code(ssp.dwCurrentState);
        debug!(
            "scm status for {}: code {} pid {}",
            name, ssp.dwCurrentState, ssp.dwProcessId
        );
        Ok(ServiceStatus::new(
            name,
            state,
            ssp.dwProcessId,
            RawCode::Code(ssp.dwCurrentState),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the live SCM; query rights need no elevation.

    #[test]
    fn test_nonexistent_service_is_false_not_error() {
        let backend = WindowsScmBackend::new();
        let name = "svcstatus-test-no-such-service";
        assert!(!backend.exists(name).unwrap());
        assert!(matches!(backend.status(name), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_known_service_has_canonical_state() {
        let backend = WindowsScmBackend::new();
        // Present on every supported Windows version.
        let status = backend.status("EventLog").unwrap();
        assert!(status.exists);
        assert!(matches!(status.raw_code, RawCode::Code(_)));
    }
}
