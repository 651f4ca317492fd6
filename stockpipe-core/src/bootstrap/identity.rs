//! Identity of the invoking host user.

/// UID the orchestration image falls back to when the host has none.
pub const DEFAULT_AIRFLOW_UID: u32 = 50000;

/// Numeric id of the user running this process.
#[cfg(unix)]
pub fn host_uid() -> u32 {
    // SAFETY: getuid has no preconditions and always succeeds.
    unsafe { libc::getuid() }
}

#[cfg(not(unix))]
pub fn host_uid() -> u32 {
    DEFAULT_AIRFLOW_UID
}
