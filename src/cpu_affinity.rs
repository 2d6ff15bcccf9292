//! Cross-platform CPU affinity pinning for worker threads. Each lane (C9)
//! runs on its own pinned core so worker threads never contend for the same
//! cache hierarchy.

use crate::errors::AffinityError;

/// Pins the calling thread to `core_id` (0-indexed). Returns `true` on
/// success, `false` if the platform call failed or this platform isn't
/// supported — callers that only care about `run`'s hot path can ignore the
/// reason; `try_set_core` is there for the ones that want it.
pub fn set_core(core_id: usize) -> bool {
    try_set_core(core_id).is_ok()
}

/// Same as [`set_core`] but surfaces *why* a pin attempt failed, for callers
/// that want to log or retry rather than just fall back to running unpinned.
pub fn try_set_core(core_id: usize) -> Result<(), AffinityError> {
    #[cfg(target_os = "linux")]
    return pin_linux(core_id);

    #[cfg(target_os = "windows")]
    return pin_windows(core_id);

    #[cfg(target_os = "macos")]
    return pin_macos(core_id);

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        let _ = core_id;
        Err(AffinityError::UnsupportedPlatform)
    }
}

#[cfg(target_os = "linux")]
fn pin_linux(core_id: usize) -> Result<(), AffinityError> {
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut set);
        let tid = libc::pthread_self();
        let rc = libc::pthread_setaffinity_np(tid, std::mem::size_of::<libc::cpu_set_t>(), &set);
        if rc == 0 {
            Ok(())
        } else {
            Err(AffinityError::SyscallFailed(rc))
        }
    }
}

#[cfg(target_os = "windows")]
fn pin_windows(core_id: usize) -> Result<(), AffinityError> {
    use windows_sys::Win32::System::Threading::{GetCurrentThread, SetThreadAffinityMask};
    // A `usize` mask only ever addresses the first `usize::BITS` cores; this
    // crate's lane count never gets anywhere near that.
    let mask = 1usize << core_id;
    let previous = unsafe { SetThreadAffinityMask(GetCurrentThread(), mask) };
    if previous != 0 {
        Ok(())
    } else {
        Err(AffinityError::SyscallFailed(0))
    }
}

#[cfg(target_os = "macos")]
fn pin_macos(core_id: usize) -> Result<(), AffinityError> {
    #[repr(C)]
    struct ThreadAffinityPolicy {
        affinity_tag: i32,
    }
    const THREAD_AFFINITY_POLICY: u32 = 4;

    let mut policy = ThreadAffinityPolicy {
        affinity_tag: core_id as i32,
    };
    let policy_words =
        (std::mem::size_of::<ThreadAffinityPolicy>() / std::mem::size_of::<i32>()) as u32;
    unsafe {
        let port = libc::mach_thread_self();
        let rc = libc::thread_policy_set(
            port,
            THREAD_AFFINITY_POLICY,
            &mut policy as *mut _ as *mut i32,
            policy_words,
        );
        if rc == 0 {
            Ok(())
        } else {
            Err(AffinityError::SyscallFailed(rc))
        }
    }
}
