//! Win32-backed process primitives, the platform `spec.md` actually targets.

use std::time::{Duration, Instant};

use tokio::process::Command;
use windows::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
use windows::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows::Win32::System::Threading::{
    GetProcessTimes, OpenProcess, TerminateProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    PROCESS_TERMINATE, PROCESS_VM_READ,
};

use super::ProcessSnapshotEntry;

const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Spawn the child in its own process group with no console window, so a
/// `CTRL_BREAK_EVENT` sent to its pid doesn't also reach the agent.
pub fn apply_spawn_flags(cmd: &mut Command) {
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
}

pub fn process_exists(pid: u32) -> bool {
    // SAFETY: OpenProcess with a plain pid is always safe to attempt; we
    // only use the handle's validity, never dereference raw data from it.
    unsafe {
        match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(handle) => {
                let _ = CloseHandle(handle);
                true
            }
            Err(_) => false,
        }
    }
}

/// Best-effort soft terminate: `CTRL_BREAK_EVENT` to the process group, which
/// is the job's pid because it was created with `CREATE_NEW_PROCESS_GROUP`.
pub fn terminate_soft(pids: &[u32]) {
    for &pid in pids {
        // SAFETY: GenerateConsoleCtrlEvent on a process group id we created
        // is safe; failure (e.g. group already gone) is ignored.
        unsafe {
            let _ = GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid);
        }
    }
}

pub fn terminate_hard(pids: &[u32]) {
    for &pid in pids {
        // SAFETY: OpenProcess/TerminateProcess on a pid we own; any failure
        // (already exited, access denied) is logged by the caller.
        unsafe {
            if let Ok(handle) = OpenProcess(PROCESS_TERMINATE, false, pid) {
                let _ = TerminateProcess(handle, 1);
                let _ = CloseHandle(handle);
            }
        }
    }
}

fn filetime_to_u64(ft: FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64
}

fn open_for_query(pid: u32) -> Option<HANDLE> {
    // SAFETY: OpenProcess with a plain pid and read-only access rights.
    unsafe {
        OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_VM_READ, false, pid).ok()
    }
}

fn process_times(handle: HANDLE) -> Option<(u64, u64, u64)> {
    let mut creation = FILETIME::default();
    let mut exit = FILETIME::default();
    let mut kernel = FILETIME::default();
    let mut user = FILETIME::default();
    // SAFETY: all four out-pointers reference valid local storage.
    let ok = unsafe { GetProcessTimes(handle, &mut creation, &mut exit, &mut kernel, &mut user) };
    ok.ok()?;
    Some((filetime_to_u64(creation), filetime_to_u64(kernel), filetime_to_u64(user)))
}

fn working_set_mb(handle: HANDLE) -> Option<f64> {
    let mut counters = PROCESS_MEMORY_COUNTERS::default();
    let size = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
    // SAFETY: counters is a valid, correctly-sized out-buffer.
    let ok = unsafe { GetProcessMemoryInfo(handle, &mut counters, size) };
    ok.ok()?;
    Some(counters.WorkingSetSize as f64 / (1024.0 * 1024.0))
}

/// Sample CPU% and memory for `pid` over `super::SAMPLE_WINDOW`.
pub async fn sample(pid: u32) -> Option<super::Sample> {
    let handle = open_for_query(pid)?;
    let (_, kernel0, user0) = process_times(handle)?;
    tokio::time::sleep(super::SAMPLE_WINDOW).await;
    let (_, kernel1, user1) = process_times(handle)?;
    let mem_mb = working_set_mb(handle).unwrap_or(0.0);
    // SAFETY: handle was opened by this function and is closed exactly once.
    unsafe {
        let _ = CloseHandle(handle);
    }

    let delta_100ns = (kernel1 + user1).saturating_sub(kernel0 + user0);
    let cpu_secs = delta_100ns as f64 / 10_000_000.0;
    let cpu_percent = (cpu_secs / super::SAMPLE_WINDOW.as_secs_f64()) * 100.0;

    Some(super::Sample { cpu_percent, mem_mb })
}

fn process_created_at(pid: u32, now: Instant, now_filetime_100ns: u64) -> Option<Instant> {
    let handle = open_for_query(pid)?;
    let (creation, _, _) = process_times(handle)?;
    // SAFETY: handle was opened by this function and is closed exactly once.
    unsafe {
        let _ = CloseHandle(handle);
    }
    let age_100ns = now_filetime_100ns.saturating_sub(creation);
    let age = Duration::from_secs_f64(age_100ns as f64 / 10_000_000.0);
    Some(now.checked_sub(age).unwrap_or(now))
}

fn system_time_as_filetime_100ns() -> u64 {
    use windows::Win32::System::SystemInformation::GetSystemTimeAsFileTime;
    let mut ft = FILETIME::default();
    // SAFETY: ft is valid local storage for the out-parameter.
    unsafe { GetSystemTimeAsFileTime(&mut ft) };
    filetime_to_u64(ft)
}

/// Snapshot the full process table via a ToolHelp snapshot, for use by
/// `find_process_family`.
pub fn enumerate_processes() -> Vec<ProcessSnapshotEntry> {
    let now = Instant::now();
    let now_ft = system_time_as_filetime_100ns();

    // SAFETY: TH32CS_SNAPPROCESS with th32ProcessID 0 snapshots all processes.
    let snapshot = match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) } {
        Ok(h) => h,
        Err(_) => return Vec::new(),
    };

    let mut entries = Vec::new();
    let mut entry = PROCESSENTRY32W { dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32, ..Default::default() };

    // SAFETY: entry.dwSize is set as required before the first call.
    let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
    while has_entry {
        let name = String::from_utf16_lossy(
            &entry.szExeFile[..entry.szExeFile.iter().position(|&c| c == 0).unwrap_or(0)],
        );
        let created_at = process_created_at(entry.th32ProcessID, now, now_ft).unwrap_or(now);
        entries.push(ProcessSnapshotEntry {
            pid: entry.th32ProcessID,
            ppid: entry.th32ParentProcessID,
            name,
            exe_path: None,
            created_at,
        });
        // SAFETY: snapshot handle is still valid and entry.dwSize untouched.
        has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
    }

    // SAFETY: snapshot was returned by CreateToolhelp32Snapshot above.
    unsafe {
        let _ = CloseHandle(snapshot);
    }
    entries
}
