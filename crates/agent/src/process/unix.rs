//! `/proc`-backed process primitives for non-Windows builds. The real spec
//! target is Windows; this path exists so the agent builds and its
//! concurrency/termination logic is exercisable on the development machine.

use std::fs;
use std::time::{Duration, Instant};

use tokio::process::Command;

use super::ProcessSnapshotEntry;

fn clock_ticks_per_sec() -> i64 {
    // SAFETY: sysconf with a valid name is always safe to call.
    unsafe { libc::sysconf(libc::_SC_CLK_TCK) }
}

/// Apply the flags needed so a terminate signal to the job's pid does not
/// also land on this agent process: put the child in its own process group.
pub fn apply_spawn_flags(cmd: &mut Command) {
    cmd.process_group(0);
}

pub fn process_exists(pid: u32) -> bool {
    // SAFETY: signal 0 performs no action beyond existence/permission checks.
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

/// Send SIGTERM to the process group headed by `pid` (negative pid targets
/// the group created by `apply_spawn_flags`'s `process_group(0)`).
pub fn terminate_soft(pids: &[u32]) {
    for &pid in pids {
        // SAFETY: kill(2) on an attacker-uncontrolled pid we own is safe;
        // ESRCH/EPERM are expected once a process has already exited.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGTERM);
        }
    }
}

pub fn terminate_hard(pids: &[u32]) {
    for &pid in pids {
        // SAFETY: see terminate_soft.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
            libc::kill(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

struct StatFields {
    ppid: u32,
    utime: u64,
    stime: u64,
    starttime: u64,
}

/// Parse the fields of `/proc/[pid]/stat` we need. The `comm` field may
/// contain spaces or parentheses, so we split on the last `)` rather than
/// naively splitting on whitespace.
fn read_stat(pid: u32) -> Option<StatFields> {
    let raw = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let close_paren = raw.rfind(')')?;
    let rest = raw[close_paren + 1..].trim_start();
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is state; ppid is fields[1] (3rd field overall).
    let ppid: u32 = fields.get(1)?.parse().ok()?;
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    let starttime: u64 = fields.get(19)?.parse().ok()?;
    Some(StatFields { ppid, utime, stime, starttime })
}

fn read_comm(pid: u32) -> Option<String> {
    fs::read_to_string(format!("/proc/{pid}/comm"))
        .ok()
        .map(|s| s.trim_end().to_string())
}

fn read_exe(pid: u32) -> Option<String> {
    fs::read_link(format!("/proc/{pid}/exe"))
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

fn read_rss_mb(pid: u32) -> Option<f64> {
    let status = fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: f64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb / 1024.0);
        }
    }
    None
}

fn uptime_secs() -> Option<f64> {
    let raw = fs::read_to_string("/proc/uptime").ok()?;
    raw.split_whitespace().next()?.parse().ok()
}

/// Sample CPU% and memory for `pid` over `super::SAMPLE_WINDOW`. Returns
/// `None` once the process has exited mid-sample.
pub async fn sample(pid: u32) -> Option<super::Sample> {
    let before = read_stat(pid)?;
    tokio::time::sleep(super::SAMPLE_WINDOW).await;
    let after = read_stat(pid)?;

    let ticks_per_sec = clock_ticks_per_sec().max(1) as f64;
    let delta_ticks = (after.utime + after.stime).saturating_sub(before.utime + before.stime);
    let cpu_secs = delta_ticks as f64 / ticks_per_sec;
    let cpu_percent = (cpu_secs / super::SAMPLE_WINDOW.as_secs_f64()) * 100.0;
    let mem_mb = read_rss_mb(pid).unwrap_or(0.0);

    Some(super::Sample { cpu_percent, mem_mb })
}

/// Snapshot every process currently visible under `/proc`, for use by
/// `find_process_family`.
pub fn enumerate_processes() -> Vec<ProcessSnapshotEntry> {
    let ticks_per_sec = clock_ticks_per_sec().max(1) as f64;
    let boot_uptime = uptime_secs();
    let now = Instant::now();

    let Ok(entries) = fs::read_dir("/proc") else {
        return Vec::new();
    };

    let mut snapshot = Vec::new();
    for entry in entries.flatten() {
        let Some(pid): Option<u32> = entry.file_name().to_str().and_then(|s| s.parse().ok())
        else {
            continue;
        };
        let Some(stat) = read_stat(pid) else { continue };
        let name = read_comm(pid).unwrap_or_default();
        let exe_path = read_exe(pid);

        let created_at = match boot_uptime {
            Some(uptime) => {
                let start_secs_since_boot = stat.starttime as f64 / ticks_per_sec;
                let age_secs = (uptime - start_secs_since_boot).max(0.0);
                now.checked_sub(Duration::from_secs_f64(age_secs)).unwrap_or(now)
            }
            None => now,
        };

        snapshot.push(ProcessSnapshotEntry { pid, ppid: stat.ppid, name, exe_path, created_at });
    }
    snapshot
}
