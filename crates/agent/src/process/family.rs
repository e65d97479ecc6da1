//! `find_process_family`: the heuristic "related sibling" discovery from
//! `spec.md` §4.1 Termination, step 3, encapsulated per §9 "Process-family
//! discovery" as an explicit, unit-testable function over an injected
//! process-table snapshot.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// One row of a process-table snapshot, platform-agnostic.
#[derive(Debug, Clone)]
pub struct ProcessSnapshotEntry {
    pub pid: u32,
    pub ppid: u32,
    /// Process (executable) name, e.g. `CarlaUE4.exe`.
    pub name: String,
    /// Full executable path, if resolvable.
    pub exe_path: Option<String>,
    pub created_at: Instant,
}

/// Substrings (matched case-insensitively against name or exe path) that
/// identify a CARLA-family process spawned outside the immediate
/// parent-child chain, per `spec.md` §4.1.
pub const SIMULATOR_NAME_PATTERNS: &[&str] = &["carlaue4", "bootstrappackagedgame", "ue4editor"];

/// Compute the full process set to terminate for a job: the direct child,
/// every descendant reachable via the parent-pid relation, and every
/// process matching a simulator name pattern whose creation time falls in
/// `[job_start - before, job_start + after]`.
pub fn find_process_family(
    root_pid: u32,
    job_start: Instant,
    name_patterns: &[&str],
    before: Duration,
    after: Duration,
    snapshot: &[ProcessSnapshotEntry],
) -> HashSet<u32> {
    let mut family: HashSet<u32> = HashSet::new();
    family.insert(root_pid);

    // BFS over the parent-pid relation to capture all descendants.
    let mut frontier = vec![root_pid];
    while let Some(parent) = frontier.pop() {
        for entry in snapshot {
            if entry.ppid == parent && family.insert(entry.pid) {
                frontier.push(entry.pid);
            }
        }
    }

    let window_start = job_start.checked_sub(before);
    let window_end = job_start + after;

    for entry in snapshot {
        if family.contains(&entry.pid) {
            continue;
        }
        let name_matches = name_patterns.iter().any(|pat| {
            let pat = pat.to_lowercase();
            entry.name.to_lowercase().contains(&pat)
                || entry
                    .exe_path
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&pat))
        });
        if !name_matches {
            continue;
        }
        let in_window = match window_start {
            Some(start) => entry.created_at >= start && entry.created_at <= window_end,
            None => entry.created_at <= window_end,
        };
        if in_window {
            family.insert(entry.pid);
        }
    }

    family
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: u32, ppid: u32, name: &str, created_at: Instant) -> ProcessSnapshotEntry {
        ProcessSnapshotEntry { pid, ppid, name: name.into(), exe_path: None, created_at }
    }

    #[test]
    fn includes_direct_child_even_with_empty_snapshot() {
        let now = Instant::now();
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &[],
        );
        assert_eq!(family, HashSet::from([100]));
    }

    #[test]
    fn walks_descendant_chain() {
        let now = Instant::now();
        let snapshot = vec![
            entry(200, 100, "wrapper.bat", now),
            entry(300, 200, "launcher.exe", now),
            entry(999, 1, "unrelated.exe", now),
        ];
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &snapshot,
        );
        assert_eq!(family, HashSet::from([100, 200, 300]));
    }

    #[test]
    fn catches_sibling_by_name_and_timing_even_without_parent_link() {
        let now = Instant::now();
        let snapshot = vec![entry(400, 1, "CarlaUE4.exe", now + Duration::from_secs(10))];
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &snapshot,
        );
        assert!(family.contains(&400));
    }

    #[test]
    fn ignores_matching_name_outside_the_time_window() {
        let now = Instant::now();
        let snapshot = vec![entry(400, 1, "CarlaUE4.exe", now + Duration::from_secs(120))];
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &snapshot,
        );
        assert!(!family.contains(&400));
    }

    #[test]
    fn ignores_non_matching_name_even_inside_window() {
        let now = Instant::now();
        let snapshot = vec![entry(400, 1, "notepad.exe", now)];
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &snapshot,
        );
        assert!(!family.contains(&400));
    }

    #[test]
    fn name_match_is_case_insensitive_and_checks_exe_path_too() {
        let now = Instant::now();
        let mut e = entry(401, 1, "game", now);
        e.exe_path = Some("C:/Carla/Binaries/Win64/CARLAUE4.exe".into());
        let family = find_process_family(
            100,
            now,
            SIMULATOR_NAME_PATTERNS,
            Duration::from_secs(5),
            Duration::from_secs(60),
            &[e],
        );
        assert!(family.contains(&401));
    }
}
