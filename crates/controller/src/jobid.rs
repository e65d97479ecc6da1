//! Job-id derivation for `start`/`exec` when the user omits `--job-id`, per
//! `spec.md` §4.2 "Job-id generation". Agents run on Windows regardless of
//! the controller's host OS, so basenames are parsed with Windows path
//! rules (`\` and `/` both separate components) no matter what platform
//! the controller itself runs on.

const SCRIPT_EXTENSIONS: &[&str] =
    &[".py", ".ps1", ".bat", ".sh", ".js", ".rb", ".pl", ".r", ".m"];

/// Derive a job id from a command line: the basename (no extension) of the
/// first token that looks like a script, else the basename of the
/// executable itself.
pub fn derive_job_id(cmd: &[String]) -> String {
    for token in cmd {
        if matching_extension(token).is_some() {
            return windows_stem(token);
        }
    }
    cmd.first().map(|exe| windows_stem(exe)).unwrap_or_else(|| "job".to_string())
}

fn matching_extension(token: &str) -> Option<&'static str> {
    let lower = token.to_ascii_lowercase();
    SCRIPT_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)).copied()
}

/// Windows-style basename with its extension stripped.
fn windows_stem(path: &str) -> String {
    let base = path.rsplit(['\\', '/']).next().unwrap_or(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[..idx].to_string(),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_script_token_anywhere_in_the_command_line() {
        let cmd = vec!["python.exe".into(), "C:\\rigs\\run_scenario.py".into(), "--seed".into(), "1".into()];
        assert_eq!(derive_job_id(&cmd), "run_scenario");
    }

    #[test]
    fn finds_script_with_unix_style_separators() {
        let cmd = vec!["bash".into(), "/opt/carla/start_rig.sh".into()];
        assert_eq!(derive_job_id(&cmd), "start_rig");
    }

    #[test]
    fn falls_back_to_executable_basename_when_no_script_present() {
        let cmd = vec!["C:\\Windows\\System32\\cmd.exe".into(), "/c".into(), "exit".into(), "0".into()];
        assert_eq!(derive_job_id(&cmd), "cmd");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let cmd = vec!["powershell.exe".into(), "Launch.PS1".into()];
        assert_eq!(derive_job_id(&cmd), "Launch");
    }

    #[test]
    fn empty_command_falls_back_to_a_placeholder() {
        assert_eq!(derive_job_id(&[]), "job");
    }
}
