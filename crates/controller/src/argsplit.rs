//! The `--args` sentinel, per `spec.md` §4.2 "Argument parsing quirk": once
//! seen, every remaining token is the child process's argv verbatim. A
//! common user mistake is a mistyped controller flag landing among those
//! passthrough tokens, so we warn (but still pass it through unchanged).

/// Split raw argv (excluding the program name) at the first literal
/// `--args` token. Everything before it is left for the normal flag parser;
/// everything after is the child's argv.
pub fn split_args(argv: &[String]) -> (Vec<String>, Vec<String>) {
    match argv.iter().position(|a| a == "--args") {
        Some(pos) => {
            let before = argv[..pos].to_vec();
            let after = argv[pos + 1..].to_vec();
            warn_on_suspicious_flags(&after);
            (before, after)
        }
        None => (argv.to_vec(), Vec::new()),
    }
}

fn warn_on_suspicious_flags(passthrough: &[String]) {
    for token in passthrough {
        if token.starts_with("--") && token != "--help" {
            eprintln!(
                "warning: '{token}' after --args looks like a controller flag; it will be passed to the child process verbatim"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_at_the_args_sentinel() {
        let argv = v(&["start", "--exe", "run.exe", "--args", "--seed", "1"]);
        let (before, after) = split_args(&argv);
        assert_eq!(before, v(&["start", "--exe", "run.exe"]));
        assert_eq!(after, v(&["--seed", "1"]));
    }

    #[test]
    fn without_the_sentinel_everything_stays_before() {
        let argv = v(&["status", "--clients", "a,b"]);
        let (before, after) = split_args(&argv);
        assert_eq!(before, argv);
        assert!(after.is_empty());
    }

    #[test]
    fn trailing_sentinel_yields_empty_passthrough() {
        let argv = v(&["start", "--exe", "run.exe", "--args"]);
        let (_, after) = split_args(&argv);
        assert!(after.is_empty());
    }
}
