//! Job identifier generation.
//!
//! `spec.md` §3 requires a "random 128-bit identifier rendered as a
//! canonical 36-character form" when the caller omits `job_id`. That is a
//! UUID v4 in its standard hyphenated form.

use uuid::Uuid;

/// Generate a fresh random job id in canonical 36-character UUID form.
pub fn generate_job_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical_uuids() {
        let id = generate_job_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_job_id();
        let b = generate_job_id();
        assert_ne!(a, b);
    }
}
