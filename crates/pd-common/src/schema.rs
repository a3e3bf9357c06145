//! Output schema versioning and compatibility.

/// Current schema version for digest tables and the run manifest.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (column removals, renamed tables)
/// - MINOR: Additive changes (new columns or tables)
/// - PATCH: Bug fixes, documentation
pub const SCHEMA_VERSION: &str = "1.0.0";

/// True when both versions parse and share a MAJOR component.
pub fn same_major(a: &str, b: &str) -> bool {
    match (major(a), major(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn major(version: &str) -> Option<u32> {
    version.split('.').next().and_then(|s| s.parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_major_compatible() {
        assert!(same_major(SCHEMA_VERSION, "1.0.0"));
        assert!(same_major(SCHEMA_VERSION, "1.4.2"));
    }

    #[test]
    fn test_different_major_incompatible() {
        assert!(!same_major(SCHEMA_VERSION, "0.9.0"));
        assert!(!same_major(SCHEMA_VERSION, "2.0.0"));
        assert!(!same_major(SCHEMA_VERSION, "garbage"));
    }

    #[test]
    fn test_unparsable_versions_never_match() {
        assert!(same_major("3.1.0", "3.0.9"));
        assert!(!same_major("x.1", "x.1"));
        assert!(!same_major("", "1.0.0"));
    }
}
