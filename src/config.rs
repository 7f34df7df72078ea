use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Hemascan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Optional path to an external reference-range table.
///
/// When HEMASCAN_RANGES points at a readable JSON file the validator loads
/// it instead of the embedded table, so ranges can be updated without a
/// code change.
pub fn reference_table_path() -> Option<PathBuf> {
    std::env::var_os("HEMASCAN_RANGES").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_hemascan() {
        assert_eq!(APP_NAME, "Hemascan");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.4.0");
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().starts_with("hemascan"));
    }
}
