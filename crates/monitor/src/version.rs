//! Build version information recorded into the monitor's metrics.

/// The crate version.
pub const SIMPLE: &str = env!("CARGO_PKG_VERSION");

/// Build metadata, injected at build time via `CHAINWATCH_BUILD_META`.
pub const META: &str = match option_env!("CHAINWATCH_BUILD_META") {
    Some(meta) => meta,
    None => "dev",
};

/// The version string with build metadata attached, e.g. `0.1.0+dev`.
#[must_use]
pub fn simple_with_meta() -> String {
    format!("{SIMPLE}+{META}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_with_meta_carries_both_parts() {
        let version = simple_with_meta();
        assert!(version.starts_with(SIMPLE));
        assert!(version.ends_with(META));
    }
}
