use std::env;
use std::sync::OnceLock;

mod config;
pub use self::config::{Backend, Config, Ops, Remote};

pub mod resources;

/// Environment variable enabling diagnostic output.
pub const DEBUG_VAR: &str = "KORRA_HEB_DEBUG";

/// Whether `KORRA_HEB_DEBUG` was set to `TRUE` when first checked.
pub fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| env::var(DEBUG_VAR).map_or(false, |v| is_debug_value(&v)))
}

fn is_debug_value(value: &str) -> bool {
    value.eq_ignore_ascii_case("TRUE")
}

#[cfg(test)]
mod tests {
    use super::is_debug_value;

    #[test]
    fn debug_gate() {
        assert!(is_debug_value("TRUE"));
        assert!(is_debug_value("true"));
        assert!(!is_debug_value("1"));
        assert!(!is_debug_value(""));
    }
}
