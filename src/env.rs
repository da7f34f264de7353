//! Configuration overrides read from environment variables.

/// Interpret a flag value such as "1", "yes" or "off" as a boolean.
///
/// Returns `None` if the value is not recognized.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Return whether a feature flag controlled by an environment variable is
/// enabled.
///
/// If the variable is unset, or set to an unrecognized value, `default` is
/// returned.
pub fn env_flag(name: &str, default: bool) -> bool {
    let Ok(value) = std::env::var(name) else {
        return default;
    };
    parse_flag(&value).unwrap_or_else(|| {
        log::warn!(
            "ignoring unrecognized value \"{}\" for {}, using default ({})",
            value,
            name,
            default
        );
        default
    })
}
