// Platform command tables
//
// Both tables compile everywhere so their parsers are tested on any host;
// `host_commands` picks the one matching the running OS.

pub mod linux;
pub mod windows;

use std::sync::Arc;

use nettune_core::domain::{ConfigValue, Observed, ValueKind};
use nettune_core::port::PlatformCommands;

pub use linux::LinuxCommands;
pub use windows::WindowsCommands;

/// Command table for the running OS
pub fn host_commands() -> Arc<dyn PlatformCommands> {
    #[cfg(windows)]
    {
        Arc::new(WindowsCommands)
    }

    #[cfg(not(windows))]
    {
        Arc::new(LinuxCommands)
    }
}

/// Interpret one reported token as a value of `kind`
///
/// Tokens outside the kind's vocabulary (netsh `default`, sysctl `2`) are
/// kept as a level so they can still be compared and restored.
pub(crate) fn parse_reading(kind: ValueKind, raw: &str) -> Observed {
    ConfigValue::parse_as(kind, raw)
        .or_else(|_| ConfigValue::level(raw))
        .map(Observed::Value)
        .unwrap_or(Observed::Unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading_keeps_foreign_tokens() {
        assert_eq!(
            parse_reading(ValueKind::Toggle, "enabled"),
            Observed::Value(ConfigValue::Toggle(true))
        );
        assert_eq!(
            parse_reading(ValueKind::Toggle, "default"),
            Observed::Value(ConfigValue::Level("default".to_string()))
        );
        assert_eq!(parse_reading(ValueKind::Number, "n/a ?"), Observed::Unavailable);
    }
}
