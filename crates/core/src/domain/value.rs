// Configuration values and probe observations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use super::error::{DomainError, Result};

/// Shape of the value a target carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Ip,
    Toggle,
    Number,
    Level,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Ip => "ip",
            ValueKind::Toggle => "toggle",
            ValueKind::Number => "number",
            ValueKind::Level => "level",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ip" => Some(ValueKind::Ip),
            "toggle" => Some(ValueKind::Toggle),
            "number" => Some(ValueKind::Number),
            "level" => Some(ValueKind::Level),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed configuration value
///
/// Values are always constructed from the enumerated profile table or parsed
/// from probe output, never interpolated from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConfigValue {
    Ip(IpAddr),
    Toggle(bool),
    Number(u64),
    Level(String),
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Ip(_) => ValueKind::Ip,
            ConfigValue::Toggle(_) => ValueKind::Toggle,
            ConfigValue::Number(_) => ValueKind::Number,
            ConfigValue::Level(_) => ValueKind::Level,
        }
    }

    /// Build a level token (lowercased, restricted character set)
    pub fn level(raw: &str) -> Result<Self> {
        Self::parse_as(ValueKind::Level, raw)
    }

    /// Parse raw text (probe output or table entry) into a value of `kind`
    ///
    /// Toggles accept the vocabularies of netsh, the registry and sysctl
    /// (`enabled`/`disabled`, `yes`/`no`, `1`/`0`). Numbers accept decimal
    /// and `0x`-prefixed hexadecimal (as printed by `reg query`).
    pub fn parse_as(kind: ValueKind, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || DomainError::InvalidValue {
            kind: kind.to_string(),
            raw: raw.to_string(),
        };

        match kind {
            ValueKind::Ip => trimmed
                .parse::<IpAddr>()
                .map(ConfigValue::Ip)
                .map_err(|_| invalid()),
            ValueKind::Toggle => match trimmed.to_ascii_lowercase().as_str() {
                "enabled" | "enable" | "yes" | "on" | "true" | "1" => Ok(ConfigValue::Toggle(true)),
                "disabled" | "disable" | "no" | "off" | "false" | "0" => {
                    Ok(ConfigValue::Toggle(false))
                }
                _ => Err(invalid()),
            },
            ValueKind::Number => {
                let parsed = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => trimmed.parse::<u64>(),
                };
                parsed.map(ConfigValue::Number).map_err(|_| invalid())
            }
            ValueKind::Level => {
                let token = trimmed.to_ascii_lowercase();
                let valid = !token.is_empty()
                    && token.len() <= 32
                    && token
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if valid {
                    Ok(ConfigValue::Level(token))
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Ip(ip) => write!(f, "{}", ip),
            ConfigValue::Toggle(true) => f.write_str("enabled"),
            ConfigValue::Toggle(false) => f.write_str("disabled"),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::Level(level) => f.write_str(level),
        }
    }
}

/// Result of reading a target through a verification probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Observed {
    /// Target exists and carries a value
    Value(ConfigValue),
    /// Target exists but no value is set (absent registry value, empty DNS slot)
    Unset,
    /// Target does not exist on this host
    Unavailable,
}

impl Observed {
    pub fn is_available(&self) -> bool {
        !matches!(self, Observed::Unavailable)
    }

    pub fn matches(&self, desired: &ConfigValue) -> bool {
        matches!(self, Observed::Value(v) if v == desired)
    }

    pub fn value(&self) -> Option<&ConfigValue> {
        match self {
            Observed::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<ConfigValue> for Observed {
    fn from(value: ConfigValue) -> Self {
        Observed::Value(value)
    }
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::Value(v) => write!(f, "{}", v),
            Observed::Unset => f.write_str("<unset>"),
            Observed::Unavailable => f.write_str("<unavailable>"),
        }
    }
}
