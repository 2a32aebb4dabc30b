// Domain Layer - Pure configuration-change model and measurements

pub mod change;
pub mod diagnostics;
pub mod error;
pub mod profile;
pub mod report;
pub mod target;
pub mod value;

// Re-exports
pub use change::{ChangeDescriptor, ChangeSpec, DescriptorId};
pub use diagnostics::{
    validate_host, InterfaceStats, NetworkSnapshot, PingStats, SpeedTestResult,
};
pub use error::DomainError;
pub use profile::{Profile, ProfileCatalog, ALL_PROFILE};
pub use report::{ApplyResult, ChangeError, Report, ReportOutcome, RollbackOutcome};
pub use target::{
    CacheKind, Category, ChangeTarget, DnsSlot, InterfaceName, RegistrySetting, TcpSetting,
    WlanSetting,
};
pub use value::{ConfigValue, Observed, ValueKind};
