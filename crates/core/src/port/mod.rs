// Port Layer - Interfaces for external dependencies

pub mod command_executor;
pub mod diagnostics;
pub mod id_provider; // For deterministic testing
pub mod mocks;
pub mod network_inventory;
pub mod platform_commands;
pub mod time_provider;
pub mod verification_probe;

// Re-exports
pub use command_executor::{CommandExecutor, CommandOutput, CommandSpec, ExecutionError};
pub use diagnostics::{DiagnosticsError, Pinger, SpeedTester};
pub use id_provider::IdProvider;
pub use network_inventory::NetworkInventory;
pub use platform_commands::PlatformCommands;
pub use time_provider::TimeProvider;
pub use verification_probe::VerificationProbe;
