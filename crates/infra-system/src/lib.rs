// NetTune Infrastructure - System Adapters
// Implements: CommandExecutor, VerificationProbe, PlatformCommands, Pinger,
// SpeedTester, NetworkInventory

pub mod command_probe;
pub mod inventory;
pub mod ping;
pub mod platform;
pub mod privilege;
pub mod serialized_executor;
pub mod speed_test;
pub mod subprocess_executor;

pub use command_probe::CommandProbe;
pub use inventory::SysinfoInventory;
pub use ping::SystemPinger;
pub use platform::{host_commands, LinuxCommands, WindowsCommands};
pub use privilege::is_elevated;
pub use serialized_executor::SerializedExecutor;
pub use speed_test::HttpSpeedTester;
pub use subprocess_executor::SubprocessExecutor;
