// Platform command table port
//
// Maps typed targets and values onto concrete programs for one OS.

use super::command_executor::{CommandOutput, CommandSpec};
use crate::domain::{ChangeTarget, ConfigValue, Observed};

/// Closed translation between change targets and OS commands
///
/// Every command is built from typed values, so no caller-provided text ever
/// reaches a command line. `None` means the platform has no way to read or
/// modify the target.
pub trait PlatformCommands: Send + Sync {
    /// Platform label recorded in reports ("windows", "linux")
    fn platform(&self) -> &'static str;

    /// Read-only query for the target's current value
    fn read_command(&self, target: &ChangeTarget) -> Option<CommandSpec>;

    /// Interpret the output of [`PlatformCommands::read_command`]
    fn parse_observation(&self, target: &ChangeTarget, output: &CommandOutput) -> Observed;

    /// Mutation setting the target to `value`
    fn apply_command(&self, target: &ChangeTarget, value: &ConfigValue) -> Option<CommandSpec>;

    /// Mutation returning the target to its unset state
    ///
    /// `written` is the value the failed change left behind.
    fn clear_command(&self, target: &ChangeTarget, written: &ConfigValue) -> Option<CommandSpec>;
}
