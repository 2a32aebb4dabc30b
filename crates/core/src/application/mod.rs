// Application Layer - Use Cases and Business Logic

pub mod cancel;
pub mod catalog;
pub mod constants;
pub mod diagnostics;
pub mod orchestrator;
pub mod service;

// Re-exports
pub use cancel::{cancel_channel, CancelSender, CancelToken};
pub use catalog::builtin_catalog;
pub use diagnostics::DiagnosticsRunner;
pub use orchestrator::{RunOptions, TuningOrchestrator};
pub use service::NetTuneService;
