//! Async compile orchestration for the TypeScript worker compiler.
//!
//! The host process constructs a [`CompileOrchestrator`], which spawns an
//! isolated [`CompilerEndpoint`] task owning the single native compiler
//! core instance. Compile and type-check calls cross the boundary as
//! correlated request/response envelopes over message channels; responses
//! may arrive in any order and are matched back to their callers by id.
//!
//! The endpoint never shares memory with the host: everything that crosses
//! the boundary is a JSON-serializable [`RequestEnvelope`] or
//! [`ResponseEnvelope`], so the same protocol works over in-process
//! channels, pipes, or sockets.

pub mod compiler;
pub mod config;
pub mod correlation;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod metrics;
pub mod options;
pub mod orchestrator;
pub mod protocol;
pub mod telemetry;

// Re-export the compiler seam
pub use compiler::{
    CompilerCore, CompilerFactory, CompilerFailure, PassthroughCompiler, PassthroughFactory,
};

// Re-export configuration
pub use config::HostConfig;

// Re-export the diagnostic/result model
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLocation, Severity, Span};
pub use options::{CompileOptions, CompileOptionsOverrides, CompileResult};

// Re-export the endpoint and orchestrator
pub use endpoint::{CompilerEndpoint, EndpointState};
pub use orchestrator::{CompileOrchestrator, LifecycleState};

// Re-export the protocol types
pub use protocol::{Request, RequestEnvelope, RequestId, Response, ResponseEnvelope};

// Re-export errors and metrics
pub use correlation::PendingRequests;
pub use error::{OrchestrationError, OrchestrationResult};
pub use metrics::{MetricsSnapshot, RequestMetrics};
