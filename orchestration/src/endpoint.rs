//! Isolated compiler endpoint: the message dispatcher that owns the
//! single native compiler core instance.
//!
//! The endpoint is single-threaded cooperative dispatch: one message at a
//! time, in arrival order. Concurrent requests are pipelined by the
//! transport, never reordered here. A failed compile never invalidates
//! the core instance, and a failed init leaves the endpoint retryable.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::compiler::{CompilerCore, CompilerFactory};
use crate::protocol::{Request, RequestEnvelope, Response, ResponseEnvelope};

/// Endpoint lifecycle states. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// No core instance yet; only `init` can make progress.
    Uninitialized,
    /// Core constructed; compile and check requests are served.
    Ready,
    /// Torn down; no further messages are processed.
    Disposed,
}

impl EndpointState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Owns exactly one core instance and mediates all access to it.
pub struct CompilerEndpoint {
    state: EndpointState,
    factory: Box<dyn CompilerFactory>,
    core: Option<Box<dyn CompilerCore>>,
}

impl CompilerEndpoint {
    pub fn new(factory: Box<dyn CompilerFactory>) -> Self {
        Self {
            state: EndpointState::Uninitialized,
            factory,
            core: None,
        }
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Process one message and produce the correlated response.
    ///
    /// Every response echoes the request id unmodified. State changes only
    /// on a successful first `init` and on dispose.
    pub fn handle(&mut self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let RequestEnvelope { id, request } = envelope;

        if self.state.is_terminal() {
            debug!(id = %id, kind = request.kind(), "message after dispose rejected");
            return ResponseEnvelope::new(
                id,
                Response::Error {
                    error: "endpoint disposed".to_string(),
                },
            );
        }

        let response = match request {
            Request::Init => self.handle_init(),
            Request::Compile { source, options } => self.handle_compile(&source, &options),
            Request::Check { source } => self.handle_check(&source),
        };
        ResponseEnvelope::new(id, response)
    }

    fn handle_init(&mut self) -> Response {
        if self.state == EndpointState::Ready {
            // Idempotent: the core is not reconstructed.
            debug!("init on ready endpoint, re-acknowledging");
            return Response::InitSuccess;
        }

        match self.factory.create() {
            Ok(core) => {
                self.core = Some(core);
                self.transition(EndpointState::Ready);
                Response::InitSuccess
            }
            Err(failure) => {
                // Stay Uninitialized so a later init can retry.
                warn!(error = %failure, "compiler core construction failed");
                Response::Error {
                    error: failure.to_string(),
                }
            }
        }
    }

    fn handle_compile(&mut self, source: &str, options: &crate::options::CompileOptions) -> Response {
        let Some(core) = self.core.as_ref() else {
            return Response::Error {
                error: "compiler not initialized. Call init first".to_string(),
            };
        };
        match core.compile(source, options) {
            Ok(result) => Response::CompileSuccess { result },
            Err(failure) => {
                // The core instance stays valid; only this request fails.
                debug!(file = %options.file_name, error = %failure, "compile request failed");
                Response::Error {
                    error: format!("compilation failed: {failure}"),
                }
            }
        }
    }

    fn handle_check(&mut self, source: &str) -> Response {
        let Some(core) = self.core.as_ref() else {
            return Response::Error {
                error: "compiler not initialized. Call init first".to_string(),
            };
        };
        match core.type_check(source) {
            Ok(diagnostics) => Response::CheckSuccess { diagnostics },
            Err(failure) => {
                debug!(error = %failure, "check request failed");
                Response::Error {
                    error: format!("type checking failed: {failure}"),
                }
            }
        }
    }

    /// Tear down the endpoint. Terminal and idempotent.
    pub fn dispose(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.core = None;
        self.transition(EndpointState::Disposed);
    }

    fn transition(&mut self, to: EndpointState) {
        debug!(from = %self.state, to = %to, "endpoint state transition");
        self.state = to;
    }

    /// Dispatch loop: serve messages in arrival order until the request
    /// channel closes (the host's teardown signal), then dispose.
    pub async fn run(
        mut self,
        mut request_rx: mpsc::UnboundedReceiver<RequestEnvelope>,
        response_tx: mpsc::UnboundedSender<ResponseEnvelope>,
    ) {
        while let Some(envelope) = request_rx.recv().await {
            let response = self.handle(envelope);
            if response_tx.send(response).is_err() {
                debug!("response channel closed, stopping endpoint loop");
                break;
            }
        }
        self.dispose();
        debug!("endpoint loop exited");
    }
}
