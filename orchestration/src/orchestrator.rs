//! Host-side orchestrator: lifecycle, correlation, and deadlines for
//! requests issued against the isolated compiler endpoint.
//!
//! The orchestrator owns the request channel and a correlation table.
//! Any number of requests may be in flight at once; each waits on its own
//! completion handle, so slow compiles never block fast ones and
//! responses may arrive in any order.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::compiler::CompilerFactory;
use crate::config::HostConfig;
use crate::correlation::PendingRequests;
use crate::diagnostics::Diagnostic;
use crate::endpoint::CompilerEndpoint;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::metrics::{MetricsSnapshot, RequestMetrics};
use crate::options::{CompileOptions, CompileOptionsOverrides, CompileResult};
use crate::protocol::{Request, RequestEnvelope, RequestId, Response, ResponseEnvelope};

/// Orchestrator lifecycle states. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed; `init()` has not yet succeeded.
    Created,
    /// `init()` succeeded; compile and type-check calls are accepted.
    Ready,
    /// Torn down; every call fails fast.
    Disposed,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Ready => write!(f, "ready"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

struct Shared {
    state: LifecycleState,
    request_tx: Option<mpsc::UnboundedSender<RequestEnvelope>>,
}

/// Facade the editor integration talks to.
pub struct CompileOrchestrator {
    shared: Mutex<Shared>,
    pending: Arc<PendingRequests>,
    metrics: Arc<RequestMetrics>,
    timeout: Duration,
}

impl CompileOrchestrator {
    /// Spawn an endpoint task for the given factory and wire the
    /// orchestrator to it over in-process channels.
    pub fn spawn(factory: Box<dyn CompilerFactory>, config: &HostConfig) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        tokio::spawn(CompilerEndpoint::new(factory).run(request_rx, response_tx));

        Self::with_transport(request_tx, response_rx, config.request_timeout())
    }

    /// Wire the orchestrator to an already-running endpoint transport.
    pub fn with_transport(
        request_tx: mpsc::UnboundedSender<RequestEnvelope>,
        mut response_rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
        timeout: Duration,
    ) -> Self {
        let pending = Arc::new(PendingRequests::new());
        let metrics = Arc::new(RequestMetrics::new());

        // Response pump: resolve each envelope against the correlation
        // table, discarding anything no longer outstanding.
        let pump_pending = pending.clone();
        let pump_metrics = metrics.clone();
        tokio::spawn(async move {
            while let Some(envelope) = response_rx.recv().await {
                if !pump_pending.resolve(envelope) {
                    pump_metrics.record_late_discard();
                    debug!("discarded response with no outstanding request");
                }
            }
            debug!("response pump exited");
        });

        Self {
            shared: Mutex::new(Shared {
                state: LifecycleState::Created,
                request_tx: Some(request_tx),
            }),
            pending,
            metrics,
            timeout,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Initialize the endpoint's compiler core. Idempotent: repeated calls
    /// re-acknowledge without reconstructing the core. A failed init
    /// leaves the orchestrator in `Created` and may be retried.
    pub async fn init(&self) -> OrchestrationResult<()> {
        match self.roundtrip(Request::Init).await? {
            Response::InitSuccess => {
                self.transition(LifecycleState::Ready);
                Ok(())
            }
            Response::Error { error } => {
                self.metrics.record_failure();
                Err(OrchestrationError::initialization(error))
            }
            other => Err(self.mismatched("init", &other)),
        }
    }

    /// Compile one source file, applying `overrides` on top of the
    /// default options.
    pub async fn compile(
        &self,
        source: impl Into<String>,
        overrides: CompileOptionsOverrides,
    ) -> OrchestrationResult<CompileResult> {
        self.ensure_ready()?;
        let request = Request::Compile {
            source: source.into(),
            options: CompileOptions::normalized(overrides),
        };
        match self.roundtrip(request).await? {
            Response::CompileSuccess { result } => Ok(result),
            Response::Error { error } => {
                self.metrics.record_failure();
                Err(OrchestrationError::compilation(error))
            }
            other => Err(self.mismatched("compile", &other)),
        }
    }

    /// Type-check one source file, returning only its diagnostics.
    pub async fn type_check(
        &self,
        source: impl Into<String>,
    ) -> OrchestrationResult<Vec<Diagnostic>> {
        self.ensure_ready()?;
        let request = Request::Check {
            source: source.into(),
        };
        match self.roundtrip(request).await? {
            Response::CheckSuccess { diagnostics } => Ok(diagnostics),
            Response::Error { error } => {
                self.metrics.record_failure();
                Err(OrchestrationError::compilation(error))
            }
            other => Err(self.mismatched("check", &other)),
        }
    }

    /// Tear everything down. Idempotent. Outstanding requests are woken
    /// with [`OrchestrationError::EndpointUnavailable`]; dropping the
    /// request channel stops the endpoint task.
    pub fn dispose(&self) {
        let mut shared = self.lock();
        if shared.state.is_terminal() {
            return;
        }
        debug!(from = %shared.state, to = %LifecycleState::Disposed, "orchestrator state transition");
        shared.state = LifecycleState::Disposed;
        shared.request_tx = None;
        drop(shared);
        self.pending.clear();
    }

    /// Send one request and wait for its correlated response, subject to
    /// the per-request deadline.
    async fn roundtrip(&self, request: Request) -> OrchestrationResult<Response> {
        let tx = {
            let shared = self.lock();
            if shared.state.is_terminal() {
                return Err(OrchestrationError::EndpointUnavailable);
            }
            shared
                .request_tx
                .clone()
                .ok_or(OrchestrationError::EndpointUnavailable)?
        };

        let id = RequestId::fresh();
        let rx = self
            .pending
            .register(&id)
            .map_err(|e| OrchestrationError::protocol(e.to_string()))?;

        let kind = request.kind();
        self.metrics.record_sent();
        if tx.send(RequestEnvelope::new(id.clone(), request)).is_err() {
            self.pending.forget(&id);
            return Err(OrchestrationError::EndpointUnavailable);
        }
        debug!(id = %id, kind, "request sent");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(envelope)) => Ok(envelope.response),
            Ok(Err(_)) => Err(OrchestrationError::EndpointUnavailable),
            Err(_) => {
                // Remove the entry so the late response gets discarded.
                self.pending.forget(&id);
                self.metrics.record_timeout();
                warn!(id = %id, kind, timeout = ?self.timeout, "request timed out");
                Err(OrchestrationError::Timeout {
                    waited: self.timeout,
                })
            }
        }
    }

    fn ensure_ready(&self) -> OrchestrationResult<()> {
        match self.lock().state {
            LifecycleState::Ready => Ok(()),
            LifecycleState::Created => Err(OrchestrationError::NotInitialized),
            LifecycleState::Disposed => Err(OrchestrationError::EndpointUnavailable),
        }
    }

    fn transition(&self, to: LifecycleState) {
        let mut shared = self.lock();
        if shared.state == to || shared.state.is_terminal() {
            return;
        }
        debug!(from = %shared.state, to = %to, "orchestrator state transition");
        shared.state = to;
    }

    fn mismatched(&self, expected: &str, got: &Response) -> OrchestrationError {
        self.metrics.record_failure();
        OrchestrationError::protocol(format!(
            "expected {expected} response, got {}",
            got.kind()
        ))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("orchestrator state poisoned")
    }
}

impl Drop for CompileOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PassthroughFactory;

    fn test_config() -> HostConfig {
        HostConfig::default()
    }

    #[tokio::test]
    async fn test_compile_before_init_fails_without_sending() {
        let orchestrator =
            CompileOrchestrator::spawn(Box::new(PassthroughFactory), &test_config());

        let err = orchestrator
            .compile("let x = 1;", CompileOptionsOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NotInitialized));
        assert_eq!(orchestrator.metrics().requests_sent, 0);
    }

    #[tokio::test]
    async fn test_init_then_compile() {
        let orchestrator =
            CompileOrchestrator::spawn(Box::new(PassthroughFactory), &test_config());
        assert_eq!(orchestrator.state(), LifecycleState::Created);

        orchestrator.init().await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::Ready);

        let result = orchestrator
            .compile("let x: number = 1;", CompileOptionsOverrides::default())
            .await
            .unwrap();
        assert!(result.code.contains("let x: number = 1;"));
        assert!(result.is_clean());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let orchestrator =
            CompileOrchestrator::spawn(Box::new(PassthroughFactory), &test_config());
        orchestrator.init().await.unwrap();
        orchestrator.init().await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_dispose_fails_fast_and_is_idempotent() {
        let orchestrator =
            CompileOrchestrator::spawn(Box::new(PassthroughFactory), &test_config());
        orchestrator.init().await.unwrap();

        orchestrator.dispose();
        orchestrator.dispose();
        assert_eq!(orchestrator.state(), LifecycleState::Disposed);

        let err = orchestrator.init().await.unwrap_err();
        assert!(matches!(err, OrchestrationError::EndpointUnavailable));
        let err = orchestrator
            .compile("x", CompileOptionsOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::EndpointUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_forgets_the_request() {
        // A transport whose endpoint never answers.
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let (_response_tx, response_rx) = mpsc::unbounded_channel();
        let orchestrator = CompileOrchestrator::with_transport(
            request_tx,
            response_rx,
            Duration::from_secs(10),
        );

        let err = orchestrator.init().await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Timeout { .. }));
        assert_eq!(orchestrator.metrics().timeouts, 1);

        // The request did reach the wire, and its entry is gone.
        assert!(request_rx.recv().await.is_some());
        assert_eq!(orchestrator.pending.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_late_response_is_discarded() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let orchestrator = CompileOrchestrator::with_transport(
            request_tx,
            response_rx,
            Duration::from_millis(10),
        );

        let err = orchestrator.init().await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Timeout { .. }));

        // The endpoint answers after the deadline.
        let envelope = request_rx.recv().await.unwrap();
        response_tx
            .send(ResponseEnvelope::new(envelope.id, Response::InitSuccess))
            .unwrap();

        // Give the pump a chance to process the stale envelope.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(orchestrator.metrics().late_responses_discarded, 1);
        assert_eq!(orchestrator.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_endpoint_error_surfaces_as_compilation_error() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let orchestrator = CompileOrchestrator::with_transport(
            request_tx,
            response_rx,
            Duration::from_secs(5),
        );

        // Fake endpoint: init succeeds, compile fails.
        tokio::spawn(async move {
            while let Some(envelope) = request_rx.recv().await {
                let response = match envelope.request {
                    Request::Init => Response::InitSuccess,
                    _ => Response::Error {
                        error: "unexpected token".to_string(),
                    },
                };
                if response_tx
                    .send(ResponseEnvelope::new(envelope.id, response))
                    .is_err()
                {
                    break;
                }
            }
        });

        orchestrator.init().await.unwrap();
        let err = orchestrator
            .compile("garbage", CompileOptionsOverrides::default())
            .await
            .unwrap_err();
        match err {
            OrchestrationError::Compilation { message } => {
                assert_eq!(message, "unexpected token");
            }
            other => panic!("expected compilation error, got {other}"),
        }
        // Still usable after the failure.
        assert_eq!(orchestrator.state(), LifecycleState::Ready);
        assert_eq!(orchestrator.metrics().failures, 1);
    }

    #[tokio::test]
    async fn test_type_check_returns_diagnostics() {
        let orchestrator =
            CompileOrchestrator::spawn(Box::new(PassthroughFactory), &test_config());
        orchestrator.init().await.unwrap();

        let diagnostics = orchestrator.type_check("let x = 1;").await.unwrap();
        assert!(diagnostics.is_empty());
    }
}
