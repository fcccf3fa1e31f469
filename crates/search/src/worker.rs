//! Background search worker.
//!
//! A [`SearchWorker`] runs one [`QuerySession`] on a dedicated thread. Callers
//! talk to it through a [`SearchClient`]: requests go out over an unbounded
//! channel and are handled strictly in send order, responses come back on a
//! second channel. Nothing the caller does blocks on the worker.
//!
//! Responses may be observed after the caller has moved on to a newer query.
//! The client remembers the latest query it issued and [`SearchClient::accept`]
//! discards any response whose echoed `q` no longer matches. Cancellation is
//! only ever this discard; the worker always finishes what it started.

use crate::config::{SearchConfig, SessionConfig};
use crate::error::{Result, SearchError};
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::record::ProviderRecord;
use crate::session::{QuerySession, SearchResponse};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const THREAD_NAME: &str = "catalogue-search";

/// What travels over the request channel.
#[derive(Debug)]
enum Envelope {
    Request(WorkerRequest),
    /// Undecoded JSON; decoding happens on the worker
    Raw(String),
}

/// Handle to a running worker and its response stream.
pub struct SearchWorker {
    client: SearchClient,
    responses: mpsc::UnboundedReceiver<WorkerResponse>,
    thread: Option<JoinHandle<()>>,
}

impl SearchWorker {
    /// Start a worker thread with an empty session.
    pub fn spawn(config: SearchConfig) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let session_config = config.session.clone();
        let session = QuerySession::new(config);

        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(session, request_rx, response_tx))
            .map_err(SearchError::WorkerSpawn)?;

        debug!("Search worker started");

        Ok(Self {
            client: SearchClient::new(request_tx, session_config),
            responses: response_rx,
            thread: Some(thread),
        })
    }

    /// A client for sending requests. Clients are cheap to clone.
    pub fn client(&self) -> SearchClient {
        self.client.clone()
    }

    /// Next response in arrival order, stale or not.
    pub async fn recv(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for callers outside a runtime.
    pub fn blocking_recv(&mut self) -> Option<WorkerResponse> {
        self.responses.blocking_recv()
    }

    /// Next search response that still answers the client's latest query.
    ///
    /// Build acknowledgements and stale results are skipped. Returns `None`
    /// once the worker has stopped.
    pub async fn next_results(&mut self) -> Option<SearchResponse> {
        loop {
            match self.responses.recv().await? {
                WorkerResponse::Ready(summary) => {
                    debug!(providers = summary.providers, services = summary.services, "Index ready");
                }
                WorkerResponse::Results(response) => {
                    if let Some(response) = self.client.accept(response) {
                        return Some(response);
                    }
                }
            }
        }
    }

    /// Stop the worker and wait for its thread to exit.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.client.terminate();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Search worker thread panicked");
            }
        }
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker message loop. Returns when terminated or when either side hangs up.
fn run(
    mut session: QuerySession,
    mut requests: mpsc::UnboundedReceiver<Envelope>,
    responses: mpsc::UnboundedSender<WorkerResponse>,
) {
    while let Some(envelope) = requests.blocking_recv() {
        let request = match envelope {
            Envelope::Request(request) => request,
            Envelope::Raw(text) => match WorkerRequest::from_json(&text) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!("Ignoring message with unknown type");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "Ignoring malformed message");
                    continue;
                }
            },
        };

        let response = match request {
            WorkerRequest::Build { providers } => WorkerResponse::Ready(session.build(providers)),
            WorkerRequest::Search { query } => WorkerResponse::Results(session.search(&query)),
            WorkerRequest::Terminate => break,
        };

        if responses.send(response).is_err() {
            debug!("Response receiver dropped");
            break;
        }
    }

    debug!("Search worker stopped");
}

/// Caller-side handle to a [`SearchWorker`].
#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    requests: mpsc::UnboundedSender<Envelope>,
    /// Latest query issued, trimmed; `None` after terminate
    current: Mutex<Option<String>>,
    /// Bumped on every search so debounced sends can tell they were superseded
    generation: AtomicU64,
    closed: AtomicBool,
    session: SessionConfig,
}

impl SearchClient {
    fn new(requests: mpsc::UnboundedSender<Envelope>, session: SessionConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                requests,
                current: Mutex::new(None),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                session,
            }),
        }
    }

    /// Replace the worker's catalogue. The records move into the message.
    pub fn build(&self, providers: Vec<ProviderRecord>) -> Result<()> {
        self.send(Envelope::Request(WorkerRequest::Build { providers }))
    }

    /// Issue a query.
    ///
    /// Queries below the minimum length never reach the worker; their empty
    /// answer is returned directly. Otherwise the request is sent and `None`
    /// returned; the answer arrives on the worker's response channel.
    pub fn search(&self, query: &str) -> Result<Option<SearchResponse>> {
        self.ensure_open()?;
        let q = query.trim();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self.current() = Some(q.to_string());

        if q.chars().count() < self.inner.session.min_query_chars {
            return Ok(Some(SearchResponse::empty(q)));
        }

        self.send(Envelope::Request(WorkerRequest::Search { query: q.to_string() }))?;
        Ok(None)
    }

    /// Issue a query after the debounce interval, unless a newer one arrives first.
    ///
    /// Short queries are answered at once, like [`search`](Self::search).
    /// Returns `Ok(None)` both when the request was sent and when it was
    /// superseded during the wait.
    pub async fn search_debounced(&self, query: &str) -> Result<Option<SearchResponse>> {
        self.ensure_open()?;
        if query.trim().chars().count() < self.inner.session.min_query_chars {
            return self.search(query);
        }

        let ticket = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.inner.session.debounce()).await;

        if self.inner.generation.load(Ordering::SeqCst) != ticket {
            debug!(query, "Debounced query superseded");
            return Ok(None);
        }
        self.search(query)
    }

    /// Send an undecoded JSON message. Malformed or unknown messages are
    /// logged and dropped by the worker. Raw searches do not update the
    /// client's current query.
    pub fn submit_json(&self, message: impl Into<String>) -> Result<()> {
        self.send(Envelope::Raw(message.into()))
    }

    /// Whether `q` is the latest query this client issued.
    pub fn is_current(&self, q: &str) -> bool {
        self.current().as_deref() == Some(q)
    }

    /// Keep a response only if it answers the latest query.
    pub fn accept(&self, response: SearchResponse) -> Option<SearchResponse> {
        if self.is_current(&response.q) {
            Some(response)
        } else {
            debug!(q = %response.q, "Discarding stale search response");
            None
        }
    }

    /// Stop the worker and invalidate any query still in flight.
    pub fn terminate(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.current() = None;
        // The worker may already be gone; nothing to report then.
        let _ = self.inner.requests.send(Envelope::Request(WorkerRequest::Terminate));
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst) || self.inner.requests.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SearchError::WorkerClosed);
        }
        Ok(())
    }

    fn send(&self, envelope: Envelope) -> Result<()> {
        self.ensure_open()?;
        self.inner.requests.send(envelope).map_err(|_| SearchError::WorkerClosed)
    }

    fn current(&self) -> MutexGuard<'_, Option<String>> {
        // The guarded value is a plain string; a poisoned lock is still usable.
        self.inner.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("current", &*self.current())
            .field("closed", &self.is_closed())
            .finish()
    }
}
