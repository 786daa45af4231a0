//! Execution of protocol requests.
//!
//! The same `Dispatcher` runs either on a dedicated worker thread, reached
//! only through channels, or inline on the caller's thread. Callers hold a
//! `Box<dyn Executor>` picked once by `spawn_executor` and never branch on
//! the mode themselves.
//!
//! Requests and responses are moved across the channel, so the worker never
//! shares memory with the caller and no locking is involved. There is no
//! queueing policy beyond channel order, no timeout, and no cancellation:
//! a terminated worker finishes its current request and the response is
//! dropped.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, ExecutionMode};
use crate::protocol::{Dispatcher, Request, Response};

/// Errors raised by executors. These concern the transport only; a request
/// that fails to compute still yields an `error` response.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("executor has been terminated")]
    Terminated,

    #[error("worker disconnected")]
    Disconnected,

    #[error("no response pending")]
    NothingPending,

    #[error("worker thread panicked")]
    WorkerPanicked,
}

/// Something that accepts requests and hands back one response per request.
pub trait Executor: Send {
    /// Submits a request. Its response becomes available to `recv`.
    fn post(&self, request: Request) -> Result<(), ExecutorError>;

    /// Waits for the next response.
    fn recv(&self) -> Result<Response, ExecutorError>;

    /// Returns the next response if one is ready.
    fn try_recv(&self) -> Result<Option<Response>, ExecutorError>;

    /// Where requests run.
    fn mode(&self) -> ExecutionMode;

    /// Posts a request and waits for its response.
    fn call(&self, request: Request) -> Result<Response, ExecutorError> {
        self.post(request)?;
        self.recv()
    }
}

/// Runs requests on a dedicated thread.
pub struct WorkerExecutor {
    requests: Option<Sender<Request>>,
    responses: Receiver<Response>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerExecutor {
    /// Spawns the worker thread.
    pub fn spawn(name: &str, dispatcher: Dispatcher) -> Result<Self, ExecutorError> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (res_tx, res_rx) = mpsc::channel::<Response>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(dispatcher, req_rx, res_tx))?;

        info!(thread = name, "expectation worker started");
        Ok(WorkerExecutor {
            requests: Some(req_tx),
            responses: res_rx,
            handle: Some(handle),
        })
    }

    /// Stops accepting requests without waiting for the worker. A request
    /// already in flight runs to completion and its response is discarded.
    pub fn terminate(&mut self) {
        if self.requests.take().is_some() {
            debug!("expectation worker terminated");
        }
        self.handle.take();
    }

    /// Stops accepting requests and waits for the worker thread to exit.
    pub fn shutdown(mut self) -> Result<(), ExecutorError> {
        self.requests.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ExecutorError::WorkerPanicked),
            None => Ok(()),
        }
    }

    fn is_terminated(&self) -> bool {
        self.requests.is_none()
    }
}

impl Drop for WorkerExecutor {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl Executor for WorkerExecutor {
    fn post(&self, request: Request) -> Result<(), ExecutorError> {
        let requests = self.requests.as_ref().ok_or(ExecutorError::Terminated)?;
        requests.send(request).map_err(|_| ExecutorError::Disconnected)
    }

    fn recv(&self) -> Result<Response, ExecutorError> {
        if self.is_terminated() {
            return Err(ExecutorError::Terminated);
        }
        self.responses.recv().map_err(|_| ExecutorError::Disconnected)
    }

    fn try_recv(&self) -> Result<Option<Response>, ExecutorError> {
        if self.is_terminated() {
            return Err(ExecutorError::Terminated);
        }
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ExecutorError::Disconnected),
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Worker
    }
}

fn worker_loop(dispatcher: Dispatcher, requests: Receiver<Request>, responses: Sender<Response>) {
    for request in requests {
        let response = dispatcher.handle(&request);
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("expectation worker exiting");
}

/// Runs requests inline on the caller's thread. `post` blocks until the
/// response is computed.
pub struct LocalExecutor {
    dispatcher: Dispatcher,
    tx: Sender<Response>,
    rx: Receiver<Response>,
}

impl LocalExecutor {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let (tx, rx) = mpsc::channel();
        LocalExecutor { dispatcher, tx, rx }
    }
}

impl Executor for LocalExecutor {
    fn post(&self, request: Request) -> Result<(), ExecutorError> {
        let response = self.dispatcher.handle(&request);
        self.tx.send(response).map_err(|_| ExecutorError::Disconnected)
    }

    fn recv(&self) -> Result<Response, ExecutorError> {
        // Responses are produced inside `post`, so an empty queue would
        // never fill.
        self.try_recv()?.ok_or(ExecutorError::NothingPending)
    }

    fn try_recv(&self) -> Result<Option<Response>, ExecutorError> {
        match self.rx.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ExecutorError::Disconnected),
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Local
    }
}

/// Builds the executor for `config`. In worker mode a failed thread spawn
/// falls back to a `LocalExecutor`.
pub fn spawn_executor(config: &EngineConfig) -> Box<dyn Executor> {
    let dispatcher = Dispatcher::new(config.search_options());
    match config.mode {
        ExecutionMode::Local => Box::new(LocalExecutor::new(dispatcher)),
        ExecutionMode::Worker => {
            or_local(WorkerExecutor::spawn(&config.worker_name, dispatcher), dispatcher)
        }
    }
}

fn or_local(
    spawned: Result<WorkerExecutor, ExecutorError>,
    dispatcher: Dispatcher,
) -> Box<dyn Executor> {
    match spawned {
        Ok(worker) => Box::new(worker),
        Err(e) => {
            warn!("{}; running requests on the calling thread", e);
            Box::new(LocalExecutor::new(dispatcher))
        }
    }
}
