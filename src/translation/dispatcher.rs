/*!
 * Request dispatching.
 *
 * A dispatcher schedules translation requests against the cache gateway while
 * bounding how many run at once. Two strategies exist:
 *
 * - `Limiter`: every request runs in its own task once it holds a semaphore
 *   permit. The semaphore is fair, so requests start in submission order.
 * - `WorkerPool`: a fixed set of long-lived workers each translate one request
 *   at a time; requests are handed out round-robin and results are routed back
 *   to the submitter by request id.
 *
 * Both hand out a [`DispatchHandle`] per submission. A handle always resolves:
 * if its request is lost, it yields the original text.
 */

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::app_config::{DispatchStrategy, TranslationConfig};
use crate::providers::TranslationRequest;
use crate::translation::gateway::CacheGateway;

/// Correlation id of a submitted request, unique within one dispatcher
pub type RequestId = u64;

/// Pending result of one submitted request
#[derive(Debug)]
pub struct DispatchHandle {
    id: RequestId,
    fallback: String,
    receiver: oneshot::Receiver<String>,
}

impl DispatchHandle {
    fn new(id: RequestId, fallback: String) -> (Self, oneshot::Sender<String>) {
        let (sender, receiver) = oneshot::channel();
        (Self { id, fallback, receiver }, sender)
    }

    /// Correlation id
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the translation; the original text if the request was dropped
    pub async fn wait(self) -> String {
        match self.receiver.await {
            Ok(translated) => translated,
            Err(_) => {
                warn!("Request {} was dropped, keeping original text", self.id);
                self.fallback
            }
        }
    }
}

/// Bounded scheduler of translation requests
#[async_trait]
pub trait Dispatcher: Send {
    /// Submit a request; may wait until the dispatcher has room for it
    async fn submit(&mut self, request: TranslationRequest) -> DispatchHandle;

    /// Wait until every submitted request has completed, then release all tasks
    async fn drain(&mut self);

    /// Maximum number of requests translated at the same time
    fn capacity(&self) -> usize;
}

/// Create the dispatcher selected by the configuration
pub fn create_dispatcher(
    strategy: DispatchStrategy,
    capacity: usize,
    gateway: CacheGateway,
) -> Box<dyn Dispatcher> {
    match strategy {
        DispatchStrategy::Limiter => Box::new(Limiter::new(capacity, gateway)),
        DispatchStrategy::WorkerPool => Box::new(WorkerPool::new(capacity, gateway)),
    }
}

/// Create the dispatcher for a translation config
pub fn dispatcher_for_config(config: &TranslationConfig, gateway: CacheGateway) -> Box<dyn Dispatcher> {
    create_dispatcher(config.dispatch, config.concurrency_limit(), gateway)
}

/// Semaphore-bounded dispatcher, one task per request
pub struct Limiter {
    gateway: CacheGateway,
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
    capacity: usize,
    next_id: RequestId,
}

impl Limiter {
    /// Allow at most `capacity` requests in flight
    pub fn new(capacity: usize, gateway: CacheGateway) -> Self {
        let capacity = capacity.max(1);
        Self {
            gateway,
            semaphore: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
            capacity,
            next_id: 0,
        }
    }
}

#[async_trait]
impl Dispatcher for Limiter {
    async fn submit(&mut self, request: TranslationRequest) -> DispatchHandle {
        let id = self.next_id;
        self.next_id += 1;
        let (handle, sender) = DispatchHandle::new(id, request.text.clone());

        // Queue here so permits are granted in submission order
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let _ = sender.send(request.text);
                return handle;
            }
        };

        let gateway = self.gateway.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            let translated = gateway
                .resolve(&request.text, &request.source_language, &request.target_language)
                .await;
            let _ = sender.send(translated);
        });

        handle
    }

    async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!("Translation task failed: {}", e);
            }
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A request assigned to a worker
struct Job {
    id: RequestId,
    request: TranslationRequest,
}

/// A finished request on its way back to the submitter
struct Completion {
    id: RequestId,
    translated: String,
}

type PendingMap = Arc<Mutex<HashMap<RequestId, oneshot::Sender<String>>>>;

/// Fixed set of sequential workers fed round-robin
pub struct WorkerPool {
    senders: Vec<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    router: Option<JoinHandle<()>>,
    pending: PendingMap,
    next_worker: usize,
    next_id: RequestId,
    capacity: usize,
}

impl WorkerPool {
    /// Start `size` workers
    pub fn new(size: usize, gateway: CacheGateway) -> Self {
        let size = size.max(1);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (completion_tx, completion_rx) = mpsc::unbounded_channel::<Completion>();

        let mut senders = Vec::with_capacity(size);
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();
            senders.push(job_tx);
            workers.push(tokio::spawn(run_worker(
                index,
                job_rx,
                completion_tx.clone(),
                gateway.clone(),
            )));
        }
        drop(completion_tx);

        let router = tokio::spawn(route_completions(completion_rx, Arc::clone(&pending)));

        debug!("Worker pool started with {} workers", size);

        Self {
            senders,
            workers,
            router: Some(router),
            pending,
            next_worker: 0,
            next_id: 0,
            capacity: size,
        }
    }

    /// Number of requests still awaiting a result
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

async fn run_worker(
    index: usize,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    completions: mpsc::UnboundedSender<Completion>,
    gateway: CacheGateway,
) {
    while let Some(job) = jobs.recv().await {
        let translated = gateway
            .resolve(
                &job.request.text,
                &job.request.source_language,
                &job.request.target_language,
            )
            .await;
        if completions.send(Completion { id: job.id, translated }).is_err() {
            break;
        }
    }
    debug!("Worker {} stopped", index);
}

async fn route_completions(mut completions: mpsc::UnboundedReceiver<Completion>, pending: PendingMap) {
    while let Some(completion) = completions.recv().await {
        let sender = pending.lock().remove(&completion.id);
        match sender {
            Some(sender) => {
                let _ = sender.send(completion.translated);
            }
            None => warn!("Dropping result for unknown request {}", completion.id),
        }
    }
}

#[async_trait]
impl Dispatcher for WorkerPool {
    async fn submit(&mut self, request: TranslationRequest) -> DispatchHandle {
        let id = self.next_id;
        self.next_id += 1;
        let (handle, sender) = DispatchHandle::new(id, request.text.clone());

        if self.senders.is_empty() {
            let _ = sender.send(request.text);
            return handle;
        }

        self.pending.lock().insert(id, sender);

        let worker = self.next_worker;
        self.next_worker = (self.next_worker + 1) % self.senders.len();

        if self.senders[worker].send(Job { id, request }).is_err() {
            // Worker is gone; dropping the sender resolves the handle to its fallback
            self.pending.lock().remove(&id);
        }

        handle
    }

    async fn drain(&mut self) {
        // Closing the queues lets each worker finish its backlog and exit
        self.senders.clear();

        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!("Worker task failed: {}", e);
            }
        }
        if let Some(router) = self.router.take() {
            if let Err(e) = router.await {
                warn!("Result router failed: {}", e);
            }
        }

        let orphaned = std::mem::take(&mut *self.pending.lock());
        if !orphaned.is_empty() {
            warn!("{} requests finished without a result", orphaned.len());
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
        if let Some(router) = &self.router {
            router.abort();
        }
    }
}
