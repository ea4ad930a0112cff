//! Async driver around [`OrderWorkflow`].
//!
//! The session owns the injected collaborators and runs every request the
//! workflow issues as a task on a [`JoinSet`]. Completions are applied one at
//! a time, in the order they arrive; the workflow itself decides whether a
//! result is still wanted. All methods that start a request must be called
//! from within a Tokio runtime.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::catalog::{Catalog, FetchError, OrderSink, SubmitError};
use crate::model::{Category, Model, ModelId, OfferId, OrderId, QualityGrade, VendorOffer};
use crate::workflow::{
    DEFAULT_QUANTITY_CAP, FetchModels, FetchOffers, OrderWorkflow, RequestId, SubmitOrder,
    WorkflowError,
};

/// Tunables of an ordering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quantity bound while no vendor offer is selected.
    pub quantity_cap: u32,
    /// Deadline for each catalog request; none by default.
    pub fetch_timeout: Option<Duration>,
    /// Deadline for order submission; none by default.
    pub submit_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quantity_cap: DEFAULT_QUANTITY_CAP,
            fetch_timeout: None,
            submit_timeout: None,
        }
    }
}

/// A user action, as issued by a screen or a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectCategory(Category),
    SelectModel(ModelId),
    /// Select the first loaded model whose name matches.
    SearchModel(String),
    SelectOffer(OfferId),
    /// Select the cheapest in-stock offer of a grade.
    SelectGrade(QualityGrade),
    SetQuantity(u32),
    IncrementQuantity,
    DecrementQuantity,
    Submit,
    Reset,
}

/// Result of a finished request, tagged with the request that produced it.
#[derive(Debug)]
enum Completion {
    Models(RequestId, Result<Vec<Model>, FetchError>),
    Offers(RequestId, Result<Vec<VendorOffer>, FetchError>),
    Order(RequestId, Result<OrderId, SubmitError>),
}

/// One user's ordering session.
pub struct OrderSession {
    workflow: OrderWorkflow,
    catalog: Arc<dyn Catalog>,
    sink: Arc<dyn OrderSink>,
    config: SessionConfig,
    inflight: JoinSet<Completion>,
}

/// Public API
impl OrderSession {
    pub fn new(catalog: Arc<dyn Catalog>, sink: Arc<dyn OrderSink>) -> Self {
        Self::with_config(catalog, sink, SessionConfig::default())
    }

    pub fn with_config(
        catalog: Arc<dyn Catalog>,
        sink: Arc<dyn OrderSink>,
        config: SessionConfig,
    ) -> Self {
        Self {
            workflow: OrderWorkflow::with_quantity_cap(config.quantity_cap),
            catalog,
            sink,
            config,
            inflight: JoinSet::new(),
        }
    }

    /// Current state, for presentation.
    pub fn workflow(&self) -> &OrderWorkflow {
        &self.workflow
    }

    /// Number of requests still running, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    pub fn select_category(&mut self, category: Category) {
        let fetch = self.workflow.select_category(category);
        self.spawn_models(fetch);
    }

    pub fn select_model(&mut self, model: &Model) -> Result<(), WorkflowError> {
        let fetch = self.workflow.select_model(model)?;
        self.spawn_offers(fetch);
        Ok(())
    }

    pub fn select_model_id(&mut self, id: ModelId) -> Result<(), WorkflowError> {
        let fetch = self.workflow.select_model_id(id)?;
        self.spawn_offers(fetch);
        Ok(())
    }

    pub fn select_model_matching(&mut self, query: &str) -> Result<(), WorkflowError> {
        let fetch = self.workflow.select_model_matching(query)?;
        self.spawn_offers(fetch);
        Ok(())
    }

    pub fn select_vendor(&mut self, offer: &VendorOffer) -> Result<(), WorkflowError> {
        self.workflow.select_vendor(offer)
    }

    pub fn select_offer(&mut self, id: OfferId) -> Result<(), WorkflowError> {
        self.workflow.select_offer(id)
    }

    pub fn select_grade(&mut self, grade: QualityGrade) -> Result<(), WorkflowError> {
        self.workflow.select_grade(grade)
    }

    pub fn set_quantity(&mut self, quantity: u32) -> bool {
        self.workflow.set_quantity(quantity)
    }

    pub fn increment_quantity(&mut self) -> bool {
        self.workflow.increment_quantity()
    }

    pub fn decrement_quantity(&mut self) -> bool {
        self.workflow.decrement_quantity()
    }

    /// Start submitting the current draft without waiting for the answer.
    pub fn submit(&mut self) -> Result<(), WorkflowError> {
        let submit = self.workflow.submit()?;
        self.spawn_order(submit);
        Ok(())
    }

    /// Submit the current draft and wait for the sink's answer.
    ///
    /// Superseded requests still running are not waited for.
    /// `Ok(true)` once the sink accepted the order, `Ok(false)` if it failed;
    /// the failure message is then in [`OrderWorkflow::submission`].
    pub async fn place_order(&mut self) -> Result<bool, WorkflowError> {
        self.submit()?;
        self.wait_for_submission().await;
        Ok(self.workflow.submission().placed().is_some())
    }

    pub fn reset(&mut self) {
        self.workflow.reset();
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `false` if nothing was running.
    pub async fn complete_next(&mut self) -> bool {
        match self.inflight.join_next().await {
            Some(joined) => {
                self.apply_joined(joined);
                true
            }
            None => false,
        }
    }

    /// Wait until no request is running.
    pub async fn settle(&mut self) {
        while self.complete_next().await {}
    }

    /// Apply a single command, waiting first for any list it picks from.
    ///
    /// `Submit` returns once the sink has answered.
    pub async fn execute(&mut self, command: Command) -> Result<(), WorkflowError> {
        match command {
            Command::SelectCategory(category) => self.select_category(category),
            Command::SelectModel(id) => {
                self.wait_for_models().await;
                self.select_model_id(id)?;
            }
            Command::SearchModel(query) => {
                self.wait_for_models().await;
                self.select_model_matching(&query)?;
            }
            Command::SelectOffer(id) => {
                self.wait_for_offers().await;
                self.select_offer(id)?;
            }
            Command::SelectGrade(grade) => {
                self.wait_for_offers().await;
                self.select_grade(grade)?;
            }
            Command::SetQuantity(quantity) => {
                self.set_quantity(quantity);
            }
            Command::IncrementQuantity => {
                self.increment_quantity();
            }
            Command::DecrementQuantity => {
                self.decrement_quantity();
            }
            Command::Submit => {
                self.submit()?;
                self.wait_for_submission().await;
            }
            Command::Reset => self.reset(),
        }
        Ok(())
    }

    /// Run the session over a stream of commands.
    ///
    /// Requests complete concurrently with incoming commands. A command that
    /// does not fit the current step is logged and skipped. Returns once the
    /// stream ends and no current request is outstanding; superseded ones
    /// are left running.
    pub async fn run(&mut self, mut commands: impl Stream<Item = Command> + Unpin) {
        loop {
            tokio::select! {
                command = commands.next() => {
                    let Some(command) = command else { break };
                    let description = format!("{command:?}");
                    if let Err(e) = self.execute(command).await {
                        warn!(command = %description, reason = %e, "command skipped");
                    }
                }
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    self.apply_joined(joined);
                }
            }
        }

        while self.workflow.is_busy() && self.complete_next().await {}
        info!(step = %self.workflow.step(), "session finished");
    }
}

/// Private API
impl OrderSession {
    async fn wait_for_models(&mut self) {
        while self.workflow.models().is_loading() && self.complete_next().await {}
    }

    async fn wait_for_offers(&mut self) {
        while self.workflow.offers().is_loading() && self.complete_next().await {}
    }

    async fn wait_for_submission(&mut self) {
        while self.workflow.submission().is_pending() && self.complete_next().await {}
    }

    fn spawn_models(&mut self, fetch: FetchModels) {
        let catalog = Arc::clone(&self.catalog);
        let limit = self.config.fetch_timeout;
        let FetchModels { request, category } = fetch;

        let task = within(limit, FetchError::Timeout, async move {
            catalog.list_models_by_category(category).await
        });
        self.inflight.spawn(async move {
            let result = tokio::spawn(task)
                .await
                .unwrap_or_else(|e| Err(FetchError::Interrupted(e.to_string())));
            Completion::Models(request, result)
        });
    }

    fn spawn_offers(&mut self, fetch: FetchOffers) {
        let catalog = Arc::clone(&self.catalog);
        let limit = self.config.fetch_timeout;
        let FetchOffers {
            request,
            model,
            category,
        } = fetch;

        let task = within(limit, FetchError::Timeout, async move {
            catalog.list_vendor_offers(model, category).await
        });
        self.inflight.spawn(async move {
            let result = tokio::spawn(task)
                .await
                .unwrap_or_else(|e| Err(FetchError::Interrupted(e.to_string())));
            Completion::Offers(request, result)
        });
    }

    fn spawn_order(&mut self, submit: SubmitOrder) {
        let sink = Arc::clone(&self.sink);
        let limit = self.config.submit_timeout;
        let SubmitOrder { request, draft } = submit;

        let task = within(limit, SubmitError::Timeout, async move {
            sink.submit_order(&draft).await
        });
        self.inflight.spawn(async move {
            let result = tokio::spawn(task)
                .await
                .unwrap_or_else(|e| Err(SubmitError::Interrupted(e.to_string())));
            Completion::Order(request, result)
        });
    }

    /// Collaborator panics are already folded into the completion by the
    /// inner task; an error here means the wrapper itself was cancelled.
    fn apply_joined(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Ok(completion) => self.apply(completion),
            Err(e) => error!(reason = %e, "request task cancelled"),
        }
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Models(request, result) => {
                self.workflow.models_loaded(request, result);
            }
            Completion::Offers(request, result) => {
                self.workflow.offers_loaded(request, result);
            }
            Completion::Order(request, result) => {
                self.workflow.submission_finished(request, result);
            }
        }
    }
}

/// Await `fut`, giving up after `limit` if one is set.
async fn within<T, E>(
    limit: Option<Duration>,
    on_timeout: impl FnOnce(Duration) -> E,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(on_timeout(limit))),
        None => fut.await,
    }
}
