//! Remote collaborators of the order workflow.
//!
//! The workflow never talks to a backend directly: it depends on a [`Catalog`]
//! to list models and vendor offers and on an [`OrderSink`] to record placed
//! orders. Both are injected, so a network client and an in-memory double are
//! interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Category, Model, ModelId, OrderDraft, OrderId, VendorOffer};

pub mod memory;

pub use memory::{MemoryCatalog, MemorySink};

/// Failure to retrieve catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backing service reported an error.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
    /// The task running the request panicked or was aborted.
    #[error("catalog request interrupted: {0}")]
    Interrupted(String),
}

/// Failure to record an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("order service unavailable: {0}")]
    Unavailable(String),
    #[error("order submission timed out after {0:?}")]
    Timeout(Duration),
    #[error("order submission interrupted: {0}")]
    Interrupted(String),
}

/// Source of models and vendor offers.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Models of the given category, sorted by name.
    async fn list_models_by_category(&self, category: Category)
    -> Result<Vec<Model>, FetchError>;

    /// Offers for a model within a category, cheapest first.
    async fn list_vendor_offers(
        &self,
        model: ModelId,
        category: Category,
    ) -> Result<Vec<VendorOffer>, FetchError>;
}

/// Durable destination for finalized orders.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit_order(&self, order: &OrderDraft) -> Result<OrderId, SubmitError>;
}
