//! Error types for workflow transitions.

use thiserror::Error;

use crate::model::{Category, ModelId, OfferId, OrderId, QualityGrade};

/// An input that does not fit the current step of the flow.
///
/// Remote failures never show up here: they are recorded in the workflow
/// state instead (see [`Listing::error`](super::Listing::error) and
/// [`Submission::Failed`](super::Submission::Failed)).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("no category selected")]
    NoCategory,

    #[error("no model selected")]
    NoModel,

    #[error("no vendor offer selected")]
    NoVendor,

    #[error("model {model} is a {found} part, but {expected} is selected")]
    CategoryMismatch {
        model: ModelId,
        expected: Category,
        found: Category,
    },

    #[error("model {0} is not in the loaded model list")]
    ModelNotListed(ModelId),

    #[error("no loaded model matches '{0}'")]
    NoMatchingModel(String),

    #[error("offer {0} is not in the loaded offer list")]
    OfferNotListed(OfferId),

    #[error("no loaded offer has quality grade {0}")]
    NoOfferForGrade(QualityGrade),

    #[error("offer {0} is out of stock")]
    OutOfStock(OfferId),

    #[error("an order submission is already in flight")]
    SubmissionPending,

    #[error("order {0} was already placed; start a new order")]
    AlreadyPlaced(OrderId),
}
