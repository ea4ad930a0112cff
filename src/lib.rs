pub mod amount;
pub mod catalog;
pub mod csv;
pub mod model;
pub mod session;
pub mod workflow;

pub use amount::Amount;
pub use catalog::{Catalog, FetchError, OrderSink, SubmitError};
pub use model::{Category, Model, OrderDraft, PlacedOrder, QualityGrade, VendorOffer};
pub use session::{Command, OrderSession, SessionConfig};
pub use workflow::{OrderWorkflow, Step, Submission, WorkflowError};
