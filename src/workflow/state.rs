use std::fmt;

use crate::model::PlacedOrder;

/// Tag attached to every remote request issued by the workflow.
///
/// Ids grow monotonically for the lifetime of a workflow, reset included, so
/// a response can always be matched against the latest request of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn first() -> Self {
        RequestId(1)
    }

    pub(crate) fn bump(&mut self) -> RequestId {
        let current = *self;
        self.0 += 1;
        current
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A remotely fetched list with its loading and error state.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    pending: Option<RequestId>,
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop everything, including any request still in flight.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Empty the list and wait for `request`.
    pub(crate) fn start(&mut self, request: RequestId) {
        self.items.clear();
        self.loading = true;
        self.error = None;
        self.pending = Some(request);
    }

    pub(crate) fn is_current(&self, request: RequestId) -> bool {
        self.pending == Some(request)
    }

    pub(crate) fn fill(&mut self, items: Vec<T>) {
        self.items = items;
        self.loading = false;
        self.error = None;
        self.pending = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.items.clear();
        self.loading = false;
        self.error = Some(message);
        self.pending = None;
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pending: None,
        }
    }
}

/// Outcome of the latest order submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Submission {
    #[default]
    Idle,
    Pending(RequestId),
    Placed(PlacedOrder),
    /// The sink refused or failed; the draft is untouched and can be resubmitted.
    Failed(String),
}

impl Submission {
    pub fn is_pending(&self) -> bool {
        matches!(self, Submission::Pending(_))
    }

    pub fn placed(&self) -> Option<&PlacedOrder> {
        match self {
            Submission::Placed(order) => Some(order),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Submission::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Where the user is in the ordering flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Empty,
    CategorySelected,
    ModelSelected,
    VendorSelected,
    Submitted,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Empty => "empty",
            Step::CategorySelected => "category selected",
            Step::ModelSelected => "model selected",
            Step::VendorSelected => "vendor selected",
            Step::Submitted => "submitted",
        };
        f.write_str(name)
    }
}
