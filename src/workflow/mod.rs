//! Order workflow state machine.
//!
//! Tracks the user's progressive selection (category, model, vendor offer,
//! quantity) and the lists fetched along the way. Every input is an explicit
//! transition handler that clears downstream state synchronously. Inputs that
//! need remote data return a ticket tagged with a [`RequestId`]; the caller
//! runs the request and hands the result back. Results for anything but the
//! latest request of a slot are discarded, so rapid re-selection can never
//! leave a list belonging to an older selection on screen.

use tracing::{debug, info, warn};

use crate::Amount;
use crate::catalog::{FetchError, SubmitError};
use crate::model::{
    Category, Model, ModelId, OfferId, OrderDraft, OrderId, PlacedOrder, QualityGrade,
    VendorOffer,
};

mod state;
pub use state::{Listing, RequestId, Step, Submission};

mod error;
pub use error::WorkflowError;

/// Upper bound on quantity while no vendor offer is selected.
pub const DEFAULT_QUANTITY_CAP: u32 = 10;

/// Request for the models of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchModels {
    pub request: RequestId,
    pub category: Category,
}

/// Request for the vendor offers of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOffers {
    pub request: RequestId,
    pub model: ModelId,
    pub category: Category,
}

/// Request to record the current draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOrder {
    pub request: RequestId,
    pub draft: OrderDraft,
}

/// In-memory state of one ordering session.
#[derive(Debug, Clone)]
pub struct OrderWorkflow {
    quantity_cap: u32,
    category: Option<Category>,
    models: Listing<Model>,
    model: Option<Model>,
    offers: Listing<VendorOffer>,
    offer: Option<VendorOffer>,
    quantity: u32,
    submission: Submission,
    next_request: RequestId,
}

/// Read access
impl OrderWorkflow {
    pub fn new() -> Self {
        Self::with_quantity_cap(DEFAULT_QUANTITY_CAP)
    }

    /// Workflow whose quantity bound without a selected offer is `cap` (at least 1).
    pub fn with_quantity_cap(cap: u32) -> Self {
        Self {
            quantity_cap: cap.max(1),
            category: None,
            models: Listing::default(),
            model: None,
            offers: Listing::default(),
            offer: None,
            quantity: 1,
            submission: Submission::Idle,
            next_request: RequestId::first(),
        }
    }

    pub fn step(&self) -> Step {
        if self.submission.placed().is_some() {
            Step::Submitted
        } else if self.offer.is_some() {
            Step::VendorSelected
        } else if self.model.is_some() {
            Step::ModelSelected
        } else if self.category.is_some() {
            Step::CategorySelected
        } else {
            Step::Empty
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn models(&self) -> &Listing<Model> {
        &self.models
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn offers(&self) -> &Listing<VendorOffer> {
        &self.offers
    }

    pub fn offer(&self) -> Option<&VendorOffer> {
        self.offer.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Largest quantity currently allowed: the offer's stock, or the default cap.
    pub fn max_quantity(&self) -> u32 {
        self.offer
            .as_ref()
            .map_or(self.quantity_cap, |offer| offer.stock)
    }

    /// Unit price times quantity, or zero while no offer is selected.
    pub fn total_price(&self) -> Amount {
        self.offer
            .as_ref()
            .map_or(Amount::ZERO, |offer| offer.price * self.quantity)
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    /// Whether a request the workflow still waits on is outstanding.
    pub fn is_busy(&self) -> bool {
        self.models.is_loading() || self.offers.is_loading() || self.submission.is_pending()
    }

    /// Loaded models whose name contains `query`, ignoring case.
    /// A blank query matches every model.
    pub fn search_models(&self, query: &str) -> Vec<&Model> {
        let needle = query.trim().to_lowercase();
        self.models
            .items()
            .iter()
            .filter(|m| needle.is_empty() || m.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn offers_with_grade(&self, grade: QualityGrade) -> impl Iterator<Item = &VendorOffer> {
        self.offers.items().iter().filter(move |o| o.grade == grade)
    }

    /// Lowest-priced in-stock offer of a grade.
    pub fn cheapest_offer(&self, grade: QualityGrade) -> Option<&VendorOffer> {
        self.offers_with_grade(grade)
            .filter(|o| o.in_stock())
            .min_by_key(|o| o.price)
    }

    /// The complete selection, once a vendor offer is chosen.
    pub fn draft(&self) -> Option<OrderDraft> {
        let category = self.category?;
        let model = self.model.as_ref()?;
        let offer = self.offer.as_ref()?;
        Some(OrderDraft {
            category,
            model_id: model.id,
            model_name: model.name.clone(),
            offer_id: offer.id,
            vendor_name: offer.vendor.name.clone(),
            grade: offer.grade,
            unit_price: offer.price,
            quantity: self.quantity,
            total_price: self.total_price(),
        })
    }
}

/// Transitions
impl OrderWorkflow {
    /// Select (or re-select) the category, the root of every other choice.
    ///
    /// Accepted from any step: clears model, offers and quantity, drops any
    /// pending request and starts a fresh model fetch.
    pub fn select_category(&mut self, category: Category) -> FetchModels {
        if let Submission::Pending(request) = self.submission {
            warn!(%request, "order submission superseded by a new category");
        }

        let request = self.next_request.bump();
        self.category = Some(category);
        self.model = None;
        self.offers.clear();
        self.offer = None;
        self.quantity = 1;
        self.submission = Submission::Idle;
        self.models.start(request);

        info!(%category, %request, "category selected");
        FetchModels { request, category }
    }

    /// Apply a model list fetch result.
    ///
    /// Returns `false` when the result belongs to a superseded request and was dropped.
    pub fn models_loaded(
        &mut self,
        request: RequestId,
        result: Result<Vec<Model>, FetchError>,
    ) -> bool {
        if !self.models.is_current(request) {
            debug!(%request, "discarding stale model list");
            return false;
        }

        match result {
            Ok(models) => {
                info!(%request, count = models.len(), "models loaded");
                self.models.fill(models);
            }
            Err(e) => {
                warn!(%request, reason = %e, "failed to load models");
                self.models.fail(format!("Failed to load models: {e}"));
            }
        }
        true
    }

    /// Select a model from the loaded list and start fetching its offers.
    ///
    /// Clears the vendor offer and resets quantity to 1.
    pub fn select_model(&mut self, model: &Model) -> Result<FetchOffers, WorkflowError> {
        self.ensure_editable()?;

        let category = self.category.ok_or(WorkflowError::NoCategory)?;
        if model.category != category {
            return Err(WorkflowError::CategoryMismatch {
                model: model.id,
                expected: category,
                found: model.category,
            });
        }
        let listed = self
            .models
            .items()
            .iter()
            .find(|m| m.id == model.id)
            .cloned()
            .ok_or(WorkflowError::ModelNotListed(model.id))?;

        let request = self.next_request.bump();
        info!(model = listed.id, name = %listed.name, %request, "model selected");

        self.model = Some(listed);
        self.offer = None;
        self.quantity = 1;
        self.offers.start(request);

        Ok(FetchOffers {
            request,
            model: model.id,
            category,
        })
    }

    pub fn select_model_id(&mut self, id: ModelId) -> Result<FetchOffers, WorkflowError> {
        let model = self
            .models
            .items()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(WorkflowError::ModelNotListed(id))?;
        self.select_model(&model)
    }

    /// Select the first loaded model matching a search query.
    pub fn select_model_matching(&mut self, query: &str) -> Result<FetchOffers, WorkflowError> {
        let model = self
            .search_models(query)
            .first()
            .map(|m| (*m).clone())
            .ok_or_else(|| WorkflowError::NoMatchingModel(query.to_string()))?;
        self.select_model(&model)
    }

    /// Apply a vendor offer fetch result.
    ///
    /// Returns `false` when the result belongs to a superseded request and was dropped.
    pub fn offers_loaded(
        &mut self,
        request: RequestId,
        result: Result<Vec<VendorOffer>, FetchError>,
    ) -> bool {
        if !self.offers.is_current(request) {
            debug!(%request, "discarding stale offer list");
            return false;
        }

        match result {
            Ok(offers) => {
                info!(%request, count = offers.len(), "vendor offers loaded");
                self.offers.fill(offers);
            }
            Err(e) => {
                warn!(%request, reason = %e, "failed to load vendor offers");
                self.offers.fail(format!("Failed to load vendors: {e}"));
            }
        }
        true
    }

    /// Select one of the loaded vendor offers.
    ///
    /// Quantity is kept but clamped down to the offer's stock.
    pub fn select_vendor(&mut self, offer: &VendorOffer) -> Result<(), WorkflowError> {
        self.select_offer(offer.id)
    }

    pub fn select_offer(&mut self, id: OfferId) -> Result<(), WorkflowError> {
        self.ensure_editable()?;

        if self.model.is_none() {
            return Err(WorkflowError::NoModel);
        }
        let offer = self
            .offers
            .items()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(WorkflowError::OfferNotListed(id))?;
        if !offer.in_stock() {
            return Err(WorkflowError::OutOfStock(id));
        }

        if self.quantity > offer.stock {
            debug!(
                offer = id,
                quantity = self.quantity,
                stock = offer.stock,
                "quantity clamped to stock"
            );
            self.quantity = offer.stock;
        }
        self.offer = Some(offer);

        info!(
            offer = id,
            quantity = self.quantity,
            total = %self.total_price(),
            "vendor offer selected"
        );
        Ok(())
    }

    /// Select the cheapest in-stock offer of a quality grade.
    pub fn select_grade(&mut self, grade: QualityGrade) -> Result<(), WorkflowError> {
        let id = self
            .cheapest_offer(grade)
            .map(|o| o.id)
            .ok_or(WorkflowError::NoOfferForGrade(grade))?;
        self.select_offer(id)
    }

    /// Set the quantity if it lies within `1..=max_quantity()`.
    ///
    /// Out-of-range values, and any change while the order is pending or
    /// placed, leave the quantity untouched and return `false`.
    pub fn set_quantity(&mut self, quantity: u32) -> bool {
        if let Err(e) = self.ensure_editable() {
            debug!(quantity, reason = %e, "quantity change ignored");
            return false;
        }

        let max = self.max_quantity();
        if !(1..=max).contains(&quantity) {
            debug!(quantity, max, "quantity out of range, ignored");
            return false;
        }

        self.quantity = quantity;
        debug!(quantity, total = %self.total_price(), "quantity set");
        true
    }

    pub fn increment_quantity(&mut self) -> bool {
        self.set_quantity(self.quantity.saturating_add(1))
    }

    pub fn decrement_quantity(&mut self) -> bool {
        self.set_quantity(self.quantity.saturating_sub(1))
    }

    /// Hand the current draft to the order sink.
    pub fn submit(&mut self) -> Result<SubmitOrder, WorkflowError> {
        self.ensure_editable()?;

        if self.category.is_none() {
            return Err(WorkflowError::NoCategory);
        }
        if self.model.is_none() {
            return Err(WorkflowError::NoModel);
        }
        let draft = self.draft().ok_or(WorkflowError::NoVendor)?;

        let request = self.next_request.bump();
        self.submission = Submission::Pending(request);

        info!(
            %request,
            model = draft.model_id,
            offer = draft.offer_id,
            quantity = draft.quantity,
            total = %draft.total_price,
            "submitting order"
        );
        Ok(SubmitOrder { request, draft })
    }

    /// Apply the order sink's answer.
    ///
    /// Returns `true` only if this result placed the order. On failure the
    /// draft stays as it was and the error message is kept for display.
    pub fn submission_finished(
        &mut self,
        request: RequestId,
        result: Result<OrderId, SubmitError>,
    ) -> bool {
        if self.submission != Submission::Pending(request) {
            match result {
                Ok(id) => warn!(%request, order = id, "order placed after it was abandoned"),
                Err(e) => debug!(%request, reason = %e, "discarding stale submission result"),
            }
            return false;
        }

        match (result, self.draft()) {
            (Ok(id), Some(draft)) => {
                info!(order = id, total = %draft.total_price, "order placed");
                self.submission = Submission::Placed(PlacedOrder { id, draft });
                true
            }
            (Ok(id), None) => {
                // pending submissions freeze the draft, so this cannot be reached
                warn!(order = id, "order placed without a draft");
                self.submission = Submission::Idle;
                false
            }
            (Err(e), _) => {
                warn!(%request, reason = %e, "failed to place order");
                self.submission = Submission::Failed(format!("Failed to place order: {e}"));
                false
            }
        }
    }

    /// Return to [`Step::Empty`], discarding every selection and pending request.
    pub fn reset(&mut self) {
        if let Submission::Pending(request) = self.submission {
            warn!(%request, "order submission abandoned by reset");
        }

        let next_request = self.next_request;
        *self = Self::with_quantity_cap(self.quantity_cap);
        self.next_request = next_request;

        info!("order reset");
    }

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        match &self.submission {
            Submission::Pending(_) => Err(WorkflowError::SubmissionPending),
            Submission::Placed(order) => Err(WorkflowError::AlreadyPlaced(order.id)),
            Submission::Idle | Submission::Failed(_) => Ok(()),
        }
    }
}

impl Default for OrderWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryDays, Vendor};

    // test utils

    fn models(category: Category, count: u32) -> Vec<Model> {
        let base = match category {
            Category::Display => 0,
            Category::Battery => 100,
        };
        (1..=count)
            .map(|i| Model::new(base + i, format!("Phone {i:02}"), category))
            .collect()
    }

    fn offer(
        id: OfferId,
        model_id: ModelId,
        grade: QualityGrade,
        price: i64,
        stock: u32,
    ) -> VendorOffer {
        VendorOffer {
            id,
            model_id,
            grade,
            price: Amount::from_units(price),
            stock,
            vendor: Vendor {
                id,
                name: format!("Vendor {id}"),
                rating: 4.5,
                delivery: DeliveryDays::new(1, 3),
            },
        }
    }

    /// Five display offers, cheapest first, like the demo inventory.
    fn offers(model_id: ModelId) -> Vec<VendorOffer> {
        vec![
            offer(5, model_id, QualityGrade::Copy, 40, 25),
            offer(4, model_id, QualityGrade::B, 60, 20),
            offer(3, model_id, QualityGrade::A, 80, 15),
            offer(2, model_id, QualityGrade::APlus, 100, 10),
            offer(1, model_id, QualityGrade::Og, 120, 5),
        ]
    }

    /// Workflow with Display models loaded.
    fn with_models() -> OrderWorkflow {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Display);
        assert!(workflow.models_loaded(fetch.request, Ok(models(Category::Display, 10))));
        workflow
    }

    /// Workflow with the first Display model selected and its offers loaded.
    fn with_offers() -> OrderWorkflow {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(1).unwrap();
        assert!(workflow.offers_loaded(fetch.request, Ok(offers(1))));
        workflow
    }

    /// Workflow with the 40-unit offer (stock 25) selected.
    fn with_vendor() -> OrderWorkflow {
        let mut workflow = with_offers();
        workflow.select_offer(5).unwrap();
        workflow
    }

    #[test]
    fn new_workflow_is_empty() {
        let workflow = OrderWorkflow::new();
        assert_eq!(workflow.step(), Step::Empty);
        assert_eq!(workflow.category(), None);
        assert!(workflow.models().items().is_empty());
        assert!(!workflow.models().is_loading());
        assert_eq!(workflow.quantity(), 1);
        assert_eq!(workflow.max_quantity(), DEFAULT_QUANTITY_CAP);
        assert_eq!(workflow.total_price(), Amount::ZERO);
        assert_eq!(workflow.submission(), &Submission::Idle);
    }

    // Category

    #[test]
    fn select_category_starts_model_fetch() {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Battery);

        assert_eq!(fetch.category, Category::Battery);
        assert_eq!(workflow.step(), Step::CategorySelected);
        assert!(workflow.models().is_loading());
        assert_eq!(workflow.models().error(), None);
    }

    #[test]
    fn models_loaded_fills_list() {
        let workflow = with_models();
        assert_eq!(workflow.models().items().len(), 10);
        assert!(!workflow.models().is_loading());
    }

    #[test]
    fn model_fetch_failure_sets_error_and_empty_list() {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Battery);
        workflow.models_loaded(
            fetch.request,
            Err(FetchError::Unavailable("connection refused".to_string())),
        );

        assert!(workflow.models().items().is_empty());
        assert!(!workflow.models().is_loading());
        let error = workflow.models().error().unwrap();
        assert!(error.contains("connection refused"));
    }

    #[test]
    fn reselecting_category_refetches_and_clears_error() {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Battery);
        workflow.models_loaded(fetch.request, Err(FetchError::Unavailable("down".to_string())));

        let fetch = workflow.select_category(Category::Battery);
        assert_eq!(workflow.models().error(), None);
        assert!(workflow.models().is_loading());

        workflow.models_loaded(fetch.request, Ok(models(Category::Battery, 3)));
        assert_eq!(workflow.models().items().len(), 3);
    }

    #[test]
    fn selecting_same_category_twice_matches_single_selection() {
        let mut once = OrderWorkflow::new();
        let fetch = once.select_category(Category::Display);
        once.models_loaded(fetch.request, Ok(models(Category::Display, 10)));

        let mut twice = OrderWorkflow::new();
        let first = twice.select_category(Category::Display);
        let second = twice.select_category(Category::Display);
        assert!(!twice.models_loaded(first.request, Ok(models(Category::Display, 10))));
        assert!(twice.models_loaded(second.request, Ok(models(Category::Display, 10))));

        assert_eq!(once.models(), twice.models());
        assert_eq!(once.offers(), twice.offers());
        assert_eq!(once.quantity(), twice.quantity());
        assert_eq!(once.total_price(), twice.total_price());
    }

    #[test]
    fn new_category_after_vendor_clears_downstream() {
        let mut workflow = with_vendor();
        workflow.set_quantity(4);

        workflow.select_category(Category::Battery);

        assert_eq!(workflow.step(), Step::CategorySelected);
        assert_eq!(workflow.model(), None);
        assert_eq!(workflow.offer(), None);
        assert!(workflow.offers().items().is_empty());
        assert_eq!(workflow.quantity(), 1);
        assert_eq!(workflow.total_price(), Amount::ZERO);
    }

    #[test]
    fn stale_model_list_is_discarded_in_either_order() {
        for battery_first in [false, true] {
            let mut workflow = OrderWorkflow::new();
            let display = workflow.select_category(Category::Display);
            let battery = workflow.select_category(Category::Battery);

            if battery_first {
                assert!(workflow.models_loaded(battery.request, Ok(models(Category::Battery, 3))));
                assert!(!workflow.models_loaded(display.request, Ok(models(Category::Display, 10))));
            } else {
                assert!(!workflow.models_loaded(display.request, Ok(models(Category::Display, 10))));
                assert!(workflow.models_loaded(battery.request, Ok(models(Category::Battery, 3))));
            }

            let listed = workflow.models().items();
            assert_eq!(listed.len(), 3);
            assert!(listed.iter().all(|m| m.category == Category::Battery));
        }
    }

    // Model

    #[test]
    fn select_model_requires_category() {
        let mut workflow = OrderWorkflow::new();
        let model = Model::new(1, "Phone 01", Category::Display);
        assert_eq!(workflow.select_model(&model), Err(WorkflowError::NoCategory));
    }

    #[test]
    fn select_model_rejects_other_category() {
        let mut workflow = with_models();
        let model = Model::new(101, "Phone 01", Category::Battery);
        assert_eq!(
            workflow.select_model(&model),
            Err(WorkflowError::CategoryMismatch {
                model: 101,
                expected: Category::Display,
                found: Category::Battery,
            })
        );
    }

    #[test]
    fn select_model_rejects_unlisted_model() {
        let mut workflow = with_models();
        assert_eq!(
            workflow.select_model_id(42),
            Err(WorkflowError::ModelNotListed(42))
        );
    }

    #[test]
    fn select_model_starts_offer_fetch() {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(3).unwrap();

        assert_eq!(fetch.model, 3);
        assert_eq!(fetch.category, Category::Display);
        assert_eq!(workflow.step(), Step::ModelSelected);
        assert!(workflow.offers().is_loading());
    }

    #[test]
    fn new_model_after_vendor_clears_vendor_and_total() {
        let mut workflow = with_vendor();
        workflow.set_quantity(3);

        let fetch = workflow.select_model_id(2).unwrap();

        assert_eq!(workflow.category(), Some(Category::Display));
        assert_eq!(workflow.models().items().len(), 10);
        assert_eq!(workflow.model().map(|m| m.id), Some(2));
        assert_eq!(workflow.offer(), None);
        assert_eq!(workflow.total_price(), Amount::ZERO);
        assert_eq!(workflow.quantity(), 1);

        // offers for the new model are on their way
        assert!(workflow.offers().is_loading());
        assert!(workflow.offers_loaded(fetch.request, Ok(offers(2))));
    }

    #[test]
    fn stale_offer_list_is_discarded() {
        let mut workflow = with_models();
        let first = workflow.select_model_id(1).unwrap();
        let second = workflow.select_model_id(2).unwrap();

        assert!(workflow.offers_loaded(second.request, Ok(offers(2))));
        assert!(!workflow.offers_loaded(first.request, Ok(offers(1))));
        assert!(workflow.offers().items().iter().all(|o| o.model_id == 2));
    }

    #[test]
    fn offer_fetch_failure_sets_error() {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(1).unwrap();
        workflow.offers_loaded(fetch.request, Err(FetchError::Timeout(std::time::Duration::from_secs(5))));

        assert!(workflow.offers().items().is_empty());
        assert!(workflow.offers().error().unwrap().contains("timed out"));
    }

    #[test]
    fn huge_line_total_saturates_instead_of_overflowing() {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(1).unwrap();
        let pricey = offer(9, 1, QualityGrade::Og, 100_000_000_000_000, 100_000);
        assert!(workflow.offers_loaded(fetch.request, Ok(vec![pricey])));

        workflow.select_offer(9).unwrap();
        assert!(workflow.set_quantity(10_000));
        assert_eq!(workflow.total_price(), Amount::from_scaled(i64::MAX));
    }

    #[test]
    fn search_models_is_case_insensitive() {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Display);
        workflow.models_loaded(
            fetch.request,
            Ok(vec![
                Model::new(1, "iPhone 12", Category::Display),
                Model::new(2, "Samsung S21", Category::Display),
                Model::new(3, "iPhone 13", Category::Display),
            ]),
        );

        let names: Vec<_> = workflow.search_models("IPHONE").iter().map(|m| m.id).collect();
        assert_eq!(names, vec![1, 3]);
        assert_eq!(workflow.search_models("  ").len(), 3);
        assert!(workflow.search_models("pixel").is_empty());

        workflow.select_model_matching("samsung").unwrap();
        assert_eq!(workflow.model().map(|m| m.id), Some(2));
        assert_eq!(
            workflow.select_model_matching("nokia"),
            Err(WorkflowError::NoMatchingModel("nokia".to_string()))
        );
    }

    // Vendor

    #[test]
    fn select_vendor_requires_model() {
        let mut workflow = with_models();
        let listed = offer(5, 1, QualityGrade::Copy, 40, 25);
        assert_eq!(workflow.select_vendor(&listed), Err(WorkflowError::NoModel));
    }

    #[test]
    fn select_vendor_rejects_unlisted_offer() {
        let mut workflow = with_offers();
        assert_eq!(
            workflow.select_offer(99),
            Err(WorkflowError::OfferNotListed(99))
        );
    }

    #[test]
    fn select_vendor_rejects_out_of_stock() {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(1).unwrap();
        workflow.offers_loaded(fetch.request, Ok(vec![offer(7, 1, QualityGrade::A, 80, 0)]));

        assert_eq!(workflow.select_offer(7), Err(WorkflowError::OutOfStock(7)));
        assert_eq!(workflow.step(), Step::ModelSelected);
    }

    #[test]
    fn select_vendor_computes_total() {
        let workflow = with_vendor();
        assert_eq!(workflow.step(), Step::VendorSelected);
        assert_eq!(workflow.max_quantity(), 25);
        assert_eq!(workflow.total_price(), Amount::from_units(40));
    }

    #[test]
    fn select_vendor_clamps_quantity_to_stock() {
        let mut workflow = with_offers();
        assert!(workflow.set_quantity(8));

        workflow.select_offer(1).unwrap(); // stock 5
        assert_eq!(workflow.quantity(), 5);
        assert_eq!(workflow.total_price(), Amount::from_units(600));
    }

    #[test]
    fn grade_selection_picks_cheapest_in_stock() {
        let mut workflow = with_models();
        let fetch = workflow.select_model_id(1).unwrap();
        workflow.offers_loaded(
            fetch.request,
            Ok(vec![
                offer(10, 1, QualityGrade::A, 70, 0),
                offer(11, 1, QualityGrade::A, 75, 3),
                offer(12, 1, QualityGrade::A, 90, 9),
                offer(13, 1, QualityGrade::B, 50, 9),
            ]),
        );

        assert_eq!(workflow.offers_with_grade(QualityGrade::A).count(), 3);
        workflow.select_grade(QualityGrade::A).unwrap();
        assert_eq!(workflow.offer().map(|o| o.id), Some(11));
        assert_eq!(
            workflow.select_grade(QualityGrade::Og),
            Err(WorkflowError::NoOfferForGrade(QualityGrade::Og))
        );
    }

    // Quantity

    #[test]
    fn total_tracks_every_valid_quantity() {
        let mut workflow = with_vendor();
        for q in 1..=25 {
            assert!(workflow.set_quantity(q));
            assert_eq!(workflow.total_price(), Amount::from_units(40) * q);
        }
    }

    #[test]
    fn quantity_above_stock_is_ignored() {
        let mut workflow = with_vendor();
        workflow.set_quantity(7);

        assert!(!workflow.set_quantity(26));
        assert_eq!(workflow.quantity(), 7);
    }

    #[test]
    fn quantity_zero_is_ignored() {
        let mut workflow = with_vendor();
        workflow.set_quantity(7);

        assert!(!workflow.set_quantity(0));
        assert_eq!(workflow.quantity(), 7);
    }

    #[test]
    fn quantity_without_offer_uses_default_cap() {
        let mut workflow = with_models();
        assert!(workflow.set_quantity(10));
        assert!(!workflow.set_quantity(11));
        assert_eq!(workflow.total_price(), Amount::ZERO);

        let mut workflow = OrderWorkflow::with_quantity_cap(3);
        assert!(!workflow.set_quantity(4));
        assert_eq!(workflow.max_quantity(), 3);
    }

    #[test]
    fn stepper_stops_at_bounds() {
        let mut workflow = with_offers();
        workflow.select_offer(1).unwrap(); // stock 5

        assert!(!workflow.decrement_quantity());
        assert_eq!(workflow.quantity(), 1);

        for _ in 0..10 {
            workflow.increment_quantity();
        }
        assert_eq!(workflow.quantity(), 5);
        assert!(workflow.decrement_quantity());
        assert_eq!(workflow.quantity(), 4);
    }

    // Submission

    #[test]
    fn submit_requires_vendor() {
        let mut workflow = OrderWorkflow::new();
        assert_eq!(workflow.submit(), Err(WorkflowError::NoCategory));

        let mut workflow = with_models();
        assert_eq!(workflow.submit(), Err(WorkflowError::NoModel));

        let mut workflow = with_offers();
        assert_eq!(workflow.submit(), Err(WorkflowError::NoVendor));
    }

    #[test]
    fn successful_submission_places_order() {
        let mut workflow = with_vendor();
        workflow.set_quantity(3);

        let submit = workflow.submit().unwrap();
        assert_eq!(submit.draft.total_price, Amount::from_units(120));
        assert_eq!(submit.draft.offer_id, 5);
        assert!(workflow.submission().is_pending());

        assert!(workflow.submission_finished(submit.request, Ok(77)));
        assert_eq!(workflow.step(), Step::Submitted);
        let placed = workflow.submission().placed().unwrap();
        assert_eq!(placed.id, 77);
        assert_eq!(placed.draft.quantity, 3);
    }

    #[test]
    fn failed_submission_keeps_draft_and_error() {
        let mut workflow = with_vendor();
        workflow.set_quantity(2);

        let submit = workflow.submit().unwrap();
        let placed = workflow.submission_finished(
            submit.request,
            Err(SubmitError::Unavailable("503".to_string())),
        );

        assert!(!placed);
        assert_eq!(workflow.step(), Step::VendorSelected);
        assert_eq!(workflow.quantity(), 2);
        assert!(workflow.submission().error().unwrap().contains("503"));

        // retry goes through
        let retry = workflow.submit().unwrap();
        assert!(workflow.submission_finished(retry.request, Ok(1)));
    }

    #[test]
    fn edits_are_rejected_while_submission_pending() {
        let mut workflow = with_vendor();
        workflow.submit().unwrap();

        assert!(!workflow.set_quantity(2));
        assert_eq!(workflow.select_offer(4), Err(WorkflowError::SubmissionPending));
        assert_eq!(workflow.select_model_id(2), Err(WorkflowError::SubmissionPending));
        assert_eq!(workflow.submit(), Err(WorkflowError::SubmissionPending));
        assert_eq!(workflow.quantity(), 1);
    }

    #[test]
    fn placed_order_only_accepts_new_order() {
        let mut workflow = with_vendor();
        let submit = workflow.submit().unwrap();
        workflow.submission_finished(submit.request, Ok(9));

        assert_eq!(workflow.select_offer(4), Err(WorkflowError::AlreadyPlaced(9)));
        assert!(!workflow.increment_quantity());

        workflow.select_category(Category::Battery);
        assert_eq!(workflow.step(), Step::CategorySelected);
        assert_eq!(workflow.submission(), &Submission::Idle);
    }

    #[test]
    fn submission_result_after_reset_is_discarded() {
        let mut workflow = with_vendor();
        let submit = workflow.submit().unwrap();
        workflow.reset();

        assert!(!workflow.submission_finished(submit.request, Ok(3)));
        assert_eq!(workflow.step(), Step::Empty);
    }

    // Reset

    #[test]
    fn reset_returns_to_initial_state() {
        let mut workflow = with_vendor();
        workflow.set_quantity(6);
        workflow.reset();

        assert_eq!(workflow.step(), Step::Empty);
        assert_eq!(workflow.category(), None);
        assert_eq!(workflow.model(), None);
        assert_eq!(workflow.offer(), None);
        assert!(workflow.models().items().is_empty());
        assert!(workflow.offers().items().is_empty());
        assert_eq!(workflow.quantity(), 1);
        assert_eq!(workflow.total_price(), Amount::ZERO);
        assert_eq!(workflow.submission(), &Submission::Idle);
    }

    #[test]
    fn fetch_result_after_reset_is_discarded() {
        let mut workflow = OrderWorkflow::new();
        let fetch = workflow.select_category(Category::Display);
        workflow.reset();

        assert!(!workflow.models_loaded(fetch.request, Ok(models(Category::Display, 2))));
        assert!(workflow.models().items().is_empty());

        // ids keep growing across resets
        let next = workflow.select_category(Category::Display);
        assert!(next.request > fetch.request);
    }

    #[test]
    fn draft_mirrors_selection() {
        let mut workflow = with_vendor();
        assert!(OrderWorkflow::new().draft().is_none());

        workflow.set_quantity(2);
        let draft = workflow.draft().unwrap();
        assert_eq!(draft.category, Category::Display);
        assert_eq!(draft.model_id, 1);
        assert_eq!(draft.vendor_name, "Vendor 5");
        assert_eq!(draft.grade, QualityGrade::Copy);
        assert_eq!(draft.unit_price, Amount::from_units(40));
        assert_eq!(draft.total_price, Amount::from_units(80));
    }
}
