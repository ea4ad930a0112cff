//! In-memory catalog and order sink.
//!
//! Useful for the CLI, for tests, and anywhere a hosted backend is not
//! available. Orders are kept for the lifetime of the process only.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Catalog, FetchError, OrderSink, SubmitError};
use crate::Amount;
use crate::model::{
    Category, DeliveryDays, Model, ModelId, OrderDraft, OrderId, PlacedOrder, QualityGrade,
    Vendor, VendorOffer,
};

/// Catalog backed by plain collections.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    models: Vec<Model>,
    offers: HashMap<ModelId, Vec<VendorOffer>>,
    /// Artificial delay applied to every request.
    latency: Option<Duration>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the storefront's demo inventory.
    pub fn demo() -> Self {
        const NAMES: [&str; 10] = [
            "iPhone 12",
            "iPhone 13",
            "iPhone 14",
            "Samsung S21",
            "Samsung S22",
            "Samsung S23",
            "Google Pixel 6",
            "Google Pixel 7",
            "OnePlus 10",
            "OnePlus 11",
        ];
        const DISPLAY_GRADES: [(QualityGrade, i64, u32); 5] = [
            (QualityGrade::Og, 120, 5),
            (QualityGrade::APlus, 100, 10),
            (QualityGrade::A, 80, 15),
            (QualityGrade::B, 60, 20),
            (QualityGrade::Copy, 40, 25),
        ];
        const BATTERY_GRADES: [(QualityGrade, i64, u32); 3] = [
            (QualityGrade::Og, 50, 8),
            (QualityGrade::APlus, 40, 12),
            (QualityGrade::A, 35, 18),
        ];

        let vendors = demo_vendors();
        let mut catalog = Self::new();
        let mut id: ModelId = 1;

        for category in Category::ALL {
            let grades: &[(QualityGrade, i64, u32)] = match category {
                Category::Display => &DISPLAY_GRADES,
                Category::Battery => &BATTERY_GRADES,
            };
            for name in NAMES {
                catalog.add_model(Model::new(id, name, category));
                for (idx, (grade, price, stock)) in grades.iter().enumerate() {
                    let vendor = &vendors[(id as usize + idx) % vendors.len()];
                    catalog.add_offer(VendorOffer {
                        id: id * 10 + idx as u32,
                        model_id: id,
                        grade: *grade,
                        price: Amount::from_units(*price),
                        stock: *stock,
                        vendor: vendor.clone(),
                    });
                }
                id += 1;
            }
        }
        catalog
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn add_offer(&mut self, offer: VendorOffer) {
        self.offers.entry(offer.model_id).or_default().push(offer);
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn offer_count(&self) -> usize {
        self.offers.values().map(Vec::len).sum()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn demo_vendors() -> [Vendor; 5] {
    let vendor = |id, name: &str, rating, min, max| Vendor {
        id,
        name: name.to_string(),
        rating,
        delivery: DeliveryDays::new(min, max),
    };
    [
        vendor(1, "MobilePro Parts", 4.8, 1, 2),
        vendor(2, "PhoneFix Supply", 4.5, 2, 3),
        vendor(3, "TechParts Direct", 4.7, 1, 3),
        vendor(4, "RepairHub Store", 4.6, 2, 4),
        vendor(5, "GadgetFix Parts", 4.4, 3, 5),
    ]
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_models_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<Model>, FetchError> {
        self.simulate_latency().await;

        let mut models: Vec<Model> = self
            .models
            .iter()
            .filter(|m| m.category == category)
            .cloned()
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        debug!(%category, count = models.len(), "listed models");
        Ok(models)
    }

    async fn list_vendor_offers(
        &self,
        model: ModelId,
        category: Category,
    ) -> Result<Vec<VendorOffer>, FetchError> {
        self.simulate_latency().await;

        // Unknown models and category mismatches simply have no offers
        let matches_category = self.model(model).is_some_and(|m| m.category == category);
        let mut offers = match (matches_category, self.offers.get(&model)) {
            (true, Some(offers)) => offers.clone(),
            _ => Vec::new(),
        };
        offers.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));

        debug!(model, %category, count = offers.len(), "listed vendor offers");
        Ok(offers)
    }
}

/// Order sink that keeps every accepted order in memory.
#[derive(Debug)]
pub struct MemorySink {
    orders: RwLock<Vec<PlacedOrder>>,
    first_id: OrderId,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Sink whose first order gets `first_id`.
    pub fn starting_at(first_id: OrderId) -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
            first_id,
        }
    }

    /// Orders accepted so far, oldest first.
    pub async fn orders(&self) -> Vec<PlacedOrder> {
        self.orders.read().await.clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderSink for MemorySink {
    async fn submit_order(&self, order: &OrderDraft) -> Result<OrderId, SubmitError> {
        if order.quantity == 0 {
            return Err(SubmitError::Rejected("quantity must be at least 1".to_string()));
        }

        let mut orders = self.orders.write().await;
        let id = self.first_id + orders.len() as OrderId;
        orders.push(PlacedOrder {
            id,
            draft: order.clone(),
        });
        Ok(id)
    }
}
