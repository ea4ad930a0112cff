//! Core domain types for the parts storefront.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Amount;

/// Device model identifier.
pub type ModelId = u32;

/// Vendor offer identifier.
pub type OfferId = u32;

/// Vendor identifier.
pub type VendorId = u32;

/// Identifier handed out by the order sink once an order is recorded.
pub type OrderId = u64;

/// Error returned when parsing one of the enumerated tags from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTagError {
    #[error("unknown category '{0}'")]
    Category(String),
    #[error("unknown quality grade '{0}'")]
    QualityGrade(String),
    #[error("invalid delivery days '{0}', expected 'min-max' with min <= max")]
    DeliveryDays(String),
}

/// Top-level part classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Display,
    Battery,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Display, Category::Battery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Display => "Display",
            Category::Battery => "Battery",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "display" => Ok(Category::Display),
            "battery" => Ok(Category::Battery),
            _ => Err(ParseTagError::Category(s.to_string())),
        }
    }
}

/// Authenticity/condition tier of a part, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityGrade {
    Og,
    APlus,
    A,
    B,
    Copy,
}

impl QualityGrade {
    pub const ALL: [QualityGrade; 5] = [
        QualityGrade::Og,
        QualityGrade::APlus,
        QualityGrade::A,
        QualityGrade::B,
        QualityGrade::Copy,
    ];

    /// Short tag shown on offer badges.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::Og => "OG",
            QualityGrade::APlus => "A+",
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::Copy => "Copy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityGrade::Og => "Original",
            QualityGrade::APlus => "A+ Quality",
            QualityGrade::A => "A Quality",
            QualityGrade::B => "B Quality",
            QualityGrade::Copy => "Copy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QualityGrade::Og => "Original manufacturer quality",
            QualityGrade::APlus => "Premium aftermarket quality",
            QualityGrade::A => "High-quality aftermarket",
            QualityGrade::B => "Standard aftermarket quality",
            QualityGrade::Copy => "Budget-friendly option",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityGrade {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "og" | "original" => Ok(QualityGrade::Og),
            "a+" => Ok(QualityGrade::APlus),
            "a" => Ok(QualityGrade::A),
            "b" => Ok(QualityGrade::B),
            "copy" => Ok(QualityGrade::Copy),
            _ => Err(ParseTagError::QualityGrade(s.to_string())),
        }
    }
}

/// A specific device a part fits. Belongs to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub category: Category,
}

impl Model {
    pub fn new(id: ModelId, name: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            name: name.into(),
            category,
        }
    }
}

/// Delivery estimate in days, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryDays {
    pub min: u8,
    pub max: u8,
}

impl DeliveryDays {
    pub fn new(min: u8, max: u8) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
}

impl fmt::Display for DeliveryDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for DeliveryDays {
    type Err = ParseTagError;

    /// Accepts `"1-3"` or a single day count such as `"2"`. A reversed
    /// range is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseTagError::DeliveryDays(s.to_string());
        let (min, max) = match s.trim().split_once('-') {
            Some((min, max)) => (min.trim(), max.trim()),
            None => (s.trim(), s.trim()),
        };
        let min: u8 = min.parse().map_err(|_| invalid())?;
        let max: u8 = max.parse().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }
        Ok(DeliveryDays { min, max })
    }
}

/// The vendor behind an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    /// Average customer rating, 0 to 5.
    pub rating: f32,
    pub delivery: DeliveryDays,
}

/// A vendor's priced, stocked listing of a part for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorOffer {
    pub id: OfferId,
    pub model_id: ModelId,
    pub grade: QualityGrade,
    pub price: Amount,
    pub stock: u32,
    pub vendor: Vendor,
}

impl VendorOffer {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A complete selection: what the review step shows and what the order sink records.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub category: Category,
    pub model_id: ModelId,
    pub model_name: String,
    pub offer_id: OfferId,
    pub vendor_name: String,
    pub grade: QualityGrade,
    pub unit_price: Amount,
    pub quantity: u32,
    pub total_price: Amount,
}

/// An order the sink acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub draft: OrderDraft,
}
