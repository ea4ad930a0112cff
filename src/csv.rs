use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::Amount;
use crate::catalog::MemoryCatalog;
use crate::model::{
    Category, DeliveryDays, Model, ModelId, OfferId, PlacedOrder, QualityGrade, Vendor,
    VendorId, VendorOffer,
};
use crate::session::Command;

/// File names expected inside a catalog directory.
pub const MODELS_FILE: &str = "models.csv";
pub const OFFERS_FILE: &str = "offers.csv";

/// Errors that can occur when reading catalog or script csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("{}: cannot open: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized action '{action}'")]
    UnrecognizedAction { line: usize, action: String },

    #[error("line {line}: {action} missing value")]
    MissingValue { line: usize, action: String },

    #[error("line {line}: invalid value '{value}': {reason}")]
    InvalidValue {
        line: usize,
        value: String,
        reason: String,
    },

    #[error("line {line}: offer {offer} references unknown model {model}")]
    UnknownModel {
        line: usize,
        offer: OfferId,
        model: ModelId,
    },
}

#[derive(Debug, Deserialize)]
struct ModelRow {
    id: ModelId,
    model_name: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct OfferRow {
    id: OfferId,
    model_id: ModelId,
    quality_type: String,
    price: f64,
    stock: u32,
    vendor_id: VendorId,
    vendor_name: String,
    vendor_rating: f32,
    delivery_days: String,
}

#[derive(Debug, Deserialize)]
struct CommandRow {
    action: String,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrderRow {
    order: u64,
    category: String,
    model: String,
    vendor: String,
    quality: String,
    unit_price: String,
    quantity: u32,
    total: String,
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_value<T>(line: usize, value: &str) -> Result<T, CsvError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| CsvError::InvalidValue {
        line,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Load a catalog from `models.csv` and `offers.csv` in `dir`
pub fn load_catalog(dir: impl AsRef<Path>) -> Result<MemoryCatalog, CsvError> {
    let dir = dir.as_ref();
    let mut catalog = MemoryCatalog::new();

    for (idx, result) in open(&dir.join(MODELS_FILE))?
        .into_deserialize::<ModelRow>()
        .enumerate()
    {
        let line = idx + 2; // 1-indexed, skip header
        let row = result.map_err(|source| CsvError::Parse { line, source })?;
        let category: Category = parse_value(line, &row.category)?;
        catalog.add_model(Model::new(row.id, row.model_name, category));
    }

    for (idx, result) in open(&dir.join(OFFERS_FILE))?
        .into_deserialize::<OfferRow>()
        .enumerate()
    {
        let line = idx + 2;
        let row = result.map_err(|source| CsvError::Parse { line, source })?;
        if catalog.model(row.model_id).is_none() {
            return Err(CsvError::UnknownModel {
                line,
                offer: row.id,
                model: row.model_id,
            });
        }
        let invalid = |value: String, reason: &str| CsvError::InvalidValue {
            line,
            value,
            reason: reason.to_string(),
        };
        if !row.price.is_finite() || row.price < 0.0 {
            return Err(invalid(
                row.price.to_string(),
                "price must be a non-negative number",
            ));
        }
        let Some(price) = Amount::checked_from_float(row.price) else {
            return Err(invalid(row.price.to_string(), "price is too large"));
        };
        if price.checked_mul(row.stock).is_none() {
            return Err(invalid(
                row.price.to_string(),
                "price times stock is too large",
            ));
        }
        if !(0.0..=5.0).contains(&row.vendor_rating) {
            return Err(invalid(
                row.vendor_rating.to_string(),
                "vendor rating must be between 0 and 5",
            ));
        }

        catalog.add_offer(VendorOffer {
            id: row.id,
            model_id: row.model_id,
            grade: parse_value::<QualityGrade>(line, &row.quality_type)?,
            price,
            stock: row.stock,
            vendor: Vendor {
                id: row.vendor_id,
                name: row.vendor_name,
                rating: row.vendor_rating,
                delivery: parse_value::<DeliveryDays>(line, &row.delivery_days)?,
            },
        });
    }

    Ok(catalog)
}

/// Read user actions from a script csv with `action,value` columns
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = open(path.as_ref())?;

    Ok(reader
        .into_deserialize::<CommandRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let action = row.action.to_ascii_lowercase();
            let value = row.value.filter(|v| !v.is_empty());
            let required = || {
                value.clone().ok_or_else(|| CsvError::MissingValue {
                    line,
                    action: action.clone(),
                })
            };

            match action.as_str() {
                "category" => Ok(Command::SelectCategory(parse_value(line, &required()?)?)),
                "model" => Ok(Command::SelectModel(parse_value(line, &required()?)?)),
                "search" => Ok(Command::SearchModel(required()?)),
                "offer" => Ok(Command::SelectOffer(parse_value(line, &required()?)?)),
                "grade" => Ok(Command::SelectGrade(parse_value(line, &required()?)?)),
                "quantity" => Ok(Command::SetQuantity(parse_value(line, &required()?)?)),
                "increment" => Ok(Command::IncrementQuantity),
                "decrement" => Ok(Command::DecrementQuantity),
                "submit" => Ok(Command::Submit),
                "reset" => Ok(Command::Reset),
                _ => Err(CsvError::UnrecognizedAction {
                    line,
                    action: row.action,
                }),
            }
        }))
}

/// Write placed orders in csv format
pub fn write_orders<'a, W: io::Write>(
    writer: W,
    orders: impl IntoIterator<Item = &'a PlacedOrder>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for order in orders {
        let draft = &order.draft;
        writer.serialize(OrderRow {
            order: order.id,
            category: draft.category.to_string(),
            model: draft.model_name.clone(),
            vendor: draft.vendor_name.clone(),
            quality: draft.grade.to_string(),
            unit_price: draft.unit_price.to_string(),
            quantity: draft.quantity,
            total: draft.total_price.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
