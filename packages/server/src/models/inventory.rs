use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::plant_inventory;

use super::plant::PlantResponse;
use super::shared::{NOT_NULL_MESSAGE, Pagination, Violations, double_option, fixed_scale, narrow};

pub const UNIQUE_TOGETHER_MESSAGE: &str = "The fields plant, nursery, size must make a unique set.";

/// Write shape: the plant is referenced by id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct InventoryRequest {
    #[schema(example = 7)]
    pub plant_id: Option<i32>,
    #[schema(example = 12)]
    pub quantity: Option<i64>,
    #[schema(value_type = Option<String>, example = "34.50")]
    pub price: Option<Decimal>,
    #[schema(example = "2 gallon")]
    pub size: String,
    pub notes: String,
    #[schema(example = "March to June")]
    pub seasonal_availability: String,
}

impl From<&plant_inventory::Model> for InventoryRequest {
    fn from(m: &plant_inventory::Model) -> Self {
        Self {
            plant_id: Some(m.plant_id),
            quantity: Some(m.quantity.into()),
            price: Some(m.price),
            size: m.size.clone(),
            notes: m.notes.clone(),
            seasonal_availability: m.seasonal_availability.clone(),
        }
    }
}

/// Partial inventory body. Present fields are applied; none of them may be `null`.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct InventoryPatchRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub plant_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub quantity: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub seasonal_availability: Option<Option<String>>,
}

/// Unwrap a patched value, recording an explicit `null`.
fn present<T>(field: &str, value: Option<Option<T>>, v: &mut Violations) -> Option<T> {
    match value? {
        Some(value) => Some(value),
        None => {
            v.add(field, NOT_NULL_MESSAGE);
            None
        }
    }
}

impl InventoryPatchRequest {
    /// Overlay the present fields onto a full body, recording explicit nulls in `v`.
    pub fn apply_to(self, target: &mut InventoryRequest, v: &mut Violations) {
        if let Some(plant_id) = present("plant_id", self.plant_id, v) {
            target.plant_id = Some(plant_id);
        }
        if let Some(quantity) = present("quantity", self.quantity, v) {
            target.quantity = Some(quantity);
        }
        if let Some(price) = present("price", self.price, v) {
            target.price = Some(price);
        }
        if let Some(size) = present("size", self.size, v) {
            target.size = size;
        }
        if let Some(notes) = present("notes", self.notes, v) {
            target.notes = notes;
        }
        if let Some(seasonal) = present("seasonal_availability", self.seasonal_availability, v) {
            target.seasonal_availability = seasonal;
        }
    }
}

/// Optional overrides for creating inventory from a catalog plant.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct TemplateRequest {
    /// Defaults to 1.
    pub quantity: Option<i64>,
    /// Defaults to 0.00.
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    /// Defaults to "Standard".
    pub size: Option<String>,
    pub notes: Option<String>,
    pub seasonal_availability: Option<String>,
}

impl TemplateRequest {
    pub fn into_request(self, plant_id: i32) -> InventoryRequest {
        InventoryRequest {
            plant_id: Some(plant_id),
            quantity: Some(self.quantity.unwrap_or(1)),
            price: Some(self.price.unwrap_or(Decimal::ZERO)),
            size: self.size.unwrap_or_else(|| "Standard".to_string()),
            notes: self.notes.unwrap_or_default(),
            seasonal_availability: self.seasonal_availability.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryDraft {
    pub plant_id: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub size: String,
    pub notes: String,
    pub seasonal_availability: String,
}

/// Validate an inventory write. The plant reference is resolved by the caller.
pub fn validate_inventory(req: &InventoryRequest, v: &mut Violations) -> InventoryDraft {
    if req.plant_id.is_none() {
        v.add("plant_id", "This field is required.");
    }
    match req.quantity {
        Some(q) => v.non_negative("quantity", q),
        None => v.add("quantity", "This field is required."),
    }
    match req.price {
        Some(p) => v.decimal("price", p, 10, 2),
        None => v.add("price", "This field is required."),
    }
    let size = v.text("size", &req.size, 50, true);
    let seasonal_availability =
        v.text("seasonal_availability", &req.seasonal_availability, 200, false);

    InventoryDraft {
        plant_id: req.plant_id.unwrap_or_default(),
        quantity: narrow(req.quantity.unwrap_or_default()),
        price: req.price.unwrap_or_default(),
        size,
        notes: req.notes.trim().to_string(),
        seasonal_availability,
    }
}

/// Read shape: the full plant is embedded.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InventoryResponse {
    pub id: i32,
    pub plant: PlantResponse,
    pub nursery_id: i32,
    pub quantity: i32,
    #[schema(value_type = String, example = "34.50")]
    pub price: Decimal,
    pub size: String,
    pub notes: String,
    pub seasonal_availability: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryResponse {
    pub fn new(m: plant_inventory::Model, plant: PlantResponse) -> Self {
        Self {
            id: m.id,
            plant,
            nursery_id: m.nursery_id,
            quantity: m.quantity,
            price: fixed_scale(m.price, 2),
            size: m.size,
            notes: m.notes,
            seasonal_availability: m.seasonal_availability,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct InventoryListResponse {
    pub data: Vec<InventoryResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryListQuery {
    /// Restrict to one nursery's stock.
    pub nursery_id: Option<i32>,
    pub plant_id: Option<i32>,
    /// Exact size match.
    pub size: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
