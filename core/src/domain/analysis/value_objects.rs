use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{common::generate_uuid_v7, health_profile::entities::ConditionKey};

/// Per-request correlation data threaded through a stage for observability.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: Option<String>) -> Self {
        let request_id = request_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_uuid_v7().to_string());

        Self {
            request_id,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// A file already received by the upload layer and written to local disk.
///
/// The analysis stage owns the file from here on and removes it when done.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub path: PathBuf,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Food fields that determine a health analysis outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodFingerprint<'a> {
    pub product_name: &'a Value,
    pub ingredients: &'a Value,
    pub nutrition: &'a Value,
    pub allergens: &'a Value,
}

impl<'a> FoodFingerprint<'a> {
    pub fn from_food_data(food_data: &'a Value) -> Self {
        Self {
            product_name: field(food_data, "productName"),
            ingredients: field(food_data, "ingredients"),
            nutrition: field(food_data, "nutrition"),
            allergens: field(food_data, "allergens"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFingerprint<'a> {
    pub food_data: FoodFingerprint<'a>,
    pub conditions: Vec<ConditionKey<'a>>,
}

static NULL: Value = Value::Null;

fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
    value.get(key).unwrap_or(&NULL)
}
