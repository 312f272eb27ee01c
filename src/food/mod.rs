//! Food and recipe records
//!
//! Shapes of the JSON the model returns for a food scan or a recipe request,
//! plus the local bookkeeping fields the store adds. Decoding is forgiving:
//! the model is asked for strings but regularly answers with bare numbers or
//! nulls, and sometimes wraps the payload in a Markdown code fence.

pub mod render;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub use render::{capitalize_first, food_markdown, food_page, recipe_page, storage_emoji};

/// Local identifier assigned by the store
pub type FoodId = u64;

/// Errors decoding model output
#[derive(Debug, thiserror::Error)]
pub enum FoodParseError {
    #[error("model returned an empty payload")]
    Empty,
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One scanned food item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodInfo {
    #[serde(default)]
    pub id: FoodId,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub food_item: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode_number: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub nutrition_facts: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub storage: String,
    #[serde(default)]
    pub room_temp: StorageInfo,
    #[serde(default)]
    pub fridge: StorageInfo,
    #[serde(default, deserialize_with = "lenient_string")]
    pub food_emoji: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Shelf life under one storage method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub food_safety_window: String,
    #[serde(
        default,
        rename = "expected_expiration_date",
        deserialize_with = "lenient_string"
    )]
    pub expiration: String,
}

/// Recipe suggested from the user's pantry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipe_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number_of_servings: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cooking_instructions: String,
    #[serde(default, alias = "additonal_seasoning", deserialize_with = "lenient_string")]
    pub additional_seasoning: String,
    #[serde(default)]
    pub macro_nutrients: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost: String,
}

impl FoodInfo {
    /// Attach ownership and source image before storing
    pub fn owned_by(mut self, user_id: impl Into<String>, image_url: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self.image_url = image_url.into();
        self
    }
}

/// Parse a single food object
pub fn parse_food(raw: &str) -> Result<FoodInfo, FoodParseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(FoodParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

/// Parse a list of foods; a lone object is accepted as a one-element list
pub fn parse_foods(raw: &str) -> Result<Vec<FoodInfo>, FoodParseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(FoodParseError::Empty);
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<FoodInfo>),
        One(Box<FoodInfo>),
    }

    Ok(match serde_json::from_str(body)? {
        OneOrMany::Many(foods) => foods,
        OneOrMany::One(food) => vec![*food],
    })
}

pub fn parse_recipes(raw: &str) -> Result<Vec<Recipe>, FoodParseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(FoodParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

/// Remove a surrounding ```json fence if present
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // drop the language tag on the opening line
    match rest.split_once('\n') {
        Some((tag, body)) if !tag.trim_start().starts_with(['{', '[']) => body.trim(),
        _ => rest.trim(),
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Accept strings, numbers, booleans or null where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_to_string(v)))
        .collect())
}
