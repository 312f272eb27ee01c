//! Prompt templates

use chrono::NaiveDate;

use crate::food::FoodInfo;

const STORAGE_STEPS: &str = r#"3. List the likely nutrition facts (only calories and other macronutrients) with exact figures and units.
4. Specify the most common storage method, either "room_temp" or "fridge".
5. Estimate the food safety window in days and the expected expiration date for both "room_temp" and "fridge"."#;

const FOOD_SCHEMA: &str = r#"{
  "food_item": "string",
  "barcode_number": "string",  # digits formatted as a string
  "nutrition_facts": { "name": "amount with unit", ... },
  "storage": "room_temp or fridge",
  "room_temp": {
    "food_safety_window": "string",  # days, as an integer string
    "expected_expiration_date": "MM/DD/YY"  # latest safe date at room temperature, counting from tomorrow
  },
  "fridge": {
    "food_safety_window": "string",  # days, as an integer string
    "expected_expiration_date": "MM/DD/YY"  # latest safe date in the fridge, counting from tomorrow
  },
  "food_emoji": "a single emoji for the food",
  "cost": "$D.CC"  # estimated price
}"#;

const RECIPE_SCHEMA: &str = r#"[{
  "recipe_name": "string",
  "description": "string",
  "number_of_servings": "string",  # integer as a string
  "ingredients": ["string", ...],  # every ingredient with amount and an emoji, e.g. "2 tbsp olive oil 🫒"
  "missing_ingredients": ["string", ...],  # ingredients not in the pantry list
  "cooking_instructions": "string",  # markdown, numbered steps separated by newlines
  "additional_seasoning": "string",  # markdown seasoning suggestions
  "macro_nutrients": ["string", ...],  # per-serving macronutrients in grams
  "cost": "$D.CC"  # estimated price
}, ...]"#;

fn date_line(today: NaiveDate) -> String {
    format!("Today's date: {}.", today.format("%m/%d/%Y"))
}

/// Identify the single most relevant food in a photo
pub fn single_food(today: NaiveDate) -> String {
    format!(
        "{}\nFrom the provided image:\n\
         1. Identify the food item most relevant for a nutritionist.\n\
         2. Provide its barcode number.\n\
         {}\n\
         6. Return a single JSON object following this schema:\n\n{}",
        date_line(today),
        STORAGE_STEPS,
        FOOD_SCHEMA
    )
}

/// Identify every food visible in a photo
pub fn foods_in_photo(today: NaiveDate) -> String {
    format!(
        "{}\nFor every food in the image:\n\
         1. Identify the food item most relevant for a nutritionist.\n\
         2. Provide its barcode number.\n\
         {}\n\
         6. Return a JSON array whose elements follow this schema:\n\n[{}, ...]",
        date_line(today),
        STORAGE_STEPS,
        FOOD_SCHEMA
    )
}

/// Identify every food listed on a store receipt
pub fn foods_on_receipt(today: NaiveDate) -> String {
    format!(
        "{}\nThe image is a store receipt. For every food listed on it:\n\
         1. Identify the full name of the food item most relevant for a nutritionist.\n\
         2. Leave barcode_number empty unless it is printed on the receipt.\n\
         {}\n\
         6. Return a JSON array whose elements follow this schema:\n\n[{}, ...]",
        date_line(today),
        STORAGE_STEPS,
        FOOD_SCHEMA
    )
}

/// Three recipes built mostly from the pantry
pub fn recipes(foods: &[FoodInfo], preferences: &str) -> String {
    let pantry = foods
        .iter()
        .map(|food| food.food_item.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let preferences = if preferences.trim().is_empty() {
        "none"
    } else {
        preferences.trim()
    };

    format!(
        "I have the following foods in my fridge or pantry:\n[{}]\n\n\
         Recommend 3 recipes that primarily use ingredients from this list. The recipes should:\n\
         1. Strongly prioritize ingredients from the list.\n\
         2. Only add ingredients that are not on the list when they are essential and common \
         (butter, garlic, spices) or when the user's preferences require them.\n\
         3. Give the dish name, the required ingredients and a brief preparation method.\n\n\
         Mark any ingredient that is not on the list and suggest substitutions from the pantry. \
         Creative or healthier variations are welcome. When preferences are given, every recipe \
         must strongly relate to them. User preferences: {}\n\n\
         Output JSON following this schema:\n\n{}",
        pantry, preferences, RECIPE_SCHEMA
    )
}
