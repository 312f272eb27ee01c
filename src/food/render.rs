//! Page rendering for food and recipe records

use std::fmt::Write as _;

use super::{FoodInfo, Recipe};
use crate::discord::Embed;

/// Embed accent color
const PAGE_COLOR: u32 = 0x00ff00;

/// Emoji for a storage method; unknown methods render as nothing
pub fn storage_emoji(storage: &str) -> &'static str {
    match storage.to_ascii_lowercase().as_str() {
        "fridge" => "❄️",
        "room_temp" => "🏠",
        _ => "",
    }
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bullet_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().fold(String::new(), |mut out, item| {
        let _ = writeln!(out, " - {}", item);
        out
    })
}

fn storage_lines(info: &FoodInfo) -> String {
    let room = storage_emoji("room_temp");
    let fridge = storage_emoji("fridge");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "- {} **Room Temperature Safety Window:** {} days",
        room, info.room_temp.food_safety_window
    );
    let _ = writeln!(
        out,
        "- {} **Room Temperature Expected Expiration:** {}",
        room, info.room_temp.expiration
    );
    let _ = writeln!(
        out,
        "- {} **Fridge Safety Window:** {} days",
        fridge, info.fridge.food_safety_window
    );
    let _ = writeln!(
        out,
        "- {} **Fridge Expected Expiration:** {}",
        fridge, info.fridge.expiration
    );
    out
}

/// Render one food record as a page
pub fn food_page(info: &FoodInfo) -> Embed {
    let nutrition = info
        .nutrition_facts
        .iter()
        .fold(String::new(), |mut out, (key, value)| {
            let _ = writeln!(out, " - {}: {}", key, value);
            out
        });

    Embed::new()
        .title("Food Information")
        .description(format!("{} {} info", info.food_emoji, info.food_item).trim().to_string())
        .color(PAGE_COLOR)
        .field("Nutrition Facts", nutrition, true)
        .field(
            "Recommended Storage",
            format!("{} {}", info.storage, storage_emoji(&info.storage)),
            true,
        )
        .field("Storage Information", storage_lines(info), false)
        .thumbnail(info.image_url.as_str())
}

/// Render one recipe as a page
pub fn recipe_page(recipe: &Recipe) -> Embed {
    Embed::new()
        .title(format!("Recipe: {}", recipe.recipe_name))
        .description(recipe.description.as_str())
        .color(PAGE_COLOR)
        .field(
            format!("🍽️ Serves {} | Ingredients", recipe.number_of_servings),
            bullet_list(&recipe.ingredients),
            true,
        )
        .field(
            "Missing ingredients",
            bullet_list(&recipe.missing_ingredients),
            true,
        )
        .field(
            "Cooking Instructions",
            recipe.cooking_instructions.as_str(),
            false,
        )
        .field(
            "Additional seasoning",
            recipe.additional_seasoning.as_str(),
            false,
        )
        .field("Macronutrients", bullet_list(&recipe.macro_nutrients), false)
}

/// Markdown summary of a food record for plain-text replies
pub fn food_markdown(info: &FoodInfo) -> String {
    let mut out = String::from("### Food Information\n\n");
    let _ = writeln!(out, "- **Food Item:** {} {}", info.food_item, info.food_emoji);
    let _ = writeln!(out, "- **Barcode Number:** {}\n", info.barcode_number);

    out.push_str("#### Nutrition Facts:\n");
    for (key, value) in &info.nutrition_facts {
        let _ = writeln!(out, "- {}: {}", capitalize_first(key), value);
    }
    out.push('\n');

    out.push_str("#### Storage Information:\n");
    let _ = writeln!(
        out,
        "- **Preferred Storage:** {} {}",
        info.storage,
        storage_emoji(&info.storage)
    );
    out.push_str(&storage_lines(info));
    out
}
