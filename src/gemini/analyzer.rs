//! Food analysis on top of the Gemini client

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, error};

use super::client::{GeminiClient, Part};
use super::{GeminiError, prompts};
use crate::food::{self, FoodInfo, Recipe};

/// Image to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub url: String,
    pub mime_type: String,
}

impl ImageSource {
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Turns images and pantry lists into records
#[async_trait]
pub trait FoodAnalyzer: Send + Sync {
    /// The single most relevant food in a photo
    async fn analyze_single(&self, image: &ImageSource) -> Result<FoodInfo, GeminiError>;

    /// Every food in a photo
    async fn analyze_photo(&self, image: &ImageSource) -> Result<Vec<FoodInfo>, GeminiError>;

    /// Every food on a receipt
    async fn analyze_receipt(&self, image: &ImageSource) -> Result<Vec<FoodInfo>, GeminiError>;

    async fn suggest_recipes(
        &self,
        foods: &[FoodInfo],
        preferences: &str,
    ) -> Result<Vec<Recipe>, GeminiError>;
}

impl GeminiClient {
    async fn ask_about_image(
        &self,
        image: &ImageSource,
        prompt: String,
    ) -> Result<String, GeminiError> {
        let data = self.download_image(&image.url).await?;
        let parts = [
            Part::Image {
                mime_type: image.mime_type.clone(),
                data,
            },
            Part::Text(prompt),
        ];
        self.generate(&parts).await
    }

    fn foods_from(raw: &str, image: &ImageSource) -> Result<Vec<FoodInfo>, GeminiError> {
        let foods = food::parse_foods(raw).inspect_err(|e| {
            error!("Error decoding foods: {}", e);
            error!("Raw result: {}", raw);
        })?;
        debug!("Model found {} foods in {}", foods.len(), image.url);
        Ok(foods
            .into_iter()
            .map(|mut food| {
                food.image_url = image.url.clone();
                food
            })
            .collect())
    }
}

#[async_trait]
impl FoodAnalyzer for GeminiClient {
    async fn analyze_single(&self, image: &ImageSource) -> Result<FoodInfo, GeminiError> {
        let today = Local::now().date_naive();
        let raw = self
            .ask_about_image(image, prompts::single_food(today))
            .await?;

        let mut info = food::parse_food(&raw).inspect_err(|e| {
            error!("Error decoding food: {}", e);
            error!("Raw result: {}", raw);
        })?;
        info.image_url = image.url.clone();
        Ok(info)
    }

    async fn analyze_photo(&self, image: &ImageSource) -> Result<Vec<FoodInfo>, GeminiError> {
        let today = Local::now().date_naive();
        let raw = self
            .ask_about_image(image, prompts::foods_in_photo(today))
            .await?;
        Self::foods_from(&raw, image)
    }

    async fn analyze_receipt(&self, image: &ImageSource) -> Result<Vec<FoodInfo>, GeminiError> {
        let today = Local::now().date_naive();
        let raw = self
            .ask_about_image(image, prompts::foods_on_receipt(today))
            .await?;
        Self::foods_from(&raw, image)
    }

    async fn suggest_recipes(
        &self,
        foods: &[FoodInfo],
        preferences: &str,
    ) -> Result<Vec<Recipe>, GeminiError> {
        let raw = self
            .generate(&[Part::Text(prompts::recipes(foods, preferences))])
            .await?;
        let recipes = food::parse_recipes(&raw).inspect_err(|e| {
            error!("Error decoding recipes: {}", e);
            error!("Raw result: {}", raw);
        })?;
        Ok(recipes)
    }
}
