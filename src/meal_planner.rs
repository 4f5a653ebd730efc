use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::api_connection::connection::{strip_code_fences, ApiConnectionError};
use crate::api_connection::endpoints::{ChatMessage, MessagesRequest, Provider, ANTHROPIC_MODELS};
use crate::grocery_list::GroceryItem;
use crate::lenient;
use crate::meal_config::MealConfig;
use crate::recipe_vault::{ExportedRecipe, RecipeVault};

pub const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

const SYSTEM_PROMPT: &str = r#"You are a meal planning assistant. You create practical, budget-conscious weekly meal plans.

Key rules:
- Follow the dietary preferences and meal rules provided by the user
- Prefer whole foods, lean proteins, healthy fats, vegetables
- Maximize ingredient overlap across meals to minimize waste and cost
- Stay within the weekly budget

Output ONLY valid JSON matching this schema:
{
  "meal_plan": [
    {
      "day": "Monday",
      "dinner": {
        "name": "Recipe Name",
        "servings": 4,
        "prep_time_min": 30,
        "tags": ["high-protein", "skillet", "mexican", "sheet-pan"],
        "ingredients": [
          {"item": "chicken breast", "quantity": 1.5, "unit": "lb"},
          {"item": "broccoli", "quantity": 2, "unit": "cups"}
        ],
        "instructions_summary": "Brief 2-3 sentence cooking summary"
      },
      "leftover_lunch": true
    }
  ],
  "grocery_list": [
    {"item": "chicken breast", "quantity": 3, "unit": "lb", "category": "meat", "estimated_price": 8.99}
  ],
  "estimated_total": 95.50,
  "budget_notes": "Under budget by $24.50. Could upgrade to organic chicken."
}

Categories for grocery items: meat, produce, dairy, pantry, frozen, bakery, other

Aggregate ingredients across all meals into a single grocery_list (combine duplicates).
Estimate prices based on typical US grocery prices."#;

type Extra = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlannedIngredient {
    pub item: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Dinner {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub servings: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub prep_time_min: Option<u32>,
    #[serde(default, deserialize_with = "lenient::skip_invalid")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::skip_invalid")]
    pub ingredients: Vec<PlannedIngredient>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub instructions_summary: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DayPlan {
    pub day: String,
    pub dinner: Dinner,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub leftover_lunch: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The model's plan. Loose values are read leniently and keys this type
/// doesn't model are kept in `extra`, so the saved plan loses nothing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MealPlan {
    pub meal_plan: Vec<DayPlan>,
    #[serde(default, deserialize_with = "lenient::skip_invalid")]
    pub grocery_list: Vec<GroceryItem>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub estimated_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub budget_notes: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Command-line values that take precedence over `config.json`.
#[derive(Debug, Clone, Default)]
pub struct PlanOverrides {
    pub budget: Option<f64>,
    pub meals: Option<u32>,
    pub household: Option<String>,
    pub zip: Option<String>,
    pub preferences: Option<String>,
}

/// Everything that goes into the planning prompt.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub config: MealConfig,
    pub overrides: PlanOverrides,
    pub dietary_reference: Option<String>,
    pub saved_recipes: Vec<ExportedRecipe>,
}

impl PlanRequest {
    pub fn user_message(&self) -> Result<String> {
        let config = &self.config;
        let overrides = &self.overrides;
        let meals = overrides.meals.unwrap_or(config.meals);
        let budget = overrides.budget.unwrap_or(config.budget);
        let household = overrides.household.as_deref().unwrap_or(&config.household);
        let zip = overrides.zip.as_deref().unwrap_or(&config.zip);

        let mut msg = format!(
            "Create a {}-meal weekly dinner plan.\n\nHousehold: {}\nBudget: ${:.2}/week\nLocation ZIP: {}",
            meals, household, budget, zip
        );
        if !config.diet.is_empty() {
            msg.push_str(&format!("\nDiet: {}", config.diet));
        }
        if !config.friday_rule.is_empty() {
            msg.push_str(&format!("\nFriday rule: {}", config.friday_rule));
        }
        if !config.leftovers.is_empty() {
            msg.push_str(&format!("\nLeftovers: {}", config.leftovers));
        }
        if let Some(preferences) = overrides.preferences.as_deref().filter(|p| !p.is_empty()) {
            msg.push_str(&format!("\nAdditional preferences: {}", preferences));
        }
        if let Some(reference) = &self.dietary_reference {
            msg.push_str(&format!("\n\nPCOS Dietary Reference:\n{}", reference));
        }
        if !self.saved_recipes.is_empty() {
            let recipes = serde_json::to_string_pretty(&self.saved_recipes)?;
            msg.push_str(&format!(
                "\n\nIncorporate these saved recipes if appropriate:\n{}",
                recipes
            ));
        }
        Ok(msg)
    }
}

/// Parses the model's reply, tolerating a surrounding code fence.
pub fn parse_meal_plan(reply: &str) -> Result<MealPlan> {
    let cleaned = strip_code_fences(reply);
    if cleaned.is_empty() {
        return Err(ApiConnectionError::EmptyResponse.into());
    }
    serde_json::from_str(&cleaned).with_context(|| {
        format!(
            "Meal plan reply was not valid JSON for the expected schema. Reply was:\n{}",
            cleaned
        )
    })
}

pub async fn generate_meal_plan(provider: &Provider, request: &PlanRequest) -> Result<MealPlan> {
    let model = provider
        .get_available_models()
        .first()
        .cloned()
        .or_else(|| ANTHROPIC_MODELS.first().cloned())
        .ok_or_else(|| anyhow!("No model configured for meal planning"))?;

    let messages_request = MessagesRequest {
        model: model.model_name.to_string(),
        max_tokens: model.max_output_tokens,
        system: Some(SYSTEM_PROMPT.to_string()),
        messages: vec![ChatMessage::user(request.user_message()?)],
        temperature: None,
    };

    info!("Generating meal plan with {}...", model.model_name);
    let response = provider
        .call_messages(messages_request)
        .await
        .context("Meal plan request failed")?;
    if let Some(usage) = &response.usage {
        debug!(input = usage.input_tokens, output = usage.output_tokens, "token usage");
    }
    parse_meal_plan(&response.text())
}

/// Saved recipes for the prompt, from a JSON export file or a vault directory.
pub fn load_saved_recipes(
    recipes_file: Option<&Path>,
    recipes_vault: Option<&Path>,
) -> Result<Vec<ExportedRecipe>> {
    if let Some(file) = recipes_file {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read recipes file '{}'", file.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse recipes file '{}'", file.display()));
    }
    if let Some(vault) = recipes_vault {
        return RecipeVault::new(vault).export(&[]);
    }
    Ok(Vec::new())
}

/// Optional dietary reference document included verbatim in the prompt.
pub fn load_dietary_reference(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
