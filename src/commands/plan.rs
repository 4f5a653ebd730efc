use anyhow::Result;
use tracing::info;

use crate::api_connection::Provider;
use crate::cli::PlanArgs;
use crate::meal_config::MealConfig;
use crate::meal_planner::{
    generate_meal_plan, load_dietary_reference, load_saved_recipes, PlanOverrides, PlanRequest,
    API_KEY_ENV_VAR,
};
use crate::settings::Settings;

use super::{print_json, write_json};

pub async fn run(args: PlanArgs, settings: &Settings) -> Result<()> {
    let config = MealConfig::load(&settings.config_path(), settings.kroger_zip.as_deref())?;
    let saved_recipes =
        load_saved_recipes(args.recipes_file.as_deref(), args.recipes_vault.as_deref())?;
    if !saved_recipes.is_empty() {
        info!("Including {} saved recipes", saved_recipes.len());
    }

    let request = PlanRequest {
        config,
        overrides: PlanOverrides {
            budget: args.budget,
            meals: args.meals,
            household: args.household,
            zip: args.zip,
            preferences: args.preferences,
        },
        dietary_reference: load_dietary_reference(&settings.dietary_reference_path()),
        saved_recipes,
    };

    let provider = Provider::anthropic(API_KEY_ENV_VAR);
    let plan = generate_meal_plan(&provider, &request).await?;

    let output = args.output.unwrap_or_else(|| settings.meal_plan_path());
    write_json(&output, &plan).await?;
    info!("Meal plan saved to {}", output.display());
    print_json(&plan)
}
