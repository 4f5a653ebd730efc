use anyhow::{bail, Context, Result};
use std::io::Read;
use tracing::info;

use crate::cli::RecipeCommand;
use crate::recipe_vault::{split_list, NewRecipe, Recipe, RecipeVault};
use crate::settings::Settings;

use super::print_json;

pub fn run(cmd: RecipeCommand, settings: &Settings) -> Result<()> {
    let vault = RecipeVault::new(&settings.recipe_vault);

    match cmd {
        RecipeCommand::List { tags, sort } => {
            let tags = tags.as_deref().map(split_list).unwrap_or_default();
            let listings: Vec<_> = vault.list(&tags, sort)?.iter().map(Recipe::listing).collect();
            print_json(&listings)?;
        }
        RecipeCommand::Show { name } => {
            let Some(recipe) = vault.find(&name)? else {
                bail!("Recipe not found: {}", name);
            };
            let content = std::fs::read_to_string(&recipe.file_path)
                .with_context(|| format!("Failed to read '{}'", recipe.file_path.display()))?;
            print!("{}", content);
        }
        RecipeCommand::Save {
            name,
            tags,
            servings,
            source,
            prep_time,
        } => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read recipe body from stdin")?;
            let file_path = vault.save(NewRecipe {
                name: name.clone(),
                tags: tags.as_deref().map(split_list).unwrap_or_default(),
                servings,
                prep_time_min: prep_time,
                source,
                body,
            })?;
            info!("Saved: {}", file_path.display());
            print_json(&serde_json::json!({
                "file_path": file_path.display().to_string(),
                "name": name,
            }))?;
        }
        RecipeCommand::Export { names } => {
            let names = names.as_deref().map(split_list).unwrap_or_default();
            print_json(&vault.export(&names)?)?;
        }
        RecipeCommand::UpdateUsed { names } => {
            for name in vault.mark_used(&names)? {
                info!("Updated last_used: {}", name);
            }
        }
    }
    Ok(())
}
