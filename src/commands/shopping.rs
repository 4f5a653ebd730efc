use anyhow::{bail, Result};
use std::io;
use tracing::{info, warn};

use crate::cli::{CartArgs, GroceriesArgs};
use crate::grocery_list::{
    build_grocery_cart, items_from_names_json, load_plan_items, stage_cart_items, GroceryCart,
    GroceryItem, SEARCH_DELAY,
};
use crate::kroger::models::CartItem;
use crate::meal_config::MealConfig;
use crate::recipe_vault::split_list;
use crate::settings::{Settings, DEFAULT_ZIP};

use super::{kroger_client, print_json, prompt_line, write_json};

pub async fn groceries(args: GroceriesArgs, settings: &Settings) -> Result<()> {
    let items: Vec<GroceryItem> = match (&args.items, &args.plan) {
        (Some(raw), _) => items_from_names_json(raw)?,
        (None, Some(plan)) => load_plan_items(plan).await?,
        (None, None) => load_plan_items(&settings.meal_plan_path()).await?,
    };
    if items.is_empty() {
        bail!("No grocery items to search");
    }

    let location = args.location.or_else(|| settings.kroger_location_id.clone());
    let zip = store_zip(settings)?;
    let mut client = kroger_client(settings)?;

    info!("Building grocery cart for {} items...", items.len());
    let cart = build_grocery_cart(&mut client, &items, location, &zip, SEARCH_DELAY).await?;

    let output = args.output.unwrap_or_else(|| settings.grocery_cart_path());
    write_json(&output, &cart).await?;
    info!("Grocery cart saved to {}", output.display());
    info!(
        "{} items found, {} not found, estimated total: ${:.2}",
        cart.item_count, cart.missing_count, cart.estimated_total
    );
    if !cart.not_found.is_empty() {
        warn!("Items not found (may need manual selection):");
        for item in &cart.not_found {
            warn!("  - {} ({} {})", item.item, item.quantity, item.unit);
        }
    }
    print_json(&cart)
}

/// ZIP used to pick a store: `KROGER_ZIP`, then the saved config, then the default.
fn store_zip(settings: &Settings) -> Result<String> {
    if let Some(zip) = &settings.kroger_zip {
        return Ok(zip.clone());
    }
    let config = MealConfig::load(&settings.config_path(), None)?;
    Ok(if config.zip.is_empty() {
        DEFAULT_ZIP.to_string()
    } else {
        config.zip
    })
}

pub async fn cart(args: CartArgs, settings: &Settings) -> Result<()> {
    let path = args.cart.unwrap_or_else(|| settings.grocery_cart_path());
    let cart = GroceryCart::load(&path).await?;
    let exclude = args.exclude.as_deref().map(split_list).unwrap_or_default();
    let staged = stage_cart_items(&cart, &exclude, args.modality);

    if staged.is_empty() {
        println!("Nothing to add: every item was excluded or unresolved.");
        return Ok(());
    }

    for line in review_lines(&cart, &staged) {
        println!("{}", line);
    }

    if args.dry_run {
        return print_json(&staged);
    }

    if !args.yes {
        let answer = prompt_line(
            io::stdin().lock(),
            io::stdout(),
            &format!("\nAdd {} items to your Kroger cart? [y/N] ", staged.len()),
        )?;
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut client = kroger_client(settings)?;
    let result = client.add_to_cart(&staged).await?;
    print_json(&result)
}

/// One line per staged item, matched back to its resolved product.
fn review_lines(cart: &GroceryCart, staged: &[CartItem]) -> Vec<String> {
    staged
        .iter()
        .map(|line| {
            let product = cart.resolved_items.iter().find(|p| p.upc == line.upc);
            match product {
                Some(p) => format!(
                    "  {} x {} ({}) {}",
                    line.quantity,
                    p.description,
                    p.search_query,
                    p.effective_price
                        .map(|price| format!("${:.2}", price))
                        .unwrap_or_else(|| "no price".to_string())
                ),
                None => format!("  {} x {}", line.quantity, line.upc),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_zip_falls_back_to_config_then_default() -> Result<()> {
        let dir = TempDir::new()?;
        let mut settings = Settings {
            project_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(store_zip(&settings)?, DEFAULT_ZIP);

        std::fs::write(settings.config_path(), r#"{"zip": "90210"}"#)?;
        assert_eq!(store_zip(&settings)?, "90210");

        settings.kroger_zip = Some("10001".to_string());
        assert_eq!(store_zip(&settings)?, "10001");
        Ok(())
    }
}
