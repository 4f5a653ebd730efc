use anyhow::{anyhow, bail, Context, Result};
use std::io;

use crate::cli::KrogerCommand;
use crate::kroger::auth::CART_SCOPE;
use crate::kroger::models::{CartItem, ProductSummary, StoreSummary};
use crate::settings::Settings;

use super::{kroger_client, print_json, prompt_line};

pub async fn run(cmd: KrogerCommand, settings: &Settings) -> Result<()> {
    let mut client = kroger_client(settings)?;

    match cmd {
        KrogerCommand::Auth => {
            let url = client.auth().authorize_url(CART_SCOPE)?;
            println!("Open this URL in your browser to authorize Kroger cart access:\n");
            println!("{}", url);
            println!(
                "\nAfter authorizing, you'll be redirected to a URL containing a 'code' parameter."
            );
            let code = prompt_line(
                io::stdin().lock(),
                io::stdout(),
                "\nPaste the authorization code here: ",
            )?;
            if code.is_empty() {
                bail!("No code provided. Aborting.");
            }
            let tokens = client.auth_mut().exchange_code(&code).await?;
            println!(
                "\nAuthorization successful! Tokens saved to {}",
                client.auth().token_file().display()
            );
            let refresh = tokens.refresh_token.unwrap_or_else(|| "N/A".to_string());
            println!("Refresh token: {}...", refresh.chars().take(20).collect::<String>());
            println!("\nYou can now use cart operations.");
        }
        KrogerCommand::Stores { zip, radius, limit } => {
            let zip = zip.unwrap_or_else(|| settings.zip_or_default());
            let stores = client.find_stores(&zip, radius, limit).await?;
            if stores.data.is_empty() {
                println!("No stores found near {}", zip);
                return Ok(());
            }
            let summaries: Vec<StoreSummary> = stores.data.iter().map(StoreSummary::from).collect();
            print_json(&summaries)?;
        }
        KrogerCommand::Search {
            query,
            location,
            limit,
        } => {
            let location = location_or_env(location, settings)?;
            let products = client.search_products(&query, &location, limit, None).await?;
            if products.data.is_empty() {
                println!("No products found for '{}'", query);
                return Ok(());
            }
            let summaries: Vec<ProductSummary> =
                products.data.iter().map(ProductSummary::from).collect();
            print_json(&summaries)?;
        }
        KrogerCommand::Product { id, location } => {
            let location = location_or_env(location, settings)?;
            print_json(&client.get_product(&id, &location).await?)?;
        }
        KrogerCommand::CartAdd { items } => {
            let items: Vec<CartItem> =
                serde_json::from_str(&items).context("--items must be a JSON array of {upc, quantity}")?;
            print_json(&client.add_to_cart(&items).await?)?;
        }
    }
    Ok(())
}

fn location_or_env(location: Option<String>, settings: &Settings) -> Result<String> {
    location
        .or_else(|| settings.kroger_location_id.clone())
        .ok_or_else(|| anyhow!("--location or KROGER_LOCATION_ID required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_location_beats_env() {
        let settings = Settings {
            kroger_location_id: Some("01400943".to_string()),
            ..Default::default()
        };
        assert_eq!(
            location_or_env(Some("70100123".to_string()), &settings).unwrap(),
            "70100123"
        );
        assert_eq!(location_or_env(None, &settings).unwrap(), "01400943");
        assert!(location_or_env(None, &Settings::default()).is_err());
    }
}
