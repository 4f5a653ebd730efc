use std::env;
use std::path::PathBuf;

use crate::kroger::KrogerCredentials;
use crate::recipe_vault::default_vault_path;

pub const DEFAULT_ZIP: &str = "48837";

/// Environment-derived settings. Call after `dotenv()` so `.env` values apply.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub project_root: PathBuf,
    pub kroger: KrogerCredentials,
    pub kroger_zip: Option<String>,
    pub kroger_location_id: Option<String>,
    pub recipe_vault: PathBuf,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let project_root = non_empty_var("MEAL_CART_HOME")
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            project_root,
            kroger: KrogerCredentials {
                client_id: non_empty_var("KROGER_CLIENT_ID"),
                client_secret: non_empty_var("KROGER_CLIENT_SECRET"),
                redirect_uri: non_empty_var("KROGER_REDIRECT_URI"),
                refresh_token: non_empty_var("KROGER_REFRESH_TOKEN"),
            },
            kroger_zip: non_empty_var("KROGER_ZIP"),
            kroger_location_id: non_empty_var("KROGER_LOCATION_ID"),
            recipe_vault: non_empty_var("RECIPE_VAULT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_vault_path),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_root.join("config.json")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.project_root.join(".tmp")
    }

    pub fn meal_plan_path(&self) -> PathBuf {
        self.tmp_dir().join("meal_plan.json")
    }

    pub fn grocery_cart_path(&self) -> PathBuf {
        self.tmp_dir().join("grocery_cart.json")
    }

    pub fn token_file(&self) -> PathBuf {
        self.tmp_dir().join("kroger_tokens.json")
    }

    pub fn dietary_reference_path(&self) -> PathBuf {
        self.project_root.join("references").join("pcos.md")
    }

    pub fn zip_or_default(&self) -> String {
        self.kroger_zip.clone().unwrap_or_else(|| DEFAULT_ZIP.to_string())
    }
}
