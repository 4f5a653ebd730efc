use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::kroger::models::Modality;
use crate::recipe_vault::RecipeSort;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly meal plans, grocery matching and Kroger cart staging", long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage household meal preferences (config.json)
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage the markdown recipe vault
    #[command(subcommand)]
    Recipes(RecipeCommand),

    /// Generate a weekly meal plan with the language model
    Plan(PlanArgs),

    /// Raw Kroger API operations
    #[command(subcommand)]
    Kroger(KrogerCommand),

    /// Resolve a meal plan's grocery list to Kroger products
    Groceries(GroceriesArgs),

    /// Stage the approved items of a resolved grocery cart into the Kroger cart
    Cart(CartArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Interactive setup
    Setup,
    /// Show current config
    Show,
    /// Set a config value
    Set {
        /// zip, household, meals, budget, diet, friday_rule or leftovers
        key: String,
        value: String,
    },
    /// Delete config
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommand {
    /// List recipes in the vault
    List {
        /// Filter by tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_enum, default_value_t = RecipeSort::Name)]
        sort: RecipeSort,
    },
    /// Show a recipe
    Show { name: String },
    /// Save a recipe (reads the markdown body from stdin)
    Save {
        #[arg(long)]
        name: String,
        /// Tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        servings: Option<u32>,
        /// Source URL or description
        #[arg(long)]
        source: Option<String>,
        /// Prep time in minutes
        #[arg(long)]
        prep_time: Option<u32>,
    },
    /// Export recipes as JSON for the planner
    Export {
        /// Recipe names to export (comma-separated); all when omitted
        #[arg(long)]
        names: Option<String>,
    },
    /// Set last_used to today
    UpdateUsed {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    /// Weekly budget (from config if not set)
    #[arg(long)]
    pub budget: Option<f64>,
    /// Number of dinners (from config if not set)
    #[arg(long)]
    pub meals: Option<u32>,
    /// Household description (from config if not set)
    #[arg(long)]
    pub household: Option<String>,
    /// Additional dietary preferences
    #[arg(long)]
    pub preferences: Option<String>,
    /// JSON file with saved recipes to incorporate
    #[arg(long, conflicts_with = "recipes_vault")]
    pub recipes_file: Option<PathBuf>,
    /// Recipe vault directory to incorporate
    #[arg(long)]
    pub recipes_vault: Option<PathBuf>,
    /// ZIP code (from config if not set)
    #[arg(long)]
    pub zip: Option<String>,
    /// Output file (default: .tmp/meal_plan.json)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum KrogerCommand {
    /// Interactive OAuth setup for cart access
    Auth,
    /// Find stores near a ZIP code
    Stores {
        #[arg(long)]
        zip: Option<String>,
        /// Radius in miles
        #[arg(long, default_value_t = 10)]
        radius: u32,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    /// Search products at a store
    Search {
        #[arg(long)]
        query: String,
        /// Store location ID
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Get product details
    Product {
        #[arg(long)]
        id: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Add items to the cart
    CartAdd {
        /// JSON array: [{"upc":"...","quantity":N}]
        #[arg(long)]
        items: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct GroceriesArgs {
    /// Meal plan JSON (default: .tmp/meal_plan.json)
    #[arg(long, conflicts_with = "items")]
    pub plan: Option<PathBuf>,
    /// JSON array of item names to search
    #[arg(long)]
    pub items: Option<String>,
    /// Kroger store location ID
    #[arg(long)]
    pub location: Option<String>,
    /// Output file (default: .tmp/grocery_cart.json)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CartArgs {
    /// Resolved grocery cart (default: .tmp/grocery_cart.json)
    #[arg(long)]
    pub cart: Option<PathBuf>,
    /// Product IDs or UPCs to leave out (comma-separated)
    #[arg(long)]
    pub exclude: Option<String>,
    #[arg(long, value_enum, default_value_t = Modality::Pickup)]
    pub modality: Modality,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
    /// Print the staged items without touching the cart
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
