pub mod api_connection;
pub mod cli;
pub mod commands;
pub mod grocery_list;
pub mod kroger;
pub mod lenient;
pub mod matching;
pub mod meal_config;
pub mod meal_planner;
pub mod recipe_vault;
pub mod settings;
