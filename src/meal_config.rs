//! Household meal preferences stored in `config.json`.
//!
//! Values resolve as: generic defaults, then non-empty saved values, then
//! `KROGER_ZIP` when no ZIP was saved.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Zip,
    Household,
    Meals,
    Budget,
    Diet,
    FridayRule,
    Leftovers,
}

pub const CONFIG_KEYS: [ConfigKey; 7] = [
    ConfigKey::Zip,
    ConfigKey::Household,
    ConfigKey::Meals,
    ConfigKey::Budget,
    ConfigKey::Diet,
    ConfigKey::FridayRule,
    ConfigKey::Leftovers,
];

impl ConfigKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Zip => "zip",
            ConfigKey::Household => "household",
            ConfigKey::Meals => "meals",
            ConfigKey::Budget => "budget",
            ConfigKey::Diet => "diet",
            ConfigKey::FridayRule => "friday_rule",
            ConfigKey::Leftovers => "leftovers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigKey::Zip => "ZIP code",
            ConfigKey::Household => "Household description",
            ConfigKey::Meals => "Number of weeknight dinners",
            ConfigKey::Budget => "Weekly grocery budget ($)",
            ConfigKey::Diet => "Dietary preferences",
            ConfigKey::FridayRule => "Friday meal rule",
            ConfigKey::Leftovers => "Leftover strategy",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ConfigKey::Zip => "e.g. 90210",
            ConfigKey::Household => "e.g. 2 adults, 1 child",
            ConfigKey::Meals => "default: 5",
            ConfigKey::Budget => "default: 100",
            ConfigKey::Diet => "e.g. PCOS-friendly, high-protein, low-carb",
            ConfigKey::FridayRule => "e.g. crock-pot / slow-cooker meal, or leave blank",
            ConfigKey::Leftovers => "e.g. plan enough for next-day lunches, or leave blank",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        CONFIG_KEYS
            .iter()
            .copied()
            .find(|key| key.as_str() == name)
            .ok_or_else(|| {
                let valid: Vec<&str> = CONFIG_KEYS.iter().map(|k| k.as_str()).collect();
                anyhow!("Unknown key: {}. Valid keys: {}", name, valid.join(", "))
            })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealConfig {
    pub zip: String,
    pub household: String,
    pub meals: u32,
    pub budget: f64,
    pub diet: String,
    pub friday_rule: String,
    pub leftovers: String,
}

impl Default for MealConfig {
    fn default() -> Self {
        Self {
            zip: String::new(),
            household: String::new(),
            meals: 5,
            budget: 100.0,
            diet: String::new(),
            friday_rule: String::new(),
            leftovers: String::new(),
        }
    }
}

impl MealConfig {
    /// Loads `path` over the defaults; `env_zip` fills an unset ZIP.
    pub fn load(path: &Path, env_zip: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            let saved: serde_json::Map<String, Value> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config '{}'", path.display()))?;
            for key in CONFIG_KEYS {
                let text = match saved.get(key.as_str()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => continue,
                };
                if !text.is_empty() {
                    config
                        .set(key, &text)
                        .with_context(|| format!("Invalid saved value for '{}'", key))?;
                }
            }
        }

        if let Some(zip) = env_zip.filter(|z| !z.is_empty()) {
            if config.zip.is_empty() {
                config.zip = zip.to_string();
            }
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write config '{}'", path.display()))
    }

    /// Deletes the config file; `false` when there was nothing to delete.
    pub fn reset(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete config '{}'", path.display()))?;
        Ok(true)
    }

    /// Sets one field from text, coercing `meals` and `budget` to numbers.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Zip => self.zip = value.to_string(),
            ConfigKey::Household => self.household = value.to_string(),
            ConfigKey::Meals => {
                self.meals = value
                    .trim()
                    .parse()
                    .with_context(|| format!("meals must be a whole number, got '{}'", value))?
            }
            ConfigKey::Budget => {
                let budget: f64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("budget must be a number, got '{}'", value))?;
                if !budget.is_finite() || budget < 0.0 {
                    bail!("budget must be a non-negative number, got '{}'", value);
                }
                self.budget = budget;
            }
            ConfigKey::Diet => self.diet = value.to_string(),
            ConfigKey::FridayRule => self.friday_rule = value.to_string(),
            ConfigKey::Leftovers => self.leftovers = value.to_string(),
        }
        Ok(())
    }

    /// Display text for a field; empty strings render as `None`.
    pub fn display_value(&self, key: ConfigKey) -> Option<String> {
        let text = match key {
            ConfigKey::Zip => self.zip.clone(),
            ConfigKey::Household => self.household.clone(),
            ConfigKey::Meals => self.meals.to_string(),
            ConfigKey::Budget => self.budget.to_string(),
            ConfigKey::Diet => self.diet.clone(),
            ConfigKey::FridayRule => self.friday_rule.clone(),
            ConfigKey::Leftovers => self.leftovers.clone(),
        };
        (!text.is_empty()).then_some(text)
    }

    /// Interactive setup: one prompt per field, Enter keeps the current value.
    pub fn prompt_all<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<Self> {
        let mut config = self.clone();
        writeln!(output, "Meal plan configuration setup")?;
        writeln!(output, "Press Enter to keep the current/default value.\n")?;

        for key in CONFIG_KEYS {
            match self.display_value(key) {
                Some(current) => write!(output, "  {} [{}] ({}): ", key.label(), current, key.hint())?,
                None => write!(output, "  {} ({}): ", key.label(), key.hint())?,
            }
            output.flush()?;

            let mut line = String::new();
            input.read_line(&mut line)?;
            let value = line.trim();
            if !value.is_empty() {
                config.set(key, value)?;
            }
        }
        Ok(config)
    }
}
