//! Markdown recipe vault (one `.md` per recipe, YAML frontmatter on top).

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const DEFAULT_SERVINGS: u32 = 4;

static FRONTMATTER_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_STRIP_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_SPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Frontmatter fields. Built by [`parse_frontmatter`], which moves any value
/// that does not fit a typed field into `extra` unchanged.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct RecipeMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Unknown keys, and known keys whose value has an unexpected shape.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub file_path: PathBuf,
    pub filename: String,
    pub metadata: RecipeMetadata,
    pub body: String,
    /// Set when the frontmatter is not valid YAML; such files are never rewritten.
    pub frontmatter_error: Option<String>,
}

/// Recipe shape handed to the meal planner.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportedRecipe {
    pub name: String,
    pub servings: u32,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_min: Option<u32>,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

/// Row printed by `recipes list`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RecipeListing {
    pub name: String,
    pub tags: Vec<String>,
    pub servings: Option<u32>,
    pub last_used: String,
    pub created: String,
    pub source: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RecipeSort {
    #[default]
    Name,
    Created,
    #[value(name = "last_used")]
    LastUsed,
}

/// Splits `content` into frontmatter metadata and markdown body. Content
/// without a frontmatter block is all body. Fails only when the block is not
/// a YAML mapping.
pub fn parse_frontmatter(content: &str) -> Result<(RecipeMetadata, String)> {
    let re = FRONTMATTER_RE.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z")
            .expect("frontmatter regex is valid")
    });
    let Some(caps) = re.captures(content) else {
        return Ok((RecipeMetadata::default(), content.to_string()));
    };
    let yaml = caps.get(1).map_or("", |m| m.as_str());
    let body = caps[2].to_string();
    let metadata = match serde_yaml::from_str::<Value>(yaml).context("invalid YAML frontmatter")? {
        Value::Null => RecipeMetadata::default(),
        Value::Mapping(mapping) => metadata_from_mapping(mapping)?,
        _ => bail!("frontmatter is not a key/value mapping"),
    };
    Ok((metadata, body))
}

fn metadata_from_mapping(mapping: Mapping) -> Result<RecipeMetadata> {
    let mut meta = RecipeMetadata::default();
    for (key, value) in mapping {
        let key = scalar_text(&key).ok_or_else(|| anyhow!("unsupported frontmatter key: {:?}", key))?;
        let taken = match key.as_str() {
            "name" => scalar_text(&value).map(|v| meta.name = v).is_some(),
            "created" => scalar_text(&value).map(|v| meta.created = Some(v)).is_some(),
            "last_used" => scalar_text(&value).map(|v| meta.last_used = Some(v)).is_some(),
            "source" => scalar_text(&value).map(|v| meta.source = Some(v)).is_some(),
            "tags" => text_list(&value).map(|v| meta.tags = v).is_some(),
            "servings" => whole_number(&value).map(|v| meta.servings = Some(v)).is_some(),
            "prep_time_min" => whole_number(&value).map(|v| meta.prep_time_min = Some(v)).is_some(),
            _ => false,
        };
        if !taken {
            debug!(key = %key, "keeping frontmatter value as-is");
            meta.extra.insert(key, value);
        }
    }
    Ok(meta)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence()?.iter().map(scalar_text).collect()
}

fn whole_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn write_frontmatter(metadata: &RecipeMetadata, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(metadata).context("Failed to serialize recipe frontmatter")?;
    Ok(format!("---\n{}---\n\n{}", yaml, body.trim_start_matches(['\r', '\n'])))
}

/// Filename-safe slug: lowercase, alphanumerics and dashes only.
pub fn slugify(text: &str) -> String {
    let strip = SLUG_STRIP_RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("slug regex is valid"));
    let space = SLUG_SPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("slug regex is valid"));
    let lower = text.to_lowercase();
    let stripped = strip.replace_all(&lower, "");
    space.replace_all(&stripped, "-").trim_matches('-').to_string()
}

/// Content under a `## heading`, up to the next `##` heading.
pub fn extract_section(body: &str, heading: &str) -> String {
    let pattern = format!(r"(?is)##\s+{}\s*\n(.*?)(?:\n##|\z)", regex::escape(heading));
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures(body)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

pub fn default_vault_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("Recipes")
}

impl Recipe {
    pub fn to_export(&self) -> ExportedRecipe {
        let ingredients = extract_section(&self.body, "Ingredients")
            .lines()
            .filter(|line| line.trim().starts_with('-'))
            .map(|line| line.trim().trim_matches(|c| c == '-' || c == ' ').trim().to_string())
            .collect();
        ExportedRecipe {
            name: self.metadata.name.clone(),
            servings: self.metadata.servings.unwrap_or(DEFAULT_SERVINGS),
            tags: self.metadata.tags.clone(),
            prep_time_min: self.metadata.prep_time_min,
            ingredients,
            instructions: extract_section(&self.body, "Instructions"),
        }
    }

    pub fn listing(&self) -> RecipeListing {
        let meta = &self.metadata;
        RecipeListing {
            name: meta.name.clone(),
            tags: meta.tags.clone(),
            servings: meta.servings,
            last_used: meta.last_used.clone().unwrap_or_default(),
            created: meta.created.clone().unwrap_or_default(),
            source: meta.source.clone().unwrap_or_default(),
            file_path: self.file_path.display().to_string(),
        }
    }

    fn file_stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Input for [`RecipeVault::save`].
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub tags: Vec<String>,
    pub servings: Option<u32>,
    pub prep_time_min: Option<u32>,
    pub source: Option<String>,
    pub body: String,
}

pub struct RecipeVault {
    root: PathBuf,
}

impl RecipeVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// All `*.md` recipes sorted by filename; a missing vault is empty.
    pub fn load_all(&self) -> Result<Vec<Recipe>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read vault '{}'", self.root.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read recipe '{}'", path.display()))?;
                let (metadata, body, frontmatter_error) = match parse_frontmatter(&content) {
                    Ok((metadata, body)) => (metadata, body, None),
                    Err(e) => {
                        warn!(path = %path.display(), "unreadable recipe frontmatter: {:#}", e);
                        (RecipeMetadata::default(), content.clone(), Some(format!("{:#}", e)))
                    }
                };
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Recipe {
                    file_path: path,
                    filename,
                    metadata,
                    body,
                    frontmatter_error,
                })
            })
            .collect()
    }

    /// Finds a recipe by frontmatter name (case-insensitive) or filename slug.
    pub fn find(&self, name: &str) -> Result<Option<Recipe>> {
        let slug = slugify(name);
        let wanted = name.to_lowercase();
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.metadata.name.to_lowercase() == wanted || r.file_stem() == slug))
    }

    pub fn list(&self, tags: &[String], sort: RecipeSort) -> Result<Vec<Recipe>> {
        let mut recipes = self.load_all()?;
        if !tags.is_empty() {
            recipes.retain(|r| r.metadata.tags.iter().any(|t| tags.contains(t)));
        }
        match sort {
            RecipeSort::Name => {
                recipes.sort_by_key(|r| r.metadata.name.to_lowercase());
            }
            RecipeSort::Created => {
                recipes.sort_by(|a, b| b.metadata.created.cmp(&a.metadata.created));
            }
            RecipeSort::LastUsed => {
                recipes.sort_by(|a, b| b.metadata.last_used.cmp(&a.metadata.last_used));
            }
        }
        Ok(recipes)
    }

    /// Writes a new recipe dated today; refuses to overwrite an existing file.
    pub fn save(&self, recipe: NewRecipe) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create vault '{}'", self.root.display()))?;
        let slug = slugify(&recipe.name);
        if slug.is_empty() {
            bail!("Recipe name '{}' has no filename-safe characters", recipe.name);
        }
        let file_path = self.root.join(format!("{}.md", slug));
        if file_path.exists() {
            bail!(
                "Recipe already exists: {}. Use a different name or delete the existing file.",
                file_path.display()
            );
        }

        let today = today();
        let metadata = RecipeMetadata {
            name: recipe.name,
            created: Some(today.clone()),
            last_used: Some(today),
            tags: recipe.tags,
            servings: Some(recipe.servings.unwrap_or(DEFAULT_SERVINGS)),
            prep_time_min: recipe.prep_time_min,
            source: Some(recipe.source.unwrap_or_else(|| "manual".to_string())),
            extra: BTreeMap::new(),
        };
        std::fs::write(&file_path, write_frontmatter(&metadata, &recipe.body)?)
            .with_context(|| format!("Failed to write recipe '{}'", file_path.display()))?;
        Ok(file_path)
    }

    /// Exports the named recipes (warning on misses), or every recipe.
    pub fn export(&self, names: &[String]) -> Result<Vec<ExportedRecipe>> {
        if names.is_empty() {
            return Ok(self.load_all()?.iter().map(Recipe::to_export).collect());
        }
        let mut exported = Vec::new();
        for name in names {
            match self.find(name)? {
                Some(recipe) => exported.push(recipe.to_export()),
                None => warn!("recipe not found: {}", name),
            }
        }
        Ok(exported)
    }

    /// Stamps `last_used` with today's date; returns the names that were found.
    pub fn mark_used(&self, names: &[String]) -> Result<Vec<String>> {
        let today = today();
        let mut updated = Vec::new();
        for name in names {
            let Some(mut recipe) = self.find(name)? else {
                warn!("recipe not found: {}", name);
                continue;
            };
            if let Some(err) = &recipe.frontmatter_error {
                warn!(
                    "not updating '{}': fix its frontmatter first ({})",
                    recipe.file_path.display(),
                    err
                );
                continue;
            }
            recipe.metadata.last_used = Some(today.clone());
            std::fs::write(
                &recipe.file_path,
                write_frontmatter(&recipe.metadata, &recipe.body)?,
            )
            .with_context(|| format!("Failed to update recipe '{}'", recipe.file_path.display()))?;
            updated.push(name.clone());
        }
        Ok(updated)
    }
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Splits a comma-separated CLI list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
