//! Report category taxonomy.
//!
//! An ordered, closed list of policy categories. Order matters: it is the
//! tie-break order of the classifier. Each category carries the policy
//! definitions used to explain a classification.

use std::path::Path;

use reviewsweep_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One report category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    /// Human-readable policy definitions, matched against review text.
    #[serde(default)]
    pub definitions: Vec<String>,
}

impl CategoryDef {
    fn new(name: &str, definitions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            definitions: definitions.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Ordered category list plus the bucket used for empty or near-empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<CategoryDef>,
    #[serde(rename = "insufficientContent")]
    pub insufficient_content: String,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Taxonomy {
    /// The six map-listing report categories.
    pub fn builtin() -> Self {
        Self {
            categories: vec![
                CategoryDef::new(
                    "Off topic",
                    &[
                        "The review does not describe a personal experience with this place or its services.",
                        "The review talks about unrelated events, politics, or other businesses instead of this place.",
                    ],
                ),
                CategoryDef::new(
                    "Spam",
                    &[
                        "The review contains advertising, promotional links, or repeated irrelevant content.",
                        "The review is fake, automated, or posted to manipulate the rating.",
                        "The review has no meaningful content about the place.",
                    ],
                ),
                CategoryDef::new(
                    "Conflict of interest",
                    &[
                        "The review is written by a competitor, former employee, or owner with a personal stake.",
                        "The review promotes another business or disparages this one for personal gain.",
                    ],
                ),
                CategoryDef::new(
                    "Profanity",
                    &[
                        "The review contains swear words, obscene language, or sexually explicit content.",
                        "The review uses vulgar or offensive words to insult the place or its staff.",
                    ],
                ),
                CategoryDef::new(
                    "Bullying or harassment",
                    &[
                        "The review personally attacks, threatens, or intimidates a named individual or staff member.",
                        "The review shares private information about a person to harass them.",
                    ],
                ),
                CategoryDef::new(
                    "Discrimination or hate speech",
                    &[
                        "The review attacks people based on race, ethnicity, religion, gender, disability, or sexual orientation.",
                        "The review contains slurs or promotes hatred against a protected group.",
                    ],
                ),
            ],
            insufficient_content: "Spam".to_string(),
        }
    }

    /// Load and validate a taxonomy from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let taxonomy: Taxonomy = serde_json::from_str(&data)?;
        taxonomy.validate()?;
        info!(
            "Loaded taxonomy from {} ({} categories)",
            path.display(),
            taxonomy.categories.len()
        );
        Ok(taxonomy)
    }

    /// Load from `path` when given, falling back to the built-in taxonomy.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(taxonomy)) => taxonomy,
            Some(Err(e)) => {
                warn!("Invalid taxonomy file: {}. Using built-in categories.", e);
                Self::builtin()
            }
            None => Self::builtin(),
        }
    }

    /// Non-empty, unique names, sentinel present.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("taxonomy has no categories".into()));
        }
        for (i, cat) in self.categories.iter().enumerate() {
            if cat.name.trim().is_empty() {
                return Err(Error::Config(format!("category #{} has an empty name", i)));
            }
            if self.categories[..i].iter().any(|c| c.name == cat.name) {
                return Err(Error::Config(format!("duplicate category '{}'", cat.name)));
            }
        }
        if self.index_of(&self.insufficient_content).is_none() {
            return Err(Error::Config(format!(
                "insufficient-content category '{}' is not in the taxonomy",
                self.insufficient_content
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }
}
