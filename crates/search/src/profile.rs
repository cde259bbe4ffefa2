use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const BUILTIN_BOARD: &str = include_str!("../../../profiles/board.json");

/// Ranking configuration for [`crate::BoardIndex`]
#[derive(Clone, Debug, PartialEq)]
pub struct SearchProfile {
    name: String,
    description: Option<String>,
    pub limit: usize,
    pub boosts: FieldBoosts,
    pub bm25: Bm25Config,
    /// Multiplier for hits on indexed prefixes rather than whole terms
    pub prefix_weight: f32,
    /// Added when the whole query equals a document's name
    pub exact_name_bonus: f32,
    pub fuzzy: FuzzyConfig,
}

/// Per-field weights, highest first in the default profile
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBoosts {
    pub name: f32,
    pub node_name: f32,
    pub matched_value: f32,
    pub pin_name: f32,
    pub search_text: f32,
    pub category: f32,
    pub data_type: f32,
    pub description: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyConfig {
    pub weight: f32,
    /// Shorter query terms never expand fuzzily
    pub min_term_len: usize,
    pub max_expansions: usize,
    /// Candidate score relative to the term's perfect self-match
    pub min_similarity: f32,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    description: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    boosts: RawBoosts,
    #[serde(default)]
    bm25: RawBm25,
    prefix_weight: Option<f32>,
    exact_name_bonus: Option<f32>,
    #[serde(default)]
    fuzzy: RawFuzzy,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBoosts {
    name: Option<f32>,
    node_name: Option<f32>,
    matched_value: Option<f32>,
    pin_name: Option<f32>,
    search_text: Option<f32>,
    category: Option<f32>,
    data_type: Option<f32>,
    description: Option<f32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBm25 {
    k1: Option<f32>,
    b: Option<f32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFuzzy {
    weight: Option<f32>,
    min_term_len: Option<usize>,
    max_expansions: Option<usize>,
    min_similarity: Option<f32>,
}

impl SearchProfile {
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "board" | "default" => Self::from_bytes("board", BUILTIN_BOARD.as_bytes(), None).ok(),
            _ => None,
        }
    }

    /// The bundled board profile
    #[must_use]
    pub fn board() -> Self {
        Self::builtin("board").unwrap_or_else(Self::fallback)
    }

    /// Load a profile file; unset keys fall back to the bundled board profile
    pub fn from_file(profile_name: &str, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read profile file {}", path.display()))?;
        Self::from_bytes(profile_name, &bytes, Some("board"))
    }

    pub fn from_bytes(profile_name: &str, bytes: &[u8], base: Option<&str>) -> Result<Self> {
        let raw: RawProfile = serde_json::from_slice(bytes)
            .with_context(|| format!("Profile '{profile_name}' is not valid JSON configuration"))?;
        let base = match base {
            Some(base_name) => Self::builtin(base_name)
                .ok_or_else(|| anyhow!("Base profile '{base_name}' not bundled"))?,
            None => Self::fallback(),
        };
        let profile = base.overlay(profile_name, raw);
        profile.validate()?;
        Ok(profile)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn overlay(self, name: &str, raw: RawProfile) -> Self {
        let b = raw.boosts;
        Self {
            name: name.to_string(),
            description: raw.description.or(self.description),
            limit: raw.limit.unwrap_or(self.limit),
            boosts: FieldBoosts {
                name: b.name.unwrap_or(self.boosts.name),
                node_name: b.node_name.unwrap_or(self.boosts.node_name),
                matched_value: b.matched_value.unwrap_or(self.boosts.matched_value),
                pin_name: b.pin_name.unwrap_or(self.boosts.pin_name),
                search_text: b.search_text.unwrap_or(self.boosts.search_text),
                category: b.category.unwrap_or(self.boosts.category),
                data_type: b.data_type.unwrap_or(self.boosts.data_type),
                description: b.description.unwrap_or(self.boosts.description),
            },
            bm25: Bm25Config {
                k1: raw.bm25.k1.unwrap_or(self.bm25.k1),
                b: raw.bm25.b.unwrap_or(self.bm25.b),
            },
            prefix_weight: raw.prefix_weight.unwrap_or(self.prefix_weight),
            exact_name_bonus: raw.exact_name_bonus.unwrap_or(self.exact_name_bonus),
            fuzzy: FuzzyConfig {
                weight: raw.fuzzy.weight.unwrap_or(self.fuzzy.weight),
                min_term_len: raw.fuzzy.min_term_len.unwrap_or(self.fuzzy.min_term_len),
                max_expansions: raw.fuzzy.max_expansions.unwrap_or(self.fuzzy.max_expansions),
                min_similarity: raw.fuzzy.min_similarity.unwrap_or(self.fuzzy.min_similarity),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(anyhow!("Profile '{}': limit must be positive", self.name));
        }
        let weights = [
            ("boosts.name", self.boosts.name),
            ("boosts.node_name", self.boosts.node_name),
            ("boosts.matched_value", self.boosts.matched_value),
            ("boosts.pin_name", self.boosts.pin_name),
            ("boosts.search_text", self.boosts.search_text),
            ("boosts.category", self.boosts.category),
            ("boosts.data_type", self.boosts.data_type),
            ("boosts.description", self.boosts.description),
            ("bm25.k1", self.bm25.k1),
            ("prefix_weight", self.prefix_weight),
            ("exact_name_bonus", self.exact_name_bonus),
            ("fuzzy.weight", self.fuzzy.weight),
        ];
        if let Some((key, value)) = weights
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(anyhow!(
                "Profile '{}': {key} must be a non-negative number, got {value}",
                self.name
            ));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(anyhow!("Profile '{}': bm25.b must be within 0..=1", self.name));
        }
        if !(0.0..=1.0).contains(&self.fuzzy.min_similarity) {
            return Err(anyhow!(
                "Profile '{}': fuzzy.min_similarity must be within 0..=1",
                self.name
            ));
        }
        Ok(())
    }

    /// Hard-coded values mirroring `profiles/board.json`
    fn fallback() -> Self {
        Self {
            name: "board".to_string(),
            description: None,
            limit: 100,
            boosts: FieldBoosts {
                name: 5.0,
                node_name: 4.0,
                matched_value: 3.0,
                pin_name: 2.5,
                search_text: 2.0,
                category: 1.5,
                data_type: 1.5,
                description: 1.0,
            },
            bm25: Bm25Config { k1: 1.2, b: 0.75 },
            prefix_weight: 0.5,
            exact_name_bonus: 10.0,
            fuzzy: FuzzyConfig {
                weight: 0.35,
                min_term_len: 4,
                max_expansions: 3,
                min_similarity: 0.5,
            },
        }
    }
}

impl Default for SearchProfile {
    fn default() -> Self {
        Self::board()
    }
}
