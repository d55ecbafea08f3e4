// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static offer tables: subject → offers, offer title → description.

use std::collections::HashMap;
use std::path::Path;

use concierge_core::ConciergeError;
use serde::Deserialize;

/// The catalog that ships with the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// A discounted add-on offered by a subject.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Offer {
    pub title: String,
    pub discount: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    subjects: Vec<SubjectEntry>,
    descriptions: Vec<DescriptionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubjectEntry {
    name: String,
    offers: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptionEntry {
    title: String,
    description: String,
}

/// A subject (named master) and the offers they run.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    key: String,
    pub offers: Vec<Offer>,
}

impl Subject {
    /// Normalized lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Both lookup tables, keyed case-insensitively on trimmed text.
#[derive(Debug, Clone)]
pub struct RecommendationCatalog {
    subjects: Vec<Subject>,
    descriptions: HashMap<String, String>,
}

impl RecommendationCatalog {
    /// Parses a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConciergeError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| ConciergeError::Config(format!("invalid recommendation catalog: {e}")))?;

        for subject in &file.subjects {
            if let Some(offer) = subject.offers.iter().find(|o| o.discount > 100) {
                return Err(ConciergeError::Config(format!(
                    "offer `{}` of `{}` has discount {}%, expected 0-100",
                    offer.title, subject.name, offer.discount
                )));
            }
        }

        Ok(Self {
            subjects: file
                .subjects
                .into_iter()
                .map(|entry| Subject {
                    key: normalize(&entry.name),
                    name: entry.name.trim().to_string(),
                    offers: entry.offers,
                })
                .collect(),
            descriptions: file
                .descriptions
                .into_iter()
                .map(|entry| (normalize(&entry.title), entry.description))
                .collect(),
        })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, ConciergeError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a catalog file.
    pub fn load(path: &Path) -> Result<Self, ConciergeError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConciergeError::Config(format!(
                "failed to read recommendation catalog {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// Subjects in file order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Offers of one subject, looked up case-insensitively.
    pub fn offers_for(&self, name: &str) -> Option<&[Offer]> {
        let key = normalize(name);
        self.subjects
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.offers.as_slice())
    }

    /// Every subject's offers, concatenated in file order.
    pub fn all_offers(&self) -> Vec<Offer> {
        self.subjects
            .iter()
            .flat_map(|s| s.offers.iter().cloned())
            .collect()
    }

    pub fn description(&self, title: &str) -> Option<&str> {
        self.descriptions.get(&normalize(title)).map(String::as_str)
    }
}

/// Trimmed, lowercased form used for every catalog and subject comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
