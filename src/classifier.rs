//! Keyword-based classification of retraction reasons.
//!
//! Each reason category is backed by an externally curated keyword list, one
//! flat text file per category (one keyword or phrase per line). The lists are
//! loaded once at startup into an immutable classifier; a single reason string
//! may match keywords from several categories at once.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Delimiters separating reason fragments inside the raw reason field
const FRAGMENT_DELIMITERS: [char; 3] = [';', '+', '/'];

/// Retraction reason category.
///
/// Categories are not mutually exclusive: one record's reason text may match
/// keywords from multiple categories, and every match counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Alterations,
    Research,
    Integrity,
    Supplemental,
    System,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 5] = [
        Category::Alterations,
        Category::Research,
        Category::Integrity,
        Category::Supplemental,
        Category::System,
    ];

    /// Name of the curated keyword file backing this category.
    ///
    /// The alterations category is historically maintained as `Serious.txt`.
    pub fn keyword_file(&self) -> &'static str {
        match self {
            Category::Alterations => "Serious.txt",
            Category::Research => "Research.txt",
            Category::Integrity => "Integrity.txt",
            Category::Supplemental => "Supplemental.txt",
            Category::System => "System.txt",
        }
    }

    /// Lowercase label used in dashboard artifacts
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Alterations => "alterations",
            Category::Research => "research",
            Category::Integrity => "integrity",
            Category::Supplemental => "supplemental",
            Category::System => "system",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable keyword classifier for retraction reasons.
///
/// Keywords are stored lowercased; matching is case-insensitive substring
/// matching against each fragment of the reason text.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<(Category, Vec<String>)>,
}

impl KeywordClassifier {
    /// Load keyword lists from a directory containing the five category files.
    ///
    /// A missing or unreadable category file leaves that category with an
    /// empty keyword list (it will never match) rather than failing startup.
    /// The directory itself missing is a configuration error.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(DashboardError::Config(format!(
                "Classification directory not found: {}",
                dir.display()
            )));
        }

        let mut keywords = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let path = dir.join(category.keyword_file());
            let list = match std::fs::read_to_string(&path) {
                Ok(content) => content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!(category = %category, path = %path.display(), error = %e, "Keyword file unavailable");
                    Vec::new()
                }
            };
            info!(category = %category, keywords = list.len(), "Loaded keyword list");
            keywords.push((category, list));
        }

        Ok(Self { keywords })
    }

    /// Build a classifier from in-memory keyword lists.
    ///
    /// Categories absent from `pairs` get an empty keyword list.
    pub fn from_keywords(pairs: Vec<(Category, Vec<String>)>) -> Self {
        let keywords = Category::ALL
            .into_iter()
            .map(|category| {
                let list = pairs
                    .iter()
                    .filter(|(c, _)| *c == category)
                    .flat_map(|(_, kws)| kws.iter().map(|k| k.to_lowercase()))
                    .collect();
                (category, list)
            })
            .collect();
        Self { keywords }
    }

    /// Classify a raw reason string into a set of matching categories.
    ///
    /// The reason text is split into fragments on `;`, `+` and `/`, and every
    /// fragment is matched against all five keyword lists independently.
    /// Empty text yields an empty set; unmatched fragments are ignored.
    pub fn classify(&self, reason_text: &str) -> BTreeSet<Category> {
        let mut matched = BTreeSet::new();
        if reason_text.trim().is_empty() {
            return matched;
        }

        for fragment in reason_text.split(FRAGMENT_DELIMITERS) {
            let fragment = fragment.trim().to_lowercase();
            if fragment.is_empty() {
                continue;
            }
            for (category, list) in &self.keywords {
                if matched.contains(category) {
                    continue;
                }
                if list.iter().any(|keyword| fragment.contains(keyword)) {
                    debug!(category = %category, fragment = %fragment, "Fragment matched");
                    matched.insert(*category);
                }
            }
        }

        matched
    }

    /// Total number of loaded keywords across all categories
    pub fn keyword_count(&self) -> usize {
        self.keywords.iter().map(|(_, list)| list.len()).sum()
    }
}
