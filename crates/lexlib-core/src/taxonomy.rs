//! Document category/subcategory taxonomy.
//!
//! The taxonomy is the single source of truth for every category and
//! subcategory selector in the system. It is built once from a static table
//! and never mutated at runtime. Order is significant: categories and their
//! subcategories are reported in definition order, not alphabetically.
//!
//! Category names are unique. Subcategory names are unique within their
//! owning category only, so a category whose sole subcategory carries its own
//! name (e.g. "Acts of Parliament") is a valid entry.
//!
//! ```
//! use lexlib_core::Taxonomy;
//!
//! let taxonomy = Taxonomy::standard();
//! assert_eq!(taxonomy.all_categories()[0], "Acts of Parliament");
//! assert_eq!(
//!     taxonomy.subcategories_of("Acts of Parliament"),
//!     ["Acts of Parliament"]
//! );
//! assert!(taxonomy.subcategories_of("No Such Category").is_empty());
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{Error, Result};

/// Static category table: `(category, [subcategories...])` in display order.
const STANDARD_TABLE: &[(&str, &[&str])] = &[
    ("Acts of Parliament", &["Acts of Parliament"]),
    (
        "Courts of Record",
        &[
            "Supreme Court",
            "Court of Appeal",
            "High Court",
            "Employment and Labour Relations Court",
            "Environment and Land Court",
            "Magistrates Courts",
        ],
    ),
    (
        "Hansards",
        &[
            "Hansards 2020",
            "Hansards 2021",
            "Hansards 2022",
            "Hansards 2023",
            "Hansards 2024",
        ],
    ),
    ("Bills", &["Government Bills", "Private Members Bills"]),
    ("Subsidiary Legislation", &["Legal Notices", "Gazette Notices"]),
    ("Law Reports", &["Law Reports"]),
    (
        "Legal Publications",
        &["Journals", "Commentaries", "Practice Directions"],
    ),
    ("Archival Materials", &["Archival Materials"]),
];

static STANDARD: Lazy<Taxonomy> = Lazy::new(|| {
    let entries = STANDARD_TABLE
        .iter()
        .map(|(name, subs)| (name.to_string(), subs.iter().map(|s| s.to_string()).collect()))
        .collect();
    Taxonomy::from_entries(entries).expect("Standard taxonomy table must be valid")
});

/// A category and its ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<String>,
}

/// Immutable, ordered category -> subcategories mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// The library's built-in taxonomy.
    pub fn standard() -> &'static Taxonomy {
        &STANDARD
    }

    /// Build a taxonomy from `(category, subcategories)` pairs.
    ///
    /// Rejects blank names, duplicate categories, categories without
    /// subcategories, and subcategories repeated within one category.
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Result<Self> {
        let mut seen_categories = HashSet::new();
        let mut categories = Vec::with_capacity(entries.len());

        for (name, subcategories) in entries {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "category name must not be blank".to_string(),
                ));
            }
            if !seen_categories.insert(name.clone()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate category '{}'",
                    name
                )));
            }
            if subcategories.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "category '{}' has no subcategories",
                    name
                )));
            }

            let mut seen_subs = HashSet::new();
            for sub in &subcategories {
                if sub.trim().is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "category '{}' has a blank subcategory",
                        name
                    )));
                }
                if !seen_subs.insert(sub.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "subcategory '{}' repeated in category '{}'",
                        sub, name
                    )));
                }
            }

            categories.push(Category {
                name,
                subcategories,
            });
        }

        Ok(Self { categories })
    }

    /// All category names in definition order.
    pub fn all_categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Ordered subcategories of `category`; empty when the category is unknown.
    ///
    /// Matching is exact and case-sensitive, the same way the backend filters.
    pub fn subcategories_of(&self, category: &str) -> &[String] {
        self.get(category)
            .map(|c| c.subcategories.as_slice())
            .unwrap_or(&[])
    }

    /// Look up a category by exact name.
    pub fn get(&self, category: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == category)
    }

    /// Whether `category` is a known category name.
    pub fn contains_category(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Whether `subcategory` belongs to `category`.
    pub fn contains_pair(&self, category: &str, subcategory: &str) -> bool {
        self.subcategories_of(category)
            .iter()
            .any(|s| s == subcategory)
    }

    /// Iterate categories with their subcategories.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Validate a `(category, subcategory)` pair destined for storage.
    ///
    /// When `subcategory` is `None` the category must have exactly one
    /// subcategory, which is returned; otherwise the pair must exist.
    pub fn validate_pair<'a>(
        &'a self,
        category: &str,
        subcategory: Option<&str>,
    ) -> Result<(&'a str, &'a str)> {
        let entry = self
            .get(category)
            .ok_or_else(|| Error::InvalidInput(format!("unknown category '{}'", category)))?;

        let sub = match subcategory {
            Some(sub) => entry
                .subcategories
                .iter()
                .find(|s| s.as_str() == sub)
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "'{}' is not a subcategory of '{}'",
                        sub, category
                    ))
                })?,
            None if entry.subcategories.len() == 1 => &entry.subcategories[0],
            None => {
                return Err(Error::InvalidInput(format!(
                    "category '{}' requires a subcategory",
                    category
                )))
            }
        };

        Ok((entry.name.as_str(), sub.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(raw: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        raw.iter()
            .map(|(n, s)| (n.to_string(), s.iter().map(|x| x.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_standard_preserves_definition_order() {
        let cats = Taxonomy::standard().all_categories();
        assert_eq!(
            cats,
            vec![
                "Acts of Parliament",
                "Courts of Record",
                "Hansards",
                "Bills",
                "Subsidiary Legislation",
                "Law Reports",
                "Legal Publications",
                "Archival Materials",
            ]
        );
    }

    #[test]
    fn test_every_category_has_subcategories() {
        let taxonomy = Taxonomy::standard();
        for cat in taxonomy.all_categories() {
            assert!(
                !taxonomy.subcategories_of(cat).is_empty(),
                "{} has no subcategories",
                cat
            );
        }
    }

    #[test]
    fn test_self_named_subcategory_is_kept() {
        let taxonomy = Taxonomy::standard();
        assert_eq!(
            taxonomy.subcategories_of("Archival Materials"),
            ["Archival Materials"]
        );
        assert!(taxonomy.contains_pair("Acts of Parliament", "Acts of Parliament"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let taxonomy = Taxonomy::standard();
        assert!(taxonomy.contains_category("Hansards"));
        assert!(!taxonomy.contains_category("hansards"));
        assert!(taxonomy.subcategories_of("HANSARDS").is_empty());
    }

    #[test]
    fn test_unknown_category_yields_empty_list() {
        assert!(Taxonomy::standard()
            .subcategories_of("Not A Real Category")
            .is_empty());
    }

    #[test]
    fn test_subcategory_may_repeat_across_categories() {
        let t = Taxonomy::from_entries(entries(&[
            ("A", &["Shared", "Only A"]),
            ("B", &["Shared"]),
        ]))
        .unwrap();
        assert!(t.contains_pair("A", "Shared"));
        assert!(t.contains_pair("B", "Shared"));
        assert!(!t.contains_pair("B", "Only A"));
    }

    #[test]
    fn test_rejects_duplicate_category() {
        let err = Taxonomy::from_entries(entries(&[("A", &["x"]), ("A", &["y"])])).unwrap_err();
        assert!(err.to_string().contains("duplicate category"));
    }

    #[test]
    fn test_rejects_repeated_subcategory_within_category() {
        let err = Taxonomy::from_entries(entries(&[("A", &["x", "x"])])).unwrap_err();
        assert!(err.to_string().contains("repeated"));
    }

    #[test]
    fn test_rejects_empty_category() {
        let err = Taxonomy::from_entries(entries(&[("A", &[])])).unwrap_err();
        assert!(err.to_string().contains("no subcategories"));
    }

    #[test]
    fn test_validate_pair_infers_sole_subcategory() {
        let taxonomy = Taxonomy::standard();
        let (cat, sub) = taxonomy.validate_pair("Law Reports", None).unwrap();
        assert_eq!((cat, sub), ("Law Reports", "Law Reports"));
    }

    #[test]
    fn test_validate_pair_requires_subcategory_when_ambiguous() {
        let taxonomy = Taxonomy::standard();
        assert!(taxonomy.validate_pair("Hansards", None).is_err());
        assert!(taxonomy
            .validate_pair("Hansards", Some("Hansards 2023"))
            .is_ok());
        assert!(taxonomy
            .validate_pair("Hansards", Some("Supreme Court"))
            .is_err());
        assert!(taxonomy.validate_pair("Nope", Some("Nope")).is_err());
    }
}
