//! Category → priority group lookup
//!
//! Every category maps to exactly one [`CategoryGroup`]. Categories not listed
//! as necessary or unnecessary fall into [`CategoryGroup::Other`].

use std::collections::HashMap;

use crate::models::CategoryGroup;

/// Categories treated as essential living costs
pub const DEFAULT_NECESSARY: &[&str] = &[
    "Rent/Mortgage",
    "Utilities",
    "Groceries",
    "Transportation",
    "Insurance",
    "Healthcare",
];

/// Categories treated as discretionary
pub const DEFAULT_UNNECESSARY: &[&str] = &["Entertainment", "Shopping"];

/// Injectable category lookup table (exact, case-sensitive names)
#[derive(Debug, Clone, PartialEq)]
pub struct Taxonomy {
    groups: HashMap<String, CategoryGroup>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::from_lists(DEFAULT_NECESSARY, DEFAULT_UNNECESSARY)
    }
}

impl Taxonomy {
    /// Build from explicit lists; a category in both lists is unnecessary
    pub fn from_lists<N, U>(necessary: &[N], unnecessary: &[U]) -> Self
    where
        N: AsRef<str>,
        U: AsRef<str>,
    {
        let mut groups = HashMap::new();
        for name in necessary {
            groups.insert(name.as_ref().to_string(), CategoryGroup::Necessary);
        }
        for name in unnecessary {
            groups.insert(name.as_ref().to_string(), CategoryGroup::Unnecessary);
        }
        Self { groups }
    }

    pub fn classify(&self, category: &str) -> CategoryGroup {
        self.groups
            .get(category)
            .copied()
            .unwrap_or(CategoryGroup::Other)
    }

    /// Categories explicitly assigned to `group`, sorted
    pub fn categories_in(&self, group: CategoryGroup) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .groups
            .iter()
            .filter(|(_, g)| **g == group)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
