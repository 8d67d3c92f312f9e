// 📚 Reference Catalogs - country, currency and company lookup tables
//
// A catalog is a passive key → display name table. Nothing is validated or
// deduplicated at load time: a duplicate key simply produces more than one
// match, and the reconciler multiplies the deal row accordingly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CATALOG KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
    Country,
    Currency,
    /// Keyed by an integer-like identifier instead of a code
    Company,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Country => "Country",
            CatalogKind::Currency => "Currency",
            CatalogKind::Company => "Company",
        }
    }

    /// Column holding the key in the source table
    pub fn key_column(&self) -> &'static str {
        match self {
            CatalogKind::Country | CatalogKind::Currency => "Code",
            CatalogKind::Company => "Id",
        }
    }

    /// Column holding the display name in the source table
    pub fn name_column(&self) -> &'static str {
        "Name"
    }

    /// Normalize a key for matching.
    ///
    /// Codes match exactly. Company ids match on their integer value when
    /// the text parses as one, so "05" and "5" are the same company.
    pub fn normalize_key(&self, key: &str) -> String {
        match self {
            CatalogKind::Country | CatalogKind::Currency => key.to_string(),
            CatalogKind::Company => match key.trim().parse::<i64>() {
                Ok(id) => id.to_string(),
                Err(_) => key.to_string(),
            },
        }
    }
}

// ============================================================================
// REFERENCE ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Key as it appears in the catalog (code, or company id)
    pub code: String,
    pub display_name: String,
}

impl ReferenceEntry {
    pub fn new(code: &str, display_name: &str) -> Self {
        ReferenceEntry {
            code: code.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Catalog {
    kind: CatalogKind,
    entries: Vec<ReferenceEntry>,
    /// normalized key → positions in `entries`, in load order
    index: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(kind: CatalogKind) -> Self {
        Catalog {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a catalog from entries, keeping their order
    pub fn from_entries(kind: CatalogKind, entries: Vec<ReferenceEntry>) -> Self {
        let mut catalog = Catalog::new(kind);
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Add an entry. Duplicate keys are kept.
    pub fn insert(&mut self, entry: ReferenceEntry) {
        let key = self.kind.normalize_key(&entry.code);
        self.index.entry(key).or_default().push(self.entries.len());
        self.entries.push(entry);
    }

    /// All entries matching `code`, in catalog order. Empty when none match.
    pub fn lookup(&self, code: &str) -> Vec<&ReferenceEntry> {
        let key = self.kind.normalize_key(code);
        match self.index.get(&key) {
            Some(positions) => positions.iter().map(|&i| &self.entries[i]).collect(),
            None => Vec::new(),
        }
    }

    /// First matching entry, if any
    pub fn find(&self, code: &str) -> Option<&ReferenceEntry> {
        self.lookup(code).into_iter().next()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&self.kind.normalize_key(code))
    }

    /// Keys that appear more than once, in order of first appearance
    pub fn duplicate_codes(&self) -> Vec<String> {
        let mut duplicates: Vec<String> = Vec::new();
        for entry in &self.entries {
            let key = self.kind.normalize_key(&entry.code);
            let repeated = self.index.get(&key).map_or(false, |p| p.len() > 1);
            if repeated && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// CATALOG SET
// ============================================================================

/// The three catalogs held for one pass
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub country: Catalog,
    pub currency: Catalog,
    pub company: Catalog,
}

impl Catalogs {
    pub fn new(country: Catalog, currency: Catalog, company: Catalog) -> Self {
        Catalogs {
            country,
            currency,
            company,
        }
    }

    /// Three empty catalogs
    pub fn empty() -> Self {
        Catalogs::new(
            Catalog::new(CatalogKind::Country),
            Catalog::new(CatalogKind::Currency),
            Catalog::new(CatalogKind::Company),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Catalog> {
        [&self.country, &self.currency, &self.company].into_iter()
    }
}
