//! Static item catalog and free-text name resolution.
//!
//! The shop table is fixed at process start: every entry carries its category,
//! canonical key, unit price, and the credit target a purchase lands in. User
//! input is matched against a pre-built alias table (case-insensitive,
//! whitespace-normalized, with a fully de-spaced variant so "ray skin" and
//! "rayskin" both resolve). A miss is a normal outcome, not a fault.

use std::collections::HashMap;
use std::fmt;

/// Shop categories, in the precedence order used when the alias table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Chest,
    Material,
    Legendary,
    Other,
}

/// Chest tiers, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ChestTier {
    C,
    B,
    A,
    S,
}

impl ChestTier {
    pub const ALL: [ChestTier; 4] = [ChestTier::C, ChestTier::B, ChestTier::A, ChestTier::S];

    pub fn letter(&self) -> &'static str {
        match self {
            ChestTier::C => "c",
            ChestTier::B => "b",
            ChestTier::A => "a",
            ChestTier::S => "s",
        }
    }
}

impl fmt::Display for ChestTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter().to_ascii_uppercase())
    }
}

/// Where a purchased quantity is credited. Resolved once when the catalog is
/// built so the transaction never branches on raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditTarget {
    /// Per-tier chest counter on the inventory record.
    Chest(ChestTier),
    /// Dedicated xp-book counter on the inventory record.
    XpBooks,
    /// Dedicated xp-scroll counter on the inventory record.
    XpScrolls,
    /// Derived currency credited back onto the balance record.
    ResetTokens,
    /// Generic item map on the inventory record, keyed by canonical name.
    Item(String),
}

/// One priced catalog entry. Immutable after catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Category,
    pub key: String,
    pub unit_price: i64,
    pub target: CreditTarget,
}

/// Normalize free text for alias matching: lowercase, trim, collapse runs of
/// whitespace to single spaces.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn despace(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The alias-indexed catalog. Build once, share freely; `resolve` is pure.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    // alias (normalized or de-spaced) -> index into `entries`
    aliases: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from entries plus their alias lists. Fails if any alias
    /// (after normalization, or after de-spacing) is claimed by two entries.
    pub fn new(defs: Vec<(CatalogEntry, Vec<String>)>) -> Result<Self, String> {
        let mut entries: Vec<CatalogEntry> = Vec::with_capacity(defs.len());
        let mut aliases: HashMap<String, usize> = HashMap::new();
        for (entry, alias_list) in defs {
            let idx = entries.len();
            for alias in &alias_list {
                let norm = normalize_name(alias);
                if norm.is_empty() {
                    return Err(format!("empty alias for catalog entry '{}'", entry.key));
                }
                // Register both the spaced and de-spaced spelling; duplicates
                // within the same entry are harmless, across entries they are
                // a table error.
                for variant in [norm.clone(), despace(&norm)] {
                    match aliases.get(&variant) {
                        Some(&prior) if prior != idx => {
                            return Err(format!(
                                "alias '{}' claimed by both '{}' and '{}'",
                                variant, entries[prior].key, entry.key
                            ));
                        }
                        _ => {
                            aliases.insert(variant, idx);
                        }
                    }
                }
            }
            entries.push(entry);
        }
        Ok(Self { entries, aliases })
    }

    /// The standard shop table. Prices are in berries.
    pub fn standard() -> Self {
        let mut defs: Vec<(CatalogEntry, Vec<String>)> = Vec::new();

        // Chests first: their single-letter aliases must win over anything
        // a later category might try to claim.
        let chest_prices = [
            (ChestTier::C, 100),
            (ChestTier::B, 250),
            (ChestTier::A, 500),
            (ChestTier::S, 2000),
        ];
        for (tier, price) in chest_prices {
            let l = tier.letter();
            defs.push((
                CatalogEntry {
                    category: Category::Chest,
                    key: tier.to_string(),
                    unit_price: price,
                    target: CreditTarget::Chest(tier),
                },
                vec![
                    format!("{l} tier chest"),
                    format!("{l} chest"),
                    format!("{l} tier"),
                    l.to_string(),
                ],
            ));
        }

        let materials: [(&str, i64); 11] = [
            ("steel", 20),
            ("iron", 15),
            ("wood", 5),
            ("leather", 30),
            ("ray skin", 100),
            ("titanium", 200),
            ("obsidian", 150),
            ("spring", 10),
            ("aluminum", 25),
            ("brass", 15),
            ("diamond", 500),
        ];
        for (key, price) in materials {
            defs.push((
                CatalogEntry {
                    category: Category::Material,
                    key: key.to_string(),
                    unit_price: price,
                    target: CreditTarget::Item(key.to_string()),
                },
                vec![key.to_string()],
            ));
        }

        let legendary: [(&str, i64); 8] = [
            ("log pose", 5000),
            ("map", 3000),
            ("gold bar", 10000),
            ("jolly roger flag", 4000),
            ("crew contract", 8000),
            ("ancient relic", 12000),
            ("s rank summon", 15000),
            ("awakening", 20000),
        ];
        for (key, price) in legendary {
            defs.push((
                CatalogEntry {
                    category: Category::Legendary,
                    key: key.to_string(),
                    unit_price: price,
                    target: CreditTarget::Item(key.to_string()),
                },
                vec![key.to_string()],
            ));
        }

        let others: [(&str, i64, CreditTarget); 4] = [
            ("reset token", 1000, CreditTarget::ResetTokens),
            ("xp book", 250, CreditTarget::XpBooks),
            ("xp scroll", 150, CreditTarget::XpScrolls),
            ("battle token", 50, CreditTarget::Item("battle token".to_string())),
        ];
        for (key, price, target) in others {
            defs.push((
                CatalogEntry {
                    category: Category::Other,
                    key: key.to_string(),
                    unit_price: price,
                    target,
                },
                vec![key.to_string()],
            ));
        }

        Self::new(defs).expect("standard catalog aliases are unique")
    }

    /// Resolve a free-text item name to its catalog entry. Tries the
    /// whitespace-normalized spelling first, then the fully de-spaced one.
    pub fn resolve(&self, raw: &str) -> Option<&CatalogEntry> {
        let norm = normalize_name(raw);
        if norm.is_empty() {
            return None;
        }
        if let Some(&idx) = self.aliases.get(&norm) {
            return Some(&self.entries[idx]);
        }
        self.aliases.get(&despace(&norm)).map(|&idx| &self.entries[idx])
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

/// Format the shop listing as plain lines, one section per category.
pub fn format_catalog_listing(catalog: &Catalog) -> Vec<String> {
    let sections = [
        (Category::Chest, "Chests"),
        (Category::Material, "Materials"),
        (Category::Legendary, "Legendary"),
        (Category::Other, "Others"),
    ];
    let mut lines = Vec::new();
    for (category, title) in sections {
        lines.push(format!("=== {} ===", title));
        for entry in catalog.entries().iter().filter(|e| e.category == category) {
            let name = match category {
                Category::Chest => format!("{} tier chest", entry.key),
                _ => entry.key.clone(),
            };
            lines.push(format!("{} - {}¥", name, entry.unit_price));
        }
    }
    lines
}
