use serde::{Deserialize, Serialize};

use super::Kind;

/// One row of the append-only category table.
/// `subcategory: None` registers a category that has no subcategories yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub category: String,
    pub subcategory: Option<String>,
    pub kind: Kind,
}

impl TaxonomyEntry {
    pub fn category(kind: Kind, category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
            kind,
        }
    }

    pub fn subcategory(kind: Kind, category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            kind,
        }
    }
}

/// Categories of one kind and their subcategories, both in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    categories: Vec<(String, Vec<String>)>,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.subcategories(category).is_some()
    }

    /// Subcategories of `category`, or `None` if the category is unknown.
    pub fn subcategories(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, subs)| subs.as_slice())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, subs)| (name.as_str(), subs.as_slice()))
    }

    fn insert(&mut self, category: &str, subcategory: Option<&str>) {
        let index = match self.categories.iter().position(|(name, _)| name == category) {
            Some(index) => index,
            None => {
                self.categories.push((category.to_string(), Vec::new()));
                self.categories.len() - 1
            }
        };

        if let Some(sub) = subcategory.filter(|s| !s.is_empty()) {
            let subs = &mut self.categories[index].1;
            if !subs.iter().any(|s| s == sub) {
                subs.push(sub.to_string());
            }
        }
    }
}

/// Build the category -> subcategories mapping for one kind.
pub fn resolve(entries: &[TaxonomyEntry], kind: Kind) -> Taxonomy {
    let mut taxonomy = Taxonomy::default();
    for entry in entries.iter().filter(|e| e.kind == kind) {
        taxonomy.insert(&entry.category, entry.subcategory.as_deref());
    }
    taxonomy
}

/// Case-sensitive exact match against the existing categories.
pub fn is_duplicate_category(existing: &Taxonomy, candidate: &str) -> bool {
    existing.contains_category(candidate)
}

pub fn is_duplicate_subcategory(existing: &Taxonomy, category: &str, candidate: &str) -> bool {
    existing
        .subcategories(category)
        .is_some_and(|subs| subs.iter().any(|s| s == candidate))
}

/// Categories a new household starts with.
pub fn default_entries() -> Vec<TaxonomyEntry> {
    let table: [(Kind, &str, &[&str]); 6] = [
        (Kind::Expense, "Alimentação", &["Supermercado", "Restaurante", "Delivery"]),
        (Kind::Expense, "Transporte", &["Combustível", "Uber", "Manutenção"]),
        (Kind::Expense, "Moradia", &["Aluguel", "Energia", "Internet"]),
        (Kind::Income, "Salário", &["Mensal", "Freelance"]),
        (Kind::Expense, "Lazer", &["Cinema", "Viagem", "Assinaturas"]),
        (Kind::Expense, "Outros", &["Farmácia", "Presentes", "Vestuário"]),
    ];

    table
        .into_iter()
        .flat_map(|(kind, category, subs)| {
            std::iter::once(TaxonomyEntry::category(kind, category)).chain(
                subs.iter()
                    .map(move |sub| TaxonomyEntry::subcategory(kind, category, *sub)),
            )
        })
        .collect()
}
