use thiserror::Error;

use crate::domain::Kind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} already exists: {name}")]
    DuplicateEntry { entity: &'static str, name: String },

    #[error("Category not found for {kind}: {category}")]
    CategoryNotFound { kind: Kind, category: String },

    #[error("Subcategory not found in {category}: {subcategory}")]
    SubcategoryNotFound {
        category: String,
        subcategory: String,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid kind: {0} (expected income/receita or expense/despesa)")]
    InvalidKind(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
