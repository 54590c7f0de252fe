//! Collection queries
//!
//! A [`Query`] selects documents from one collection with an optional
//! equality filter, orders them by document id or by a field, and
//! optionally truncates the result. Ordering by a field drops documents that
//! do not carry that field.

use crate::types::{compare_values, StoredDoc};
use serde_json::Value;
use std::cmp::Ordering;

/// Equality filter on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// `field == value`
    Eq {
        /// Field name
        field: String,
        /// Value the field must equal
        value: Value,
    },
}

impl FieldFilter {
    fn matches(&self, doc: &StoredDoc) -> bool {
        match self {
            FieldFilter::Eq { field, value } => doc
                .field(field)
                .map_or(false, |v| compare_values(v, value) == Ordering::Equal),
        }
    }
}

/// Sort key for query results
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Order by document id
    #[default]
    DocumentId,
    /// Order by a top-level field (documents without it are excluded)
    Field(String),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// A query over a single collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to scan
    pub collection: String,
    /// Optional equality filter
    pub filter: Option<FieldFilter>,
    /// Sort key
    pub order_by: OrderBy,
    /// Sort direction
    pub direction: Direction,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl Query {
    /// Query every document of a collection, ordered by id
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: None,
            order_by: OrderBy::DocumentId,
            direction: Direction::Asc,
            limit: None,
        }
    }

    /// Keep only documents whose `field` equals `value`
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Set the sort key and direction
    pub fn order_by(mut self, order_by: OrderBy, direction: Direction) -> Self {
        self.order_by = order_by;
        self.direction = direction;
        self
    }

    /// Truncate the result to `limit` documents
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the query over the documents of its collection
    ///
    /// `docs` may be in any order; documents from other collections are
    /// ignored.
    pub fn evaluate(&self, docs: impl IntoIterator<Item = StoredDoc>) -> Vec<StoredDoc> {
        let mut selected: Vec<StoredDoc> = docs
            .into_iter()
            .filter(|d| d.key.collection == self.collection)
            .filter(|d| self.filter.as_ref().map_or(true, |f| f.matches(d)))
            .filter(|d| match &self.order_by {
                OrderBy::DocumentId => true,
                OrderBy::Field(name) => d.data.contains_key(name),
            })
            .collect();

        selected.sort_by(|a, b| {
            let ord = match &self.order_by {
                OrderBy::DocumentId => a.key.id.cmp(&b.key.id),
                OrderBy::Field(name) => match (a.field(name), b.field(name)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => Ordering::Equal,
                }
                .then_with(|| a.key.id.cmp(&b.key.id)),
            };
            match self.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}
