//! Field schema reported by a Bookworm server.
//!
//! A `returnPossibleFields` request yields one record per queryable field
//! in the selected database. The schema drives two things: validation of
//! group/search-limit names (expanded with the `__id` suffix and `*`
//! prefix variants the server understands) and dtype coercion when results
//! are materialized into a frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Data type the server reports for a field.
///
/// Anything outside the known set is carried as `Other` and left untouched
/// at coercion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Dtype {
    Integer,
    Datetime,
    Character,
    Other,
}

impl From<String> for Dtype {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "integer" => Dtype::Integer,
            "datetime" => Dtype::Datetime,
            "character" => Dtype::Character,
            _ => Dtype::Other,
        }
    }
}

impl From<Dtype> for String {
    fn from(dtype: Dtype) -> Self {
        match dtype {
            Dtype::Integer => "integer".to_string(),
            Dtype::Datetime => "datetime".to_string(),
            Dtype::Character => "character".to_string(),
            Dtype::Other => "other".to_string(),
        }
    }
}

/// One field descriptor from a `returnPossibleFields` response.
///
/// Servers send additional keys (`dbname`, `anchor`, ...) that are ignored
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub dtype: Dtype,
}

/// The full field table for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<Field>,
}

impl FieldSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Name -> dtype map used for frame coercion.
    pub fn dtypes(&self) -> HashMap<String, Dtype> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.dtype))
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Whether a group name is accepted by this schema.
    ///
    /// The accepted set per raw field `name` is {name, name__id, *name,
    /// *name__id}: a `*` prefix buckets by id space, a `__id` suffix asks
    /// for ids rather than labels.
    pub fn allows_group(&self, name: &str) -> bool {
        let bare = name.strip_prefix('*').unwrap_or(name);
        self.has(bare)
            || bare
                .strip_suffix("__id")
                .is_some_and(|base| self.has(base))
    }

    /// Whether a search-limit key is accepted by this schema.
    ///
    /// Accepted keys are {name, name__id} per field, plus the literal
    /// `word`. No `*` prefix here: id-space bucketing only applies to
    /// grouping.
    pub fn allows_limit(&self, key: &str) -> bool {
        if key == "word" {
            return true;
        }
        self.has(key)
            || key
                .strip_suffix("__id")
                .is_some_and(|base| self.has(base))
    }
}
