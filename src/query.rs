//! Query construction, validation, and dispatch.
//!
//! [`BwQuery`] owns a working [`QuerySpec`], an endpoint, and the
//! transport used to reach it. Mutations of the grouping fields and
//! search limits are validated against the field schema *before* they are
//! applied, so a rejected mutation never leaves the spec partially
//! changed; the full-spec check run before dispatch additionally keeps a
//! last-good snapshot and rolls back to it on failure.
//!
//! Validation is best-effort: until a schema has been fetched, group and
//! limit names are accepted unchecked. Fetching the schema (explicitly
//! via [`BwQuery::fields`] or eagerly at construction) turns the checks
//! on for the lifetime of the instance.

use std::collections::HashMap;
use std::error::Error;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config;
use crate::results::{BwResults, FrameOpts, ShapeError};
use crate::schema::{Dtype, Field, FieldSchema};
use crate::transport::{HttpTransport, Transport};

pub const TEXT_COUNT: &str = "TextCount";
pub const WORD_COUNT: &str = "WordCount";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no endpoint; provide one to BwQuery on construction or install a default")]
    NoEndpoint,

    #[error(
        "no database; provide one to BwQuery on construction, embed it in the spec, or install a default"
    )]
    NoDatabase,
}

/// Validation error types
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("the following groups are not supported in this bookworm: {}", .fields.join(", "))]
    UnknownGroups { fields: Vec<String> },

    #[error("the following search_limits fields are not supported in this bookworm: {}", .fields.join(", "))]
    UnknownLimits { fields: Vec<String> },

    #[error("word value needs to be a list, even if there is only one word")]
    WordNotList,
}

/// The request payload sent to the server.
///
/// `groups` and `counttype` accept a bare string where a one-element list
/// is meant; serialization always emits lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub search_limits: Map<String, Value>,
    #[serde(default = "default_collation")]
    pub words_collation: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_counttype", deserialize_with = "string_or_list")]
    pub counttype: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub groups: Vec<String>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            database: String::new(),
            search_limits: Map::new(),
            words_collation: default_collation(),
            method: default_method(),
            format: default_format(),
            counttype: default_counttype(),
            groups: Vec::new(),
        }
    }
}

fn default_collation() -> String {
    "Case_Sensitive".to_string()
}

fn default_method() -> String {
    "data".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_counttype() -> Vec<String> {
    vec![TEXT_COUNT.to_string(), WORD_COUNT.to_string()]
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Construction options for [`BwQuery`].
#[derive(Debug, Clone)]
pub struct QueryOpts {
    /// Server endpoint; falls back to the installed default.
    pub endpoint: Option<String>,
    /// Database; falls back to the spec's own value, then the installed
    /// default.
    pub database: Option<String>,
    /// Starting spec; the default query template when absent.
    pub spec: Option<QuerySpec>,
    /// Fetch the field schema eagerly so validation is active from the
    /// start. Turning this off saves one server call; checks resume if
    /// `fields()` is called later.
    pub verify_fields: bool,
    /// TLS certificate verification for the HTTP transport.
    pub verify_cert: bool,
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self {
            endpoint: None,
            database: None,
            spec: None,
            verify_fields: true,
            verify_cert: true,
        }
    }
}

/// A configured query against one Bookworm database.
pub struct BwQuery {
    spec: QuerySpec,
    endpoint: String,
    transport: Box<dyn Transport>,
    fields: Option<FieldSchema>,
    dtypes: HashMap<String, Dtype>,
    field_cache: HashMap<String, Vec<String>>,
    last_good: Option<QuerySpec>,
}

impl BwQuery {
    /// Build a query over the HTTP transport.
    pub fn new(opts: QueryOpts) -> Result<Self, Box<dyn Error>> {
        let transport = HttpTransport::new(opts.verify_cert)?;
        Self::with_transport(opts, Box::new(transport))
    }

    /// Default query against one database, everything else resolved from
    /// installed defaults.
    pub fn for_database(database: &str) -> Result<Self, Box<dyn Error>> {
        Self::new(QueryOpts {
            database: Some(database.to_string()),
            ..Default::default()
        })
    }

    /// Build from a serialized spec.
    pub fn from_json(text: &str, opts: QueryOpts) -> Result<Self, Box<dyn Error>> {
        let spec: QuerySpec = serde_json::from_str(text)?;
        Self::new(QueryOpts {
            spec: Some(spec),
            ..opts
        })
    }

    /// Build over a caller-supplied transport.
    pub fn with_transport(
        opts: QueryOpts,
        transport: Box<dyn Transport>,
    ) -> Result<Self, Box<dyn Error>> {
        let mut spec = opts.spec.unwrap_or_default();

        let endpoint = opts
            .endpoint
            .or_else(config::default_endpoint)
            .ok_or(ConfigError::NoEndpoint)?;

        if let Some(database) = opts.database {
            spec.database = database;
        } else if spec.database.is_empty()
            && let Some(database) = config::default_database()
        {
            spec.database = database;
        }
        if spec.database.is_empty() {
            return Err(ConfigError::NoDatabase.into());
        }

        let mut query = Self {
            spec,
            endpoint,
            transport,
            fields: None,
            dtypes: HashMap::new(),
            field_cache: HashMap::new(),
            last_good: None,
        };
        if opts.verify_fields {
            query.fields()?;
        }
        query.validate()?;
        Ok(query)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn groups(&self) -> &[String] {
        &self.spec.groups
    }

    /// Replace the grouping fields. Validated against the schema first;
    /// on rejection the current groups are untouched.
    pub fn set_groups(&mut self, groups: Vec<String>) -> Result<(), ValidationError> {
        check_groups(self.fields.as_ref(), &groups)?;
        self.spec.groups = groups;
        Ok(())
    }

    pub fn search_limits(&self) -> &Map<String, Value> {
        &self.spec.search_limits
    }

    /// Replace the search limits. Validated first; on rejection the
    /// current limits are untouched.
    pub fn set_search_limits(&mut self, limits: Map<String, Value>) -> Result<(), ValidationError> {
        check_search_limits(self.fields.as_ref(), &limits)?;
        self.spec.search_limits = limits;
        Ok(())
    }

    pub fn counttype(&self) -> &[String] {
        &self.spec.counttype
    }

    pub fn set_counttype(&mut self, counttype: Vec<String>) {
        self.spec.counttype = counttype;
    }

    pub fn database(&self) -> &str {
        &self.spec.database
    }

    pub fn set_database(&mut self, database: String) {
        self.spec.database = database;
    }

    /// Name -> dtype map derived from the schema; empty until a schema
    /// has been fetched.
    pub fn dtypes(&self) -> &HashMap<String, Dtype> {
        &self.dtypes
    }

    /// The field schema for this database, fetched from the server on
    /// first call and cached for the lifetime of the instance.
    pub fn fields(&mut self) -> Result<FieldSchema, Box<dyn Error>> {
        if let Some(schema) = &self.fields {
            return Ok(schema.clone());
        }
        let request = json!({
            "database": self.spec.database,
            "method": "returnPossibleFields",
        });
        let response = self.transport.fetch(&self.endpoint, &request)?;
        let records: Vec<Field> = serde_json::from_value(response)?;
        let schema = FieldSchema::new(records);
        self.dtypes = schema.dtypes();
        self.fields = Some(schema.clone());
        Ok(schema)
    }

    /// Full-spec check: pins `method` to `data` and validates groups and
    /// search limits. On success the spec becomes the new last-good
    /// snapshot; on failure the working spec is rolled back to the
    /// previous snapshot before the error surfaces.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        match self.validate_inner() {
            Ok(()) => {
                self.last_good = Some(self.spec.clone());
                Ok(())
            }
            Err(e) => {
                if let Some(good) = &self.last_good {
                    self.spec = good.clone();
                }
                Err(e)
            }
        }
    }

    fn validate_inner(&mut self) -> Result<(), ValidationError> {
        if self.spec.method != "data" {
            warn!(
                method = %self.spec.method,
                "ignoring custom method argument; results are only parsable from 'data'"
            );
            self.spec.method = default_method();
        }
        check_groups(self.fields.as_ref(), &self.spec.groups)?;
        check_search_limits(self.fields.as_ref(), &self.spec.search_limits)?;
        Ok(())
    }

    // Query issues tolerated until somebody tries to run the thing.
    // Nothing is checked today; grouping requirements would land here.
    fn runtime_validate(&self) {}

    /// Send the query and wrap the reply.
    pub fn run(&mut self) -> Result<BwResults, Box<dyn Error>> {
        self.validate()?;
        self.runtime_validate();

        debug!(query = %serde_json::to_string(&self.spec)?, "running bookworm query");
        let response = self
            .transport
            .fetch(&self.endpoint, &serde_json::to_value(&self.spec)?)?;
        let data = response
            .get("data")
            .cloned()
            .ok_or(ShapeError::MissingData)?;

        Ok(BwResults::new(data, &self.spec, self.dtypes.clone()))
    }

    /// All values of a field, most frequent first. Memoized per field.
    ///
    /// With `max`, buckets by id space instead (`*field` grouping) and
    /// constrains `field__id` to ids at or below `max`.
    pub fn field_values(&mut self, field: &str, max: Option<u64>) -> Result<Vec<String>, Box<dyn Error>> {
        if let Some(values) = self.field_cache.get(field) {
            return Ok(values.clone());
        }

        let mut scratch = QuerySpec {
            database: self.spec.database.clone(),
            ..Default::default()
        };
        match max {
            Some(max) => {
                scratch
                    .search_limits
                    .insert(format!("{field}__id"), json!({"$lt": max + 1}));
                scratch.groups = vec![format!("*{field}")];
            }
            None => scratch.groups = vec![field.to_string()],
        }

        let values = self.fetch_values(&scratch, field)?;
        self.field_cache.insert(field.to_string(), values.clone());
        Ok(values)
    }

    /// Values of a field that occur under the current search limits
    /// (minus any `word` constraint), most frequent first.
    pub fn limited_field_values(&mut self, field: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let mut scratch = self.spec.clone();
        scratch.search_limits.remove("word");
        scratch.groups.push(field.to_string());

        let values = self.fetch_values(&scratch, field)?;
        self.field_cache.insert(field.to_string(), values.clone());
        Ok(values)
    }

    fn fetch_values(&mut self, scratch: &QuerySpec, field: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let response = self
            .transport
            .fetch(&self.endpoint, &serde_json::to_value(scratch)?)?;
        let results = BwResults::new(response, scratch, self.dtypes.clone());
        let frame = results.frame(&FrameOpts {
            index: false,
            ..Default::default()
        })?;

        let position = frame
            .columns()
            .iter()
            .position(|c| c == field)
            .ok_or(ShapeError::MissingColumn {
                name: field.to_string(),
            })?;
        // The scratch query may carry extra groups (the limited path), so
        // the same value can appear on several rows; keep first sightings,
        // which are also the most frequent ones.
        let mut values = Vec::new();
        for row in frame.rows() {
            let value = row[position].to_string();
            if !values.contains(&value) {
                values.push(value);
            }
        }
        Ok(values)
    }
}

fn check_groups(schema: Option<&FieldSchema>, groups: &[String]) -> Result<(), ValidationError> {
    let Some(schema) = schema else {
        return Ok(());
    };
    let bad: Vec<String> = groups
        .iter()
        .filter(|g| !schema.allows_group(g))
        .cloned()
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnknownGroups { fields: bad })
    }
}

fn check_search_limits(
    schema: Option<&FieldSchema>,
    limits: &Map<String, Value>,
) -> Result<(), ValidationError> {
    if let Some(schema) = schema {
        let bad: Vec<String> = limits
            .keys()
            .filter(|k| !schema.allows_limit(k))
            .cloned()
            .collect();
        if !bad.is_empty() {
            return Err(ValidationError::UnknownLimits { fields: bad });
        }
    }
    // Checked with or without a schema: a bare word string is always a
    // caller mistake.
    if let Some(word) = limits.get("word")
        && !word.is_array()
    {
        return Err(ValidationError::WordNotList);
    }
    Ok(())
}
