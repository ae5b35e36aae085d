//! Reshaping of nested count responses.
//!
//! The server answers a grouped query with a mapping nested one level per
//! group, leaves being count lists ordered like the requested count types.
//! [`BwResults`] walks that structure depth-first and flattens it into one
//! record per facet-value combination, then optionally materializes the
//! records into a [`Frame`] for presentation.
//!
//! Recursion depth is bounded by the group list, which is known at call
//! time; a response level that does not match the expected shape is a
//! [`ShapeError`], never a deeper walk.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::frame::{Cell, Frame};
use crate::labels;
use crate::query::QuerySpec;
use crate::schema::Dtype;

/// One flattened row: group name -> bucket value, then count type -> count.
pub type Record = IndexMap<String, Value>;

/// Response shape error types
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("response contains no 'data' payload")]
    MissingData,

    #[error("expected a nested mapping for group '{group}', found {found}")]
    ExpectedMapping { group: String, found: &'static str },

    #[error("expected a count list at depth {depth}, found {found}")]
    ExpectedCounts { depth: usize, found: &'static str },

    #[error("leaf holds {got} values but {want} count types were requested")]
    CountMismatch { got: usize, want: usize },

    #[error("missing column '{name}' in expanded result")]
    MissingColumn { name: String },
}

/// Presentation options for [`BwResults::frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameOpts {
    /// Use the group columns as the row index.
    pub index: bool,
    /// Remove rows where every count column is zero.
    pub drop_zeros: bool,
    /// Remove rows containing an "unknown/unspecified" sentinel value.
    pub drop_unknowns: bool,
}

impl Default for FrameOpts {
    fn default() -> Self {
        Self {
            index: true,
            drop_zeros: false,
            drop_unknowns: false,
        }
    }
}

/// The decoded reply to one count query, plus the request context needed
/// to interpret it.
#[derive(Debug, Clone)]
pub struct BwResults {
    raw: Value,
    groups: Vec<String>,
    counttype: Vec<String>,
    dtypes: HashMap<String, Dtype>,
}

impl BwResults {
    /// Wrap a decoded response.
    ///
    /// `raw` may be the bare count payload or a full response object with
    /// a top-level `data` key; both shapes come back from the server
    /// depending on the path. Group names lose their leading `*` here —
    /// results never care about id-space bucketing.
    pub fn new(raw: Value, spec: &QuerySpec, dtypes: HashMap<String, Dtype>) -> Self {
        let groups = spec
            .groups
            .iter()
            .map(|g| g.trim_start_matches('*').to_string())
            .collect();
        Self {
            raw,
            groups,
            counttype: spec.counttype.clone(),
            dtypes,
        }
    }

    /// The raw decoded JSON, exactly as received.
    pub fn json(&self) -> &Value {
        &self.raw
    }

    fn payload(&self) -> &Value {
        match &self.raw {
            Value::Object(map) if map.contains_key("data") => &map["data"],
            other => other,
        }
    }

    /// Flatten the response into one record per facet-value combination.
    pub fn records(&self) -> Result<Vec<Record>, ShapeError> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        expand(
            self.payload(),
            &self.groups,
            &self.counttype,
            &mut path,
            &mut out,
        )?;
        Ok(out)
    }

    /// Materialize the records into a presentation frame.
    pub fn frame(&self, opts: &FrameOpts) -> Result<Frame, ShapeError> {
        let records = self.records()?;

        let columns: Vec<String> = self
            .groups
            .iter()
            .chain(self.counttype.iter())
            .cloned()
            .collect();
        let rows: Vec<Vec<Cell>> = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| record.get(col).map_or(Cell::Null, Cell::from_value))
                    .collect()
            })
            .collect();
        let mut frame = Frame::new(columns.clone(), rows);

        frame.coerce(&self.dtypes);
        if opts.drop_unknowns {
            frame.drop_unknown_rows();
        }
        labels::relabel(&mut frame);

        if opts.index && !self.groups.is_empty() {
            frame.set_index(self.groups.len());
        } else {
            frame.select(&columns);
        }

        if opts.drop_zeros {
            frame.drop_zero_rows(&self.counttype);
        }
        frame.sort_desc(&self.counttype);

        Ok(frame)
    }

    /// Default frame serialized as CSV, index columns included.
    pub fn csv(&self) -> Result<String, ShapeError> {
        Ok(self.frame(&FrameOpts::default())?.to_csv())
    }

    /// Rows as plain value tuples, without an index.
    pub fn tuples(&self) -> Result<Vec<Vec<Cell>>, ShapeError> {
        let opts = FrameOpts {
            index: false,
            ..Default::default()
        };
        Ok(self.frame(&opts)?.tuples())
    }
}

fn expand(
    node: &Value,
    groups: &[String],
    counttypes: &[String],
    path: &mut Vec<(String, Value)>,
    out: &mut Vec<Record>,
) -> Result<(), ShapeError> {
    match groups.split_first() {
        None => {
            let Value::Array(counts) = node else {
                return Err(ShapeError::ExpectedCounts {
                    depth: path.len(),
                    found: kind(node),
                });
            };
            if counts.len() != counttypes.len() {
                return Err(ShapeError::CountMismatch {
                    got: counts.len(),
                    want: counttypes.len(),
                });
            }
            let mut record = Record::new();
            for (name, value) in path.iter() {
                record.insert(name.clone(), value.clone());
            }
            for (name, value) in counttypes.iter().zip(counts) {
                record.insert(name.clone(), value.clone());
            }
            out.push(record);
            Ok(())
        }
        Some((group, rest)) => {
            let Value::Object(buckets) = node else {
                return Err(ShapeError::ExpectedMapping {
                    group: group.clone(),
                    found: kind(node),
                });
            };
            // serde_json's preserve_order map keeps the server's own
            // iteration order, so emission order matches the reply.
            for (bucket, sub) in buckets {
                path.push((group.clone(), Value::String(bucket.clone())));
                expand(sub, rest, counttypes, path, out)?;
                path.pop();
            }
            Ok(())
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(groups: &[&str], counttype: &[&str]) -> QuerySpec {
        let mut spec = QuerySpec::default();
        spec.database = "federalist".to_string();
        spec.groups = groups.iter().map(|s| s.to_string()).collect();
        spec.counttype = counttype.iter().map(|s| s.to_string()).collect();
        spec
    }

    fn nested_fixture() -> Value {
        json!({
            "a1": {"b1": [5], "b2": [0]},
            "a2": {"b1": [3]}
        })
    }

    #[test]
    fn test_two_level_expansion() {
        let results = BwResults::new(
            nested_fixture(),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        let records = results.records().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0]["A"], json!("a1"));
        assert_eq!(records[0]["B"], json!("b1"));
        assert_eq!(records[0]["TextCount"], json!(5));

        assert_eq!(records[1]["A"], json!("a1"));
        assert_eq!(records[1]["B"], json!("b2"));
        assert_eq!(records[1]["TextCount"], json!(0));

        assert_eq!(records[2]["A"], json!("a2"));
        assert_eq!(records[2]["B"], json!("b1"));
        assert_eq!(records[2]["TextCount"], json!(3));
    }

    #[test]
    fn test_record_key_order_is_groups_then_counts() {
        let results = BwResults::new(
            nested_fixture(),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        let records = results.records().unwrap();
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["A", "B", "TextCount"]);
    }

    #[test]
    fn test_degenerate_no_groups() {
        let results = BwResults::new(
            json!([10, 200]),
            &spec(&[], &["TextCount", "WordCount"]),
            HashMap::new(),
        );
        let records = results.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["TextCount"], json!(10));
        assert_eq!(records[0]["WordCount"], json!(200));
    }

    #[test]
    fn test_data_wrapper_is_peeled() {
        let results = BwResults::new(
            json!({"data": {"a1": {"b1": [5], "b2": [0]}, "a2": {"b1": [3]}}}),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        assert_eq!(results.records().unwrap().len(), 3);
    }

    #[test]
    fn test_star_prefix_stripped_from_output_names() {
        let results = BwResults::new(
            json!({"eng": [7]}),
            &spec(&["*languages"], &["TextCount"]),
            HashMap::new(),
        );
        let records = results.records().unwrap();
        assert_eq!(records[0]["languages"], json!("eng"));
    }

    #[test]
    fn test_shallow_response_is_shape_error() {
        // Two groups requested, one level of nesting delivered.
        let results = BwResults::new(
            json!({"a1": [5]}),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        assert!(matches!(
            results.records(),
            Err(ShapeError::ExpectedMapping { .. })
        ));
    }

    #[test]
    fn test_deep_response_is_shape_error() {
        // No groups requested, a mapping delivered.
        let results = BwResults::new(
            json!({"a1": [5]}),
            &spec(&[], &["TextCount"]),
            HashMap::new(),
        );
        assert!(matches!(
            results.records(),
            Err(ShapeError::ExpectedCounts { .. })
        ));
    }

    #[test]
    fn test_leaf_arity_mismatch_is_shape_error() {
        let results = BwResults::new(
            json!({"a1": [5, 9]}),
            &spec(&["A"], &["TextCount"]),
            HashMap::new(),
        );
        assert!(matches!(
            results.records(),
            Err(ShapeError::CountMismatch { got: 2, want: 1 })
        ));
    }

    #[test]
    fn test_drop_zeros_removes_and_sorts() {
        let results = BwResults::new(
            nested_fixture(),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        let frame = results
            .frame(&FrameOpts {
                drop_zeros: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(frame.len(), 2);
        // a1/b1 (5) sorts before a2/b1 (3).
        assert_eq!(frame.rows()[0][0], Cell::Str("a1".to_string()));
        assert_eq!(frame.rows()[0][2], Cell::Int(5));
        assert_eq!(frame.rows()[1][0], Cell::Str("a2".to_string()));
        assert_eq!(frame.rows()[1][2], Cell::Int(3));
    }

    #[test]
    fn test_frame_index_marks_group_columns() {
        let results = BwResults::new(
            nested_fixture(),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        let indexed = results.frame(&FrameOpts::default()).unwrap();
        assert_eq!(indexed.index_width(), 2);

        let flat = results
            .frame(&FrameOpts {
                index: false,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(flat.index_width(), 0);
        assert_eq!(flat.columns(), ["A", "B", "TextCount"]);
    }

    #[test]
    fn test_drop_unknowns_filters_sentinel_rows() {
        let results = BwResults::new(
            json!({"unk": [4], "unknowable": [2], "eng": [9]}),
            &spec(&["languages"], &["TextCount"]),
            HashMap::new(),
        );
        let frame = results
            .frame(&FrameOpts {
                drop_unknowns: true,
                index: false,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(frame.len(), 2);
        let values: Vec<&Vec<Cell>> = frame.rows().iter().collect();
        // "unk" is gone, the near-match and the relabeled English remain.
        assert!(values.iter().all(|r| r[0] != Cell::Str("unk".to_string())));
    }

    #[test]
    fn test_frame_applies_labels_and_dtypes() {
        let dtypes = HashMap::from([("TextCount".to_string(), Dtype::Integer)]);
        let results = BwResults::new(
            json!({"eng": ["41"], "ger": ["7"]}),
            &spec(&["languages"], &["TextCount"]),
            dtypes,
        );
        let frame = results.frame(&FrameOpts::default()).unwrap();
        assert_eq!(frame.rows()[0][0], Cell::Str("English".to_string()));
        assert_eq!(frame.rows()[0][1], Cell::Int(41));
    }

    #[test]
    fn test_csv_view() {
        let results = BwResults::new(
            json!({"a1": {"b1": [5], "b2": [0]}, "a2": {"b1": [3]}}),
            &spec(&["A", "B"], &["TextCount"]),
            HashMap::new(),
        );
        let csv = results.csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "A,B,TextCount");
        assert_eq!(lines[1], "a1,b1,5");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_tuples_view() {
        let results = BwResults::new(
            json!([10, 200]),
            &spec(&[], &["TextCount", "WordCount"]),
            HashMap::new(),
        );
        let tuples = results.tuples().unwrap();
        assert_eq!(tuples, vec![vec![Cell::Int(10), Cell::Int(200)]]);
    }
}
