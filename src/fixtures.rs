//! Shared test fixtures: a canned transport and schema payloads.
//!
//! Tests never touch the network. [`MockTransport`] routes field-schema
//! requests to a fixed response, hands out queued data responses for
//! everything else, and logs every query it sees so tests can assert on
//! the exact wire shape.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::transport::{Transport, TransportError};

/// Field-schema response used by most tests.
pub fn standard_fields() -> Value {
    json!([
        {"name": "date_year", "type": "integer", "dbname": "date_year"},
        {"name": "languages", "type": "character", "dbname": "lang"},
        {"name": "publication_country", "type": "character", "dbname": "country"},
        {"name": "publication_date", "type": "datetime", "dbname": "pubdate"}
    ])
}

/// In-memory transport with a call log.
pub struct MockTransport {
    fields_response: Value,
    data_responses: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<Value>>,
}

impl MockTransport {
    pub fn new(fields_response: Value) -> Arc<Self> {
        Arc::new(Self {
            fields_response,
            data_responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Queue a response for the next non-schema query.
    pub fn push_data(&self, response: Value) {
        self.data_responses.lock().unwrap().push_back(response);
    }

    /// Every query sent through this transport, in order.
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    /// How many `returnPossibleFields` requests were sent.
    pub fn schema_fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|q| q["method"] == json!("returnPossibleFields"))
            .count()
    }
}

impl Transport for Arc<MockTransport> {
    fn fetch(&self, _endpoint: &str, query: &Value) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(query.clone());
        if query["method"] == json!("returnPossibleFields") {
            return Ok(self.fields_response.clone());
        }
        Ok(self
            .data_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({"data": []})))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
