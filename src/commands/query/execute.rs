use std::error::Error;

use serde::Serialize;
use serde_json::{Map, Value};

use super::QueryCmd;
use crate::commands::{Connection, Execute};
use crate::frame::Frame;
use crate::query::{BwQuery, QueryOpts};
use crate::results::FrameOpts;

/// Result of the query command execution
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub database: String,
    pub frame: Frame,
}

impl Execute for QueryCmd {
    type Output = QueryResult;

    fn execute(self, conn: &Connection) -> Result<Self::Output, Box<dyn Error>> {
        let mut query = BwQuery::new(QueryOpts {
            endpoint: conn.endpoint.clone(),
            database: conn.database.clone(),
            spec: None,
            verify_fields: !self.skip_field_check,
            verify_cert: !conn.insecure,
        })?;

        if !self.groups.is_empty() {
            query.set_groups(self.groups.clone())?;
        }
        query.set_counttype(self.counttype.clone());
        if let Some(text) = &self.limits {
            let limits: Map<String, Value> = serde_json::from_str(text)?;
            query.set_search_limits(limits)?;
        }

        let results = query.run()?;
        let frame = results.frame(&FrameOpts {
            index: !self.no_index,
            drop_zeros: self.drop_zeros,
            drop_unknowns: self.drop_unknowns,
        })?;

        Ok(QueryResult {
            database: query.database().to_string(),
            frame,
        })
    }
}
