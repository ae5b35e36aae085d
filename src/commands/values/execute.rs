use std::error::Error;

use serde::Serialize;

use super::ValuesCmd;
use crate::commands::{Connection, Execute};
use crate::query::{BwQuery, QueryOpts};

/// Result of the values command execution
#[derive(Debug, Serialize)]
pub struct ValuesResult {
    pub field: String,
    pub values: Vec<String>,
}

impl Execute for ValuesCmd {
    type Output = ValuesResult;

    fn execute(self, conn: &Connection) -> Result<Self::Output, Box<dyn Error>> {
        let mut query = BwQuery::new(QueryOpts {
            endpoint: conn.endpoint.clone(),
            database: conn.database.clone(),
            spec: None,
            verify_fields: false,
            verify_cert: !conn.insecure,
        })?;

        let values = query.field_values(&self.field, self.max)?;
        Ok(ValuesResult {
            field: self.field,
            values,
        })
    }
}
