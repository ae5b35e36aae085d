use std::error::Error;

use serde::Serialize;

use super::FieldsCmd;
use crate::commands::{Connection, Execute};
use crate::query::{BwQuery, QueryOpts};
use crate::schema::Field;

/// Result of the fields command execution
#[derive(Debug, Serialize)]
pub struct FieldsResult {
    pub database: String,
    pub fields: Vec<Field>,
}

impl Execute for FieldsCmd {
    type Output = FieldsResult;

    fn execute(self, conn: &Connection) -> Result<Self::Output, Box<dyn Error>> {
        // The constructor's eager schema fetch doubles as the query here.
        let mut query = BwQuery::new(QueryOpts {
            endpoint: conn.endpoint.clone(),
            database: conn.database.clone(),
            spec: None,
            verify_fields: true,
            verify_cert: !conn.insecure,
        })?;

        let schema = query.fields()?;
        Ok(FieldsResult {
            database: query.database().to_string(),
            fields: schema.fields().to_vec(),
        })
    }
}
