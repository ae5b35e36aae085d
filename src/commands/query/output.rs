//! Output formatting for query command results.

use super::execute::QueryResult;
use crate::output::Outputable;

impl Outputable for QueryResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Database: {}", self.database));
        lines.push(String::new());

        if self.frame.is_empty() {
            lines.push("No results.".to_string());
            return lines.join("\n");
        }

        lines.push(self.frame.to_table());
        lines.join("\n")
    }

    fn to_csv(&self) -> String {
        self.frame.to_csv()
    }
}
