//! Output formatting for values command results.

use super::execute::ValuesResult;
use crate::output::Outputable;

impl Outputable for ValuesResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Values of: {}", self.field));
        lines.push(String::new());

        if self.values.is_empty() {
            lines.push("No values found.".to_string());
            return lines.join("\n");
        }

        lines.push(format!("Found {} value(s):", self.values.len()));
        lines.push(String::new());
        for value in &self.values {
            lines.push(format!("  {}", value));
        }
        lines.join("\n")
    }

    fn to_csv(&self) -> String {
        let mut out = format!("{}\n", self.field);
        for value in &self.values {
            if value.contains(',') || value.contains('"') {
                out.push_str(&format!("\"{}\"\n", value.replace('"', "\"\"")));
            } else {
                out.push_str(&format!("{}\n", value));
            }
        }
        out
    }
}
