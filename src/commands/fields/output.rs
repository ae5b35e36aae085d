//! Output formatting for fields command results.

use super::execute::FieldsResult;
use crate::output::Outputable;

impl Outputable for FieldsResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Fields in: {}", self.database));
        lines.push(String::new());

        if self.fields.is_empty() {
            lines.push("No fields reported.".to_string());
            return lines.join("\n");
        }

        let width = self
            .fields
            .iter()
            .map(|f| f.name.len())
            .max()
            .unwrap_or(0);
        for field in &self.fields {
            let dtype: String = field.dtype.into();
            lines.push(format!("  {:<width$}  {}", field.name, dtype, width = width));
        }
        lines.join("\n")
    }

    fn to_csv(&self) -> String {
        let mut out = String::from("name,type\n");
        for field in &self.fields {
            let dtype: String = field.dtype.into();
            out.push_str(&format!("{},{}\n", field.name, dtype));
        }
        out
    }
}
