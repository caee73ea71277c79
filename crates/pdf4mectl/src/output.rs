use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

use crate::cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    /// Structured format for a CLI choice; `None` means human output
    pub fn structured(format: cli::OutputFormat) -> Option<Self> {
        match format {
            cli::OutputFormat::Json => Some(Self::Json),
            cli::OutputFormat::Yaml => Some(Self::Yaml),
            cli::OutputFormat::Table => Some(Self::Table),
            cli::OutputFormat::Auto => None,
        }
    }
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            print_as_table(&json_value)?;
        }
    }

    Ok(())
}

fn print_as_table(value: &Value) -> Result<()> {
    println!("{}", build_table(value));
    Ok(())
}

fn build_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            // Get headers from first object
            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_auto_is_human() {
        assert_eq!(OutputFormat::structured(cli::OutputFormat::Auto), None);
        assert_eq!(
            OutputFormat::structured(cli::OutputFormat::Yaml),
            Some(OutputFormat::Yaml)
        );
    }

    #[test]
    fn test_format_value_collapses_nested() {
        assert_eq!(format_value(&json!([1, 2, 3])), "[3 items]");
        assert_eq!(format_value(&json!({"a": 1})), "{1 fields}");
        assert_eq!(format_value(&json!("text")), "text");
        assert_eq!(format_value(&Value::Null), "null");
    }

    #[test]
    fn test_table_from_array_of_objects() {
        let table = build_table(&json!([
            {"name": "merge", "category": "merge-split"},
            {"name": "compress-pdf", "category": "optimize"},
        ]));
        assert!(table.contains("name"));
        assert!(table.contains("compress-pdf"));
        assert!(table.contains("merge-split"));
    }

    #[test]
    fn test_table_from_object() {
        let table = build_table(&json!({"bytes": 1024}));
        assert!(table.contains("Key"));
        assert!(table.contains("1024"));
    }
}
