//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Render a list of items as a string
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    if items.is_empty() {
        return match format {
            OutputFormat::Json => "[]".to_string(),
            _ => "No items found.".to_string(),
        };
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(items).unwrap_or_default(),
        OutputFormat::Plain => items
            .iter()
            .map(|item| {
                T::headers()
                    .iter()
                    .zip(item.row())
                    .map(|(header, value)| format!("{}: {}", header, value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n---\n"),
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

/// Print success message; suppressed for JSON so stdout stays parseable
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {}
        _ => println!("✅ {}", message),
    }
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: String,
        rows: usize,
    }

    impl TableDisplay for Row {
        fn headers() -> Vec<&'static str> {
            vec!["Name", "Rows"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.name.clone(), self.rows.to_string()]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "orders".into(), rows: 2 },
            Row { name: "ppap".into(), rows: 1 },
        ]
    }

    #[test]
    fn test_plain_output() {
        assert_eq!(
            render_list(&rows(), OutputFormat::Plain),
            "Name: orders\nRows: 2\n---\nName: ppap\nRows: 1"
        );
    }

    #[test]
    fn test_json_output() {
        let json: serde_json::Value =
            serde_json::from_str(&render_list(&rows(), OutputFormat::Json)).unwrap();
        assert_eq!(json[1]["name"], "ppap");
        assert_eq!(render_list::<Row>(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn test_table_output_has_headers() {
        let rendered = render_list(&rows(), OutputFormat::Table);
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("orders"));
    }
}
