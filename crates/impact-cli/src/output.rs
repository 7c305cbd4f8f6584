//! Output formatting for the impact CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use impact_core::Interval;
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact text format
    Text,
}

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format as a table row
    fn table_headers() -> Vec<String>;
    fn table_row(&self) -> Vec<String>;

    /// Format as key-value pairs for detailed view
    fn key_value_pairs(&self) -> Vec<(String, String)>;
}

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format and print a single item
    pub fn print_item<T>(&self, item: &T) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(item)?),
            OutputFormat::Table => {
                for (key, value) in item.key_value_pairs() {
                    println!("{}: {}", key.bold().cyan(), value);
                }
            }
            OutputFormat::Text => {
                for (key, value) in item.key_value_pairs() {
                    println!("{}: {}", key, value);
                }
            }
        }
        Ok(())
    }

    /// Format and print a list of items
    pub fn print_list<T>(&self, items: &[T]) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        if items.is_empty() {
            match self.format {
                OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
                OutputFormat::Table | OutputFormat::Text => {
                    println!("{}", "No items found".dimmed());
                }
            }
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(items)?),
            OutputFormat::Table => println!("{}", render_table(items)),
            OutputFormat::Text => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    for (key, value) in item.key_value_pairs() {
                        println!("{}: {}", key, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print a table of rows under `headers`, or the same data as
    /// key-value pairs for structured formats
    pub fn print_section(&self, title: &str, headers: &[&str], rows: &[Vec<String>]) {
        match self.format {
            OutputFormat::Table => {
                let mut table = styled_table();
                table.set_header(header_cells(headers.iter().copied()));
                for row in rows {
                    table.add_row(row);
                }
                println!("{}", title.bold());
                println!("{}", table);
            }
            OutputFormat::Text => {
                println!("{}", title);
                for row in rows {
                    println!("  {}", row.join("  "));
                }
            }
            OutputFormat::Json | OutputFormat::Yaml => {}
        }
    }

    /// Print a warning message on stderr
    pub fn print_warning(&self, message: &str) {
        match self.format {
            OutputFormat::Table => eprintln!("{} {}", "⚠".yellow().bold(), message.yellow()),
            _ => eprintln!("warning: {}", message),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<Cell> {
    headers
        .into_iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
        .collect()
}

fn render_table<T: Formattable>(items: &[T]) -> Table {
    let mut table = styled_table();
    let headers = T::table_headers();
    table.set_header(header_cells(headers.iter().map(String::as_str)));
    for item in items {
        table.add_row(item.table_row());
    }
    table
}

/// Format an interval with its unit, collapsing degenerate intervals
pub fn format_interval(interval: Interval, unit: &str) -> String {
    if interval.is_degenerate() {
        format!("{:.4e} {}", interval.min, unit)
    } else {
        format!("{:.4e} .. {:.4e} {}", interval.min, interval.max, unit)
    }
}

/// Format a parameter count given in billions
pub fn format_parameters(interval: Interval) -> String {
    if interval.is_zero() {
        "unknown".to_string()
    } else if interval.is_degenerate() {
        format!("{}B", interval.min)
    } else {
        format!("{}B - {}B", interval.min, interval.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    impl Formattable for TestItem {
        fn table_headers() -> Vec<String> {
            vec!["Name".to_string(), "Value".to_string()]
        }

        fn table_row(&self) -> Vec<String> {
            vec![self.name.clone(), self.value.to_string()]
        }

        fn key_value_pairs(&self) -> Vec<(String, String)> {
            vec![
                ("Name".to_string(), self.name.clone()),
                ("Value".to_string(), self.value.to_string()),
            ]
        }
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        assert_eq!(formatter.format, OutputFormat::Json);
        assert!(formatter.is_structured());
        assert!(!OutputFormatter::new(OutputFormat::Text).is_structured());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Interval::point(1.0), "s"), "1.0000e0 s");
        assert_eq!(
            format_interval(Interval::new(0.5, 2.0), "kWh"),
            "5.0000e-1 .. 2.0000e0 kWh"
        );
    }

    #[test]
    fn test_format_parameters() {
        assert_eq!(format_parameters(Interval::zero()), "unknown");
        assert_eq!(format_parameters(Interval::point(70.0)), "70B");
        assert_eq!(format_parameters(Interval::new(10.5, 20.5)), "10.5B - 20.5B");
    }

    #[test]
    fn test_render_table() {
        let items = vec![
            TestItem { name: "alpha".to_string(), value: 1 },
            TestItem { name: "beta".to_string(), value: 2 },
        ];
        let rendered = render_table(&items).to_string();
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("Value"));
    }

    #[test]
    fn test_formattable_trait() {
        let item = TestItem { name: "test".to_string(), value: 42 };
        assert_eq!(TestItem::table_headers(), vec!["Name", "Value"]);
        assert_eq!(item.table_row(), vec!["test", "42"]);
        assert_eq!(item.key_value_pairs()[0], ("Name".to_string(), "test".to_string()));
    }
}
