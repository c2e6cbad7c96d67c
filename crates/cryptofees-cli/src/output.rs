use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Metadata;

/// Rows for `--format table`; JSON output uses the command's `data` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Left-aligned text columns, one line per row.
    pub fn render_lines(&self) -> Vec<String> {
        let mut widths = self.headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(index) {
                    *width = (*width).max(cell.len());
                }
            }
        }

        let format_row = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(self.headers.clone()));
        let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();
        lines.push(format_row(rule.iter().map(String::as_str).collect()));
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    meta: &'a Metadata,
    data: &'a Value,
}

pub fn render(
    metadata: &Metadata,
    data: &Value,
    table: &Table,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let envelope = Envelope {
                meta: metadata,
                data,
            };
            let payload = if pretty {
                serde_json::to_string_pretty(&envelope)?
            } else {
                serde_json::to_string(&envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(metadata, table),
    }

    Ok(())
}

fn render_table(metadata: &Metadata, table: &Table) {
    println!("request_id  : {}", metadata.request_id);
    println!("generated_at: {}", metadata.generated_at);
    println!("latency_ms  : {}", metadata.latency_ms);

    if !metadata.warnings.is_empty() {
        println!("warnings:");
        for warning in &metadata.warnings {
            println!("  - {warning}");
        }
    }

    println!();
    for line in table.render_lines() {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let mut table = Table::new(vec!["id", "fee"]);
        table.push_row(vec![String::from("uniswap-v2"), String::from("1.00")]);
        table.push_row(vec![String::from("bitcoin"), String::from("12345.67")]);

        let lines = table.render_lines();

        assert_eq!(lines[0], "id          fee");
        assert_eq!(lines[1], "----------  --------");
        assert_eq!(lines[2], "uniswap-v2  1.00");
        assert_eq!(lines[3], "bitcoin     12345.67");
    }
}
