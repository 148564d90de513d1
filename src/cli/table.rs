//! List rendering - tables, TSV and JSON for record listings

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::{format_short_id, truncate_str};
use crate::cli::OutputFormat;
use crate::core::User;
use crate::entities::{
    ConsumableIssue, Department, Item, LedgerEntry, PllEntry, Request, ReturnRecord, Survey,
    WriteOff,
};

/// A record that can be shown as one row of a listing
pub trait Listing: Serialize {
    /// Plural noun used in "No ... found." and the row count footer
    const NOUN: &'static str;
    const HEADERS: &'static [&'static str];

    /// Cells for table output, possibly shortened
    fn cells(&self) -> Vec<String>;

    /// Cells for TSV output; full ids and untruncated text
    fn raw_cells(&self) -> Vec<String> {
        self.cells()
    }
}

/// Print a listing in the requested format
pub fn print_list<T: Listing>(rows: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Tsv => {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .quote_style(csv::QuoteStyle::Necessary)
                .from_writer(std::io::stdout());
            writer.write_record(T::HEADERS).into_diagnostic()?;
            for row in rows {
                writer.write_record(row.raw_cells()).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No {} found.", T::NOUN);
                return Ok(());
            }
            println!("{}", render_table(rows));
            println!();
            println!("{} {}", style(rows.len()).cyan(), T::NOUN);
        }
    }
    Ok(())
}

/// Render rows as a psql-style table
pub fn render_table<T: Listing>(rows: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::HEADERS.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row.cells());
    }
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

impl Listing for User {
    const NOUN: &'static str = "users";
    const HEADERS: &'static [&'static str] = &["USERNAME", "ROLE", "DEPARTMENT"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.role.to_string(),
            self.department.clone().unwrap_or_default(),
        ]
    }
}

impl Listing for Department {
    const NOUN: &'static str = "departments";
    const HEADERS: &'static [&'static str] = &["NAME"];

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

impl Listing for Item {
    const NOUN: &'static str = "items";
    const HEADERS: &'static [&'static str] = &["NAME", "LEDGER", "FOLIO", "TYPE", "STOCK"];

    fn cells(&self) -> Vec<String> {
        vec![
            truncate_str(&self.name, 30),
            truncate_str(&self.ledger_name, 20),
            self.folio_number.clone(),
            self.item_type.to_string(),
            self.stock.to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.ledger_name.clone(),
            self.folio_number.clone(),
            self.item_type.to_string(),
            self.stock.to_string(),
        ]
    }
}

impl Listing for Request {
    const NOUN: &'static str = "requests";
    const HEADERS: &'static [&'static str] =
        &["ID", "ITEM", "DEPARTMENT", "QTY", "STATUS", "BY", "UPDATED"];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            truncate_str(&self.item, 25),
            self.department.clone(),
            self.quantity.to_string(),
            self.status.to_string(),
            self.requested_by.clone(),
            self.updated.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.status.to_string(),
            self.requested_by.clone(),
            self.updated.to_rfc3339(),
        ]
    }
}

impl Listing for LedgerEntry {
    const NOUN: &'static str = "ledger entries";
    const HEADERS: &'static [&'static str] = &[
        "ID", "REQUEST", "ITEM", "LEDGER", "FOLIO", "DEPARTMENT", "QTY", "POSTED",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            format_short_id(&self.request),
            truncate_str(&self.item, 25),
            truncate_str(&self.ledger_name, 20),
            self.folio_number.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.posted.format("%Y-%m-%d").to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.request.to_string(),
            self.item.clone(),
            self.ledger_name.clone(),
            self.folio_number.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.posted.to_rfc3339(),
        ]
    }
}

impl Listing for PllEntry {
    const NOUN: &'static str = "holdings";
    const HEADERS: &'static [&'static str] = &["DEPARTMENT", "ITEM", "HELD"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.department.clone(),
            self.item.clone(),
            self.quantity_held.to_string(),
        ]
    }
}

impl Listing for ReturnRecord {
    const NOUN: &'static str = "returns";
    const HEADERS: &'static [&'static str] =
        &["ID", "DEPARTMENT", "ITEM", "QTY", "STATUS", "CREATED"];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.department.clone(),
            truncate_str(&self.item, 25),
            self.quantity.to_string(),
            self.status.to_string(),
            self.created.format("%Y-%m-%d").to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.department.clone(),
            self.item.clone(),
            self.quantity.to_string(),
            self.status.to_string(),
            self.created.to_rfc3339(),
        ]
    }
}

impl Listing for Survey {
    const NOUN: &'static str = "surveys";
    const HEADERS: &'static [&'static str] =
        &["ID", "ITEM", "DEPARTMENT", "QTY", "SURVEY REF", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            truncate_str(&self.item, 25),
            self.department.clone(),
            self.quantity.to_string(),
            self.survey_ref.clone(),
            self.status.to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.survey_ref.clone(),
            self.status.to_string(),
        ]
    }
}

impl Listing for WriteOff {
    const NOUN: &'static str = "write-offs";
    const HEADERS: &'static [&'static str] = &[
        "ID", "SURVEY", "ITEM", "DEPARTMENT", "QTY", "SURVEY REF", "APPROVED BY", "POSTED",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            format_short_id(&self.survey),
            truncate_str(&self.item, 25),
            self.department.clone(),
            self.quantity.to_string(),
            self.survey_ref.clone(),
            self.approved_by.clone(),
            self.posted.format("%Y-%m-%d").to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.survey.to_string(),
            self.item.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.survey_ref.clone(),
            self.approved_by.clone(),
            self.posted.to_rfc3339(),
        ]
    }
}

impl Listing for ConsumableIssue {
    const NOUN: &'static str = "consumable issues";
    const HEADERS: &'static [&'static str] = &["ID", "ITEM", "DEPARTMENT", "QTY", "ISSUED"];

    fn cells(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            truncate_str(&self.item, 25),
            self.department.clone(),
            self.quantity.to_string(),
            self.issued.format("%Y-%m-%d").to_string(),
        ]
    }

    fn raw_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item.clone(),
            self.department.clone(),
            self.quantity.to_string(),
            self.issued.to_rfc3339(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemType;

    #[test]
    fn test_render_table_has_headers_and_rows() {
        let rows = vec![Item {
            name: "Chair".to_string(),
            ledger_name: "Furniture".to_string(),
            folio_number: "12".to_string(),
            item_type: ItemType::Permanent,
            stock: 5,
        }];
        let rendered = render_table(&rows);
        assert!(rendered.contains("FOLIO"));
        assert!(rendered.contains("Chair"));
        assert!(rendered.contains("Furniture"));
    }

    #[test]
    fn test_request_cells_shorten_id() {
        let request = Request::new("Chair", "Physics", 2, "p1");
        assert_eq!(request.cells()[0], request.id.short());
        assert_eq!(request.raw_cells()[0], request.id.to_string());
    }
}
