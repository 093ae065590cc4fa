/// Report rendering: one row per incident, as a grid table, JSON, or CSV.
///
/// The row schema is fixed across all three formats: Postcode, Type,
/// Location Name, Update Time, Change. Rows are sorted by postcode (incident
/// id as the tiebreaker). The table truncates long fields and renders
/// minute-precision timestamps for scanning; JSON and CSV carry full values
/// for machine consumers.
use serde::Serialize;

use crate::model::{ChangeRecord, IncidentRecord};

/// Table cell limits before an ellipsis is applied.
const TYPE_MAX_CHARS: usize = 50;
const LOCATION_MAX_CHARS: usize = 40;

const HEADERS: [&str; 5] = ["Postcode", "Type", "Location Name", "Update Time", "Change"];

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<OutputFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Row building
// ---------------------------------------------------------------------------

/// The Type column: `{incident_status} - {category} - {origin_status}`,
/// skipping empty parts; "Unknown" when every part is empty.
pub fn type_label(incident: &IncidentRecord) -> String {
    let parts: Vec<&str> = [
        incident.incident_status.as_str(),
        incident.category.as_str(),
        incident.origin_status.as_str(),
    ]
    .into_iter()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" - ")
    }
}

/// One rendered row. Field order is the serialized key order for JSON.
#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "Postcode")]
    postcode: String,
    #[serde(rename = "Type")]
    type_label: String,
    #[serde(rename = "Location Name")]
    location_name: String,
    #[serde(rename = "Update Time")]
    update_time: String,
    #[serde(rename = "Change")]
    change: String,
}

fn build_rows(records: &[ChangeRecord], time_format: &str) -> Vec<ReportRow> {
    let mut sorted: Vec<&ChangeRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.incident
            .postcode
            .cmp(&b.incident.postcode)
            .then(a.incident_id.cmp(&b.incident_id))
    });

    sorted
        .into_iter()
        .map(|record| ReportRow {
            postcode: record.incident.postcode.clone(),
            type_label: type_label(&record.incident),
            location_name: record.incident.location_name.clone(),
            update_time: record.incident.update_time.format(time_format).to_string(),
            change: record.kind.label().to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(format: OutputFormat, records: &[ChangeRecord]) -> String {
    match format {
        OutputFormat::Table => render_table(records),
        OutputFormat::Json => render_json(records),
        OutputFormat::Csv => render_csv(records),
    }
}

/// Grid table with truncated cells and minute-precision timestamps.
pub fn render_table(records: &[ChangeRecord]) -> String {
    if records.is_empty() {
        return "No active emergencies.".to_string();
    }

    let rows: Vec<[String; 5]> = build_rows(records, "%Y-%m-%d %H:%M")
        .into_iter()
        .map(|row| {
            [
                row.postcode,
                truncate(&row.type_label, TYPE_MAX_CHARS),
                truncate(&row.location_name, LOCATION_MAX_CHARS),
                row.update_time,
                row.change,
            ]
        })
        .collect();

    let mut widths: [usize; 5] = [0; 5];
    for (i, header) in HEADERS.iter().enumerate() {
        widths[i] = header.len();
    }
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_border(&mut out, &widths, '-');
    push_row(&mut out, &widths, &HEADERS.map(String::from));
    push_border(&mut out, &widths, '=');
    for row in &rows {
        push_row(&mut out, &widths, row);
        push_border(&mut out, &widths, '-');
    }
    out.pop(); // trailing newline
    out
}

fn push_border(out: &mut String, widths: &[usize; 5], fill: char) {
    out.push('+');
    for width in widths {
        for _ in 0..width + 2 {
            out.push(fill);
        }
        out.push('+');
    }
    out.push('\n');
}

fn push_row(out: &mut String, widths: &[usize; 5], cells: &[String; 5]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        for _ in cell.chars().count()..*width {
            out.push(' ');
        }
        out.push_str(" |");
    }
    out.push('\n');
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}...", kept)
    }
}

/// Pretty-printed JSON array with second-precision timestamps.
pub fn render_json(records: &[ChangeRecord]) -> String {
    let rows = build_rows(records, "%Y-%m-%d %H:%M:%S");
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// CSV with the fixed header row and second-precision timestamps.
pub fn render_csv(records: &[ChangeRecord]) -> String {
    let mut out = String::from("Postcode,Type,Location Name,Update Time,Change\r\n");
    for row in build_rows(records, "%Y-%m-%d %H:%M:%S") {
        let cells = [
            row.postcode,
            row.type_label,
            row.location_name,
            row.update_time,
            row.change,
        ];
        let escaped: Vec<String> = cells.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&escaped.join(","));
        out.push_str("\r\n");
    }
    out
}

fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// The summary block appended after a table report.
pub fn render_summary(total: usize, changes: &[ChangeRecord], dropped: usize) -> String {
    let mut out = format!("Total incidents: {}", total);

    if !changes.is_empty() {
        out.push_str(&format!("\nStatus changes: {}", changes.len()));
        for change in changes {
            out.push_str(&format!(
                "\n  - {}: {} ({})",
                change.kind.label(),
                change.incident.location_name,
                if change.incident.postcode.is_empty() {
                    "unresolved"
                } else {
                    change.incident.postcode.as_str()
                },
            ));
        }
    }

    if dropped > 0 {
        out.push_str(&format!("\nDropped from feed: {}", dropped));
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
