//! Text and JSON output for [`Response`]s

use prettytable::format::consts::FORMAT_BOX_CHARS;
use prettytable::{Table, row};

use super::{Response, ShellResult, Stats};
use crate::avl::NodeInfo;
use crate::record::Record;

/// Format a key for display
fn key(value: f64) -> String {
    format!("{value:.6}")
}

fn relative(record: Option<&Record>) -> String {
    record.map_or_else(|| "-".to_string(), |r| format!("{} ({})", r.code(), key(r.key())))
}

fn record_table<'a>(records: impl IntoIterator<Item = &'a Record>) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.set_titles(row!["Country", "ISO3", "FM", "Years"]);
    for record in records {
        table.add_row(row![
            record.name(),
            record.code(),
            r->key(record.key()),
            r->record.measurements().len()
        ]);
    }
    table
}

fn info_table(info: &NodeInfo) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.add_row(row!["Country", info.record.name()]);
    table.add_row(row!["ISO3", info.record.code()]);
    table.add_row(row!["FM", key(info.record.key())]);
    table.add_row(row!["Level", info.level]);
    table.add_row(row!["Balance factor", info.balance]);
    table.add_row(row!["Parent", relative(info.parent.as_ref())]);
    table.add_row(row!["Grandparent", relative(info.grandparent.as_ref())]);
    table.add_row(row!["Uncle", relative(info.uncle.as_ref())]);
    table
}

fn stats_table(stats: &Stats) -> Table {
    let optional = |value: Option<f64>| value.map_or_else(|| "-".to_string(), key);

    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.add_row(row!["Countries", r->stats.len]);
    table.add_row(row!["Height", r->stats.height]);
    table.add_row(row!["Sum of FM", r->key(stats.sum)]);
    table.add_row(row!["Mean FM", r->optional(stats.mean)]);
    table.add_row(row!["Minimum FM", r->optional(stats.minimum)]);
    table.add_row(row!["Maximum FM", r->optional(stats.maximum)]);
    table
}

fn levels_table(codes: bool, levels: &[Vec<Record>]) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.set_titles(row!["Level", "Nodes"]);
    for (level, records) in levels.iter().enumerate() {
        let nodes: Vec<String> = records
            .iter()
            .map(|r| if codes { r.code().to_string() } else { key(r.key()) })
            .collect();
        table.add_row(row![r->level, nodes.join("  ")]);
    }
    table
}

/// Human-readable rendering, tables for anything with rows
pub fn to_text(response: &Response) -> String {
    match response {
        Response::Nothing => String::new(),
        Response::Message(message) => message.clone(),
        Response::Inserted(record) => format!("Inserted {}", record.summary()),
        Response::Duplicate { rejected, existing } => format!(
            "Not inserted: {} has the same FM as {}",
            rejected.code(),
            existing.summary()
        ),
        Response::Removed(record) => format!("Removed {}", record.summary()),
        Response::Found(record) => record.summary(),
        Response::NotFound(key) => format!("No country with FM {key}"),
        Response::Info(info) => info_table(info).to_string(),
        Response::Records(records) if records.is_empty() => "Tree is empty".to_string(),
        Response::Records(records) => record_table(records).to_string(),
        Response::Levels { levels, .. } if levels.is_empty() => "Tree is empty".to_string(),
        Response::Levels { codes, levels } => levels_table(*codes, levels).to_string(),
        Response::Stats(stats) => stats_table(stats).to_string(),
        Response::Selection {
            criterion,
            threshold,
            records,
        } => {
            let header = format!(
                "{} match {criterion} (threshold {})",
                records.len(),
                key(*threshold)
            );
            if records.is_empty() {
                header
            } else {
                format!("{header}\n{}", record_table(records))
            }
        }
        Response::Loaded {
            path,
            loaded,
            duplicates,
        } => format!(
            "Loaded {} countries from {} ({duplicates} duplicate keys skipped)",
            loaded - duplicates,
            path.display()
        ),
    }
}

/// Pretty-printed JSON rendering
pub fn to_json(response: &Response) -> ShellResult<String> {
    Ok(serde_json::to_string_pretty(response)?)
}
