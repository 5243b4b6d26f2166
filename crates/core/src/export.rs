// crates/core/src/export.rs
//! Table enrichment exporter: merges engine output with the original table
//! shape and serializes it as CSV.

use std::collections::HashSet;

use crate::error::ExportError;
use crate::store::TableStore;
use crate::table::{EnrichedRow, Table, TableId};
use crate::template::TemplateConfig;

/// Merge the enriched prefix with the untouched tail of the original table.
///
/// A run that paused or stopped early leaves later rows unprocessed; they
/// are exported as-is, with output columns simply absent. Sentinels are
/// never synthesized retroactively.
pub fn merge_with_originals(table: &Table, enriched: &[EnrichedRow]) -> Vec<EnrichedRow> {
    let mut rows: Vec<EnrichedRow> = enriched.to_vec();
    rows.extend(table.rows.iter().skip(enriched.len()).cloned());
    rows
}

/// Header union: original field order first, then output columns in template
/// order (only those actually present), then any remaining keys sorted for a
/// stable result.
fn header_union(
    field_names: &[String],
    configs: &[TemplateConfig],
    rows: &[EnrichedRow],
) -> Vec<String> {
    let mut headers: Vec<String> = field_names.to_vec();
    let mut seen: HashSet<String> = headers.iter().cloned().collect();

    let present = |name: &str| rows.iter().any(|r| r.contains_key(name));

    for config in configs {
        let name = &config.output_field_name;
        if !seen.contains(name) && present(name) {
            headers.push(name.clone());
            seen.insert(name.clone());
        }
    }

    let mut extras: Vec<String> = rows
        .iter()
        .flat_map(|r| r.keys())
        .filter(|k| !seen.contains(*k))
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    extras.sort();
    headers.extend(extras);
    headers
}

/// Serialize the table plus enriched rows as CSV.
///
/// Fails with `TableNotFound` if the table is not registered. Quoting and
/// escaping are delegated to the csv crate.
pub fn export(
    store: &dyn TableStore,
    table_id: TableId,
    enriched: &[EnrichedRow],
) -> Result<String, ExportError> {
    let table = store.get_table_data(table_id)?;
    let configs = store.get_template_configs(table_id)?;

    let rows = merge_with_originals(&table, enriched);
    let headers = header_union(&table.field_names, &configs, &rows);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for row in &rows {
        let record: Vec<&str> = headers
            .iter()
            .map(|h| row.get(h).and_then(|v| v.as_deref()).unwrap_or(""))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}
