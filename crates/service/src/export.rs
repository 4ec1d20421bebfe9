use std::collections::HashSet;

use serde_json::Value;

use models::application;

use crate::errors::ServiceError;

const FIXED_COLUMNS: [&str; 6] =
    ["ID", "Telegram ID", "Status", "Admin Comment", "Created At", "Updated At"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flatten applications into a tabular CSV export for offline review.
///
/// One row per application: the fixed columns above, then every key seen in
/// any application's `data` payload, in order of first appearance across the
/// input. Rows lacking a key leave the cell blank.
///
/// An empty input produces a zero-byte output, not a header-only file, so
/// callers can distinguish "nothing to export" from a malformed result.
pub fn build_applications_csv(applications: &[application::Model]) -> Result<Vec<u8>, ServiceError> {
    if applications.is_empty() {
        return Ok(Vec::new());
    }

    let mut data_columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for app in applications {
        if let Some(map) = app.data.as_object() {
            for key in map.keys() {
                if seen.insert(key.clone()) {
                    data_columns.push(key.clone());
                }
            }
        }
    }

    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
    header.extend(data_columns.iter().map(String::as_str));
    wtr.write_record(&header).map_err(csv_err)?;

    for app in applications {
        let mut record: Vec<String> = vec![
            app.id.to_string(),
            app.telegram_id.map(|v| v.to_string()).unwrap_or_default(),
            app.status.clone(),
            app.admin_comment.clone().unwrap_or_default(),
            app.created_at.format(TIMESTAMP_FORMAT).to_string(),
            app.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ];
        let map = app.data.as_object();
        for key in &data_columns {
            let cell = map.and_then(|m| m.get(key)).map(cell_text).unwrap_or_default();
            record.push(cell);
        }
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.into_inner().map_err(|e| ServiceError::Export(e.to_string()))
}

/// String values go out raw; everything else as compact JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_err(e: csv::Error) -> ServiceError {
    ServiceError::Export(e.to_string())
}
