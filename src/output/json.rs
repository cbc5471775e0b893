use serde::Serialize;
use serde_json::json;

use crate::compare::{ColumnStats, ComparisonResult};
use crate::config::ResolvedConfig;

pub fn emit_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

pub fn emit_json_value(value: &serde_json::Value, pretty: bool) -> anyhow::Result<String> {
    emit_json(value, pretty)
}

pub fn error_json(message: &str, kind: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "kind": kind,
        }
    })
}

/// Full comparison document. Rows carry their key as an object and one
/// `{source, target, matched}` entry per compared column.
pub fn comparison_to_json(result: &ComparisonResult, stats: &[ColumnStats]) -> serde_json::Value {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let key: serde_json::Map<String, serde_json::Value> = result
                .key_columns
                .iter()
                .zip(row.key_values.iter())
                .map(|(column, value)| (column.clone(), json!(value)))
                .collect();
            let cells: serde_json::Map<String, serde_json::Value> = row
                .cells
                .iter()
                .map(|cell| {
                    (
                        cell.column.clone(),
                        json!({
                            "source": cell.source,
                            "target": cell.target,
                            "matched": cell.matched,
                        }),
                    )
                })
                .collect();
            json!({
                "status": row.status.as_str(),
                "key": key,
                "columns": cells,
            })
        })
        .collect::<Vec<_>>();

    let column_stats = stats
        .iter()
        .map(|entry| {
            json!({
                "column": entry.column,
                "total": entry.total,
                "matches": entry.matches,
                "mismatches": entry.mismatches,
                "matchPercentage": entry.match_percentage(),
                "verdict": entry.verdict(),
            })
        })
        .collect::<Vec<_>>();

    json!({
        "tableName": result.table_name,
        "source": result.source_label,
        "target": result.target_label,
        "keyColumns": result.key_columns,
        "compareColumns": result.compare_columns,
        "summary": result.summary,
        "duplicates": result.duplicates,
        "columnStats": column_stats,
        "rows": rows,
    })
}

pub fn config_to_json(resolved: &ResolvedConfig) -> serde_json::Value {
    json!({
        "configPath": resolved.config_path.as_ref().map(|p| p.display().to_string()),
        "profileName": resolved.profile_name,
        "connection": {
            "server": resolved.connection.server,
            "port": resolved.connection.port,
            "database": resolved.connection.database,
            "user": resolved.connection.user,
            "password": resolved.connection.password.as_ref().map(|_| "********"),
            "encrypt": resolved.connection.encrypt,
            "trustCert": resolved.connection.trust_cert,
            "timeoutMs": resolved.connection.timeout_ms,
            "defaultSchema": resolved.connection.default_schema,
        },
        "settings": {
            "output": {
                "defaultFormat": resolved.settings.output.default_format.as_str(),
                "json": {
                    "pretty": resolved.settings.output.json_pretty,
                },
            },
            "compare": {
                "maxRows": resolved.settings.compare.max_rows,
                "duplicateKeys": resolved.settings.compare.duplicate_keys.as_str(),
                "maxCellWidth": resolved.settings.compare.max_cell_width,
            }
        }
    })
}
