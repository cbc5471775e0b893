use serde::Serialize;

use crate::compare::{Record, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Rows keyed by column name. A repeated column name keeps its last value.
    pub fn into_records(self) -> Vec<Record> {
        let names = self.column_names();
        self.rows
            .into_iter()
            .map(|row| names.iter().cloned().zip(row).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_rows_to_records() {
        let set = ResultSet {
            columns: vec![
                Column {
                    name: "id".to_string(),
                    data_type: None,
                },
                Column {
                    name: "name".to_string(),
                    data_type: Some("nvarchar".to_string()),
                },
            ],
            rows: vec![
                vec![Value::Int(1), Value::Text("Ann".to_string())],
                vec![Value::Int(2), Value::Null],
            ],
        };

        assert_eq!(set.column_names(), vec!["id", "name"]);
        let records = set.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&Value::Text("Ann".to_string())));
        assert_eq!(records[1].get("name"), Some(&Value::Null));
    }
}
