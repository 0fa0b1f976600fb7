use thiserror::Error;

use crate::columns::LogicalField;
use crate::model::TableKind;

#[derive(Debug, Error)]
pub enum JoinError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty alias list, duplicate tier, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// No header in the table matches any alias of a required field.
    #[error("{table} table: no column for '{field}' (accepted headers: {aliases})")]
    MissingColumn {
        table: TableKind,
        field: LogicalField,
        aliases: String,
    },
    /// Input text could not be read as a delimited table.
    #[error("{table} table: {message}")]
    Csv { table: TableKind, message: String },
    /// Output table could not be serialized.
    #[error("output: {0}")]
    Output(String),
}

impl JoinError {
    pub fn missing_column(table: TableKind, field: LogicalField, aliases: &[String]) -> Self {
        Self::MissingColumn {
            table,
            field,
            aliases: aliases.join(", "),
        }
    }
}
