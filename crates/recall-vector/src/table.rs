//! LanceDB connection helpers.
use anyhow::{Context, Result};
use lancedb::{connect, Connection};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.with_context(|| format!("failed to open LanceDB at {uri}"))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Quote a string literal for a LanceDB SQL filter.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::sql_literal;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(sql_literal("tenant"), "'tenant'");
        assert_eq!(sql_literal("o'brien"), "'o''brien'");
    }
}
