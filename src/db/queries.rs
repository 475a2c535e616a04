use rusqlite::{params, Connection};

// ── Key-value store ──

pub fn get_value(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_get_missing_key() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(get_value(&conn, "bookings").unwrap(), None);
    }

    #[test]
    fn test_set_then_overwrite() {
        let conn = db::init_db(":memory:").unwrap();
        set_value(&conn, "webhookUrl", "https://a.example").unwrap();
        set_value(&conn, "webhookUrl", "https://b.example").unwrap();
        assert_eq!(
            get_value(&conn, "webhookUrl").unwrap().as_deref(),
            Some("https://b.example")
        );
    }
}
