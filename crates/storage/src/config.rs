// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config table operations: flat key/value overrides over the defaults.

use crate::store::{Store, StoreError};
use rusqlite::{params, OptionalExtension};

impl Store {
    pub fn get_config(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    /// Remove one override, or all of them. Returns how many rows were
    /// deleted.
    pub fn reset_config(&self, key: Option<&str>) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n = match key {
                Some(key) => conn.execute("DELETE FROM config WHERE key = ?1", [key])?,
                None => conn.execute("DELETE FROM config", [])?,
            };
            Ok(n)
        })
    }

    /// Every stored override, sorted by key.
    pub fn all_config(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached("SELECT key, value FROM config ORDER BY key ASC")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
