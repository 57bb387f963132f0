// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl config` - typed configuration get/set/reset.
//!
//! `db_path` is written to the `queuectl.toml` sidecar (it must be readable
//! before the database can be opened); every other key is an override row in
//! the store's config table.

use clap::{Args, Subcommand};
use queuectl_core::{settings, Home, Settings};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one key, or the whole effective configuration
    Get {
        /// Config key
        key: Option<String>,
    },
    /// Set a key (validated against the schema)
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Restore one key (or everything) to defaults
    Reset {
        /// Config key
        key: Option<String>,
    },
}

pub fn handle(args: ConfigArgs, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    match args.command {
        ConfigCommand::Get { key } => get(key.as_deref(), home, format),
        ConfigCommand::Set { key, value } => set(&key, &value, home, format),
        ConfigCommand::Reset { key } => reset(key.as_deref(), home, format),
    }
}

fn effective_settings(home: &Home) -> Result<Settings, ExitError> {
    let (store, db_path) = super::open_store(home)?;
    Ok(queuectl_engine::load_settings(
        &store,
        &db_path.to_string_lossy(),
    )?)
}

fn get(key: Option<&str>, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let current = effective_settings(home)?;
    match key {
        Some(key) => {
            let value = current.value(key)?;
            format_or_json(format, &serde_json::json!({ key: value }), || {
                println!("{value}");
            })
        }
        None => {
            let pairs = current.pairs();
            format_or_json(format, &current, || {
                let mut table = Table::new(vec![Column::left("KEY"), Column::left("VALUE")]);
                for (key, value) in &pairs {
                    table.row(vec![key.to_string(), value.clone()]);
                }
                table.render(&mut std::io::stdout());
            })
        }
    }
}

fn set(key: &str, value: &str, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    // Validate type and range before anything is persisted.
    let mut probe = Settings::default();
    probe.apply(key, value)?;

    if key == "db_path" {
        settings::write_db_path_override(&home.settings_path(), value)?;
    } else {
        let (store, _) = super::open_store(home)?;
        store.set_config(key, value)?;
    }

    let obj = serde_json::json!({ "key": key, "value": value });
    format_or_json(format, &obj, || {
        println!("Set {key} = {value}");
    })
}

fn reset(key: Option<&str>, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    match key {
        Some("db_path") => {
            settings::clear_db_path_override(&home.settings_path())?;
        }
        Some(key) => {
            // Reject unknown keys with a usage error before touching the DB.
            Settings::default().value(key)?;
            let (store, _) = super::open_store(home)?;
            store.reset_config(Some(key))?;
        }
        None => {
            let (store, _) = super::open_store(home)?;
            store.reset_config(None)?;
            settings::clear_db_path_override(&home.settings_path())?;
        }
    }

    let obj = serde_json::json!({ "reset": key.unwrap_or("all") });
    format_or_json(format, &obj, || match key {
        Some(key) => println!("Reset {key} to default"),
        None => println!("Reset all config to defaults"),
    })
}
