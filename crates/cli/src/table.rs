// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal column-aligned table rendering for list commands.

use crate::color;
use std::io::Write;

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq)]
enum CellKind {
    Plain,
    Muted,
    Status,
}

pub struct Column {
    header: &'static str,
    align: Align,
    kind: CellKind,
    max_width: Option<usize>,
}

impl Column {
    pub fn left(header: &'static str) -> Self {
        Self {
            header,
            align: Align::Left,
            kind: CellKind::Plain,
            max_width: None,
        }
    }

    pub fn right(header: &'static str) -> Self {
        Self {
            align: Align::Right,
            ..Self::left(header)
        }
    }

    /// Left column rendered in the muted color (ids, timestamps).
    pub fn muted(header: &'static str) -> Self {
        Self {
            kind: CellKind::Muted,
            ..Self::left(header)
        }
    }

    /// Left column colored by state value.
    pub fn status(header: &'static str) -> Self {
        Self {
            kind: CellKind::Status,
            ..Self::left(header)
        }
    }

    pub fn with_max(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self, out: &mut dyn Write) {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell_max = self
                    .rows
                    .iter()
                    .map(|row| row.get(i).map(|c| c.chars().count()).unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                let width = cell_max.max(col.header.chars().count());
                col.max_width.map(|m| width.min(m)).unwrap_or(width)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| pad(col.header, w, col.align))
            .collect();
        let _ = writeln!(out, "{}", header.join("  ").trim_end());

        for row in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (col, &w))| {
                    let raw = row.get(i).map(String::as_str).unwrap_or("");
                    let clipped = clip(raw, w);
                    let padded = pad(&clipped, w, col.align);
                    match col.kind {
                        CellKind::Plain => padded,
                        CellKind::Muted => color::muted(&padded),
                        CellKind::Status => color::status(&padded),
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let padding = " ".repeat(width - len);
    match align {
        Align::Left => format!("{text}{padding}"),
        Align::Right => format!("{padding}{text}"),
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
