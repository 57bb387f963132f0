// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn pads_columns_to_widest_cell() {
    let mut table = Table::new(vec![Column::left("ID"), Column::left("STATE")]);
    table.row(vec!["hw".to_string(), "pending".to_string()]);
    table.row(vec!["long-id".to_string(), "dlq".to_string()]);

    let out = render(&table);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID       STATE");
    assert_eq!(lines[1], "hw       pending");
    assert_eq!(lines[2], "long-id  dlq");
}

#[test]
fn right_aligns_numeric_columns() {
    let mut table = Table::new(vec![Column::left("ID"), Column::right("ATTEMPTS")]);
    table.row(vec!["a".to_string(), "2".to_string()]);

    let out = render(&table);
    assert_eq!(out.lines().nth(1), Some("a          2"));
}

#[test]
fn clips_cells_beyond_max_width() {
    let mut table = Table::new(vec![Column::left("ERROR").with_max(8)]);
    table.row(vec!["a very long error message".to_string()]);

    let out = render(&table);
    assert_eq!(out.lines().nth(1), Some("a very …"));
}

#[test]
fn missing_cells_render_empty() {
    let mut table = Table::new(vec![Column::left("A"), Column::left("B")]);
    table.row(vec!["x".to_string()]);

    let out = render(&table);
    assert_eq!(out.lines().nth(1), Some("x"));
}
