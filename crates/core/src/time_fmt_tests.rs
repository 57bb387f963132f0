// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    seconds = { 5, "5s" },
    minutes = { 150, "2m" },
    hours   = { 7200, "2h" },
    days    = { 260_000, "3d" },
)]
fn elapsed_formats(secs: u64, want: &str) {
    assert_eq!(format_elapsed(secs), want);
}

#[test]
fn time_ago_saturates_and_handles_zero() {
    assert_eq!(format_time_ago(0, 10_000), "-");
    assert_eq!(format_time_ago(4_000, 10_000), "6s");
    // Clock skew: timestamp in the future reads as "0s", not a panic.
    assert_eq!(format_time_ago(20_000, 10_000), "0s");
}
