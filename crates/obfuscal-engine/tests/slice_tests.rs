//! Tests for the time-slice algebra: boundary semantics, merging and ranges.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use obfuscal_engine::slice::{merge_same_day, DateRange, DateTimeSlice, TimeOfDaySlice};

fn at(day: u32, hhmm: &str) -> NaiveDateTime {
    let date = NaiveDate::from_ymd_opt(2021, 5, day).unwrap();
    date.and_time(NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap())
}

/// Helper: slice on 2021-05-21 between two `HH:MM` times.
fn slice(from: &str, to: &str) -> DateTimeSlice {
    DateTimeSlice::new(at(21, from), at(21, to))
}

fn section(s: &str) -> TimeOfDaySlice {
    s.parse().expect("valid section")
}

// ---------------------------------------------------------------------------
// intersects_or_contains
// ---------------------------------------------------------------------------

#[test]
fn intersects_or_contains_truth_table() {
    let base = slice("10:00", "13:00");

    assert!(!base.intersects_or_contains(&slice("09:00", "10:00")));
    assert!(base.intersects_or_contains(&slice("09:00", "11:00")));
    assert!(base.intersects_or_contains(&slice("10:00", "11:00")));
    assert!(base.intersects_or_contains(&slice("10:01", "11:00")));
    assert!(base.intersects_or_contains(&slice("10:00", "13:00")));
    assert!(base.intersects_or_contains(&slice("10:01", "13:00")));
    assert!(base.intersects_or_contains(&slice("10:00", "14:00")));
    assert!(base.intersects_or_contains(&slice("11:00", "14:00")));
    assert!(!base.intersects_or_contains(&slice("13:00", "14:00")));
}

#[test]
fn enclosing_slice_intersects() {
    let base = slice("10:00", "13:00");
    assert!(base.intersects_or_contains(&slice("08:00", "18:00")));
}

#[test]
fn disjoint_slices_do_not_intersect() {
    let base = slice("10:00", "13:00");
    assert!(!base.intersects_or_contains(&slice("07:00", "08:00")));
    assert!(!base.intersects_or_contains(&slice("14:00", "15:00")));
}

#[test]
fn zero_length_and_end_touching_slices_match() {
    let base = slice("10:00", "13:00");
    assert!(base.intersects_or_contains(&slice("11:00", "11:00")));
    // Touches the end boundary: start < end && end >= end.
    assert!(base.intersects_or_contains(&slice("12:59", "13:00")));
}

#[test]
fn duration_is_end_minus_start() {
    assert_eq!(slice("10:00", "13:30").duration().num_minutes(), 210);
}

// ---------------------------------------------------------------------------
// merge_same_day
// ---------------------------------------------------------------------------

#[test]
fn adjacent_sections_on_same_day_merge() {
    let merged = merge_same_day(vec![slice("10:00", "11:00"), slice("09:00", "10:00")]);
    assert_eq!(merged, vec![slice("09:00", "11:00")]);
}

#[test]
fn chain_of_three_merges_into_one() {
    let merged = merge_same_day(vec![
        slice("08:00", "12:00"),
        slice("12:00", "13:00"),
        slice("13:00", "18:00"),
    ]);
    assert_eq!(merged, vec![slice("08:00", "18:00")]);
}

#[test]
fn gap_on_same_day_keeps_both_blocks() {
    let merged = merge_same_day(vec![slice("08:00", "12:00"), slice("13:00", "18:00")]);
    assert_eq!(merged, vec![slice("08:00", "12:00"), slice("13:00", "18:00")]);
}

#[test]
fn merge_never_crosses_day_boundary() {
    let day1 = DateTimeSlice::new(at(21, "09:00"), at(21, "10:00"));
    let day2 = DateTimeSlice::new(at(22, "00:00"), at(22, "01:00"));
    assert_eq!(merge_same_day(vec![day1, day2]), vec![day1, day2]);

    // Even when the clock boundary matches exactly.
    let late = DateTimeSlice::new(at(21, "23:00"), at(22, "00:00"));
    assert_eq!(merge_same_day(vec![late, day2]), vec![late, day2]);
}

#[test]
fn merge_of_nothing_is_empty() {
    assert!(merge_same_day(Vec::new()).is_empty());
}

// ---------------------------------------------------------------------------
// TimeOfDaySlice
// ---------------------------------------------------------------------------

#[test]
fn section_parses_and_displays_hhmm() {
    let s = section("08:00-12:30");
    assert_eq!(s.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    assert_eq!(s.end, NaiveTime::from_hms_opt(12, 30, 0).unwrap());
    assert_eq!(s.to_string(), "08:00-12:30");
}

#[test]
fn section_rejects_start_after_end() {
    assert!("12:00-08:00".parse::<TimeOfDaySlice>().is_err());
    assert!(TimeOfDaySlice::new(
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    )
    .is_err());
}

#[test]
fn section_rejects_garbage() {
    assert!("0800".parse::<TimeOfDaySlice>().is_err());
    assert!("8am-noon".parse::<TimeOfDaySlice>().is_err());
}

#[test]
fn section_at_date_anchors_both_ends() {
    let anchored = section("08:00-12:00").at_date(NaiveDate::from_ymd_opt(2021, 5, 21).unwrap());
    assert_eq!(anchored, slice("08:00", "12:00"));
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

#[test]
fn date_range_days_are_half_open() {
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
    )
    .unwrap();
    assert_eq!(range.days(), 3);
    let dates: Vec<_> = range.dates().collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        ]
    );
}

#[test]
fn date_range_slice_spans_to_start_of_day_after_end() {
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2021, 5, 21).unwrap(),
        NaiveDate::from_ymd_opt(2021, 5, 22).unwrap(),
    )
    .unwrap();
    let window = range.to_date_time_slice();
    assert_eq!(window.start, at(21, "00:00"));
    assert_eq!(window.end, at(23, "00:00"));
}

#[test]
fn date_range_ending_on_the_last_date_saturates() {
    let range = DateRange::new(NaiveDate::MAX, NaiveDate::MAX).unwrap();
    assert_eq!(range.days(), 0);
    assert_eq!(range.to_date_time_slice().end, NaiveDateTime::MAX);
}

#[test]
fn date_range_rejects_reversed_dates() {
    assert!(DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
    )
    .is_err());
}

#[test]
fn single_day_range_has_no_sections() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let range = DateRange::new(day, day).unwrap();
    assert_eq!(range.days(), 0);
    assert_eq!(range.dates().count(), 0);
}
