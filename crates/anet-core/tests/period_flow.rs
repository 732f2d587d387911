use std::fs;

use anet_core::cli::Command;
use anet_core::commands::{App, dispatch};
use anet_core::config::Settings;
use anet_core::{PeriodCalculator, RecurrenceKind, WeekStart};
use serde_json::Value;
use tempfile::tempdir;

fn run(app: &App, command: Command) -> String {
    let mut out = Vec::new();
    dispatch(app, &command, &mut out).expect("dispatch should succeed");
    String::from_utf8(out).expect("utf8 output")
}

fn periods(recurrence: RecurrenceKind, count: usize, offset: i64, at: &str) -> Command {
    Command::Periods {
        recurrence,
        count,
        offset,
        at: Some(at.to_string()),
        assessments: false,
        allow_future: false,
    }
}

#[test]
fn periods_json_matches_fixture_dates() {
    let app = App::new(Settings::default(), true);

    let text = run(&app, periods(RecurrenceKind::Biweekly, 2, 1, "2020-01-01"));
    let value: Value = serde_json::from_str(&text).expect("json output");

    assert_eq!(value["recurrence"], "biweekly");
    let periods = value["periods"].as_array().expect("periods array");
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0]["start"], "2019-11-25T00:00:00.000");
    assert_eq!(periods[0]["end"], "2019-12-08T23:59:59.999");
    assert_eq!(periods[1]["start"], "2019-12-09T00:00:00.000");
    assert_eq!(periods[1]["end"], "2019-12-22T23:59:59.999");
}

#[test]
fn settings_file_switches_to_sunday_weeks() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("anet-periods.toml");
    fs::write(&path, "[periods]\nuse_iso8601 = false\n").expect("write settings");

    let settings = Settings::resolve(Some(&path), |_| None).expect("load settings");
    let calculator = PeriodCalculator::from_settings(&settings);
    assert_eq!(calculator.week_start(), WeekStart::Sunday);
    assert_eq!(calculator.timezone(), chrono_tz::UTC);

    let app = App::new(settings, true);
    let text = run(&app, periods(RecurrenceKind::Weekly, 1, 0, "2020-01-01"));
    let value: Value = serde_json::from_str(&text).expect("json output");
    assert_eq!(value["periods"][0]["start"], "2019-12-29T00:00:00.000");
    assert_eq!(value["periods"][0]["end"], "2020-01-04T23:59:59.999");
}

#[test]
fn assessment_table_marks_open_periods() {
    let app = App::new(Settings::default(), false);
    let text = run(
        &app,
        Command::Periods {
            recurrence: RecurrenceKind::Semiannually,
            count: 3,
            offset: -1,
            at: Some("2020-07-01".to_string()),
            assessments: true,
            allow_future: false,
        },
    );

    let rows: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains("1 January - 30 June 2020"));
    assert!(rows[0].ends_with("yes"));
    assert!(rows[1].contains("1 July - 31 December 2020"));
    assert!(rows[1].ends_with("no"));
    assert!(rows[2].contains("1 January - 30 June 2021"));
    assert!(rows[2].ends_with("no"));
}

#[test]
fn label_and_contains_commands() {
    let app = App::new(Settings::default(), false);

    let label = run(
        &app,
        Command::Label {
            start: "2019-12-15".to_string(),
            end: "2019-12-31T23:59:59".to_string(),
        },
    );
    assert_eq!(label, "15 - 31 December 2019\n");

    let inside = run(
        &app,
        Command::Contains {
            instant: "2019-12-15 08:00".to_string(),
            start: "2019-12-15".to_string(),
            end: "2019-12-31T23:59:59".to_string(),
        },
    );
    assert_eq!(inside, "yes\n");

    let at_end = run(
        &app,
        Command::Contains {
            instant: "2019-12-31T23:59:59".to_string(),
            start: "2019-12-15".to_string(),
            end: "2019-12-31T23:59:59".to_string(),
        },
    );
    assert_eq!(at_end, "no\n");
}

#[test]
fn overlaps_command_reads_tenure_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    fs::write(
        &path,
        r#"[
            {"startTime": 0, "endTime": 10},
            {"startTime": 5, "endTime": 15},
            {"startTime": 20, "endTime": 30},
            {"startTime": 40, "endTime": 35}
        ]"#,
    )
    .expect("write history");

    let app = App::new(Settings::default(), true);
    let text = run(&app, Command::Overlaps { input: path });
    let value: Value = serde_json::from_str(&text).expect("json output");
    assert_eq!(value["overlapping"], serde_json::json!([[0, 1]]));
    assert_eq!(value["invalid"], serde_json::json!([3]));
}

#[test]
fn fit_command_uses_breakpoints() {
    let app = App::new(Settings::default(), false);
    assert_eq!(
        run(
            &app,
            Command::Fit {
                width: 700.0,
                recurrence: None
            }
        ),
        "2\n"
    );

    let json_app = App::new(Settings::default(), true);
    let text = run(
        &json_app,
        Command::Fit {
            width: 1200.0,
            recurrence: Some(RecurrenceKind::Monthly),
        },
    );
    let value: Value = serde_json::from_str(&text).expect("json output");
    assert_eq!(value["periods"].as_array().map(Vec::len), Some(3));
}

#[test]
fn non_periodic_recurrence_fails_fast() {
    let app = App::new(Settings::default(), false);
    let mut out = Vec::new();
    let err = dispatch(
        &app,
        &periods(RecurrenceKind::OnDemand, 1, 0, "2020-01-01"),
        &mut out,
    )
    .expect_err("ondemand has no periods");
    assert!(format!("{err:#}").contains("does not produce periods"));
    assert!(out.is_empty());
}
