use chrono::NaiveDate;
use pcal_grid::CurveNumbers;
use pcal_results::{
    LedgerHeader, LedgerRow, LedgerScores, ResultLedger, ResultsError, RowOutcome, read_ledger,
};

fn header(basin_column: bool) -> LedgerHeader {
    LedgerHeader {
        started: NaiveDate::from_ymd_opt(2018, 11, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
        site: "Bunny".to_string(),
        period: "2017-2018".to_string(),
        field_condition: "Straight Row Crop Poor Hydrologic Condition".to_string(),
        basin_column,
    }
}

fn scored(trial: u32, infiltration: f64, nse: f64, basin: Option<&str>) -> LedgerRow {
    LedgerRow {
        trial,
        curve_numbers: CurveNumbers::new(72, 81, 88, 91).unwrap(),
        infiltration_mm_day: infiltration,
        outcome: RowOutcome::Scored(LedgerScores {
            nse,
            pbias: 4.5,
            rsr: 0.3,
            r2: 0.9,
        }),
        basin: basin.map(str::to_string),
    }
}

#[test]
fn appends_leave_header_untouched() {
    let path = std::env::temp_dir().join("pcal_results_two_trials.csv");
    let header = header(false);
    let mut ledger = ResultLedger::create(&path, &header).unwrap();
    let header_text = std::fs::read_to_string(&path).unwrap();

    ledger.append(&[scored(0, 10.0, 0.25, None)]).unwrap();
    ledger.append(&[scored(1, 15.0, 0.5, None)]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&header_text));
    let rows: Vec<&str> = text[header_text.len()..].lines().collect();
    assert_eq!(
        rows,
        vec![
            "0,72.,81.,88.,91.,10,0.25,4.5,0.3,0.9",
            "1,72.,81.,88.,91.,15,0.5,4.5,0.3,0.9"
        ]
    );
    assert_eq!(ledger.rows_written(), 2);
}

#[test]
fn create_truncates_previous_sweep() {
    let path = std::env::temp_dir().join("pcal_results_truncate.csv");
    let mut ledger = ResultLedger::create(&path, &header(false)).unwrap();
    ledger.append(&[scored(0, 10.0, 0.25, None)]).unwrap();

    ResultLedger::create(&path, &header(false)).unwrap();
    assert!(read_ledger(&path).unwrap().rows.is_empty());
}

#[test]
fn multi_basin_rows_read_back_with_labels_and_failures() {
    let path = std::env::temp_dir().join("pcal_results_multi.csv");
    let mut ledger = ResultLedger::create(&path, &header(true)).unwrap();
    ledger
        .append(&[scored(0, 62.0, 0.4, Some("Hen")), scored(0, 62.0, -0.2, Some("Plume"))])
        .unwrap();
    let failed = LedgerRow {
        trial: 1,
        curve_numbers: CurveNumbers::new(72, 81, 88, 91).unwrap(),
        infiltration_mm_day: 64.0,
        outcome: RowOutcome::Failed,
        basin: Some("Hen".to_string()),
    };
    ledger.append(&[failed.clone()]).unwrap();

    let read = read_ledger(&path).unwrap();
    assert_eq!(read.site.as_deref(), Some("Bunny"));
    assert_eq!(read.period.as_deref(), Some("2017-2018"));
    assert_eq!(read.rows.len(), 3);
    assert_eq!(read.rows[1].basin.as_deref(), Some("Plume"));
    assert_eq!(read.rows[1].scores().unwrap().nse, -0.2);
    assert_eq!(read.rows[2], failed);
    assert_eq!(read.failed_count(), 1);
    assert_eq!(read.scored().count(), 2);
}

#[test]
fn row_without_label_is_rejected_in_multi_basin_ledger() {
    let path = std::env::temp_dir().join("pcal_results_label_check.csv");
    let mut ledger = ResultLedger::create(&path, &header(true)).unwrap();
    let err = ledger.append(&[scored(0, 10.0, 0.1, None)]).unwrap_err();
    assert!(matches!(err, ResultsError::BasinColumn { trial: 0 }));
}

#[test]
fn hand_edited_rows_are_read_and_bad_rows_name_their_line() {
    let path = std::env::temp_dir().join("pcal_results_hand_edited.csv");
    ResultLedger::create(&path, &header(false)).unwrap();
    let mut text = std::fs::read_to_string(&path).unwrap();
    text.push_str("0, 72., 81., 88., 91., 10, 0.25, 4.5, 0.3, 0.9\n\n");
    text.push_str("1,72.,81.,88.,91.,15, FAILED ,,,\n");
    std::fs::write(&path, &text).unwrap();

    let read = read_ledger(&path).unwrap();
    assert_eq!(read.rows.len(), 2);
    assert_eq!(read.rows[0], scored(0, 10.0, 0.25, None));
    assert_eq!(read.rows[1].outcome, RowOutcome::Failed);

    // header block is nine lines; rows above occupy lines 10 to 12
    text.push_str("2,72.,81.,88.,91.,wet,0.1,0.2,0.3,0.4\n");
    std::fs::write(&path, &text).unwrap();
    let err = read_ledger(&path).unwrap_err();
    assert!(matches!(err, ResultsError::Malformed { line: 13, .. }));
}
