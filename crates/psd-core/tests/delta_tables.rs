use psd_core::common::ExtractionConfig;
use psd_core::domain::{PsdWarning, ResponseKind};
use psd_core::modules::delta::DEFAULT_ZERO_TOLERANCE;
use psd_core::modules::{
    DeltaModule, DeltaRequest, compute_delta, extract_features, load_table_csv,
    parse_bush_source, render_bush_cards, verify_zero,
};
use psd_core::modules::serialization::write_table_csv;
use std::fs;
use tempfile::TempDir;

const BASELINE_RUN: &str = "\
$ACCE 0 222 3 PSD
1 1.0 0.5 0
2 2.0 1.5 0
3 3.0 0.2 0
$ACCE 0 301 3 PSD
1 1.0 0.1 0
2 2.0 0.3 0
3 3.0 0.1 0
";

const STIFFER_RUN: &str = "\
$ACCE 0 222 3 PSD
1 1.0 0.5 0
2 2.0 1.0 0
3 3.0 0.2 0
$ACCE 0 301 3 PSD
1 1.0 0.1 0
2 2.0 0.3 0
3 3.0 0.1 0
";

#[test]
fn changed_run_shows_baseline_minus_current_only_where_it_moved() {
    let config = ExtractionConfig::default();
    let baseline = extract_features(BASELINE_RUN, "baseline.pch", &config).expect("baseline");
    let current = extract_features(STIFFER_RUN, "current.pch", &config).expect("current");

    let outcome = compute_delta(
        current.table(ResponseKind::Acceleration),
        baseline.table(ResponseKind::Acceleration),
        config.delta_deadband,
    )
    .expect("delta should succeed");
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let table = &outcome.table;
    let area = table
        .cell("ACCE_T1_Area", "Node_222")
        .expect("area delta should exist");
    assert!((area - 0.5).abs() < 1.0e-12);
    assert_eq!(table.cell("ACCE_T1_PSD_2", "Node_222"), Some(0.5));
    assert_eq!(table.cell("ACCE_T1_Frequency_2", "Node_222"), Some(0.0));
    assert!(
        table
            .cell("ACCE_T2_Area", "Node_222")
            .is_some_and(f64::is_nan)
    );

    let report = verify_zero(table, DEFAULT_ZERO_TOLERANCE);
    assert!(!report.passed());
    let failures: Vec<&str> = report.failures().map(|check| check.column.as_str()).collect();
    assert_eq!(failures, ["Node_222"]);
}

#[test]
fn delta_module_reads_tables_written_by_an_earlier_run() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = ExtractionConfig::default();
    let baseline = extract_features(BASELINE_RUN, "baseline.pch", &config).expect("baseline");
    let current = extract_features(
        "$ACCE 0 222 3 PSD\n1 1.0 0.5 0\n2 2.0 1.5 0\n3 3.0 0.2 0\n",
        "current.pch",
        &config,
    )
    .expect("current");

    let baseline_path = temp.path().join("baseline.csv");
    let current_path = temp.path().join("current.csv");
    write_table_csv(&baseline_path, baseline.table(ResponseKind::Acceleration), 10)
        .expect("baseline table should be written");
    write_table_csv(&current_path, current.table(ResponseKind::Acceleration), 10)
        .expect("current table should be written");

    let output = temp.path().join("delta.csv");
    let outcome = DeltaModule
        .run(&DeltaRequest::new(&current_path, &baseline_path, &output))
        .expect("delta should succeed");

    // Node_301 exists only in the baseline and is dropped.
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.table.column_names().collect::<Vec<_>>(), ["Node_222"]);
    let written = load_table_csv(&output).expect("delta table should load");
    assert!(verify_zero(&written, DEFAULT_ZERO_TOLERANCE).passed());
}

#[test]
fn reordered_baseline_rows_are_matched_by_name() {
    let temp = TempDir::new().expect("tempdir should be created");
    let current = temp.path().join("current.csv");
    let baseline = temp.path().join("baseline.csv");
    fs::write(
        &current,
        "Measurement,Node_1\nACCE_T1_Area,1.0\nACCE_T1_Frequency_1,5.0\n",
    )
    .expect("current should be written");
    fs::write(
        &baseline,
        "Measurement,Node_1\nACCE_T1_Frequency_1,5.0\nACCE_T1_Area,3.0\n",
    )
    .expect("baseline should be written");

    let outcome = DeltaModule
        .run(&DeltaRequest::new(
            &current,
            &baseline,
            temp.path().join("delta.csv"),
        ))
        .expect("delta should succeed");

    assert!(matches!(
        outcome.warnings.as_slice(),
        [PsdWarning::SchemaMismatch { shared_rows: 2, .. }]
    ));
    assert_eq!(outcome.table.cell("ACCE_T1_Area", "Node_1"), Some(2.0));
    assert_eq!(outcome.table.cell("ACCE_T1_Frequency_1", "Node_1"), Some(0.0));
}

#[test]
fn stiffness_deck_survives_a_render_and_reparse() {
    let source = "\
$ bracket joints
PBUSH   11      K       1.+6    1.+6    1.+6    1.+8    1.+8    1.+8
PBUSH   12      K       1.+6    1.+6    1.+6    1.+13   1.+13   1.+13
";
    let deck = parse_bush_source(source);
    assert!(deck.warnings.is_empty());

    let rendered = render_bush_cards(deck.cards.values()).expect("cards should render");
    let reparsed = parse_bush_source(&rendered);
    assert_eq!(reparsed.cards, deck.cards);
    assert_eq!(reparsed.cards[&12].rotational_levels(), [Some(10); 3]);
}
