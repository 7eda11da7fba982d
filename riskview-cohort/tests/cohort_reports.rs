use std::fs;

use riskview_cohort::{high_risk_alerts, load_cohort_str, risk_by_age_band, summarize_cohort};
use riskview_core::{RiskConfig, RiskTier};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_fixture_cohort() -> Vec<riskview_core::Patient> {
    let document = fs::read_to_string(fixture_path("dashboard_cohort.json"))
        .expect("Không đọc được cohort mẫu");
    load_cohort_str(&document)
        .expect("Không parse được cohort")
        .patients
}

#[test]
fn summary_counts_match_the_upstream_document() {
    let patients = load_fixture_cohort();
    let summary = summarize_cohort(&patients, &RiskConfig::default());

    assert_eq!(summary.total_patients, 6);
    assert_eq!(summary.average_risk, 60.1);
    assert_eq!(summary.high_risk_alerts, 4);
    assert_eq!(summary.critical_risk_alerts, 2);

    let by_level: Vec<(RiskTier, usize, f64)> = summary
        .risk_distribution
        .iter()
        .map(|bucket| (bucket.level, bucket.count, bucket.percentage))
        .collect();
    assert_eq!(
        by_level,
        vec![
            (RiskTier::Low, 1, 16.7),
            (RiskTier::Medium, 1, 16.7),
            (RiskTier::High, 2, 33.3),
            (RiskTier::Critical, 2, 33.3),
        ]
    );
}

#[test]
fn empty_cohort_summary_is_all_zeros() {
    let summary = summarize_cohort(&[], &RiskConfig::default());

    assert_eq!(summary.total_patients, 0);
    assert_eq!(summary.average_risk, 0.0);
    assert_eq!(summary.high_risk_alerts, 0);
    assert_eq!(summary.critical_risk_alerts, 0);
    assert!(summary
        .risk_distribution
        .iter()
        .all(|bucket| bucket.count == 0 && bucket.percentage == 0.0));
}

#[test]
fn alert_report_counts_cover_the_full_set_despite_truncation() {
    let patients = load_fixture_cohort();
    let report = high_risk_alerts(&patients, &RiskConfig::default(), 3);

    assert_eq!(report.alert_count, 4);
    assert_eq!(report.critical_count, 2);
    assert_eq!(report.high_count, 2);
    assert_eq!(report.patients.len(), 3);

    let risks: Vec<f64> = report
        .patients
        .iter()
        .map(|profile| profile.patient.risk_percentage)
        .collect();
    assert_eq!(risks, vec![91.5, 85.0, 67.2]);
}

#[test]
fn age_bands_cover_the_fixed_ranges() {
    let patients = load_fixture_cohort();
    let bands = risk_by_age_band(&patients);

    let as_tuples: Vec<(&str, usize, f64, f64)> = bands
        .iter()
        .map(|stats| {
            (
                stats.band.as_str(),
                stats.count,
                stats.avg_risk,
                stats.max_risk,
            )
        })
        .collect();

    assert_eq!(
        as_tuples,
        vec![
            ("18-35", 1, 12.0, 12.0),
            ("36-50", 1, 45.0, 45.0),
            ("51-65", 2, 63.6, 67.2),
            ("66-80", 1, 85.0, 85.0),
            ("80+", 1, 91.5, 91.5),
        ]
    );
}

#[test]
fn age_bands_for_empty_cohort_report_zeros() {
    let bands = risk_by_age_band(&[]);
    assert_eq!(bands.len(), 5);
    assert!(bands
        .iter()
        .all(|stats| stats.count == 0 && stats.avg_risk == 0.0 && stats.max_risk == 0.0));
}
