//! Dashboard JSON document to annotated cohort queries and reports.

use std::cmp::Ordering;

use riskview_core::{assess, Gender, Patient, RiskAssessment, RiskConfig, RiskError, RiskTier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A patient cohort parsed from the upstream dashboard document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Cohort {
    pub patients: Vec<Patient>,
}

/// Parse a cohort from a JSON string.
pub fn load_cohort_str(document_json: &str) -> Result<Cohort, RiskError> {
    let value: Value =
        serde_json::from_str(document_json).map_err(|err| RiskError::Parse(err.to_string()))?;
    load_cohort_value(&value)
}

/// Parse a cohort from a `serde_json::Value`.
///
/// Accepts either the full dashboard document (`{"metadata": …, "summary": …,
/// "patients": […]}`) or a bare patient array. Risk percentages are validated
/// here; the pure classifier clamps instead of failing.
pub fn load_cohort_value(document: &Value) -> Result<Cohort, RiskError> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(_) => document
            .get("patients")
            .and_then(Value::as_array)
            .ok_or(RiskError::MissingData)?,
        _ => return Err(RiskError::MissingData),
    };

    let mut patients = Vec::with_capacity(entries.len());
    for entry in entries {
        let patient: Patient = serde_json::from_value(entry.clone())
            .map_err(|err| RiskError::Parse(err.to_string()))?;
        validate_risk(patient.risk_percentage)?;
        patients.push(patient);
    }

    Ok(Cohort { patients })
}

fn validate_risk(risk_percentage: f64) -> Result<(), RiskError> {
    if !risk_percentage.is_finite() || !(0.0..=100.0).contains(&risk_percentage) {
        return Err(RiskError::InvalidPercentage(risk_percentage));
    }
    Ok(())
}

/// Optional query criteria; a patient passes only if every supplied
/// criterion matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CohortFilter {
    pub risk_level: Option<RiskTier>,
    pub min_risk: Option<f64>,
    pub max_risk: Option<f64>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub gender: Option<Gender>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl CohortFilter {
    fn matches(&self, patient: &Patient, config: &RiskConfig) -> bool {
        if let Some(level) = self.risk_level {
            if RiskTier::from_percentage(patient.risk_percentage, &config.tiers) != level {
                return false;
            }
        }
        if let Some(min) = self.min_risk {
            if patient.risk_percentage < min {
                return false;
            }
        }
        if let Some(max) = self.max_risk {
            if patient.risk_percentage > max {
                return false;
            }
        }
        if let Some(min) = self.age_min {
            if patient.age < min {
                return false;
            }
        }
        if let Some(max) = self.age_max {
            if patient.age > max {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if patient.gender != gender {
                return false;
            }
        }
        true
    }
}

/// One patient annotated with normalized conditions and a full assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    #[serde(flatten)]
    pub patient: Patient,
    pub condition_names: Vec<String>,
    pub total_conditions: usize,
    pub assessment: RiskAssessment,
}

/// Annotate one patient record for display.
pub fn build_profile(patient: &Patient, config: &RiskConfig) -> PatientProfile {
    PatientProfile {
        condition_names: patient.conditions.display_names(),
        total_conditions: patient.conditions.total(),
        assessment: assess(patient, config),
        patient: patient.clone(),
    }
}

/// Filter, annotate and order a cohort by clinical priority.
///
/// Output is sorted by descending priority, ties broken by descending risk
/// percentage; `offset`/`limit` are applied after sorting.
pub fn query_cohort(
    patients: &[Patient],
    filter: &CohortFilter,
    config: &RiskConfig,
) -> Vec<PatientProfile> {
    let mut rows: Vec<PatientProfile> = patients
        .iter()
        .filter(|patient| filter.matches(patient, config))
        .map(|patient| build_profile(patient, config))
        .collect();

    rows.sort_by(|a, b| {
        b.assessment
            .priority
            .cmp(&a.assessment.priority)
            .then_with(|| compare_risk_desc(&a.patient, &b.patient))
    });

    let offset = filter.offset.unwrap_or(0);
    let mut rows = if offset == 0 {
        rows
    } else if offset >= rows.len() {
        Vec::new()
    } else {
        rows.split_off(offset)
    };

    if let Some(limit) = filter.limit {
        rows.truncate(limit);
    }

    rows
}

fn compare_risk_desc(a: &Patient, b: &Patient) -> Ordering {
    b.risk_percentage
        .partial_cmp(&a.risk_percentage)
        .unwrap_or(Ordering::Equal)
}

/// Patient count and share for one tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBucket {
    pub level: RiskTier,
    pub count: usize,
    pub percentage: f64,
}

/// Cohort-wide distribution and alert counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortSummary {
    pub total_patients: usize,
    pub average_risk: f64,
    pub high_risk_alerts: usize,
    pub critical_risk_alerts: usize,
    pub risk_distribution: Vec<TierBucket>,
}

/// Summarize a cohort: per-tier counts, average risk and alert totals.
pub fn summarize_cohort(patients: &[Patient], config: &RiskConfig) -> CohortSummary {
    let total = patients.len();
    let mut counts = [0usize; 4];
    let mut risk_sum = 0.0;

    for patient in patients {
        let tier = RiskTier::from_percentage(patient.risk_percentage, &config.tiers);
        counts[usize::from(tier.priority() - 1)] += 1;
        risk_sum += patient.risk_percentage;
    }

    let risk_distribution = RiskTier::ALL
        .iter()
        .map(|tier| {
            let count = counts[usize::from(tier.priority() - 1)];
            let percentage = if total == 0 {
                0.0
            } else {
                round1(count as f64 / total as f64 * 100.0)
            };
            TierBucket {
                level: *tier,
                count,
                percentage,
            }
        })
        .collect();

    CohortSummary {
        total_patients: total,
        average_risk: if total == 0 {
            0.0
        } else {
            round1(risk_sum / total as f64)
        },
        high_risk_alerts: counts[2] + counts[3],
        critical_risk_alerts: counts[3],
        risk_distribution,
    }
}

/// Patients needing immediate attention, highest risk first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertReport {
    pub alert_count: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub patients: Vec<PatientProfile>,
}

/// High and Critical tier patients, sorted by risk descending and truncated
/// to `cap` entries. Counts cover the full matching set, not the truncation.
pub fn high_risk_alerts(patients: &[Patient], config: &RiskConfig, cap: usize) -> AlertReport {
    let mut flagged: Vec<PatientProfile> = patients
        .iter()
        .map(|patient| build_profile(patient, config))
        .filter(|profile| profile.assessment.priority >= 3)
        .collect();

    flagged.sort_by(|a, b| compare_risk_desc(&a.patient, &b.patient));

    let critical_count = flagged
        .iter()
        .filter(|profile| profile.assessment.priority == 4)
        .count();
    let alert_count = flagged.len();
    let high_count = alert_count - critical_count;

    flagged.truncate(cap);

    AlertReport {
        alert_count,
        critical_count,
        high_count,
        patients: flagged,
    }
}

/// Risk statistics for one age band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgeBandStats {
    pub band: String,
    pub count: usize,
    pub avg_risk: f64,
    pub max_risk: f64,
}

const AGE_BANDS: [&str; 5] = ["18-35", "36-50", "51-65", "66-80", "80+"];

fn age_band(age: u32) -> &'static str {
    if age <= 35 {
        "18-35"
    } else if age <= 50 {
        "36-50"
    } else if age <= 65 {
        "51-65"
    } else if age <= 80 {
        "66-80"
    } else {
        "80+"
    }
}

/// Average and maximum risk per fixed age band; empty bands report zeros.
pub fn risk_by_age_band(patients: &[Patient]) -> Vec<AgeBandStats> {
    AGE_BANDS
        .iter()
        .map(|band| {
            let risks: Vec<f64> = patients
                .iter()
                .filter(|patient| age_band(patient.age) == *band)
                .map(|patient| patient.risk_percentage)
                .collect();

            if risks.is_empty() {
                AgeBandStats {
                    band: band.to_string(),
                    count: 0,
                    avg_risk: 0.0,
                    max_risk: 0.0,
                }
            } else {
                let sum: f64 = risks.iter().sum();
                let max = risks.iter().copied().fold(f64::MIN, f64::max);
                AgeBandStats {
                    band: band.to_string(),
                    count: risks.len(),
                    avg_risk: round1(sum / risks.len() as f64),
                    max_risk: round1(max),
                }
            }
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
