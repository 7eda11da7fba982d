//! Bridge WASM <-> JavaScript trung lập framework.

use riskview_cohort::{build_profile, query_cohort, CohortFilter};
use riskview_core::{Patient, RiskConfig, RiskError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsRiskConfig {
    #[serde(default)]
    critical_threshold: Option<f64>,
    #[serde(default)]
    high_threshold: Option<f64>,
    #[serde(default)]
    medium_threshold: Option<f64>,
    #[serde(default)]
    elevated_narrative: Option<f64>,
    #[serde(default)]
    moderate_narrative: Option<f64>,
}

impl From<JsRiskConfig> for RiskConfig {
    fn from(cfg: JsRiskConfig) -> Self {
        let mut base = RiskConfig::default();
        if let Some(pct) = cfg.critical_threshold {
            base.tiers.critical = pct;
        }
        if let Some(pct) = cfg.high_threshold {
            base.tiers.high = pct;
        }
        if let Some(pct) = cfg.medium_threshold {
            base.tiers.medium = pct;
        }
        if let Some(pct) = cfg.elevated_narrative {
            base.narratives.elevated = pct;
        }
        if let Some(pct) = cfg.moderate_narrative {
            base.narratives.moderate = pct;
        }
        base
    }
}

fn parse_config(config: Option<JsValue>) -> Result<RiskConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsRiskConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(RiskConfig::from(cfg))
        }
        None => Ok(RiskConfig::default()),
    }
}

/// Đánh giá một bệnh nhân, trả về profile đầy đủ cho UI.
#[wasm_bindgen]
pub fn assess_patient(patient: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patient = from_value::<Patient>(patient)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được hồ sơ bệnh nhân: {err}")))?;
    let cfg = parse_config(config)?;

    let profile = build_profile(&patient, &cfg);

    to_value(&profile).map_err(|err| JsValue::from_str(&format!("Không serialize profile: {err}")))
}

/// Lọc, xếp hạng và phân trang một cohort từ JSON dashboard.
#[wasm_bindgen]
pub fn filter_cohort(
    document: JsValue,
    filter: Option<JsValue>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let document = from_value::<serde_json::Value>(document)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON cohort: {err}")))?;

    let cohort = riskview_cohort::load_cohort_value(&document)
        .map_err(|err| JsValue::from_str(&format_risk_error(err)))?;

    let filter = match filter {
        Some(js_filter) => from_value::<CohortFilter>(js_filter)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được filter: {err}")))?,
        None => CohortFilter::default(),
    };
    let cfg = parse_config(config)?;

    let rows = query_cohort(&cohort.patients, &filter, &cfg);

    to_value(&rows).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

fn format_risk_error(err: RiskError) -> String {
    format!("Risk error: {err}")
}
