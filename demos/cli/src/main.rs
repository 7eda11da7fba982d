use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use riskview_cohort::{load_cohort_str, query_cohort, summarize_cohort, CohortFilter};
use riskview_core::{Gender, RiskConfig, RiskTier};

#[derive(Parser, Debug)]
#[command(
    name = "riskview-cli",
    about = "Tóm tắt và truy vấn cohort nguy cơ từ dữ liệu dashboard JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON dữ liệu dashboard.
    #[arg(short, long)]
    input: PathBuf,

    /// Lọc theo mức nguy cơ (Low Risk, Medium Risk, High Risk, Critical Risk).
    #[arg(long)]
    risk_level: Option<String>,

    /// Lọc theo giới tính (male/female).
    #[arg(long)]
    gender: Option<String>,

    #[arg(long)]
    age_min: Option<u32>,

    #[arg(long)]
    age_max: Option<u32>,

    /// Số bệnh nhân in ra tối đa.
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let cohort = load_cohort_str(&data)?;
    let config = RiskConfig::default();

    let summary = summarize_cohort(&cohort.patients, &config);
    println!("Patients: {}", summary.total_patients);
    println!("Average risk: {:.1}%", summary.average_risk);
    println!(
        "High/Critical alerts: {} ({} critical)",
        summary.high_risk_alerts, summary.critical_risk_alerts
    );
    for bucket in &summary.risk_distribution {
        println!(
            "  {:<14} {:>4}  {:>5.1}%",
            bucket.level.label(),
            bucket.count,
            bucket.percentage
        );
    }

    let filter = CohortFilter {
        risk_level: args.risk_level.as_deref().map(parse_tier).transpose()?,
        gender: args.gender.map(Gender::from),
        age_min: args.age_min,
        age_max: args.age_max,
        limit: Some(args.limit),
        ..CohortFilter::default()
    };

    let rows = query_cohort(&cohort.patients, &filter, &config);
    println!("\nTop {} patients by priority:", rows.len());
    for row in &rows {
        println!(
            "  {:<14} #{:<6} age {:>3} {:<6} risk {:>5.1}%  conditions: {}",
            row.assessment.level.label(),
            row.patient.patient_id,
            row.patient.age,
            row.patient.gender.as_str(),
            row.patient.risk_percentage,
            row.total_conditions
        );
    }

    Ok(())
}

fn parse_tier(raw: &str) -> anyhow::Result<RiskTier> {
    RiskTier::ALL
        .into_iter()
        .find(|tier| tier.label().eq_ignore_ascii_case(raw))
        .with_context(|| format!("Mức nguy cơ không hợp lệ: {raw}"))
}
