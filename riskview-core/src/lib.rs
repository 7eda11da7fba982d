//! Logic lõi phân tầng nguy cơ và lập kế hoạch chăm sóc.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Cấu hình các ngưỡng phân tầng và ngưỡng diễn giải.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RiskConfig {
    /// Ngưỡng phần trăm cho bốn mức nguy cơ.
    pub tiers: TierThresholds,
    /// Ngưỡng chọn câu diễn giải lâm sàng.
    pub narratives: NarrativeThresholds,
}

/// Điểm cắt (phần trăm) của từng mức, bao gồm cận dưới.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: 80.0,
            high: 60.0,
            medium: 30.0,
        }
    }
}

impl TierThresholds {
    /// Bảng điểm cắt theo xác suất của pipeline dự đoán (0.50/0.25/0.10).
    pub fn model_calibrated() -> Self {
        Self {
            critical: 50.0,
            high: 25.0,
            medium: 10.0,
        }
    }
}

/// Ngưỡng diễn giải, chỉnh độc lập với bảng phân tầng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NarrativeThresholds {
    pub elevated: f64,
    pub moderate: f64,
}

impl Default for NarrativeThresholds {
    fn default() -> Self {
        Self {
            elevated: 80.0,
            moderate: 50.0,
        }
    }
}

/// Mức nguy cơ suy giảm trong 90 ngày.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Critical Risk")]
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Critical,
    ];

    /// Xếp mức từ phần trăm nguy cơ; giá trị ngoài [0,100] được kẹp lại.
    pub fn from_percentage(risk_percentage: f64, thresholds: &TierThresholds) -> RiskTier {
        let pct = risk_percentage.clamp(0.0, 100.0);
        if pct >= thresholds.critical {
            RiskTier::Critical
        } else if pct >= thresholds.high {
            RiskTier::High
        } else if pct >= thresholds.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn from_priority(priority: u8) -> Option<RiskTier> {
        match priority {
            1 => Some(RiskTier::Low),
            2 => Some(RiskTier::Medium),
            3 => Some(RiskTier::High),
            4 => Some(RiskTier::Critical),
            _ => None,
        }
    }

    /// Nhãn hiển thị trên dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
            RiskTier::Critical => "Critical Risk",
        }
    }

    pub fn color(&self) -> RiskColor {
        match self {
            RiskTier::Low => RiskColor::Green,
            RiskTier::Medium => RiskColor::Yellow,
            RiskTier::High => RiskColor::Orange,
            RiskTier::Critical => RiskColor::Red,
        }
    }

    /// Hạng ưu tiên, số lớn hơn là khẩn cấp hơn.
    pub fn priority(&self) -> u8 {
        match self {
            RiskTier::Low => 1,
            RiskTier::Medium => 2,
            RiskTier::High => 3,
            RiskTier::Critical => 4,
        }
    }
}

/// Mã màu tương ứng với mức nguy cơ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Yellow,
    Orange,
    Red,
}

impl RiskColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskColor::Green => "green",
            RiskColor::Yellow => "yellow",
            RiskColor::Orange => "orange",
            RiskColor::Red => "red",
        }
    }
}

/// Giới tính theo dữ liệu upstream; chuỗi lạ được xếp vào `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl From<String> for Gender {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

/// Cờ bệnh mạn tính theo định dạng 0/1 của pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConditionFlags {
    #[serde(default, with = "flag")]
    pub diabetes: bool,
    #[serde(default, with = "flag")]
    pub hypertension: bool,
    #[serde(default, with = "flag")]
    pub heart_disease: bool,
    #[serde(default, with = "flag")]
    pub kidney_disease: bool,
    #[serde(default, with = "flag")]
    pub stroke: bool,
    #[serde(default, with = "flag")]
    pub copd: bool,
    #[serde(default)]
    pub other_conditions: Vec<String>,
}

impl ConditionFlags {
    /// Danh sách tên bệnh theo thứ tự chuẩn, đã khử trùng lặp.
    pub fn display_names(&self) -> Vec<String> {
        let canonical = [
            ("Diabetes", self.diabetes),
            ("Hypertension", self.hypertension),
            ("Heart Disease", self.heart_disease),
            ("Kidney Disease", self.kidney_disease),
            ("Stroke", self.stroke),
            ("COPD", self.copd),
        ];

        let mut names: Vec<String> = canonical
            .iter()
            .filter(|(_, active)| *active)
            .map(|(label, _)| label.to_string())
            .collect();

        for raw in &self.other_conditions {
            let pretty = capitalize_first(raw);
            if pretty.is_empty() {
                continue;
            }
            if names
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(&pretty))
            {
                continue;
            }
            names.push(pretty);
        }

        names
    }

    /// Tổng số bệnh sau chuẩn hóa; không tin trường đếm sẵn của upstream.
    pub fn total(&self) -> usize {
        self.display_names().len()
    }
}

/// Hồ sơ bệnh nhân do pipeline dự đoán cung cấp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub risk_percentage: f64,
    #[serde(default)]
    pub conditions: ConditionFlags,
    #[serde(default, deserialize_with = "deserialize_encounter_date")]
    pub last_encounter: Option<NaiveDate>,
}

/// Kết quả đánh giá nguy cơ cho một bệnh nhân.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskTier,
    pub color: RiskColor,
    pub priority: u8,
    pub reasoning: String,
    pub immediate_actions: Vec<String>,
    pub care_plan: Vec<String>,
}

/// Đánh giá đầy đủ: mức, màu, ưu tiên, diễn giải và hai danh sách hành động.
pub fn assess(patient: &Patient, config: &RiskConfig) -> RiskAssessment {
    let level = RiskTier::from_percentage(patient.risk_percentage, &config.tiers);
    RiskAssessment {
        level,
        color: level.color(),
        priority: level.priority(),
        reasoning: reasoning(patient.risk_percentage, &config.narratives).to_string(),
        immediate_actions: immediate_actions(level.priority()),
        care_plan: care_plan(&patient.conditions),
    }
}

/// Câu diễn giải lâm sàng theo ngưỡng riêng (so sánh chặt `>`).
pub fn reasoning(risk_percentage: f64, thresholds: &NarrativeThresholds) -> &'static str {
    if risk_percentage > thresholds.elevated {
        "Model indicators show a high probability of deterioration within 90 days. \
         Compounding chronic risk factors require immediate clinical review."
    } else if risk_percentage > thresholds.moderate {
        "Risk indicators are elevated above the cohort baseline. \
         Close monitoring and a review of the current management plan are recommended."
    } else {
        "Risk indicators are within the expected range for this cohort. \
         Routine follow-up remains appropriate."
    }
}

/// Checklist ba mục theo hạng ưu tiên.
pub fn immediate_actions(priority: u8) -> Vec<String> {
    let items: [&str; 3] = if priority >= 4 {
        [
            "Arrange emergency clinical evaluation today",
            "Notify the responsible physician and escalate to the care team",
            "Review medications and latest labs for acute changes",
        ]
    } else if priority == 3 {
        [
            "Schedule an urgent appointment within 48 hours",
            "Increase monitoring of vital signs",
            "Reassess treatment adherence with the patient",
        ]
    } else {
        [
            "Contact the patient for a routine check-in",
            "Confirm the next scheduled follow-up visit",
            "Reinforce current self-management goals",
        ]
    };

    items.iter().map(|item| item.to_string()).collect()
}

/// Kế hoạch chăm sóc: mục riêng theo bệnh, sau đó hai mục chung.
pub fn care_plan(conditions: &ConditionFlags) -> Vec<String> {
    let mut plan = Vec::new();

    if conditions.diabetes {
        plan.push(
            "Review glycemic control: HbA1c trend, glucose logs and medication titration"
                .to_string(),
        );
    }
    if conditions.hypertension {
        plan.push("Review blood pressure control and the antihypertensive regimen".to_string());
    }

    plan.push("Provide lifestyle support: diet, physical activity and smoking cessation".to_string());
    plan.push("Schedule follow-up visits according to the assigned risk tier".to_string());

    plan
}

/// Lỗi chung khi xử lý dữ liệu nguy cơ.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("Điểm nguy cơ không hợp lệ: {0}")]
    InvalidPercentage(f64),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
}

fn capitalize_first(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn deserialize_encounter_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    // Upstream ghi "" khi không có ngày khám.
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Ok(raw != 0)
    }
}
