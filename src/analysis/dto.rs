use serde::{Deserialize, Deserializer, Serialize};

use crate::meals::dto::MealSlot;

/// A figure as the analysis service reported it: usually a number, sometimes
/// text such as `"1850"` or `"32g"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
}

impl Quantity {
    /// Numeric reading: the number itself, or the leading number of the text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Quantity::Number(n) => n.is_finite().then_some(*n),
            Quantity::Text(s) => leading_number(s),
        }
    }

    /// Whole-number reading, truncated toward zero.
    pub fn as_whole(&self) -> Option<i64> {
        self.as_number().map(|n| n.trunc() as i64)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Number(n) => write!(f, "{n}"),
            Quantity::Text(s) => f.write_str(s),
        }
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        match c {
            '0'..='9' => {}
            '-' | '+' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Classification of a daily total against its goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NutrientStatus {
    OnTrack,
    Low,
    High,
    NeedsAdjustment,
    Other(String),
}

impl From<String> for NutrientStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "on track" => Self::OnTrack,
            "low" => Self::Low,
            "high" => Self::High,
            "needs adjustment" => Self::NeedsAdjustment,
            _ => Self::Other(raw),
        }
    }
}

impl From<NutrientStatus> for String {
    fn from(status: NutrientStatus) -> Self {
        match status {
            NutrientStatus::OnTrack => "on track".into(),
            NutrientStatus::Low => "low".into(),
            NutrientStatus::High => "high".into(),
            NutrientStatus::NeedsAdjustment => "needs adjustment".into(),
            NutrientStatus::Other(raw) => raw,
        }
    }
}

/// Quality of a single meal's composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rating {
    Excellent,
    Good,
    NeedsWork,
    Other(String),
}

impl From<String> for Rating {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "excellent" => Self::Excellent,
            "good" => Self::Good,
            "needs work" => Self::NeedsWork,
            _ => Self::Other(raw),
        }
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Excellent => "excellent".into(),
            Rating::Good => "good".into(),
            Rating::NeedsWork => "needs work".into(),
            Rating::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub overall: NutrientStatus,
    pub protein: NutrientStatus,
    pub veggies: NutrientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fruit: Option<NutrientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<NutrientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fats: Option<NutrientStatus>,
}

impl StatusReport {
    /// Fruit is often left out by the service; absence reads as on track.
    pub fn fruit(&self) -> NutrientStatus {
        self.fruit.clone().unwrap_or(NutrientStatus::OnTrack)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub calories: Quantity,
    pub protein: Quantity,
    pub carbs: Quantity,
    pub fats: Quantity,
    pub veggies: Quantity,
    pub fruit: Quantity,
    pub status: StatusReport,
}

/// Per-meal estimates, as text with units (e.g. `"25g"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedMacros {
    pub protein: Quantity,
    pub carbs: Quantity,
    pub fats: Quantity,
    pub veggies: Quantity,
    pub fruit: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAssessment {
    pub description: String,
    pub rating: Rating,
    pub calories: Quantity,
    pub estimated: EstimatedMacros,
    #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "Option::is_none")]
    pub portions: Option<String>,
    #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
    #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "Option::is_none")]
    pub quick_fix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<MealAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<MealAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<MealAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snacks: Option<MealAssessment>,
}

impl MealBreakdown {
    pub fn get(&self, slot: MealSlot) -> Option<&MealAssessment> {
        match slot {
            MealSlot::Breakfast => self.breakfast.as_ref(),
            MealSlot::Lunch => self.lunch.as_ref(),
            MealSlot::Dinner => self.dinner.as_ref(),
            MealSlot::Snacks => self.snacks.as_ref(),
        }
    }

    /// Assessed meals in day order.
    pub fn iter(&self) -> impl Iterator<Item = (MealSlot, &MealAssessment)> + '_ {
        MealSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|m| (slot, m)))
    }
}

/// One complete nutrition assessment of a planned day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub daily_summary: DailySummary,
    pub meal_breakdown: MealBreakdown,
    pub actionable_takeaways: Vec<String>,
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
