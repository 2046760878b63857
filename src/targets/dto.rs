use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PROTEIN_GOAL: u32 = 100;

/// The user's daily goals. Protein always has a value; calories may be unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTargets {
    #[serde(default, deserialize_with = "lenient_calories")]
    pub daily_calories: Option<u32>,
    #[serde(
        default = "default_protein_goal",
        deserialize_with = "lenient_protein_goal"
    )]
    pub protein_goal: u32,
}

impl Default for UserTargets {
    fn default() -> Self {
        Self {
            daily_calories: None,
            protein_goal: DEFAULT_PROTEIN_GOAL,
        }
    }
}

/// Gram targets derived from the calorie goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroTargets {
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub targets: UserTargets,
    #[serde(rename = "macroTargets")]
    pub macro_targets: Option<MacroTargets>,
}

fn default_protein_goal() -> u32 {
    DEFAULT_PROTEIN_GOAL
}

/// Older records hold the raw form input, so a number may arrive as a
/// number, a numeric string or an empty string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
    Null(()),
}

fn whole_number(raw: NumberOrText) -> Option<u32> {
    let value = match raw {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s.trim().parse::<f64>().ok()?,
        NumberOrText::Null(()) => return None,
    };
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value.trunc() as u32)
    } else {
        None
    }
}

fn lenient_calories<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = NumberOrText::deserialize(deserializer)?;
    Ok(whole_number(raw))
}

fn lenient_protein_goal<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = NumberOrText::deserialize(deserializer)?;
    Ok(whole_number(raw).unwrap_or(DEFAULT_PROTEIN_GOAL))
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn decodes_numbers_and_form_strings() {
        let t: UserTargets =
            serde_json::from_str(r#"{"dailyCalories":"2000","proteinGoal":"120"}"#).unwrap();
        assert_eq!(t.daily_calories, Some(2000));
        assert_eq!(t.protein_goal, 120);

        let t: UserTargets =
            serde_json::from_str(r#"{"dailyCalories":1800,"proteinGoal":90}"#).unwrap();
        assert_eq!(t.daily_calories, Some(1800));
        assert_eq!(t.protein_goal, 90);
    }

    #[test]
    fn empty_or_garbage_calories_are_unset() {
        let t: UserTargets =
            serde_json::from_str(r#"{"dailyCalories":"","proteinGoal":"100"}"#).unwrap();
        assert_eq!(t.daily_calories, None);

        let t: UserTargets =
            serde_json::from_str(r#"{"dailyCalories":"lots","proteinGoal":100}"#).unwrap();
        assert_eq!(t.daily_calories, None);

        let t: UserTargets = serde_json::from_str(r#"{"dailyCalories":null}"#).unwrap();
        assert_eq!(t.daily_calories, None);
        assert_eq!(t.protein_goal, DEFAULT_PROTEIN_GOAL);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&UserTargets {
            daily_calories: Some(2000),
            protein_goal: 110,
        })
        .unwrap();
        assert_eq!(json, r#"{"dailyCalories":2000,"proteinGoal":110}"#);
    }
}
