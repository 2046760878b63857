//! Figures derived from an analysis and the user's targets, for display.
//! Everything here is pure.

use serde::Serialize;

use super::dto::{AnalysisResult, NutrientStatus, Quantity, Rating};
use super::prompt::VEGGIE_GOAL_GRAMS;
use crate::meals::dto::MealSlot;
use crate::targets::dto::{MacroTargets, UserTargets};

/// Presentation class for a status or rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    StrongPositive,
    Positive,
    Affirmative,
    Informational,
    Caution,
    Neutral,
}

pub fn status_tone(status: &NutrientStatus) -> Tone {
    match status {
        NutrientStatus::OnTrack => Tone::Affirmative,
        NutrientStatus::Low => Tone::Informational,
        NutrientStatus::High => Tone::Caution,
        _ => Tone::Neutral,
    }
}

pub fn rating_tone(rating: &Rating) -> Tone {
    match rating {
        Rating::Excellent => Tone::StrongPositive,
        Rating::Good => Tone::Positive,
        Rating::NeedsWork => Tone::Informational,
        Rating::Other(_) => Tone::Neutral,
    }
}

/// Share of the day's calories in one meal, in whole percent.
/// `None` when either figure is unreadable or the day total is zero.
pub fn percent_of_day(meal_calories: &Quantity, day_calories: &Quantity) -> Option<i64> {
    let meal = meal_calories.as_whole()?;
    let day = day_calories.as_whole()?;
    if day == 0 {
        return None;
    }
    Some((meal as f64 / day as f64 * 100.0).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Protein,
    Veggies,
    Fruit,
}

/// A nudge shown next to a nutrient reported as low.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortfallHint {
    pub nutrient: Nutrient,
    /// Grams still needed; fruit has a range goal and carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams_needed: Option<i64>,
    pub suggestion: &'static str,
}

pub fn protein_shortfall(result: &AnalysisResult, targets: &UserTargets) -> Option<ShortfallHint> {
    let summary = &result.daily_summary;
    if summary.status.protein != NutrientStatus::Low {
        return None;
    }
    Some(ShortfallHint {
        nutrient: Nutrient::Protein,
        grams_needed: summary
            .protein
            .as_whole()
            .map(|reported| i64::from(targets.protein_goal) - reported),
        suggestion: "Try: Greek yogurt (250g = 25g), chicken (110g = 34g), or protein shake",
    })
}

pub fn veggie_shortfall(result: &AnalysisResult) -> Option<ShortfallHint> {
    let summary = &result.daily_summary;
    if summary.status.veggies != NutrientStatus::Low {
        return None;
    }
    Some(ShortfallHint {
        nutrient: Nutrient::Veggies,
        grams_needed: summary
            .veggies
            .as_whole()
            .map(|reported| i64::from(VEGGIE_GOAL_GRAMS) - reported),
        suggestion: "Try: Salad (100g), broccoli (100g), or mixed veggies (150g)",
    })
}

pub fn fruit_shortfall(result: &AnalysisResult) -> Option<ShortfallHint> {
    (result.daily_summary.status.fruit() == NutrientStatus::Low).then_some(ShortfallHint {
        nutrient: Nutrient::Fruit,
        grams_needed: None,
        suggestion: "Add fruit! Try: Apple (150g), banana (120g), or berries (150g)",
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealShare {
    pub meal: MealSlot,
    pub calories: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_of_day: Option<i64>,
}

/// Calories per meal in day order; unreadable figures count as zero.
pub fn calorie_distribution(result: &AnalysisResult) -> Vec<MealShare> {
    let day = &result.daily_summary.calories;
    result
        .meal_breakdown
        .iter()
        .map(|(meal, assessment)| MealShare {
            meal,
            calories: assessment.calories.as_whole().unwrap_or(0),
            percent_of_day: percent_of_day(&assessment.calories, day),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTones {
    pub overall: Tone,
    pub protein: Tone,
    pub veggies: Tone,
    pub fruit: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealView {
    pub meal: MealSlot,
    pub rating_tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_of_day: Option<i64>,
}

/// An analysis plus every derived figure the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub analysis: AnalysisResult,
    pub targets: UserTargets,
    pub macro_targets: Option<MacroTargets>,
    pub status_tones: StatusTones,
    pub meals: Vec<MealView>,
    /// Only present when a daily calorie target is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_distribution: Option<Vec<MealShare>>,
    pub shortfalls: Vec<ShortfallHint>,
}

impl AnalysisView {
    pub fn derive(analysis: AnalysisResult, targets: UserTargets) -> Self {
        let status = &analysis.daily_summary.status;
        let status_tones = StatusTones {
            overall: status_tone(&status.overall),
            protein: status_tone(&status.protein),
            veggies: status_tone(&status.veggies),
            fruit: status_tone(&status.fruit()),
        };

        let with_target = targets.daily_calories.is_some();
        let meals = analysis
            .meal_breakdown
            .iter()
            .map(|(meal, assessment)| MealView {
                meal,
                rating_tone: rating_tone(&assessment.rating),
                percent_of_day: if with_target {
                    percent_of_day(&assessment.calories, &analysis.daily_summary.calories)
                } else {
                    None
                },
            })
            .collect();

        let shortfalls = [
            protein_shortfall(&analysis, &targets),
            veggie_shortfall(&analysis),
            fruit_shortfall(&analysis),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            calorie_distribution: with_target.then(|| calorie_distribution(&analysis)),
            macro_targets: targets.macro_targets(),
            status_tones,
            meals,
            shortfalls,
            targets,
            analysis,
        }
    }
}
