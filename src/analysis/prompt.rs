use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::meals::dto::{MealEntrySet, MealSlot};
use crate::targets::dto::UserTargets;

pub const VEGGIE_GOAL_GRAMS: u32 = 300;
pub const FRUIT_GOAL: &str = "100-200g per day";
pub const NOT_PROVIDED: &str = "Not provided";

/// Nutrition conventions and the output schema. Identical for every request.
pub const REFERENCE_DOCUMENT: &str = r#"CRITICAL - PROTEIN CALCULATIONS:
- 1 large egg = 6g protein
- 100g cooked chicken breast = 31g protein
- 150g cooked chicken breast = 47g protein
- Greek yogurt = 10g per 100g
- Paneer = 18g per 100g

CRITICAL - VEGETABLE MEASUREMENTS:
- Vegetables are measured by WEIGHT, not volume
- 100g mixed vegetables = 100g vegetables (not 50g!)
- 150g broccoli = 150g vegetables
- 1 cup raw vegetables ≈ 100g
- 1 cup cooked vegetables ≈ 150g
- Always report the ACTUAL WEIGHT the user mentioned or estimated
- If someone says "100g mixed veg", that counts as 100g toward their 300g veggie goal

CRITICAL - IDENTIFY MISSING MACROS:
If a meal is missing carbs, protein, or veggies, flag it and suggest additions.
Example: Salmon + broccoli = missing CARBS → suggest rice or sweet potato

TREATS & DESSERTS:
- Small desserts/treats are totally fine and normal (1-2 Ferrero Rocher, small cookie, piece of chocolate)
- Only flag as excessive if it's a LOT of dessert (entire cake slice, multiple servings, etc.)
- Don't shame or make people feel bad about reasonable treats
- Focus on overall balance, not perfection

VEGETARIAN PROTEIN BOOSTERS:
Banza pasta (25g per 100g), hemp seeds (10g per 3 tbsp), nutritional yeast (8g per 2 tbsp), tempeh (19g per 100g)

Give SPECIFIC portions to weigh out with both grams AND hand portions.

CRITICAL - ALWAYS INCLUDE EYEBALL PORTIONS:
For every food item, provide BOTH the weight AND an eyeball/hand portion so people can estimate when eating out:
- Protein: "150g chicken breast (1 palm)" or "110g salmon (1 palm)"
- Carbs: "200g rice (1 cupped handful)" or "150g sweet potato (1 fist)"
- Veggies: "100g broccoli (1 fist)" or "150g salad (2 big handfuls)"
- Fats: "15g olive oil (1 thumb)" or "30g nuts (small handful)"

Common eyeball portions:
- 1 palm (thickness + size of palm) = 100-120g cooked meat/fish
- 1 fist = 100-150g veggies or 1 medium fruit
- 1 cupped handful = 150-200g cooked grains/pasta
- 1 thumb = 15g fats (oils, butter, nut butter)
- Small handful = 30g nuts/seeds

ALWAYS format as: "Weight (eyeball portion)" - e.g., "150g chicken (1 palm), 200g rice (1 cupped handful), 100g broccoli (1 fist)"

Respond ONLY with valid JSON (no markdown):
{
  "dailySummary": {
    "calories": "number",
    "protein": "number",
    "carbs": "number",
    "fats": "number",
    "veggies": "number",
    "fruit": "number",
    "status": {
      "overall": "on track / needs adjustment",
      "protein": "on track / low / high",
      "veggies": "on track / low / high",
      "fruit": "on track / low / high",
      "carbs": "on track / low / high",
      "fats": "on track / low / high"
    }
  },
  "mealBreakdown": {
    "breakfast": {
      "description": "what they said",
      "rating": "excellent / good / needs work",
      "calories": "estimated calories for this meal",
      "estimated": {"protein": "Xg", "carbs": "Xg", "fats": "Xg", "veggies": "Xg", "fruit": "Xg"},
      "portions": "SPECIFIC weights - e.g. Weigh out: 150g chicken, 200g rice",
      "missing": "what's missing - ONLY if significant",
      "quickFix": "suggestions with weights - ONLY if needed"
    },
    "lunch": {"description": "", "rating": "", "calories": "", "estimated": {}, "portions": "", "missing": "", "quickFix": ""},
    "dinner": {"description": "", "rating": "", "calories": "", "estimated": {}, "portions": "", "missing": "", "quickFix": ""},
    "snacks": {"description": "", "rating": "", "calories": "", "estimated": {}, "portions": "", "missing": "", "quickFix": ""}
  },
  "actionableTakeaways": ["3-5 simple bullets"]
}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

/// Request body for the analysis service's messages endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
}

pub fn system_instruction(targets: &UserTargets) -> String {
    let calories = targets
        .daily_calories
        .map_or_else(|| "not provided".to_string(), |c| c.to_string());
    format!(
        "You are a nutrition-aware meal planner that helps users balance their entire day.\n\
         \n\
         Daily calorie target: {calories}\n\
         Protein goal: {protein}g\n\
         Veggie goal: {VEGGIE_GOAL_GRAMS}g total per day\n\
         Fruit goal: {FRUIT_GOAL}\n\
         \n\
         {REFERENCE_DOCUMENT}",
        protein = targets.protein_goal,
    )
}

/// Four labeled lines, one per meal; blank meals read "Not provided".
pub fn meal_message(meals: &MealEntrySet) -> String {
    MealSlot::ALL
        .iter()
        .map(|&slot| format!("{}: {}", slot.label(), meals.entry(slot).unwrap_or(NOT_PROVIDED)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_request(
    targets: &UserTargets,
    meals: &MealEntrySet,
    config: &AnalysisConfig,
) -> AnalysisRequest {
    AnalysisRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        system: system_instruction(targets),
        messages: vec![Message {
            role: "user",
            content: meal_message(meals),
        }],
    }
}
