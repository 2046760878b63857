use serde::{Deserialize, Serialize};

/// One of the four meals of a planned day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snacks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snacks => "Snacks",
        }
    }
}

/// The four free-text meal fields being planned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntrySet {
    #[serde(default)]
    pub breakfast: String,
    #[serde(default)]
    pub lunch: String,
    #[serde(default)]
    pub dinner: String,
    #[serde(default)]
    pub snacks: String,
}

impl MealEntrySet {
    pub fn get(&self, slot: MealSlot) -> &str {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::Lunch => &self.lunch,
            MealSlot::Dinner => &self.dinner,
            MealSlot::Snacks => &self.snacks,
        }
    }

    pub fn set(&mut self, slot: MealSlot, text: String) {
        match slot {
            MealSlot::Breakfast => self.breakfast = text,
            MealSlot::Lunch => self.lunch = text,
            MealSlot::Dinner => self.dinner = text,
            MealSlot::Snacks => self.snacks = text,
        }
    }

    /// The field's text, or `None` when it is blank.
    pub fn entry(&self, slot: MealSlot) -> Option<&str> {
        let text = self.get(slot);
        (!text.trim().is_empty()).then_some(text)
    }

    pub fn is_empty(&self) -> bool {
        MealSlot::ALL.iter().all(|&slot| self.entry(slot).is_none())
    }
}

#[derive(Debug, Deserialize)]
pub struct PatchMealRequest {
    pub slot: MealSlot,
    pub text: String,
}

#[cfg(test)]
mod meal_tests {
    use super::*;

    #[test]
    fn whitespace_only_fields_count_as_empty() {
        let mut meals = MealEntrySet::default();
        assert!(meals.is_empty());

        meals.set(MealSlot::Dinner, "  \n\t".into());
        assert!(meals.is_empty());
        assert_eq!(meals.entry(MealSlot::Dinner), None);

        meals.set(MealSlot::Snacks, "greek yogurt".into());
        assert!(!meals.is_empty());
        assert_eq!(meals.entry(MealSlot::Snacks), Some("greek yogurt"));
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let meals: MealEntrySet = serde_json::from_str(r#"{"lunch":"chicken salad"}"#).unwrap();
        assert_eq!(meals.lunch, "chicken salad");
        assert_eq!(meals.breakfast, "");
        assert_eq!(meals.get(MealSlot::Lunch), "chicken salad");
    }

    #[test]
    fn slots_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&MealSlot::Snacks).unwrap(), r#""snacks""#);
        assert_eq!(MealSlot::ALL.map(MealSlot::label), ["Breakfast", "Lunch", "Dinner", "Snacks"]);
    }
}
