use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::meals::dto::MealEntrySet;

/// Named snapshot of the four meal fields. Never changed after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub breakfast: String,
    #[serde(default)]
    pub lunch: String,
    #[serde(default)]
    pub dinner: String,
    #[serde(default)]
    pub snacks: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MealTemplate {
    pub fn meals(&self) -> MealEntrySet {
        MealEntrySet {
            breakfast: self.breakfast.clone(),
            lunch: self.lunch.clone(),
            dinner: self.dinner.clone(),
            snacks: self.snacks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTemplate {
    pub key: String,
    pub reason: String,
}

/// Result of enumerating stored templates: what decoded, and what did not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateListing {
    pub templates: Vec<MealTemplate>,
    pub skipped: Vec<SkippedTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTemplateQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn decodes_record_written_by_browser_client() {
        let raw = r#"{
            "id": "template:1718000000000",
            "name": "Gym day",
            "breakfast": "2 eggs, toast",
            "lunch": "",
            "dinner": "salmon with rice",
            "snacks": "",
            "createdAt": "2024-06-10T06:13:20.000Z"
        }"#;
        let t: MealTemplate = serde_json::from_str(raw).unwrap();
        assert_eq!(t.id, "template:1718000000000");
        assert_eq!(t.meals().dinner, "salmon with rice");
        assert_eq!(t.created_at.unix_timestamp(), 1_718_000_000);
    }
}
