use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    ChronicDisease,
    Allergy,
    DietaryRestriction,
    Medication,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthCondition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: String,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: String,
}

/// The subset of a condition that identifies it for caching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionKey<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
}

/// Condition summary echoed back alongside a health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionSummary {
    pub id: String,
    pub name: String,
    pub severity: String,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: String,
}

impl HealthCondition {
    pub fn key(&self) -> ConditionKey<'_> {
        ConditionKey {
            id: &self.id,
            name: &self.name,
            condition_type: self.condition_type,
        }
    }

    pub fn summary(&self) -> ConditionSummary {
        ConditionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            severity: self.severity.clone(),
            condition_type: self.condition_type,
            status: self.status.clone(),
        }
    }

    /// Key used for the per-condition `healthImpact` entries in prompts.
    pub fn impact_key(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// A named entry of a stored profile list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
}

/// Stored health profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    pub user_id: String,
    #[serde(default)]
    pub chronic_diseases: Vec<ProfileEntry>,
    #[serde(default)]
    pub allergies: Vec<ProfileEntry>,
    #[serde(default)]
    pub dietary_restrictions: Vec<ProfileEntry>,
    #[serde(default)]
    pub medications: Vec<ProfileEntry>,
}

impl HealthProfile {
    /// Flattens the profile into the condition list consumed by the health
    /// analysis stage. Order is stable: diseases, allergies, restrictions,
    /// medications.
    pub fn to_conditions(&self) -> Vec<HealthCondition> {
        let mut conditions = Vec::new();

        for (index, disease) in self.chronic_diseases.iter().enumerate() {
            conditions.push(HealthCondition {
                id: entry_id(disease, ConditionType::ChronicDisease, index),
                name: disease.name.clone(),
                description: disease
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Chronic disease: {}", disease.name)),
                severity: disease
                    .severity
                    .clone()
                    .unwrap_or_else(|| "moderate".to_string()),
                condition_type: ConditionType::ChronicDisease,
                status: "active".to_string(),
            });
        }

        for (index, allergy) in self.allergies.iter().enumerate() {
            conditions.push(HealthCondition {
                id: entry_id(allergy, ConditionType::Allergy, index),
                name: format!("{} Allergy", allergy.name),
                description: format!(
                    "Allergic reaction to {}. Severity: {}",
                    allergy.name,
                    allergy.severity.as_deref().unwrap_or("unknown")
                ),
                severity: allergy
                    .severity
                    .clone()
                    .unwrap_or_else(|| "moderate".to_string()),
                condition_type: ConditionType::Allergy,
                status: "active".to_string(),
            });
        }

        for (index, restriction) in self.dietary_restrictions.iter().enumerate() {
            conditions.push(HealthCondition {
                id: entry_id(restriction, ConditionType::DietaryRestriction, index),
                name: format!("{} Dietary Restriction", restriction.name),
                description: restriction
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Dietary restriction: {}", restriction.name)),
                severity: "moderate".to_string(),
                condition_type: ConditionType::DietaryRestriction,
                status: "active".to_string(),
            });
        }

        for (index, medication) in self.medications.iter().enumerate() {
            let dosage = medication
                .dosage
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();

            conditions.push(HealthCondition {
                id: entry_id(medication, ConditionType::Medication, index),
                name: format!("Medication: {}", medication.name),
                description: format!(
                    "Currently taking {}{}. May have food interactions.",
                    medication.name, dosage
                ),
                severity: "moderate".to_string(),
                condition_type: ConditionType::Medication,
                status: "active".to_string(),
            });
        }

        conditions
    }
}

fn entry_id(entry: &ProfileEntry, condition_type: ConditionType, index: usize) -> String {
    match &entry.id {
        Some(id) => id.clone(),
        None => {
            let prefix = match condition_type {
                ConditionType::ChronicDisease => "chronic_disease",
                ConditionType::Allergy => "allergy",
                ConditionType::DietaryRestriction => "dietary_restriction",
                ConditionType::Medication => "medication",
            };
            format!("{prefix}-{index}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ProfileEntry {
        ProfileEntry {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_profile_to_conditions_naming() {
        let profile = HealthProfile {
            user_id: "u1".to_string(),
            chronic_diseases: vec![entry("Type 2 Diabetes")],
            allergies: vec![ProfileEntry {
                severity: Some("severe".to_string()),
                ..entry("Peanut")
            }],
            dietary_restrictions: vec![entry("Vegan")],
            medications: vec![ProfileEntry {
                dosage: Some("500mg".to_string()),
                ..entry("Metformin")
            }],
        };

        let conditions = profile.to_conditions();
        assert_eq!(conditions.len(), 4);
        assert_eq!(conditions[0].name, "Type 2 Diabetes");
        assert_eq!(conditions[0].description, "Chronic disease: Type 2 Diabetes");
        assert_eq!(conditions[0].id, "chronic_disease-0");
        assert_eq!(conditions[1].name, "Peanut Allergy");
        assert_eq!(conditions[1].severity, "severe");
        assert_eq!(conditions[2].name, "Vegan Dietary Restriction");
        assert_eq!(conditions[2].condition_type, ConditionType::DietaryRestriction);
        assert_eq!(conditions[3].name, "Medication: Metformin");
        assert!(conditions[3].description.contains("(500mg)"));
    }

    #[test]
    fn test_impact_key() {
        let condition = HealthProfile {
            user_id: "u1".to_string(),
            chronic_diseases: vec![entry("High  Blood Pressure")],
            ..Default::default()
        }
        .to_conditions()
        .remove(0);

        assert_eq!(condition.impact_key(), "high_blood_pressure");
    }

    #[test]
    fn test_condition_serializes_type_field() {
        let condition = HealthProfile {
            user_id: "u1".to_string(),
            allergies: vec![entry("Milk")],
            ..Default::default()
        }
        .to_conditions()
        .remove(0);

        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["type"], "allergy");
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_summary_carries_status() {
        let condition = HealthProfile {
            user_id: "u1".to_string(),
            medications: vec![entry("Metformin")],
            ..Default::default()
        }
        .to_conditions()
        .remove(0);

        let summary = serde_json::to_value(condition.summary()).unwrap();
        assert_eq!(summary["name"], "Medication: Metformin");
        assert_eq!(summary["type"], "medication");
        assert_eq!(summary["status"], "active");
        assert!(summary.get("description").is_none());
    }
}
