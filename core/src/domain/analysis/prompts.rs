use serde_json::{Value, json};

use crate::domain::{common::generate_timestamp, health_profile::entities::HealthCondition};

pub const FOOD_EXTRACTION_PROMPT: &str = r#"
You are an expert nutritionist and food analyst. Read the food packaging in the image and extract its information precisely.

RULES:
- Respond with ONLY valid JSON and no surrounding text
- Use null for anything you cannot read; never omit a field
- Base the health score strictly on the nutritional content
- Identify every form of sugar (sucrose, fructose, glucose, syrups, ...)
- Flag artificial additives and preservatives

RESPONSE STRUCTURE:
{
  "productName": "string",
  "brand": "string",
  "category": "string",
  "ingredients": [
    {"name": "string", "order": number, "isAllergen": boolean, "isAdditive": boolean, "isSugar": boolean, "concerns": ["string"]}
  ],
  "nutrition": {
    "servingSize": "string",
    "servingsPerContainer": number,
    "calories": number,
    "macros": {
      "protein": number, "totalCarbs": number, "dietaryFiber": number, "totalSugars": number,
      "addedSugars": number, "totalFat": number, "saturatedFat": number, "transFat": number
    },
    "micronutrients": {
      "sodium": number,
      "cholesterol": number,
      "vitamins": [{"name": "string", "amount": "string", "dv": number}],
      "minerals": [{"name": "string", "amount": "string", "dv": number}]
    }
  },
  "allergens": ["string"],
  "dietaryInfo": {"isVegan": boolean, "isVegetarian": boolean, "isGlutenFree": boolean, "isKeto": boolean, "isDairy": boolean},
  "healthMetrics": {
    "healthScore": number,
    "processingLevel": "unprocessed|minimally processed|processed|ultra-processed",
    "novaGroup": number,
    "warnings": ["string"],
    "benefits": ["string"]
  },
  "confidence": number
}"#;

/// (key, unit, amount pointer into the food data)
const NUTRIENTS: [(&str, &str, &str); 8] = [
    ("calories", "kcal", "/nutrition/calories"),
    ("total_fat", "g", "/nutrition/macros/totalFat"),
    ("saturated_fat", "g", "/nutrition/macros/saturatedFat"),
    ("sodium", "mg", "/nutrition/micronutrients/sodium"),
    ("total_carbohydrates", "g", "/nutrition/macros/totalCarbs"),
    ("dietary_fiber", "g", "/nutrition/macros/dietaryFiber"),
    ("sugars", "g", "/nutrition/macros/totalSugars"),
    ("protein", "g", "/nutrition/macros/protein"),
];

const RECOMMENDATIONS: &str =
    "highly_recommended|recommended|moderate_caution|not_recommended|strongly_avoid";

fn text_or<'a>(food_data: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    food_data
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
}

fn health_impact_template(conditions: &[HealthCondition]) -> Value {
    let mut impact = serde_json::Map::new();
    for condition in conditions.iter().take(2) {
        impact.insert(
            condition.impact_key(),
            json!("Specific impact on this condition"),
        );
    }
    if impact.is_empty() {
        impact.insert("general".to_string(), json!("General health impact"));
    }
    Value::Object(impact)
}

/// Example response document embedded in the health prompt.
fn health_report_template(food_data: &Value, conditions: &[HealthCondition]) -> Value {
    let product_name = text_or(food_data, "productName", "Unknown Product");
    let (now, _) = generate_timestamp();
    let slug = food_data
        .get("productName")
        .and_then(Value::as_str)
        .map(|name| name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"))
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| "unknown-product".to_string());
    let impact = health_impact_template(conditions);

    let mut nutrients = serde_json::Map::new();
    for (key, unit, pointer) in NUTRIENTS {
        let amount = food_data
            .pointer(pointer)
            .filter(|v| v.is_number())
            .cloned()
            .unwrap_or(json!(0));
        nutrients.insert(
            key.to_string(),
            json!({
                "amount": amount,
                "unit": unit,
                "dailyValue": "percentage of daily value",
                "impact": "good|neutral|bad",
                "summary": format!("Analysis of {} content", key.replace('_', " ")),
                "benefits": ["Benefits if any"],
                "concerns": ["Concerns if any"],
                "safeConsumption": {
                    "recommendation": "Specific intake recommendation",
                    "dailyRecommendedIntake": "Recommended daily amount for the user's profile",
                    "percentOfDaily": "percentage"
                },
                "healthImpact": impact.clone()
            }),
        );
    }

    json!({
        "id": format!("{}-{}", slug, now.timestamp_millis()),
        "name": product_name,
        "brand": text_or(food_data, "brand", "Unknown Brand"),
        "recommendation": RECOMMENDATIONS,
        "summary": "One-sentence summary of the recommendation",
        "recommendationDetail": "Why this recommendation was made, citing nutrients, ingredients and conditions",
        "pros": ["Benefit with the nutrient or ingredient, amounts and why it helps the user's conditions"],
        "cons": ["Concern with the nutrient or ingredient, amounts relative to daily limits and the risk"],
        "ingredients": [{
            "name": "Ingredient Name",
            "impact": "good|neutral|bad",
            "description": "What this ingredient is",
            "summary": "Its role and health implications",
            "benefits": ["Specific benefit"],
            "concerns": ["Specific concern"],
            "safeConsumption": {
                "recommendation": "Recommendation given the user's conditions",
                "limits": "Daily or weekly limits if applicable",
                "alternatives": "Healthier alternatives"
            },
            "healthImpact": impact
        }],
        "nutrients": nutrients,
        "alternatives": [{
            "id": "alternative-1-id",
            "name": "Alternative Product Name",
            "brand": "Brand Name",
            "benefits": ["Specific benefit"]
        }],
        "overallRecommendation": RECOMMENDATIONS,
        "safetyScore": "number between 0-100",
        "suitabilityAnalysis": {
            "beneficial": [{
                "aspect": "Beneficial aspect",
                "reason": "Explanation",
                "healthBenefit": "Specific health benefit",
                "relatedConditions": ["condition names"]
            }],
            "concerns": [{
                "aspect": "Concerning aspect",
                "severity": "low|moderate|high|critical",
                "reason": "Explanation",
                "healthRisk": "Specific health risk",
                "relatedConditions": ["condition names"],
                "mitigation": "How to reduce the risk"
            }]
        },
        "portionGuidance": {
            "recommendedServing": "Serving size recommendation",
            "frequency": "daily|weekly|occasionally|rarely|never",
            "reasoning": "Reasoning for the portion guidance"
        },
        "alternativeSuggestions": [{"suggestion": "Alternative", "reason": "Why it is better"}],
        "keyWarnings": ["Critical warning"],
        "medicalDisclaimer": "Disclaimer about consulting healthcare providers",
        "confidence": "number between 0-100"
    })
}

/// Builds the stage 2 prompt for `food_data` and the user's conditions.
pub fn build_health_prompt(food_data: &Value, conditions: &[HealthCondition]) -> String {
    let conditions_text = conditions
        .iter()
        .map(|c| {
            let description = if c.description.is_empty() {
                "No description"
            } else {
                c.description.as_str()
            };
            let severity = if c.severity.is_empty() {
                "Not specified"
            } else {
                c.severity.as_str()
            };
            let kind = serde_json::to_value(c.condition_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!(
                "- {}: {} (Severity: {}, Type: {})",
                c.name, description, severity, kind
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let food_json = serde_json::to_string_pretty(food_data).unwrap_or_else(|_| "{}".to_string());
    let template = serde_json::to_string_pretty(&health_report_template(food_data, conditions))
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"
You are a certified nutritionist and registered dietitian with clinical nutrition expertise. Analyse this food product for a user with the health conditions below.

USER'S HEALTH CONDITIONS:
{conditions_text}

FOOD PRODUCT DATA:
{food_json}

THE ANALYSIS MUST COVER:
1. An overall recommendation with a safety score
2. Every ingredient and its health impact
3. Every major nutrient with condition-specific impact and daily value percentages
4. Portion size and frequency guidance
5. At least three alternative products
6. Condition-specific warnings and a medical disclaimer

SAFETY:
- Be conservative for serious conditions
- Always recommend consulting a healthcare provider
- Flag ingredients that could cause adverse reactions
- Consider drug-nutrient interactions for medications

Respond with ONLY valid JSON in exactly this structure:
{template}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health_profile::entities::ConditionType;

    fn condition(name: &str) -> HealthCondition {
        HealthCondition {
            id: "c1".to_string(),
            name: name.to_string(),
            description: String::new(),
            severity: "high".to_string(),
            condition_type: ConditionType::ChronicDisease,
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_health_prompt_lists_conditions_and_food() {
        let food = json!({"productName": "Choco Crunch", "nutrition": {"calories": 250}});
        let prompt = build_health_prompt(&food, &[condition("Type 2 Diabetes")]);

        assert!(prompt.contains(
            "- Type 2 Diabetes: No description (Severity: high, Type: chronic_disease)"
        ));
        assert!(prompt.contains("\"productName\": \"Choco Crunch\""));
        assert!(prompt.contains("\"type_2_diabetes\""));
        assert!(prompt.contains("choco-crunch-"));
    }

    #[test]
    fn test_template_uses_reported_amounts() {
        let food = json!({"nutrition": {"macros": {"totalSugars": 12.5}}});
        let template = health_report_template(&food, &[]);
        assert_eq!(template["nutrients"]["sugars"]["amount"], 12.5);
        assert_eq!(template["nutrients"]["protein"]["amount"], 0);
        assert_eq!(template["name"], "Unknown Product");
        assert!(template["nutrients"]["sodium"]["healthImpact"]["general"].is_string());
    }
}
