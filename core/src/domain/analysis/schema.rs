use serde_json::{Value, json};

/// A numeric leaf that must stay within `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedField {
    pub path: &'static [&'static str],
    pub min: f64,
    pub max: f64,
    /// Value used when the reported one is missing, non-numeric or out of range.
    pub floor: Value,
}

/// Fixed shape of a stage payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSchema {
    /// Every declared key with its default leaf.
    pub defaults: Value,
    pub bounded: Vec<BoundedField>,
    /// Top-level keys the model must report for the payload to be usable.
    pub required: Vec<&'static str>,
}

pub fn default_food_data() -> Value {
    json!({
        "productName": null,
        "brand": null,
        "category": null,
        "ingredients": [],
        "nutrition": {
            "servingSize": null,
            "servingsPerContainer": null,
            "calories": null,
            "macros": {
                "protein": null,
                "totalCarbs": null,
                "dietaryFiber": null,
                "totalSugars": null,
                "addedSugars": null,
                "totalFat": null,
                "saturatedFat": null,
                "transFat": null
            },
            "micronutrients": {
                "sodium": null,
                "cholesterol": null,
                "vitamins": [],
                "minerals": []
            }
        },
        "allergens": [],
        "dietaryInfo": {
            "isVegan": null,
            "isVegetarian": null,
            "isGlutenFree": null,
            "isKeto": null,
            "isDairy": null
        },
        "healthMetrics": {
            "healthScore": null,
            "processingLevel": null,
            "novaGroup": null,
            "warnings": [],
            "benefits": []
        },
        "confidence": 0
    })
}

pub fn food_data_schema() -> PayloadSchema {
    PayloadSchema {
        defaults: default_food_data(),
        bounded: vec![
            BoundedField {
                path: &["confidence"],
                min: 0.0,
                max: 100.0,
                floor: json!(0),
            },
            BoundedField {
                path: &["healthMetrics", "healthScore"],
                min: 0.0,
                max: 100.0,
                floor: Value::Null,
            },
            BoundedField {
                path: &["healthMetrics", "novaGroup"],
                min: 1.0,
                max: 4.0,
                floor: Value::Null,
            },
        ],
        required: Vec::new(),
    }
}

pub fn default_health_report() -> Value {
    json!({
        "id": null,
        "name": null,
        "brand": null,
        "recommendation": null,
        "summary": null,
        "recommendationDetail": null,
        "pros": [],
        "cons": [],
        "ingredients": [],
        "nutrients": {},
        "alternatives": [],
        "overallRecommendation": null,
        "safetyScore": 0,
        "suitabilityAnalysis": {
            "beneficial": [],
            "concerns": []
        },
        "portionGuidance": {
            "recommendedServing": null,
            "frequency": null,
            "reasoning": null
        },
        "alternativeSuggestions": [],
        "keyWarnings": [],
        "medicalDisclaimer": null,
        "confidence": 0
    })
}

pub fn health_report_schema() -> PayloadSchema {
    PayloadSchema {
        defaults: default_health_report(),
        bounded: vec![
            BoundedField {
                path: &["safetyScore"],
                min: 0.0,
                max: 100.0,
                floor: json!(0),
            },
            BoundedField {
                path: &["confidence"],
                min: 0.0,
                max: 100.0,
                floor: json!(0),
            },
        ],
        required: vec!["recommendation", "safetyScore"],
    }
}

/// Fixed result returned when the user has no recorded health conditions.
pub fn no_health_data_result(food_data: &Value) -> Value {
    json!({
        "recommendation": "no_health_data",
        "message": "No health conditions found for analysis. Food analysis provided without health-specific recommendations.",
        "foodData": food_data,
        "safetyScore": 75,
        "overallRecommendation": "moderate_caution"
    })
}
