use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{FlowError, Result};
use crate::schema::{AnswerValue, FIELDS};

/// Label the prediction service uses for the high-risk class.
pub const HIGH_RISK: &str = "High risk";
pub const LOW_RISK: &str = "Low risk";

/// Fully populated health record submitted for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub age: u32,
    pub gender: String,
    pub region: String,
    pub income_level: String,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub hypertension: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub diabetes: bool,
    pub cholesterol_level: u32,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub obesity: bool,
    pub waist_circumference: u32,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub family_history: bool,
    pub smoking_status: String,
    pub alcohol_consumption: String,
    pub physical_activity: String,
    pub dietary_habits: String,
    pub air_pollution_exposure: String,
    pub stress_level: String,
    pub sleep_hours: u32,
    pub blood_pressure_systolic: u32,
    pub blood_pressure_diastolic: u32,
    pub fasting_blood_sugar: u32,
    pub cholesterol_hdl: u32,
    pub cholesterol_ldl: u32,
    pub triglycerides: u32,
    pub ekg_results: String,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub previous_heart_disease: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub medication_usage: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub participated_in_free_screening: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub heart_attack: bool,
}

/// Training rows share the record layout; `heart_attack` is the label.
pub type HealthData = PredictionRecord;

impl PredictionRecord {
    /// Builds a record from interview answers, failing on the first absent field.
    pub fn from_answers(answers: &BTreeMap<String, AnswerValue>) -> Result<Self> {
        let mut object = Map::with_capacity(FIELDS.len());
        for field in FIELDS {
            let value = answers
                .get(field.id)
                .ok_or_else(|| FlowError::MissingField(field.id.to_string()))?;
            object.insert(field.id.to_string(), serde_json::to_value(value)?);
        }
        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

/// Classification returned by the prediction service.
///
/// Only `risk_level` drives the conversation; anything else the service
/// sends is carried through untouched for history display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl PredictionResult {
    pub fn new(risk_level: impl Into<String>) -> Self {
        Self {
            risk_level: risk_level.into(),
            details: Map::new(),
        }
    }

    pub fn risk(&self) -> RiskLevel {
        RiskLevel::from_label(&self.risk_level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// Exactly [`HIGH_RISK`] is high; every other label counts as low.
    pub fn from_label(label: &str) -> Self {
        if label == HIGH_RISK {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => HIGH_RISK,
            RiskLevel::Low => LOW_RISK,
        }
    }
}

fn bool_from_int_or_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(num) => num
            .as_i64()
            .map(|i| i != 0)
            .ok_or_else(|| de::Error::custom("Expected boolean or integer")),
        _ => Err(de::Error::custom("Expected boolean or integer")),
    }
}
