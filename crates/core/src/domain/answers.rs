use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key the validator writes the summed expense breakdown under.
pub const TOTAL_EXPENSES_KEY: &str = "total_expenses";

/// A single questionnaire answer.
///
/// Untagged so the wire shape stays the natural JSON one: a number, a string,
/// or an object of category -> amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    Categories(BTreeMap<String, f64>),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_categories(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            AnswerValue::Categories(m) => Some(m),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AnswerValue::Number(_) => "number",
            AnswerValue::Text(_) => "text",
            AnswerValue::Categories(_) => "category breakdown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }

    /// Finite numeric answer, or `None` when absent, non-numeric, NaN or infinite.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(AnswerValue::as_number)
            .filter(|n| n.is_finite())
    }

    /// Numeric answer defaulting to 0, for scoring rules that must stay total.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(AnswerValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Integer,
    Float,
    Choice { options: Vec<String> },
    Categories { categories: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDef {
    pub key: String,
    pub text: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}
