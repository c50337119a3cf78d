//! Typed view of a vision model's receipt extraction.
//!
//! The model is asked for a fixed JSON shape (quality scores, raw text,
//! summary, header fields with confidences, line items). What comes back is
//! close to that shape but rarely exact: money arrives as `"$1,234.56"`,
//! quantities as `"2"` or `2.0`, fields as `null` or missing entirely,
//! categories in lower case. Every type here deserializes leniently so a
//! single odd value degrades to `None` instead of failing the whole reply.
//!
//! ```rust
//! use receipt_prep::receipt::{Category, ReceiptExtraction};
//!
//! let reply = r#"Here you go:
//! {"extractions": {"total": {"value": "$12.50", "confidence": 0.9}},
//!  "items": [{"name": "Coffee", "price": 12.5, "category_prediction": "dining"}]}"#;
//! let receipt = ReceiptExtraction::from_model_reply(reply).unwrap();
//! assert_eq!(receipt.extractions.total.value, Some(12.5));
//! assert_eq!(receipt.items[0].category_prediction, Category::Dining);
//! ```

use crate::error::ExtractError;
use crate::json::parse_model_json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Optional sign, currency noise, digits with thousands commas, trailing noise.
static RE_MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<neg>-)?[^\d.-]*(?P<neg2>-)?(?P<num>\d[\d,]*(?:\.\d+)?|\.\d+)\D*$").unwrap()
});

// ── Leniency ────────────────────────────────────────────────────────────

/// Conversion from an arbitrary JSON value, `None` when it does not fit.
pub trait Lenient: Sized {
    fn from_json(value: &Value) -> Option<Self>;
}

impl Lenient for String {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Lenient for f64 {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_money(s),
            _ => None,
        }
    }
}

impl Lenient for u32 {
    fn from_json(value: &Value) -> Option<Self> {
        let n = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
    }
}

/// Parse a money string such as `"$1,234.56"`, `"-3.00"` or `"12.50 USD"`.
///
/// Commas are treated as thousands separators only.
pub fn parse_money(text: &str) -> Option<f64> {
    let caps = RE_MONEY.captures(text.trim())?;
    let digits: String = caps["num"].chars().filter(|c| *c != ',').collect();
    let amount: f64 = digits.parse().ok()?;
    let negative = caps.name("neg").is_some() || caps.name("neg2").is_some();
    Some(if negative { -amount } else { amount })
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Lenient,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(T::from_json))
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let score: Option<f64> = lenient(deserializer)?;
    Ok(score.unwrap_or(0.0))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let text: Option<String> = lenient(deserializer)?;
    Ok(text.unwrap_or_default())
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn clamp_confidence(value: &Value) -> f64 {
    f64::from_json(value).map_or(0.0, |c| c.clamp(0.0, 1.0))
}

// ── Schema ──────────────────────────────────────────────────────────────

/// Full reply for one receipt image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptExtraction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub quality: QualityScores,
    /// All visible text in reading order, newline separated.
    #[serde(default, deserialize_with = "lenient_text")]
    pub raw_text: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extractions: Extractions,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    /// Reserved for per-line geometry; passed through untouched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: Vec<Value>,
}

impl ReceiptExtraction {
    /// Parse a raw model reply, tolerating prose or fences around the JSON.
    pub fn from_model_reply(text: &str) -> Result<Self, ExtractError> {
        parse_model_json(text)
    }

    /// Sum of line-item prices, rounded to cents. Items without a price count as zero.
    pub fn items_total(&self) -> f64 {
        let sum: f64 = self.items.iter().filter_map(|item| item.price).sum();
        (sum * 100.0).round() / 100.0
    }
}

/// Model's own assessment of the photo, each score in `0.0..=1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    #[serde(default, deserialize_with = "lenient_score")]
    pub blur: f64,
    #[serde(default, deserialize_with = "lenient_score")]
    pub glare: f64,
    #[serde(default, deserialize_with = "lenient_score")]
    pub readability: f64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_low_quality: bool,
}

/// Receipt header fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extractions {
    pub merchant: Field<String>,
    /// As printed; date formats on receipts are too varied to normalise here.
    pub date: Field<String>,
    pub total: Field<f64>,
    pub subtotal: Field<f64>,
    pub tax: Field<f64>,
    pub discount: Field<f64>,
    pub tip: Field<f64>,
    pub fees: Field<f64>,
    pub currency: Field<String>,
}

/// A value the model may have left out, with its confidence.
///
/// Accepts `{"value": .., "confidence": ..}`, a bare value (confidence 0),
/// or `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field<T> {
    pub value: Option<T>,
    pub confidence: f64,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }
}

impl<'de, T: Lenient> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let field = match Value::deserialize(deserializer)? {
            Value::Object(map) => Field {
                value: map.get("value").and_then(T::from_json),
                confidence: map.get("confidence").map_or(0.0, clamp_confidence),
            },
            bare => Field {
                value: T::from_json(&bare),
                confidence: 0.0,
            },
        };
        Ok(field)
    }
}

/// One purchased line. `price` is the line total, not the unit price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    /// Units bought; `None` when the number on the line is a size or pack count.
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub confidence: f64,
    #[serde(default)]
    pub category_prediction: Category,
}

/// Spending category predicted for a line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Groceries,
    Dining,
    Transport,
    Household,
    Health,
    Tech,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Dining,
        Category::Transport,
        Category::Household,
        Category::Health,
        Category::Tech,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::Dining => "Dining",
            Category::Transport => "Transport",
            Category::Household => "Household",
            Category::Health => "Health",
            Category::Tech => "Tech",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup; anything unrecognised is [`Category::Other`].
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Category::from_label(&s),
            _ => Category::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn money_strings() {
        assert_eq!(parse_money("$1,234.56"), Some(1234.56));
        assert_eq!(parse_money("  12.50 USD "), Some(12.5));
        assert_eq!(parse_money("USD 7"), Some(7.0));
        assert_eq!(parse_money("-$3.00"), Some(-3.0));
        assert_eq!(parse_money("$-3.00"), Some(-3.0));
        assert_eq!(parse_money(".99"), Some(0.99));
        assert_eq!(parse_money("free"), None);
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("2 for 5"), None);
    }

    #[test]
    fn quantities() {
        assert_eq!(u32::from_json(&json!(2)), Some(2));
        assert_eq!(u32::from_json(&json!(3.0)), Some(3));
        assert_eq!(u32::from_json(&json!(" 4 ")), Some(4));
        assert_eq!(u32::from_json(&json!(1.5)), None);
        assert_eq!(u32::from_json(&json!(-1)), None);
        assert_eq!(u32::from_json(&json!("two")), None);
        assert_eq!(u32::from_json(&Value::Null), None);
    }

    #[test]
    fn field_shapes() {
        let f: Field<f64> = serde_json::from_value(json!({"value": "$8.00", "confidence": 0.7})).unwrap();
        assert_eq!(f, Field { value: Some(8.0), confidence: 0.7 });

        let f: Field<String> = serde_json::from_value(json!("Corner Deli")).unwrap();
        assert_eq!(f.value.as_deref(), Some("Corner Deli"));
        assert_eq!(f.confidence, 0.0);

        let f: Field<f64> = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(f, Field::default());

        let f: Field<String> = serde_json::from_value(json!({"value": "  ", "confidence": 3})).unwrap();
        assert_eq!(f.value, None);
        assert_eq!(f.confidence, 1.0);
    }

    #[test]
    fn categories_are_forgiving() {
        assert_eq!(Category::from_label("groceries"), Category::Groceries);
        assert_eq!(Category::from_label(" TECH "), Category::Tech);
        assert_eq!(Category::from_label("Pets"), Category::Other);
        let c: Category = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(c, Category::Other);
        assert_eq!(serde_json::to_value(Category::Health).unwrap(), json!("Health"));
    }

    #[test]
    fn full_reply_round() {
        let reply = r#"```json
{
  "quality": { "blur": 0.1, "glare": "0.2", "readability": 0.9, "is_low_quality": false },
  "raw_text": "CORNER DELI\n2 Chicken Breast $8.00\n12pk Soda $6.99\nTOTAL $14.99",
  "summary": "Deli purchase.",
  "extractions": {
    "merchant": { "value": "CORNER DELI", "confidence": 0.95 },
    "date": { "value": null, "confidence": 0.0 },
    "total": { "value": 14.99, "confidence": 0.9 },
    "tax": null,
    "currency": { "value": "USD", "confidence": 0.5 }
  },
  "items": [
    { "name": "Chicken Breast", "price": "$8.00", "quantity": 2, "unit_price": 4.0, "confidence": 0.8, "category_prediction": "Groceries" },
    { "name": "12pk Soda", "price": 6.99, "quantity": null, "unit_price": null, "confidence": 0.8, "category_prediction": "Beverages" }
  ],
  "lines": []
}
```"#;
        let r = ReceiptExtraction::from_model_reply(reply).unwrap();
        assert_eq!(r.quality.glare, 0.2);
        assert!(!r.quality.is_low_quality);
        assert_eq!(r.extractions.merchant.value.as_deref(), Some("CORNER DELI"));
        assert_eq!(r.extractions.date.value, None);
        assert_eq!(r.extractions.tax, Field::default());
        assert_eq!(r.extractions.tip, Field::default());
        assert_eq!(r.items.len(), 2);
        assert_eq!(r.items[0].price, Some(8.0));
        assert_eq!(r.items[0].quantity, Some(2));
        assert_eq!(r.items[1].quantity, None);
        assert_eq!(r.items[1].category_prediction, Category::Other);
        assert_eq!(r.items_total(), 14.99);
    }

    #[test]
    fn sparse_reply_defaults() {
        let r = ReceiptExtraction::from_model_reply(r#"{"items": null, "raw_text": null}"#).unwrap();
        assert_eq!(r, ReceiptExtraction::default());
        assert_eq!(r.items_total(), 0.0);
    }

    #[test]
    fn reply_without_json_fails() {
        let err = ReceiptExtraction::from_model_reply("I could not read this receipt.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonStart));
    }
}
