//! Declarative option schema.
//!
//! The server only performs *structural* validation; value semantics are the
//! processor's responsibility. The one rule enforced centrally is the dimension
//! option.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single choice for a `select` option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectChoice {
    pub value: String,
    pub label: String,
}

/// The recognized option kinds, each carrying its own constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Select {
        choices: Vec<SelectChoice>,
        #[serde(skip_serializing_if = "Option::is_none")]
        presets: Option<Vec<String>>,
    },
    Text,
    Dimension {
        min: i64,
        max: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        presets: Option<Vec<i64>>,
        #[serde(default)]
        allow_original: bool,
    },
}

/// One option in a processor's schema, as served by `GET /processors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDef {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: OptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// UI visibility hint: `{ otherOptionId: value | [value, ...] }`. Opaque to the server.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "showWhen")]
    pub show_when: Option<HashMap<String, serde_json::Value>>,
}

impl OptionDef {
    pub fn number(id: impl Into<String>, label: impl Into<String>) -> OptionDefBuilder {
        OptionDefBuilder::new(id, label, OptionKind::Number { min: None, max: None, step: None })
    }

    pub fn select(
        id: impl Into<String>,
        label: impl Into<String>,
        choices: Vec<SelectChoice>,
    ) -> OptionDefBuilder {
        OptionDefBuilder::new(id, label, OptionKind::Select { choices, presets: None })
    }

    pub fn text(id: impl Into<String>, label: impl Into<String>) -> OptionDefBuilder {
        OptionDefBuilder::new(id, label, OptionKind::Text)
    }

    pub fn dimension(id: impl Into<String>, label: impl Into<String>, min: i64, max: i64) -> OptionDefBuilder {
        OptionDefBuilder::new(id, label, OptionKind::Dimension { min, max, presets: None, allow_original: false })
    }
}

/// Small builder to keep processor descriptor construction readable.
pub struct OptionDefBuilder(OptionDef);

impl OptionDefBuilder {
    fn new(id: impl Into<String>, label: impl Into<String>, kind: OptionKind) -> Self {
        Self(OptionDef { id: id.into(), label: label.into(), kind, default: None, show_when: None })
    }

    pub fn default(mut self, value: serde_json::Value) -> Self {
        self.0.default = Some(value);
        self
    }

    pub fn min_max(mut self, min: f64, max: f64) -> Self {
        if let OptionKind::Number { min: m, max: x, .. } = &mut self.0.kind {
            *m = Some(min);
            *x = Some(max);
        }
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        if let OptionKind::Number { step: s, .. } = &mut self.0.kind {
            *s = Some(step);
        }
        self
    }

    pub fn allow_original(mut self, allow: bool) -> Self {
        if let OptionKind::Dimension { allow_original, .. } = &mut self.0.kind {
            *allow_original = allow;
        }
        self
    }

    pub fn presets_i64(mut self, presets: Vec<i64>) -> Self {
        if let OptionKind::Dimension { presets: p, .. } = &mut self.0.kind {
            *p = Some(presets);
        }
        self
    }

    pub fn show_when(mut self, other_id: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.show_when.get_or_insert_with(HashMap::new).insert(other_id.into(), value);
        self
    }

    pub fn build(self) -> OptionDef {
        self.0
    }
}

/// Validate a submitted options object against a schema, enforcing only the
/// dimension rule centrally. All other validation is the processor's job once
/// it parses `options` for itself.
pub fn validate_options(schema: &[OptionDef], options: &serde_json::Value) -> Result<()> {
    let serde_json::Value::Object(map) = options else {
        return Err(Error::MalformedOptions("options must be a JSON object".to_string()));
    };

    for def in schema {
        let OptionKind::Dimension { min, max, allow_original, .. } = &def.kind else {
            continue;
        };
        let Some(value) = map.get(&def.id) else {
            continue;
        };

        if let Some(s) = value.as_str() {
            if *allow_original && s == "original" {
                continue;
            }
            return Err(Error::DimensionOutOfRange {
                field: def.id.clone(),
                message: format!("'{s}' is not a valid value (expected an integer in [{min}, {max}]{})",
                    if *allow_original { " or \"original\"" } else { "" }),
            });
        }

        let Some(n) = value.as_i64() else {
            return Err(Error::DimensionOutOfRange {
                field: def.id.clone(),
                message: "expected an integer or \"original\"".to_string(),
            });
        };

        if n < *min || n > *max {
            return Err(Error::DimensionOutOfRange {
                field: def.id.clone(),
                message: format!("{n} is outside of [{min}, {max}]"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<OptionDef> {
        vec![OptionDef::dimension("resize", "Resize", 16, 8192).allow_original(true).build()]
    }

    #[test]
    fn accepts_original_literal() {
        assert!(validate_options(&schema(), &json!({"resize": "original"})).is_ok());
    }

    #[test]
    fn accepts_in_range_integer() {
        assert!(validate_options(&schema(), &json!({"resize": 1080})).is_ok());
    }

    #[test]
    fn rejects_out_of_range_integer() {
        let err = validate_options(&schema(), &json!({"resize": 100000})).unwrap_err();
        assert!(matches!(err, Error::DimensionOutOfRange { .. }));
    }

    #[test]
    fn rejects_original_when_not_allowed() {
        let schema = vec![OptionDef::dimension("resize", "Resize", 16, 8192).build()];
        let err = validate_options(&schema, &json!({"resize": "original"})).unwrap_err();
        assert!(matches!(err, Error::DimensionOutOfRange { .. }));
    }

    #[test]
    fn missing_option_is_fine() {
        assert!(validate_options(&schema(), &json!({})).is_ok());
    }

    #[test]
    fn non_object_options_rejected() {
        let err = validate_options(&schema(), &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::MalformedOptions(_)));
    }
}
