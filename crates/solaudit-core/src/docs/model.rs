use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::coerce::stringify;

/// Name used when the model does not name the contract.
pub const FALLBACK_NAME: &str = "Contract";

/// Structured contract documentation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Documentation {
    pub name: String,
    pub description: String,
    pub version: String,
    pub license: String,
    pub functions: Vec<FunctionDoc>,
    pub events: Vec<EventDoc>,
    pub variables: Vec<VariableDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionDoc {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamDoc>,
    pub visibility: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDoc {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub visibility: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub indexed: bool,
}

fn text(value: &Value, key: &str) -> String {
    value.get(key).map(stringify).unwrap_or_default()
}

/// Object entries of a list field; anything else is dropped.
fn objects<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
}

fn params(value: &Value) -> Vec<ParamDoc> {
    objects(value, "params")
        .map(|p| ParamDoc {
            name: text(p, "name"),
            type_name: text(p, "type"),
            description: Some(text(p, "description")).filter(|d| !d.is_empty()),
            indexed: match p.get("indexed") {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
                _ => false,
            },
        })
        .collect()
}

/// Coerce any JSON value into `Documentation`. Never fails.
pub fn coerce_documentation(payload: &Value) -> Documentation {
    let name = text(payload, "name");
    Documentation {
        name: if name.trim().is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            name
        },
        description: text(payload, "description"),
        version: text(payload, "version"),
        license: text(payload, "license"),
        functions: objects(payload, "functions")
            .map(|f| FunctionDoc {
                name: text(f, "name"),
                description: text(f, "description"),
                params: params(f),
                visibility: text(f, "visibility"),
            })
            .collect(),
        events: objects(payload, "events")
            .map(|e| EventDoc {
                name: text(e, "name"),
                description: text(e, "description"),
                params: params(e),
            })
            .collect(),
        variables: objects(payload, "variables")
            .map(|v| VariableDoc {
                name: text(v, "name"),
                type_name: text(v, "type"),
                visibility: text(v, "visibility"),
                description: text(v, "description"),
            })
            .collect(),
    }
}
