//! Contract interface descriptor.
//!
//! ```json
//! {
//!   "contract": "oct...",
//!   "methods": [
//!     {"name": "claim", "label": "Claim reward", "type": "call", "params": []},
//!     {"name": "balance_of", "label": "Balance", "type": "view",
//!      "params": [{"name": "address", "example": "oct..."}]}
//!   ]
//! }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid contract interface: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("Method '{method}' takes {expected} parameter(s), got {got}")]
    Arity {
        method: String,
        expected: usize,
        got: usize,
    },
}

/// How a method is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MethodKind {
    /// Read-only, unsigned.
    View,
    /// State-changing, signed transaction.
    Call,
    Unknown(String),
}

impl From<String> for MethodKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "view" => MethodKind::View,
            "call" => MethodKind::Call,
            _ => MethodKind::Unknown(kind),
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::View => f.write_str("view"),
            MethodKind::Call => f.write_str("call"),
            MethodKind::Unknown(kind) => f.write_str(kind),
        }
    }
}

/// Display and validation hints for one parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub example: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub max: Option<String>,
}

impl ParamSpec {
    /// Prompt text, e.g. `amount (e.g. 10) (max: 100): `.
    pub fn prompt(&self) -> String {
        let mut prompt = self.name.clone();
        if let Some(example) = &self.example {
            prompt.push_str(&format!(" (e.g. {})", example));
        }
        if let Some(max) = &self.max {
            prompt.push_str(&format!(" (max: {})", max));
        }
        prompt.push_str(": ");
        prompt
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContractMethod {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: MethodKind,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl ContractMethod {
    /// Check that `params` supplies exactly one value per declared parameter.
    pub fn check_arity(&self, params: &[String]) -> Result<(), DescriptorError> {
        if params.len() != self.params.len() {
            return Err(DescriptorError::Arity {
                method: self.name.clone(),
                expected: self.params.len(),
                got: params.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContractInterface {
    /// Contract address.
    pub contract: String,
    pub methods: Vec<ContractMethod>,
}

impl ContractInterface {
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn method(&self, name: &str) -> Result<&ContractMethod, DescriptorError> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| DescriptorError::UnknownMethod(name.to_string()))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
