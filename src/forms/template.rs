use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;

/// Body of `POST /template`.
#[derive(Serialize, Deserialize, Debug, Default, Validate)]
pub struct TemplateForm {
    pub template: Option<Value>,
    pub id: Option<String>, // accepted, not used
    #[validate(min_length = 1)]
    #[validate(max_length = 32)]
    pub version: Option<String>,
}

impl TemplateForm {
    /// The template document. A string body is parsed as JSON; only objects and arrays are accepted.
    pub fn template_json(&self) -> Result<Value, String> {
        let value = match &self.template {
            None | Some(Value::Null) => return Err("Template is required.".to_string()),
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
                .map_err(|err| format!("Template is not valid JSON: {}", err))?,
            Some(value) => value.clone(),
        };

        match value {
            Value::Object(_) | Value::Array(_) => Ok(value),
            _ => Err("Template must be a JSON object or array.".to_string()),
        }
    }
}
