use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_TEMPLATE_VERSION: &str = "1.0";

/// One versioned body of a template. `json` is opaque to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInstance {
    pub json: String,
    pub version: String,
}

impl TemplateInstance {
    pub fn new(json: String, version: Option<&str>) -> Self {
        Self {
            json,
            version: version.unwrap_or(DEFAULT_TEMPLATE_VERSION).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub owner: String,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub instances: Vec<TemplateInstance>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub owner: String,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub instances: Vec<TemplateInstance>,
}

impl NewTemplate {
    /// Unpublished, untagged template holding a single instance.
    pub fn draft(owner: impl Into<String>, instance: TemplateInstance) -> Self {
        Self {
            owner: owner.into(),
            is_published: false,
            tags: vec![],
            instances: vec![instance],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateQuery {
    pub id: Option<String>,
    pub owner: Option<String>,
    pub is_published: Option<bool>,
}

impl TemplateQuery {
    pub fn matches(&self, template: &Template) -> bool {
        self.id.as_ref().map_or(true, |id| *id == template.id)
            && self.owner.as_ref().map_or(true, |owner| *owner == template.owner)
            && self
                .is_published
                .map_or(true, |published| published == template.is_published)
    }
}
