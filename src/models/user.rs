use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity provider that authenticated a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Issuer {
    #[serde(rename = "AzureAD")]
    AzureAd,
    #[serde(rename = "JWT")]
    Jwt,
    #[serde(rename = "Static")]
    Static,
}

impl Issuer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Issuer::AzureAd => "AzureAD",
            Issuer::Jwt => "JWT",
            Issuer::Static => "Static",
        }
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Issuer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AzureAD" => Ok(Issuer::AzureAd),
            "JWT" => Ok(Issuer::Jwt),
            "Static" => Ok(Issuer::Static),
            other => Err(format!("unknown issuer {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub auth_id: String,
    pub issuer: Issuer,
    pub team: Vec<String>,
    pub org: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn key(&self) -> UserKey {
        UserKey {
            auth_id: self.auth_id.clone(),
            issuer: self.issuer,
        }
    }
}

/// A user is unique per (auth_id, issuer).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserKey {
    pub auth_id: String,
    pub issuer: Issuer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub auth_id: String,
    pub issuer: Issuer,
    pub team: Vec<String>,
    pub org: Vec<String>,
}

impl NewUser {
    pub fn new(auth_id: impl Into<String>, issuer: Issuer) -> Self {
        Self {
            auth_id: auth_id.into(),
            issuer,
            team: vec![],
            org: vec![],
        }
    }

    pub fn key(&self) -> UserKey {
        UserKey {
            auth_id: self.auth_id.clone(),
            issuer: self.issuer,
        }
    }
}
