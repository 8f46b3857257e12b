use serde::{Deserialize, Deserializer};

/// A bug ticket as returned by the search endpoint. Only id and key are requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    /// Numeric issue id. Jira sends it as a JSON string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: u64,
    /// Human-facing key (e.g., "BUG-1")
    pub key: String,
}

/// One page of `/rest/api/latest/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Merge state of a linked pull request as reported by dev status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrStatus {
    Merged,
    Open,
    Declined,
    Other(String),
}

impl From<String> for PrStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "MERGED" => PrStatus::Merged,
            "OPEN" => PrStatus::Open,
            "DECLINED" => PrStatus::Declined,
            _ => PrStatus::Other(value),
        }
    }
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrStatus::Merged => write!(f, "MERGED"),
            PrStatus::Open => write!(f, "OPEN"),
            PrStatus::Declined => write!(f, "DECLINED"),
            PrStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl<'de> Deserialize<'de> for PrStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(PrStatus::from)
    }
}

/// A pull request linked to an issue's development activity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkedPr {
    /// Tracker-internal id with a one-character prefix (e.g., "#123")
    pub id: String,
    pub status: PrStatus,
    /// Web URL of the PR on GitHub
    pub url: String,
}

impl LinkedPr {
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }
}

/// Body of `/rest/dev-status/latest/issue/detail`.
#[derive(Debug, Deserialize)]
pub struct DevStatusResponse {
    #[serde(default)]
    pub detail: Vec<DevStatusDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevStatusDetail {
    #[serde(default)]
    pub pull_requests: Vec<LinkedPr>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
