use failwatch::Member;
use failwatch::Role;

/// One row of `patronictl list -f json`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct MemberRow {
    #[serde(rename = "Member")]
    pub member: String,

    #[serde(rename = "Host", default)]
    pub host: Option<String>,

    #[serde(rename = "Role")]
    pub role: String,

    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "TL", default)]
    pub timeline: Option<u64>,

    /// A number, or an empty string when unknown.
    #[serde(rename = "Lag in MB", default)]
    pub lag_in_mb: Option<serde_json::Value>,
}

impl MemberRow {
    /// Parse the whole JSON array printed by `patronictl list -f json`.
    pub fn parse_list(s: &str) -> Result<Vec<MemberRow>, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn lag_mb(&self) -> Option<f64> {
        self.lag_in_mb.as_ref().and_then(|v| v.as_f64())
    }
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member::new(row.member, Role::parse(&row.role), row.state)
    }
}
