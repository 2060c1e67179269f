//! Cases - Legal matters and the simulations run against them

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CaseSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub scenario_count: u32,
}

/// Background facts of a case.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseBackground {
    #[serde(default)]
    pub party_a: String,
    #[serde(default)]
    pub party_b: String,
    /// The backend sends either a list or a single pre-formatted string
    #[serde(default, deserialize_with = "string_or_list")]
    pub key_issues: Vec<String>,
    #[serde(default)]
    pub general_notes: String,
}

impl CaseBackground {
    /// Key issues as a bulleted block.
    pub fn key_issues_text(&self) -> String {
        self.key_issues
            .iter()
            .map(|issue| format!("• {issue}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Append transcribed text to the general notes on a new line.
    pub fn append_note(&mut self, text: &str) {
        if self.general_notes.is_empty() {
            self.general_notes = text.to_string();
        } else {
            self.general_notes.push('\n');
            self.general_notes.push_str(text);
        }
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        List(Vec<String>),
        Single(Option<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => items,
        StringOrList::Single(Some(text)) if !text.trim().is_empty() => text
            .lines()
            .map(|line| line.trim_start_matches('•').trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        StringOrList::Single(_) => Vec::new(),
    })
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimulationSummary {
    pub id: i64,
    pub headline: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "nodeCount")]
    pub node_count: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CaseDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub background: CaseBackground,
    #[serde(default)]
    pub simulations: Vec<SimulationSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewCase {
    pub name: String,
    #[serde(default)]
    pub party_a: String,
    #[serde(default)]
    pub party_b: String,
    pub context: Option<String>,
}

impl NewCase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            party_a: String::new(),
            party_b: String::new(),
            context: None,
        }
    }
}

/// Response to a background update; the backend regenerates the summary.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseUpdated {
    #[serde(default)]
    pub summary: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Simulation {
    pub id: i64,
    pub headline: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub case_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewSimulation {
    pub headline: String,
    pub brief: String,
    pub case_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_issues_accept_list_or_string() {
        let listed: CaseBackground =
            serde_json::from_value(serde_json::json!({ "key_issues": ["custody", "home"] })).unwrap();
        assert_eq!(listed.key_issues, vec!["custody", "home"]);

        let text: CaseBackground =
            serde_json::from_value(serde_json::json!({ "key_issues": "• custody\n• home\n" })).unwrap();
        assert_eq!(text.key_issues, vec!["custody", "home"]);
        assert_eq!(text.key_issues_text(), "• custody\n• home");

        let missing: CaseBackground =
            serde_json::from_value(serde_json::json!({ "key_issues": null })).unwrap();
        assert!(missing.key_issues.is_empty());
    }

    #[test]
    fn append_note_separates_with_newline() {
        let mut background = CaseBackground::default();
        background.append_note("first");
        background.append_note("second");
        assert_eq!(background.general_notes, "first\nsecond");
    }

    #[test]
    fn simulation_summary_accepts_camel_case() {
        let summary: SimulationSummary = serde_json::from_value(serde_json::json!({
            "id": 2, "headline": "Mediation", "brief": "b", "createdAt": "2025-10-18", "nodeCount": 12
        }))
        .unwrap();
        assert_eq!(summary.node_count, 12);
        assert_eq!(summary.created_at.as_deref(), Some("2025-10-18"));
    }
}
