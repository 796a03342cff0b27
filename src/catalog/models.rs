//! Catalog data models: one record per known decision prompt, with its
//! choices populated lazily from the remote archive.

use serde::{Deserialize, Serialize};

/// Owner name that makes a trainee event match every active character.
pub const OWNER_WILDCARD: &str = "All Umamusume";

/// Which part of the game a decision prompt belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    Trainee,
    Support,
    Scenario,
}

impl EventKind {
    /// Route raw OCR text for the type zone. Unrecognized text falls back
    /// to `Scenario`.
    pub fn parse(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if lowered.contains("trainee") {
            EventKind::Trainee
        } else if lowered.contains("support") {
            EventKind::Support
        } else {
            EventKind::Scenario
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Trainee => "Trainee",
            EventKind::Support => "Support",
            EventKind::Scenario => "Scenario",
        }
    }
}

/// One selectable option within a decision prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub number: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub success_outcomes: Vec<String>,
    #[serde(default)]
    pub failure_outcomes: Vec<String>,
}

impl Choice {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            label: None,
            success_outcomes: Vec::new(),
            failure_outcomes: Vec::new(),
        }
    }
}

/// A persisted decision-prompt record. `choices` starts absent and is
/// populated at most once from the remote archive, then treated as
/// immutable cached data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub index: i64,
    pub archive_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub owning_character: String,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

impl CatalogRecord {
    pub fn has_choices(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Trainee ownership check: the active character or the wildcard owner.
    pub fn owned_by(&self, character: &str) -> bool {
        self.owning_character.eq_ignore_ascii_case(character)
            || self.owning_character.eq_ignore_ascii_case(OWNER_WILDCARD)
    }

    /// The record title is a case-insensitive prefix of the OCR'd title.
    /// OCR tends to append trailing garbage, so prefix is the right test.
    pub fn title_matches(&self, ocr_title: &str) -> bool {
        let ocr = ocr_title.to_lowercase();
        ocr.starts_with(&self.title.to_lowercase())
    }
}
