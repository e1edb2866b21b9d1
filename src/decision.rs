//! Interpreting oracle output into an [`ActionRecommendation`].
//!
//! The oracle is asked for JSON but frequently wraps it in a markdown code
//! fence. The fence is stripped, the rest must parse.

use crate::observe::ElementTag;
use crate::{Error, Result};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// `next_steps` value meaning the task is complete.
pub const EXIT_NOW: &str = "exit_now";

/// Placeholder `href` used by dropdown triggers.
pub const PLACEHOLDER_HREF: &str = "#";

/// How sure the oracle is about its pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

/// The element the oracle wants acted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    #[serde(default)]
    pub element_tag: String,
    pub element_text: String,
    #[serde(default, deserialize_with = "lenient_string_map")]
    pub element_attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub reasoning: String,
}

/// A parsed oracle answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecommendation {
    pub recommended_action: RecommendedAction,
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub alternative_paths: Vec<String>,
}

impl ActionRecommendation {
    pub fn element_text(&self) -> &str {
        &self.recommended_action.element_text
    }

    /// Recognised tag, if the oracle named one.
    pub fn element_tag(&self) -> Option<ElementTag> {
        self.recommended_action.element_tag.parse().ok()
    }

    pub fn href(&self) -> Option<&str> {
        self.recommended_action
            .element_attributes
            .get("href")
            .map(String::as_str)
    }

    /// A real navigation target: present, non-empty and not `"#"`.
    pub fn navigable_href(&self) -> Option<&str> {
        self.href()
            .map(str::trim)
            .filter(|h| !h.is_empty() && *h != PLACEHOLDER_HREF)
    }

    pub fn first_step(&self) -> &str {
        self.next_steps.first().map(String::as_str).unwrap_or("")
    }

    /// Whether the oracle declared the task complete.
    pub fn is_exit(&self) -> bool {
        self.first_step().trim() == EXIT_NOW
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```[\w.+-]*").expect("fence regex is valid"))
}

/// Strip one leading fence (with or without a language tag, followed by a
/// newline or by the payload on the same line) and one trailing fence, then trim.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(fence) = fence_re().find(text) {
        text = text[fence.end()..].trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text.trim()
}

/// Parse raw oracle output into a recommendation.
pub fn parse_recommendation(raw: &str) -> Result<ActionRecommendation> {
    let cleaned = strip_code_fences(raw);
    let rec: ActionRecommendation = serde_json::from_str(cleaned)
        .map_err(|e| Error::Parse(format!("{} (got: {})", e, preview(cleaned))))?;

    if rec.next_steps.is_empty() {
        return Err(Error::Parse("next_steps must not be empty".into()));
    }
    Ok(rec)
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(80) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Attribute maps from the oracle are not always string-valued; keep what can
/// be shown as a string and drop nulls.
fn lenient_string_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let map = match value {
        None | Some(serde_json::Value::Null) => return Ok(BTreeMap::new()),
        Some(serde_json::Value::Object(map)) => map,
        Some(other) => {
            return Err(de::Error::custom(format!(
                "element_attributes must be an object, got {}",
                other
            )))
        }
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}
