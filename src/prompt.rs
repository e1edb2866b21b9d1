//! Decision requests: the goal plus the current observation, rendered as the
//! prompt the oracle answers.

use crate::decision::EXIT_NOW;
use crate::observe::{ElementTag, Observation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Shape the oracle must answer with.
const RESPONSE_SCHEMA: &str = r#"{
    "recommended_action": {
        "element_tag": "string",
        "element_text": "string",
        "element_attributes": {},
        "confidence": "high|medium|low",
        "reasoning": "string"
    },
    "next_steps": ["string"],
    "alternative_paths": ["string"]
}"#;

#[derive(Serialize)]
struct ElementRecord<'a> {
    tag: ElementTag,
    content: ElementContent<'a>,
}

#[derive(Serialize)]
struct ElementContent<'a> {
    text: &'a str,
    attributes: &'a BTreeMap<String, String>,
    visible: bool,
}

/// One question for the oracle. Rendering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    goal: String,
    observation: Observation,
}

impl DecisionRequest {
    pub fn new(goal: impl Into<String>, observation: Observation) -> Self {
        Self {
            goal: goal.into(),
            observation,
        }
    }

    /// Follow-up request after a dropdown trigger was hovered open.
    pub fn reselect(hovered_text: &str, observation: Observation) -> Self {
        Self::new(
            format!(
                "Which element should I click after hovering over '{}'?",
                hovered_text
            ),
            observation,
        )
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    /// The element list as JSON, one record per element.
    pub fn elements_json(&self) -> String {
        let records: Vec<ElementRecord<'_>> = self
            .observation
            .elements()
            .iter()
            .map(|e| ElementRecord {
                tag: e.tag,
                content: ElementContent {
                    text: &e.text,
                    attributes: &e.attributes,
                    visible: e.visible,
                },
            })
            .collect();
        serde_json::to_string(&records).unwrap_or_default()
    }

    /// Render the prompt text.
    pub fn render(&self) -> String {
        format!(
            "Task: {goal}\n\
             Website Elements Analysis:\n\
             Found {count} clickable elements.\n\
             \n\
             Please analyze these elements and provide:\n\
             1. The exact element to click on for completing the task\n\
             2. Any subsequent steps needed\n\
             3. Confirmation that this is the optimal path\n\
             4. If you determine that the task has been fully accomplished, set \"next_steps\": [\"{exit}\"].\n\
             \n\
             Available elements: {elements}\n\
             \n\
             Return response as JSON:\n\
             {schema}\n",
            goal = self.goal,
            count = self.observation.len(),
            exit = EXIT_NOW,
            elements = self.elements_json(),
            schema = RESPONSE_SCHEMA,
        )
    }
}

impl fmt::Display for DecisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::InteractiveElement;

    fn link(text: &str, href: &str) -> InteractiveElement {
        let mut attributes = BTreeMap::new();
        attributes.insert("href".to_string(), href.to_string());
        attributes.insert("class".to_string(), "nav-link".to_string());
        InteractiveElement {
            tag: ElementTag::Link,
            text: text.into(),
            attributes,
            visible: true,
        }
    }

    fn sample() -> Observation {
        Observation::new(vec![
            link("Home", "/"),
            link("Services", "#"),
            InteractiveElement {
                tag: ElementTag::Button,
                text: "Search".into(),
                attributes: BTreeMap::new(),
                visible: true,
            },
        ])
    }

    #[test]
    fn test_render_embeds_goal_count_and_schema() {
        let req = DecisionRequest::new("Download the 2025 holiday list", sample());
        let text = req.render();
        assert!(text.starts_with("Task: Download the 2025 holiday list\n"));
        assert!(text.contains("Found 3 clickable elements."));
        assert!(text.contains(r#""next_steps": ["exit_now"]"#));
        assert!(text.contains(r#""recommended_action""#));
        assert!(text.contains(r#""confidence": "high|medium|low""#));
        assert!(text.contains(r#""alternative_paths""#));
    }

    #[test]
    fn test_elements_serialized_in_order() {
        let req = DecisionRequest::new("goal", sample());
        let json = req.elements_json();
        assert_eq!(
            json,
            concat!(
                r#"[{"tag":"a","content":{"text":"Home","attributes":{"class":"nav-link","href":"/"},"visible":true}},"#,
                r##"{"tag":"a","content":{"text":"Services","attributes":{"class":"nav-link","href":"#"},"visible":true}},"##,
                r#"{"tag":"button","content":{"text":"Search","attributes":{},"visible":true}}]"#
            )
        );
        assert!(req.render().contains(&json));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = DecisionRequest::new("same goal", sample());
        let b = DecisionRequest::new("same goal", sample());
        assert_eq!(a.render(), a.render());
        assert_eq!(a.render().as_bytes(), b.render().as_bytes());
    }

    #[test]
    fn test_empty_observation_renders() {
        let text = DecisionRequest::new("anything", Observation::default()).render();
        assert!(text.contains("Found 0 clickable elements."));
        assert!(text.contains("Available elements: []"));
    }

    #[test]
    fn test_reselect_goal() {
        let req = DecisionRequest::reselect("Services", sample());
        assert_eq!(
            req.goal(),
            "Which element should I click after hovering over 'Services'?"
        );
        assert_eq!(req.to_string(), req.render());
    }
}
