//! Element extraction: turns the page's links and buttons into an [`Observation`].

use crate::page::PageDriver;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Display text used for elements with no visible text.
pub const NO_TEXT: &str = "[No Text]";

/// Kinds of element the navigator can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementTag {
    #[serde(rename = "a", alias = "link")]
    Link,
    #[serde(rename = "button")]
    Button,
}

impl ElementTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementTag::Link => "a",
            ElementTag::Button => "button",
        }
    }
}

impl FromStr for ElementTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "link" => Ok(ElementTag::Link),
            "button" => Ok(ElementTag::Button),
            other => Err(Error::Parse(format!("unknown element tag: {}", other))),
        }
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A visible link or button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveElement {
    pub tag: ElementTag,
    /// Trimmed display text, or [`NO_TEXT`].
    pub text: String,
    /// All attributes, sorted by name.
    pub attributes: BTreeMap<String, String>,
    pub visible: bool,
}

impl InteractiveElement {
    pub fn href(&self) -> Option<&str> {
        self.attributes.get("href").map(String::as_str)
    }
}

/// The visible interactive elements of a page at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    elements: Vec<InteractiveElement>,
}

impl Observation {
    pub fn new(elements: Vec<InteractiveElement>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[InteractiveElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First element whose text contains `needle` (case-insensitive).
    pub fn find_by_text(&self, needle: &str) -> Option<&InteractiveElement> {
        let needle_lower = needle.trim().to_lowercase();
        self.elements
            .iter()
            .find(|e| e.text.to_lowercase().contains(&needle_lower))
    }
}

/// Snapshot the page's visible links and buttons, in document order.
///
/// Elements whose probe failed are logged and skipped. An empty observation is
/// a normal result.
pub async fn observe<P: PageDriver + ?Sized>(page: &P) -> Result<Observation> {
    let raw = page.interactive_elements().await?;
    let total = raw.len();

    let mut elements = Vec::with_capacity(total);
    for r in raw {
        if let Some(err) = r.error {
            warn!("Error processing element: {}", err);
            continue;
        }
        if !r.visible {
            continue;
        }
        let Ok(tag) = r.tag.parse::<ElementTag>() else {
            debug!("skipping <{}>: not a link or button", r.tag);
            continue;
        };
        let trimmed = r.text.trim();
        let text = if trimmed.is_empty() {
            NO_TEXT.to_string()
        } else {
            trimmed.to_string()
        };
        debug!("Processed element: {} | Text: {}", tag, text);
        elements.push(InteractiveElement {
            tag,
            text,
            attributes: r.attributes,
            visible: true,
        });
    }

    debug!("{} of {} elements visible", elements.len(), total);
    Ok(Observation::new(elements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{RawElement, Selector};
    use async_trait::async_trait;

    struct FixedPage(Vec<RawElement>);

    #[async_trait(?Send)]
    impl PageDriver for FixedPage {
        async fn goto(&self, _url: &str, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }
        async fn interactive_elements(&self) -> Result<Vec<RawElement>> {
            Ok(self.0.clone())
        }
        async fn hover_list_item(&self, _text: &str) -> Result<bool> {
            Ok(false)
        }
        async fn click(&self, _selector: &Selector, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }
        async fn wait(&self, _ms: u64) {}
        async fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_filters_invisible_and_failed() {
        let mut hidden = RawElement::visible("a", "Hidden", &[("href", "/h")]);
        hidden.visible = false;
        let broken = RawElement {
            error: Some("element detached".into()),
            ..Default::default()
        };
        let page = FixedPage(vec![
            RawElement::visible("a", "Home", &[("href", "/")]),
            hidden,
            broken,
            RawElement::visible("button", "Search", &[]),
        ]);

        let obs = observe(&page).await.unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.elements()[0].tag, ElementTag::Link);
        assert_eq!(obs.elements()[0].href(), Some("/"));
        assert_eq!(obs.elements()[1].tag, ElementTag::Button);
        assert!(obs.elements().iter().all(|e| e.visible));
    }

    #[tokio::test]
    async fn test_empty_text_gets_sentinel() {
        let page = FixedPage(vec![RawElement::visible("a", "   ", &[("href", "/x")])]);
        let obs = observe(&page).await.unwrap();
        assert_eq!(obs.elements()[0].text, NO_TEXT);
    }

    #[tokio::test]
    async fn test_text_is_trimmed() {
        let page = FixedPage(vec![RawElement::visible("A", "  Services \n", &[])]);
        let obs = observe(&page).await.unwrap();
        assert_eq!(obs.elements()[0].text, "Services");
        assert_eq!(obs.elements()[0].tag, ElementTag::Link);
    }

    #[tokio::test]
    async fn test_no_elements_is_ok() {
        let obs = observe(&FixedPage(vec![])).await.unwrap();
        assert!(obs.is_empty());
    }

    #[test]
    fn test_find_by_text() {
        let obs = Observation::new(vec![InteractiveElement {
            tag: ElementTag::Link,
            text: "Holiday List 2025".into(),
            attributes: BTreeMap::new(),
            visible: true,
        }]);
        assert!(obs.find_by_text("holiday list").is_some());
        assert!(obs.find_by_text("tenders").is_none());
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("a".parse::<ElementTag>().unwrap(), ElementTag::Link);
        assert_eq!(" link ".parse::<ElementTag>().unwrap(), ElementTag::Link);
        assert_eq!("BUTTON".parse::<ElementTag>().unwrap(), ElementTag::Button);
        let err = "div".parse::<ElementTag>().unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("unknown element tag: div"));
    }
}
