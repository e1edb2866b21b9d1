//! The page capability the navigator drives.
//!
//! Everything the loop needs from a browser goes through [`PageDriver`], so the
//! decision logic can run against a real `eoka` page or an in-memory double.

mod chrome;

pub use chrome::{EokaLauncher, EokaPage};

use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// One `a`/`button` element as reported by the page, before filtering.
///
/// `error` is set when probing this particular element failed; the other
/// fields are then meaningless.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawElement {
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub visible: bool,
    pub error: Option<String>,
}

impl RawElement {
    /// Convenience constructor for a visible element.
    pub fn visible(tag: &str, text: &str, attributes: &[(&str, &str)]) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            visible: true,
            error: None,
        }
    }
}

/// How to locate a click target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Link whose `href` attribute equals the value exactly.
    Href(String),
    /// Link or button whose trimmed text contains the value (case-insensitive).
    Text(String),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Href(h) => write!(f, "a[href='{}']", h),
            Selector::Text(t) => write!(f, "a:has-text('{}')", t),
        }
    }
}

/// A live page. Owned by one navigation session at a time.
#[async_trait(?Send)]
pub trait PageDriver {
    /// Navigate to `url`, failing with [`crate::Error::Timeout`] after `timeout_ms`.
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Every `a` and `button` currently attached, in document order.
    async fn interactive_elements(&self) -> Result<Vec<RawElement>>;

    /// Hover the nearest `li` around a link whose text matches `text`.
    /// `Ok(false)` when no such list item exists.
    async fn hover_list_item(&self, text: &str) -> Result<bool>;

    /// Click the element `selector` resolves to, bounded by `timeout_ms`.
    async fn click(&self, selector: &Selector, timeout_ms: u64) -> Result<()>;

    /// Fixed delay.
    async fn wait(&self, ms: u64);

    /// Release the page and whatever browser backs it.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Acquires a fresh page for one session.
#[async_trait(?Send)]
pub trait PageLauncher {
    type Page: PageDriver;

    async fn launch(&self) -> Result<Self::Page>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display() {
        assert_eq!(
            Selector::Href("/services/pdf".into()).to_string(),
            "a[href='/services/pdf']"
        );
        assert_eq!(
            Selector::Text("Services".into()).to_string(),
            "a:has-text('Services')"
        );
    }

    #[test]
    fn test_raw_element_with_error_only() {
        let raw: Vec<RawElement> =
            serde_json::from_str(r#"[{"error": "detached"}, {"tag": "a", "text": "Home", "attributes": {"href": "/"}, "visible": true}]"#)
                .unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].error.as_deref(), Some("detached"));
        assert!(!raw[0].visible);
        assert_eq!(raw[1].attributes.get("href").map(String::as_str), Some("/"));
    }
}
