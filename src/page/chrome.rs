//! `PageDriver` over a real Chrome page driven by eoka.

use super::{PageDriver, PageLauncher, RawElement, Selector};
use crate::config::BrowserConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::{Browser, Page};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Enumerate every link and button with its attributes and visibility.
/// A failure on one element is reported in place instead of aborting the scan.
const EXTRACT_JS: &str = r#"(() => {
    const out = [];
    for (const el of document.querySelectorAll('a, button')) {
        try {
            const attributes = {};
            for (const attr of el.attributes) attributes[attr.name] = attr.value;
            const rect = el.getBoundingClientRect();
            const style = getComputedStyle(el);
            const visible = rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden';
            out.push({
                tag: el.tagName.toLowerCase(),
                text: (el.innerText || '').trim(),
                attributes,
                visible,
            });
        } catch (e) {
            out.push({ error: String(e) });
        }
    }
    return JSON.stringify(out);
})()"#;

/// Find the first list item holding a link whose text contains the needle and
/// return the centre of that `li`. Collapsed items (or collapsed links) are
/// skipped; `null` when no list item qualifies.
const LIST_ITEM_POINT_JS: &str = r#"((needle) => {
    const want = needle.trim().toLowerCase();
    const solid = (r) => r.width > 0 && r.height > 0;
    for (const a of document.querySelectorAll('li a')) {
        if (!(a.innerText || '').trim().toLowerCase().includes(want)) continue;
        const li = a.closest('li');
        if (!li || !solid(a.getBoundingClientRect())) continue;
        li.scrollIntoView({ block: 'center' });
        const r = li.getBoundingClientRect();
        if (!solid(r)) continue;
        return JSON.stringify({ x: r.x + r.width / 2, y: r.y + r.height / 2 });
    }
    return 'null';
})(__NEEDLE__)"#;

/// Resolve "link or button containing text" to a unique CSS path.
const FIND_BY_TEXT_JS: &str = r#"((needle) => {
    const want = needle.trim().toLowerCase();
    for (const el of document.querySelectorAll('a, button')) {
        if (!(el.innerText || '').trim().toLowerCase().includes(want)) continue;
        if (el.id) return '#' + CSS.escape(el.id);
        const path = [];
        let node = el;
        while (node && node !== document.body) {
            let selector = node.tagName.toLowerCase();
            if (node.id) {
                path.unshift('#' + CSS.escape(node.id));
                break;
            }
            const siblings = Array.from(node.parentNode?.children || []);
            if (siblings.length > 1) selector += ':nth-child(' + (siblings.indexOf(node) + 1) + ')';
            path.unshift(selector);
            node = node.parentNode;
        }
        return path.join(' > ');
    }
    return null;
})(__NEEDLE__)"#;

#[derive(Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

/// Launches a Chrome instance per session.
#[derive(Debug, Clone, Default)]
pub struct EokaLauncher {
    config: BrowserConfig,
}

impl EokaLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl PageLauncher for EokaLauncher {
    type Page = EokaPage;

    async fn launch(&self) -> Result<EokaPage> {
        let stealth = eoka::StealthConfig {
            headless: self.config.headless,
            proxy: self.config.proxy.clone(),
            user_agent: self.config.user_agent.clone(),
            viewport_width: self.config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: self.config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            self.config.headless, self.config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(EokaPage {
            browser,
            page,
            slow_mo_ms: self.config.slow_mo_ms,
            script_timeout_ms: self.config.script_timeout_ms,
        })
    }
}

/// A browser and its single page.
pub struct EokaPage {
    browser: Browser,
    page: Page,
    slow_mo_ms: u64,
    script_timeout_ms: u64,
}

impl EokaPage {
    /// Get a reference to the underlying page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn pace(&self) {
        if self.slow_mo_ms > 0 {
            self.page.wait(self.slow_mo_ms).await;
        }
    }

    async fn css_for(&self, selector: &Selector) -> Result<String> {
        match selector {
            Selector::Href(href) => Ok(format!("a[href={}]", js_string(href))),
            Selector::Text(text) => {
                let js = FIND_BY_TEXT_JS.replace("__NEEDLE__", &js_string(text));
                let found: Option<String> = self.page.evaluate(&js).await?;
                found.ok_or_else(|| {
                    Error::ActionFailed(format!("no link or button with text '{}'", text))
                })
            }
        }
    }
}

#[async_trait(?Send)]
impl PageDriver for EokaPage {
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()> {
        self.pace().await;
        bounded(timeout_ms, format!("navigation to {}", url), async {
            self.page.goto(url).await?;
            Ok::<_, Error>(())
        })
        .await
    }

    async fn interactive_elements(&self) -> Result<Vec<RawElement>> {
        let json_str: String = bounded(self.script_timeout_ms, "element scan".into(), async {
            Ok::<String, Error>(self.page.evaluate(EXTRACT_JS).await?)
        })
        .await?;
        let raw: Vec<RawElement> = serde_json::from_str(&json_str)
            .map_err(|e| eoka::Error::CdpSimple(format!("element scan parse error: {}", e)))?;
        debug!("Found {} clickable elements", raw.len());
        Ok(raw)
    }

    async fn hover_list_item(&self, text: &str) -> Result<bool> {
        self.pace().await;
        let js = LIST_ITEM_POINT_JS.replace("__NEEDLE__", &js_string(text));
        let json_str: String = bounded(
            self.script_timeout_ms,
            format!("locating list item '{}'", text),
            async { Ok::<String, Error>(self.page.evaluate(&js).await?) },
        )
        .await?;
        let point: Option<Point> = serde_json::from_str(&json_str)
            .map_err(|e| eoka::Error::CdpSimple(format!("hover point parse error: {}", e)))?;
        let Some(point) = point else {
            return Ok(false);
        };
        bounded(
            self.script_timeout_ms,
            format!("hovering '{}'", text),
            async {
                self.page
                    .session()
                    .dispatch_mouse_event(
                        eoka::cdp::MouseEventType::MouseMoved,
                        point.x,
                        point.y,
                        None,
                        None,
                    )
                    .await?;
                Ok::<_, Error>(())
            },
        )
        .await?;
        Ok(true)
    }

    async fn click(&self, selector: &Selector, timeout_ms: u64) -> Result<()> {
        self.pace().await;
        bounded(timeout_ms, format!("click {}", selector), async {
            let css = self.css_for(selector).await?;
            debug!("click: {} -> {}", selector, css);
            self.page.click(&css).await?;
            Ok::<_, Error>(())
        })
        .await
    }

    async fn wait(&self, ms: u64) {
        self.page.wait(ms).await;
    }

    async fn close(self) -> Result<()> {
        self.browser.close().await?;
        info!("Browser closed.");
        Ok(())
    }
}

/// Run `fut`, turning an elapsed deadline into [`Error::Timeout`].
async fn bounded<T>(
    timeout_ms: u64,
    what: String,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("{} exceeded {}ms", what, timeout_ms))),
    }
}

/// Quote a value as a JavaScript / CSS string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".into())
}
