use crate::config::Limits;
use crate::decision::ActionRecommendation;
use crate::observe::{self, ElementTag};
use crate::page::{PageDriver, Selector};
use crate::prompt::DecisionRequest;
use tracing::{debug, error, info, warn};

/// What happened when a recommendation was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Clicked; the task goes on.
    Continue,
    /// Clicked and the oracle said `exit_now`.
    Stop,
    /// No strategy could perform the action.
    Failed,
    /// A dropdown was hovered open; the oracle must pick from the new elements.
    Reselect(DecisionRequest),
}

/// Click strategies for a recommendation, in the order they are tried:
/// exact `href` first, then link text.
pub fn selector_plan(rec: &ActionRecommendation) -> Vec<Selector> {
    let mut plan = Vec::with_capacity(2);
    if let Some(href) = rec.navigable_href() {
        plan.push(Selector::Href(href.to_string()));
    }
    let text = rec.element_text().trim();
    if !text.is_empty() {
        plan.push(Selector::Text(text.to_string()));
    }
    plan
}

/// Links without a real href are treated as menu triggers. Buttons never are.
fn is_dropdown_trigger(rec: &ActionRecommendation) -> bool {
    rec.navigable_href().is_none() && rec.element_tag() != Some(ElementTag::Button)
}

/// Carry out one recommendation on the page.
pub async fn execute<P: PageDriver + ?Sized>(
    page: &P,
    rec: &ActionRecommendation,
    limits: &Limits,
) -> ActionOutcome {
    let text = rec.element_text().trim();
    info!("Attempting to click: {}", text);
    debug!("href: {:?}, next step: {}", rec.href(), rec.first_step());

    if is_dropdown_trigger(rec) {
        info!(
            "Element '{}' has no valid href. Attempting to hover first.",
            text
        );
        match page.hover_list_item(text).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("No list item contains a link with text '{}'", text);
                return ActionOutcome::Failed;
            }
            Err(e) => {
                warn!("Failed to hover over '{}': {}", text, e);
                return ActionOutcome::Failed;
            }
        }
        page.wait(limits.hover_settle_ms).await;
        info!("Hovered over '{}' successfully.", text);

        match observe::observe(page).await {
            Ok(revealed) if !revealed.is_empty() => {
                info!("Passing {} dropdown elements to the oracle", revealed.len());
                return ActionOutcome::Reselect(DecisionRequest::reselect(text, revealed));
            }
            Ok(_) => debug!("hover revealed no elements, clicking '{}' directly", text),
            Err(e) => {
                warn!("Failed to read submenu of '{}': {}", text, e);
                return ActionOutcome::Failed;
            }
        }
    }

    for selector in selector_plan(rec) {
        match page.click(&selector, limits.click_timeout_ms).await {
            Ok(()) => {
                info!("Successfully clicked element using selector: {}", selector);
                page.wait(limits.click_settle_ms).await;
                return if rec.is_exit() {
                    ActionOutcome::Stop
                } else {
                    ActionOutcome::Continue
                };
            }
            Err(e) => warn!("Failed to click with selector {}: {}", selector, e),
        }
    }

    error!("Failed to click element using all selectors");
    ActionOutcome::Failed
}
