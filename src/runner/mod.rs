pub mod executor;

use crate::config::NavigatorConfig;
use crate::decision::{parse_recommendation, ActionRecommendation};
use crate::observe;
use crate::oracle::DecisionOracle;
use crate::page::{PageDriver, PageLauncher};
use crate::prompt::DecisionRequest;
use crate::{Error, Result};
use executor::ActionOutcome;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"]+"#).expect("url regex is valid"))
}

/// First `http://` or `https://` URL in a free-text instruction.
pub fn extract_url(instruction: &str) -> Option<String> {
    url_re().find(instruction).map(|m| m.as_str().to_string())
}

/// How a navigation session ended.
#[derive(Debug)]
pub enum Outcome {
    /// The oracle declared the goal reached after a successful click.
    Completed(ActionRecommendation),
    /// The page had no visible links or buttons.
    NoElements,
    /// The oracle call failed or its answer could not be parsed.
    DecisionError(Error),
    /// The recommended element could not be clicked or hovered.
    ActionFailed,
    /// The iteration budget ran out before completion.
    Exhausted,
}

/// Coarse result for callers that only care about "answer / nothing / no".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A final recommendation is available.
    Result,
    /// No result was produced.
    Null,
    /// The session ran but did not succeed.
    Negative,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// The recommendation that completed the task.
    pub fn recommendation(&self) -> Option<&ActionRecommendation> {
        match self {
            Outcome::Completed(rec) => Some(rec),
            _ => None,
        }
    }

    pub fn signal(&self) -> Signal {
        match self {
            Outcome::Completed(_) => Signal::Result,
            Outcome::NoElements | Outcome::DecisionError(_) => Signal::Null,
            Outcome::ActionFailed | Outcome::Exhausted => Signal::Negative,
        }
    }

    /// Terminal state name for logs and CLI output.
    pub fn state(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::NoElements => "no_elements",
            Outcome::DecisionError(_) => "decision_error",
            Outcome::ActionFailed => "action_failed",
            Outcome::Exhausted => "exhausted",
        }
    }
}

/// Result of one navigation session.
#[derive(Debug)]
pub struct NavigationReport {
    /// URL the session started from.
    pub url: String,
    /// Terminal state.
    pub outcome: Outcome,
    /// Oracle calls made, including dropdown re-selections.
    pub decisions: u32,
    /// Successful clicks.
    pub clicks: u32,
}

/// Drives a page toward a goal, one oracle decision at a time.
pub struct Navigator<O> {
    config: NavigatorConfig,
    oracle: O,
}

impl<O: DecisionOracle> Navigator<O> {
    pub fn new(config: NavigatorConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Run one session for `instruction`, which must contain a URL.
    ///
    /// The page is launched after the URL check and closed exactly once,
    /// whatever the outcome. Page failures outside a single click or hover
    /// (initial navigation, element scans) are returned as `Err`.
    pub async fn navigate<L: PageLauncher>(
        &self,
        launcher: &L,
        instruction: &str,
    ) -> Result<NavigationReport> {
        let url = extract_url(instruction).ok_or_else(|| {
            Error::Input("no valid http:// or https:// URL found in the instruction".into())
        })?;

        let page = launcher.launch().await?;
        let result = self.drive(&page, instruction, &url).await;
        if let Err(e) = page.close().await {
            warn!("Failed to close browser: {}", e);
        }

        match &result {
            Ok(report) => info!(
                "Session ended: {} after {} decisions",
                report.outcome.state(),
                report.decisions
            ),
            Err(e) => error!("An error occurred: {}", e),
        }
        result
    }

    async fn drive<P: PageDriver>(
        &self,
        page: &P,
        goal: &str,
        url: &str,
    ) -> Result<NavigationReport> {
        let limits = &self.config.limits;

        info!("Visiting URL: {}", url);
        page.goto(url, limits.navigation_timeout_ms).await?;

        let mut remaining = limits.max_iterations;
        let mut pending: Option<DecisionRequest> = None;
        let mut decisions = 0;
        let mut clicks = 0;

        let outcome = loop {
            if remaining == 0 {
                warn!(
                    "Iteration budget of {} exhausted before completion",
                    limits.max_iterations
                );
                break Outcome::Exhausted;
            }

            let request = match pending.take() {
                Some(request) => request,
                None => {
                    let observation = observe::observe(page).await?;
                    if observation.is_empty() {
                        warn!("No clickable elements found on the page");
                        break Outcome::NoElements;
                    }
                    DecisionRequest::new(goal, observation)
                }
            };

            remaining -= 1;
            decisions += 1;
            let recommendation = match self.decide(&request).await {
                Ok(rec) => rec,
                Err(e) => {
                    error!("Error getting a decision: {}", e);
                    break Outcome::DecisionError(e);
                }
            };

            match executor::execute(page, &recommendation, limits).await {
                ActionOutcome::Continue => clicks += 1,
                ActionOutcome::Stop => {
                    clicks += 1;
                    break Outcome::Completed(recommendation);
                }
                ActionOutcome::Failed => break Outcome::ActionFailed,
                ActionOutcome::Reselect(next) => pending = Some(next),
            }
        };

        Ok(NavigationReport {
            url: url.to_string(),
            outcome,
            decisions,
            clicks,
        })
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<ActionRecommendation> {
        debug!(
            "Asking {} about {} elements",
            self.oracle.name(),
            request.observation().len()
        );
        let response = self.oracle.decide(&request.render()).await?;
        info!("Oracle response \n {}", response);
        parse_recommendation(&response)
    }
}
