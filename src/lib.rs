//! # eoka-navigator
//!
//! Goal-directed browser navigation. Each iteration observes the page's links
//! and buttons, asks a language model which one moves toward the goal, and
//! clicks (or hovers) it. The loop ends when the model answers `exit_now`,
//! an action cannot be performed, or the iteration budget runs out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_navigator::{EokaLauncher, GeminiOracle, NavigatorConfig, Navigator};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_navigator::Result<()> {
//! let config = NavigatorConfig::load("configs/navigator.yaml")?;
//! let oracle = GeminiOracle::new(&config.oracle)?;
//! let launcher = EokaLauncher::new(config.browser.clone());
//!
//! let navigator = Navigator::new(config, oracle);
//! let report = navigator
//!     .navigate(&launcher, "Download the 2025 holiday list from https://example.com/")
//!     .await?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

mod config;
pub mod decision;
pub mod observe;
pub mod oracle;
pub mod page;
pub mod prompt;
mod runner;

pub use config::{BrowserConfig, Limits, NavigatorConfig, OracleConfig, Params, Viewport};
pub use decision::{parse_recommendation, ActionRecommendation, Confidence, RecommendedAction};
pub use observe::{ElementTag, InteractiveElement, Observation};
pub use oracle::{BlockingFnOracle, DecisionOracle, FnOracle, GeminiOracle};
pub use page::{EokaLauncher, EokaPage, PageDriver, PageLauncher, RawElement, Selector};
pub use prompt::DecisionRequest;
pub use runner::executor::{execute, selector_plan, ActionOutcome};
pub use runner::{extract_url, NavigationReport, Navigator, Outcome, Signal};

/// Result type for eoka-navigator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or navigation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("invalid instruction: {0}")]
    Input(String),

    #[error("oracle error: {0}")]
    Oracle(String),

    #[error("unparseable decision: {0}")]
    Parse(String),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = NavigatorConfig::parse("{}").unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.limits.max_iterations, 100);
        assert_eq!(config.limits.navigation_timeout_ms, 30_000);
        assert_eq!(config.limits.click_timeout_ms, 5_000);
        assert_eq!(config.limits.click_settle_ms, 5_000);
        assert_eq!(config.limits.hover_settle_ms, 1_000);
        assert_eq!(config.oracle.timeout_ms, 60_000);
        assert_eq!(config.browser.script_timeout_ms, 10_000);
    }

    #[test]
    fn test_validation_zero_script_timeout() {
        let yaml = r#"
browser:
  script_timeout_ms: 0
"#;
        let err = NavigatorConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("script_timeout_ms"));
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
browser:
  headless: true
  slow_mo_ms: 250
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  viewport:
    width: 1920
    height: 1080
"#;
        let config = NavigatorConfig::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.slow_mo_ms, 250);
        assert_eq!(config.browser.proxy, Some("http://localhost:8080".into()));
        assert_eq!(config.browser.user_agent, Some("Custom UA".into()));
        let viewport = config.browser.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }

    #[test]
    fn test_parse_oracle_and_limits() {
        let yaml = r#"
oracle:
  model: "gemini-1.5-pro"
  api_key: "k-123"
  timeout_ms: 15000
limits:
  max_iterations: 7
  click_timeout_ms: 2500
"#;
        let config = NavigatorConfig::parse(yaml).unwrap();
        assert_eq!(config.oracle.model, "gemini-1.5-pro");
        assert_eq!(config.oracle.api_key, Some("k-123".into()));
        assert_eq!(config.oracle.timeout_ms, 15_000);
        assert_eq!(config.limits.max_iterations, 7);
        assert_eq!(config.limits.click_timeout_ms, 2_500);
        // untouched fields keep their defaults
        assert_eq!(config.limits.hover_settle_ms, 1_000);
    }

    #[test]
    fn test_validation_zero_iterations() {
        let yaml = r#"
limits:
  max_iterations: 0
"#;
        let result = NavigatorConfig::parse(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_validation_zero_click_timeout() {
        let yaml = r#"
limits:
  click_timeout_ms: 0
"#;
        assert!(NavigatorConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_validation_empty_model() {
        let yaml = r#"
oracle:
  model: ""
"#;
        let result = NavigatorConfig::parse(yaml);
        assert!(result.unwrap_err().to_string().contains("oracle.model"));
    }

    #[test]
    fn test_params_substitution() {
        let yaml = r#"
oracle:
  api_key: "${api_key}"
  model: "${model}"
"#;
        let params = Params::new()
            .set("api_key", "secret123")
            .set("model", "gemini-2.0-flash");
        let config = NavigatorConfig::parse_with_params(yaml, &params).unwrap();
        assert_eq!(config.oracle.api_key, Some("secret123".into()));
        assert_eq!(config.oracle.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_params_missing_variable() {
        let yaml = r#"
oracle:
  api_key: "${EOKA_NAVIGATOR_SURELY_UNSET_VAR}"
"#;
        let result = NavigatorConfig::parse(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("EOKA_NAVIGATOR_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let yaml = r#"
limits:
  max_tries: 3
"#;
        assert!(NavigatorConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_load_example_config() {
        let params = Params::new().set("GEMINI_API_KEY", "test-key");
        let config = NavigatorConfig::load_with_params("configs/navigator.yaml", &params).unwrap();
        assert_eq!(config.oracle.model, "gemini-1.5-flash");
        assert_eq!(config.oracle.api_key, Some("test-key".into()));
        assert_eq!(config.limits.max_iterations, 100);
    }

    #[test]
    fn test_error_messages() {
        let err = Error::Input("no URL found".into());
        assert_eq!(err.to_string(), "invalid instruction: no URL found");
        let err = Error::Parse("missing next_steps".into());
        assert_eq!(err.to_string(), "unparseable decision: missing next_steps");
    }
}
