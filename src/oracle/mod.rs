//! The decision oracle: prompt in, text out.

mod gemini;

pub use gemini::GeminiOracle;

use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can answer a decision request.
///
/// One call per decision point, no streaming. Synchronous backends go through
/// [`FnOracle`] or, when they block, [`BlockingFnOracle`].
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, prompt: &str) -> Result<String>;

    /// Name for logging.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<O: DecisionOracle + ?Sized> DecisionOracle for Arc<O> {
    async fn decide(&self, prompt: &str) -> Result<String> {
        (**self).decide(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<O: DecisionOracle + ?Sized> DecisionOracle for Box<O> {
    async fn decide(&self, prompt: &str) -> Result<String> {
        (**self).decide(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adapts a closure into a [`DecisionOracle`].
///
/// The closure runs inline on the runtime thread, so it must not block.
/// Wrap synchronous network clients in [`BlockingFnOracle`] instead.
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> DecisionOracle for FnOracle<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn decide(&self, prompt: &str) -> Result<String> {
        (self.f)(prompt)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Runs a blocking closure on tokio's blocking pool.
pub struct BlockingFnOracle<F> {
    f: Arc<F>,
}

impl<F> BlockingFnOracle<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl<F> DecisionOracle for BlockingFnOracle<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync + 'static,
{
    async fn decide(&self, prompt: &str) -> Result<String> {
        let f = Arc::clone(&self.f);
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || f(&prompt))
            .await
            .map_err(|e| Error::Oracle(format!("oracle task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "blocking-fn"
    }
}
