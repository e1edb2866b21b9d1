use crate::{Error, Result};
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Values for `${NAME}` placeholders in a config file.
///
/// Explicit values win; anything not set here is looked up in the process
/// environment, so `api_key: "${GEMINI_API_KEY}"` works without `-P`.
#[derive(Debug, Clone, Default)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Explicitly set value only; the environment is not consulted.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `-P KEY=VALUE` arguments. The value may itself contain `=`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter()
            .map(|arg| match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.to_string()))
                }
                _ => Err(Error::Config(format!(
                    "invalid param '{}', expected KEY=VALUE",
                    arg
                ))),
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self)
    }

    fn lookup(&self, name: &str) -> Result<String> {
        if let Some(value) = self.get(name) {
            return Ok(value.to_string());
        }
        std::env::var(name).map_err(|_| {
            Error::Config(format!(
                "missing parameter or environment variable: {}",
                name
            ))
        })
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder regex is valid"))
}

/// Replace every `${NAME}` in `template`. A `${` without a closing brace is
/// left untouched.
pub fn substitute(template: &str, params: &Params) -> Result<String> {
    let mut missing = None;
    let out = placeholder_re().replace_all(template, |caps: &Captures| {
        match params.lookup(caps[1].trim()) {
            Ok(value) => value,
            Err(e) => {
                missing.get_or_insert(e);
                String::new()
            }
        }
    });
    match missing {
        Some(e) => Err(e),
        None => Ok(out.into_owned()),
    }
}

/// Apply [`substitute`] to every string scalar in a YAML tree. Keys are left alone.
pub fn substitute_value(value: &mut Value, params: &Params) -> Result<()> {
    match value {
        Value::String(s) => *s = substitute(s, params)?,
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params)?;
            }
        }
        Value::Sequence(items) => {
            for v in items {
                substitute_value(v, params)?;
            }
        }
        Value::Tagged(tagged) => substitute_value(&mut tagged.value, params)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
