use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::{ConfigError, ConfigSource};

const CYCLE_GUARD_VAR: &str = "ELIF_INJECT_CYCLE_GUARD";
const REINJECT_VAR: &str = "ELIF_INJECT_REINJECT";
const MAX_DEPTH_VAR: &str = "ELIF_INJECT_MAX_DEPTH";

const DEFAULT_MAX_DEPTH: usize = 64;

/// How the injector avoids descending into the same type forever
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleGuard {
    /// Skip any type already being injected further up the path
    #[default]
    Ancestry,
    /// Only skip the immediately enclosing type
    #[serde(rename = "self")]
    SelfOnly,
}

impl FromStr for CycleGuard {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ancestry" | "path" => Ok(CycleGuard::Ancestry),
            "self" | "self_only" => Ok(CycleGuard::SelfOnly),
            _ => Err(ConfigError::invalid_value(
                "cycle_guard",
                s,
                "ancestry or self",
            )),
        }
    }
}

impl std::fmt::Display for CycleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = match self {
            CycleGuard::Ancestry => "ancestry",
            CycleGuard::SelfOnly => "self",
        };
        write!(f, "{}", guard)
    }
}

/// Injector behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    pub cycle_guard: CycleGuard,
    /// Re-run injection on registered instances passed to initializers
    pub reinject_instances: bool,
    /// Deepest nesting of recursive injection
    pub max_depth: usize,
}

impl InjectorConfig {
    pub fn new() -> Self {
        Self {
            cycle_guard: CycleGuard::Ancestry,
            reinject_instances: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(guard) = env::var(CYCLE_GUARD_VAR) {
            config.cycle_guard = guard.parse()?;
        }

        if let Ok(reinject) = env::var(REINJECT_VAR) {
            config.reinject_instances = reinject.trim().parse().map_err(|_| {
                ConfigError::invalid_value("reinject_instances", &reinject, "true or false")
            })?;
        }

        if let Ok(depth) = env::var(MAX_DEPTH_VAR) {
            config.max_depth = depth.trim().parse().map_err(|_| {
                ConfigError::invalid_value("max_depth", &depth, "positive integer")
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML, e.g. an `inject:` section of an
    /// application config file
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::invalid_value(
                "max_depth",
                "0",
                "at least 1",
            ));
        }
        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();

        for (field, var, default) in [
            ("cycle_guard", CYCLE_GUARD_VAR, "ancestry".to_string()),
            ("reinject_instances", REINJECT_VAR, "true".to_string()),
            ("max_depth", MAX_DEPTH_VAR, DEFAULT_MAX_DEPTH.to_string()),
        ] {
            let source = if env::var(var).is_ok() {
                ConfigSource::EnvVar(var.to_string())
            } else {
                ConfigSource::Default(default)
            };
            sources.insert(field.to_string(), source);
        }

        sources
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self::new()
    }
}
