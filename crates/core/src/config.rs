// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Describes how a coordinator is seeded: a label for logs, an initial anonymous
//! count, and named tasks to wait on. Loadable from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse coordinator config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Seed for a new coordinator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Label used in log records
    pub name: String,
    /// Anonymous units outstanding from the start
    pub initial_count: u64,
    /// Named tasks outstanding from the start; repeats count as separate occurrences
    pub events: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: "coordinator".to_string(),
            initial_count: 0,
            events: Vec::new(),
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.initial_count = count;
        self
    }

    pub fn with_events<I>(mut self, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
