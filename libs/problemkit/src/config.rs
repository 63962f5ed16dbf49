//! Declarative API behavior configuration.
//!
//! `ApiBehaviorConfig` is the serde model read from configuration files. It
//! acts as the user configuration step between
//! [`ApiBehaviorOptionsSetup::configure`] and
//! [`ApiBehaviorOptionsSetup::post_configure`].

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::compat::CompatibilityVersion;
use crate::options::ApiBehaviorOptions;
use crate::setup::{ApiBehaviorOptionsSetup, client_error_problem};

/// Configuration error for API behavior options
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown compatibility version '{value}' (expected 2.0, 2.1, 2.2 or latest)")]
    UnknownCompatibilityVersion { value: String },
    #[error("client error key '{value}' is not a valid HTTP status code")]
    InvalidStatusCode { value: String },
    #[error("status code {status} is not a client or server error")]
    NotAnErrorStatus { status: u16 },
}

/// Problem mapping for one status code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientErrorConfig {
    pub title: String,
    /// Problem `type`; `about:blank` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiBehaviorConfig {
    pub compatibility_version: CompatibilityVersion,

    /// Explicit value; when absent the compatibility version decides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_use_problem_details_for_client_error_responses: Option<bool>,

    pub suppress_map_client_errors: bool,

    /// Extra or replacement problem mappings keyed by status code ("404").
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub client_errors: BTreeMap<String, ClientErrorConfig>,
}

impl ApiBehaviorConfig {
    #[must_use]
    pub fn setup(&self) -> ApiBehaviorOptionsSetup {
        ApiBehaviorOptionsSetup::new(self.compatibility_version)
    }

    /// Apply this configuration to options that went through `configure`.
    ///
    /// # Errors
    /// Returns `ConfigError` if a `client_errors` key is not an error status code.
    pub fn apply(&self, options: &mut ApiBehaviorOptions) -> Result<(), ConfigError> {
        if let Some(allow) = self.allow_use_problem_details_for_client_error_responses {
            options.set_allow_use_problem_details_for_client_error_responses(allow);
        }
        options.suppress_map_client_errors = self.suppress_map_client_errors;

        for (key, mapping) in &self.client_errors {
            let status = parse_error_status(key)?;
            let link = mapping
                .link
                .clone()
                .unwrap_or_else(|| "about:blank".to_owned());
            options.set_problem_details_factory(
                status,
                client_error_problem(status, mapping.title.clone(), link),
            );
        }
        Ok(())
    }

    /// Run the full options build: setup `configure`, this config, setup
    /// `post_configure`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn build_options(&self) -> Result<ApiBehaviorOptions, ConfigError> {
        let setup = self.setup();
        let mut options = ApiBehaviorOptions::default();
        setup.configure(&mut options);
        self.apply(&mut options)?;
        setup.post_configure(&mut options);

        tracing::info!(
            compatibility_version = %self.compatibility_version,
            problem_details = options.allow_use_problem_details_for_client_error_responses(),
            mapped_status_codes = options.problem_details_factories().len(),
            "API behavior options configured"
        );
        Ok(options)
    }
}

fn parse_error_status(key: &str) -> Result<StatusCode, ConfigError> {
    let status = key
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ConfigError::InvalidStatusCode {
            value: key.to_owned(),
        })?;
    if status.is_client_error() || status.is_server_error() {
        Ok(status)
    } else {
        Err(ConfigError::NotAnErrorStatus {
            status: status.as_u16(),
        })
    }
}
