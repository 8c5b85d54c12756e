//! Configuration validation.
//!
//! # Responsibilities
//! - Check every required environment value (port, five backend URLs)
//! - Validate value ranges (port > 0, timeouts > 0, log queue > 0)
//! - Reject targets the gateway cannot reach (non-http schemes, no host)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure functions over `Environment` / `GatewaySettings`
//! - Runs before anything binds a port

use thiserror::Error;
use url::Url;

use crate::config::env::Environment;
use crate::config::schema::{BackendService, BackendTargets, GatewaySettings};

pub const PORT_VAR: &str = "PORT";

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} is set but empty")]
    Empty(&'static str),

    #[error("{var} has invalid port {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} has invalid URL {value:?}: {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("access_log.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
}

/// Validate the required environment values.
pub fn validate_environment(env: &Environment) -> Result<(u16, BackendTargets), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let port = match required(env, PORT_VAR) {
        Ok(raw) => match raw.parse::<u16>() {
            Ok(port) if port > 0 => Some(port),
            _ => {
                errors.push(ValidationError::InvalidPort {
                    var: PORT_VAR,
                    value: raw.to_string(),
                });
                None
            }
        },
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let mut target = |service: BackendService| {
        match required(env, service.env_var()).and_then(|raw| parse_target(service.env_var(), raw)) {
            Ok(url) => Some(url),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    };

    let photo = target(BackendService::Photo);
    let authentication = target(BackendService::Authentication);
    let profile = target(BackendService::Profile);
    let vote = target(BackendService::Vote);
    let comment = target(BackendService::Comment);

    match (port, photo, authentication, profile, vote, comment) {
        (
            Some(port),
            Some(photo),
            Some(authentication),
            Some(profile),
            Some(vote),
            Some(comment),
        ) => Ok((
            port,
            BackendTargets {
                photo,
                authentication,
                profile,
                vote,
                comment,
            },
        )),
        _ => Err(errors),
    }
}

/// Validate the tuning file.
pub fn validate_settings(settings: &GatewaySettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if settings.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if settings.timeouts.response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("response_secs"));
    }
    if settings.access_log.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn required<'a>(env: &'a Environment, var: &'static str) -> Result<&'a str, ValidationError> {
    match env.get(var).map(str::trim) {
        None => Err(ValidationError::Missing(var)),
        Some("") => Err(ValidationError::Empty(var)),
        Some(value) => Ok(value),
    }
}

fn parse_target(var: &'static str, raw: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        var,
        value: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
