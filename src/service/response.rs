//! Classification of service responses into errors

use crate::error::{ConfigField, Error, RemoteError, Result, ServiceError};
use crate::http::ResponseContainer;
use crate::types::SUPPORTED_SERVICE_VERSION;
use serde::Deserialize;

/// Boilerplate suffix some services append to error bodies
const REFERENCE_MARKER: &str = "Refer to https";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<ErrorMessage>,
    #[serde(default)]
    innererror: Option<InnerError>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InnerError {
    #[serde(default)]
    transactionid: Option<String>,
}

impl From<ErrorPayload> for RemoteError {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            code: payload.code,
            message: payload.message.and_then(|m| m.value),
            transaction_id: payload.innererror.and_then(|i| i.transactionid),
        }
    }
}

/// Fail on an unsuccessful status or an unsupported service version
pub fn check_response(context: &str, response: &ResponseContainer) -> Result<()> {
    check_status(context, response)?;
    check_version(context, response)
}

/// Fail on an unsuccessful status.
///
/// The error is attributed to the credentials on 401 and to the entity
/// name on 400, 403 and 404.
pub fn check_status(context: &str, response: &ResponseContainer) -> Result<()> {
    let status = response.status();
    if response.is_success() {
        return Ok(());
    }

    let error = match status {
        401 => ServiceError::new(format!("{context}: invalid credentials")).with_status(status),
        404 => invalid_entity(context).with_status(status),
        _ => {
            let body = response.body_text();
            let body = match body.find(REFERENCE_MARKER) {
                Some(index) => body[..index].trim_end().to_string(),
                None => body,
            };

            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => ServiceError::new(format!(
                    "{context}: HTTP {status} {}",
                    response.status_message()
                ))
                .with_remote(parsed.error.into()),
                Err(_) if body.trim_start().starts_with("<html>") => invalid_entity(context),
                Err(_) => ServiceError::new(format!(
                    "{context}: HTTP {status} {}: {body}",
                    response.status_message()
                )),
            }
            .with_status(status)
        }
    };

    let error = Error::Service(error);
    Err(match status {
        401 => error.with_config_field(ConfigField::Credentials),
        400 | 403 | 404 => error.with_config_field(ConfigField::EntityName),
        _ => error,
    })
}

/// Fail unless the response carries the supported service version
pub fn check_version(context: &str, response: &ResponseContainer) -> Result<()> {
    match response.service_version() {
        Some(version) if version.trim() == SUPPORTED_SERVICE_VERSION => Ok(()),
        Some(version) => Err(Error::service(format!(
            "{context}: unsupported data service version '{}', expected '{SUPPORTED_SERVICE_VERSION}'",
            version.trim()
        ))),
        None => Err(Error::service(format!(
            "{context}: missing data service version"
        ))),
    }
}

fn invalid_entity(context: &str) -> ServiceError {
    ServiceError::new(format!("{context}: invalid entity name"))
}
