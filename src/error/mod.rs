use serde::Deserialize;
use thiserror::Error;

use crate::connection::{ChannelKind, ConnectionState};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing configuration: {0}")]
    Configuration(String),

    #[error("Transport error on {channel} channel: {message}")]
    Transport { channel: ChannelKind, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cannot send on {channel} channel while {state}")]
    NotOpen {
        channel: ChannelKind,
        state: ConnectionState,
    },

    #[error("Empty chat message rejected")]
    EmptyMessage,

    #[error("Request failed: {}", user_message(.field.as_deref(), .message))]
    Request {
        status: Option<u16>,
        field: Option<String>,
        message: String,
    },
}

impl ClientError {
    pub fn transport(channel: ChannelKind, message: impl Into<String>) -> Self {
        Self::Transport {
            channel,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Text shown to the user in a blocking alert for a failed request.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Request { field, message, .. } => {
                user_message(field.as_deref(), message)
            }
            other => other.to_string(),
        }
    }

    /// Classify a failed REST response body.
    ///
    /// A structured validation error names the first failing field and its
    /// first message. Anything else becomes a generic failure.
    pub fn from_response(status: u16, body: &str) -> Self {
        let generic = || ClientError::Request {
            status: Some(status),
            field: None,
            message: "Something went wrong on server side.".to_string(),
        };

        if status != 400 {
            return generic();
        }

        match serde_json::from_str::<ValidationBody>(body) {
            Ok(ValidationBody::Detail { detail }) => ClientError::Request {
                status: Some(status),
                field: None,
                message: detail,
            },
            Ok(ValidationBody::Fields(fields)) => {
                let first = fields.into_iter().find_map(|(field, value)| {
                    let message = match value {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .find_map(|item| item.as_str().map(str::to_string)),
                        _ => None,
                    }?;
                    Some((field, message))
                });
                match first {
                    Some((field, message)) => ClientError::Request {
                        status: Some(status),
                        field: Some(field),
                        message,
                    },
                    None => generic(),
                }
            }
            Err(_) => generic(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request {
            status: err.status().map(|s| s.as_u16()),
            field: None,
            message: err.to_string(),
        }
    }
}

fn user_message(field: Option<&str>, message: &str) -> String {
    match field {
        Some(field) => format!("{}: {}", field, message),
        None => message.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationBody {
    Detail { detail: String },
    Fields(serde_json::Map<String, serde_json::Value>),
}

pub type Result<T> = std::result::Result<T, ClientError>;
