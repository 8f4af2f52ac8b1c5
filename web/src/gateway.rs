use caici_core::{ChatMessage, JudgeConfig, RoundError};
use caici_protocol::{ApiErrorBody, ChatRequest, ChatResponse};
use gloo::net::http::Request;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum GatewayError {
    #[error("{0}")]
    Transport(String),
    #[error("API Error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("API response has no completion")]
    MissingContent,
}

impl GatewayError {
    fn from_status(status: u16, body: &str) -> Self {
        let message = ApiErrorBody::message_from(body).unwrap_or_else(|| "Unknown Error".into());
        Self::Status { status, message }
    }
}

impl From<gloo::net::Error> for GatewayError {
    fn from(err: gloo::net::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<GatewayError> for RoundError {
    fn from(err: GatewayError) -> Self {
        RoundError::Transport(err.to_string())
    }
}

pub(crate) type Result<T> = core::result::Result<T, GatewayError>;

/// Transport to the chat-completion endpoint. Content is passed through
/// untouched; callers decode it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct JudgeGateway {
    config: JudgeConfig,
}

impl JudgeGateway {
    pub(crate) fn new(config: JudgeConfig) -> Self {
        Self { config }
    }

    /// Sends `messages` and returns the text of the first completion choice.
    pub(crate) async fn ask(&self, messages: &[ChatMessage], structured: bool) -> Result<String> {
        let JudgeConfig {
            endpoint,
            model,
            temperature,
            ..
        } = &self.config;
        let body = ChatRequest::new(messages, model, *temperature).structured(structured);
        log::debug!("POST {} ({} messages)", endpoint, messages.len());

        let response = Request::post(endpoint)
            .header(
                "Authorization",
                &format!("Bearer {}", self.config.api_key()),
            )
            .json(&body)?
            .send()
            .await
            .inspect_err(|err| log::error!("judge request failed: {}", err))?;

        if !response.ok() {
            let error_body = response.text().await.unwrap_or_default();
            log::error!("API Error Details: {}", error_body);
            return Err(GatewayError::from_status(response.status(), &error_body));
        }

        response
            .json::<ChatResponse>()
            .await?
            .into_content()
            .ok_or(GatewayError::MissingContent)
    }
}
