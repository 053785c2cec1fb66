use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;

use crate::error::HandlerError;
use crate::upstream::Upstream;

pub const FALLBACK: &str = "No data!";

/// What part of the upstream payload ends up in `random_info`.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// The whole parsed document.
    FullPayload,
    /// The value of one key of a JSON object.
    Field(String),
}

#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    status_code: u16,
    body: String,
}

#[derive(Serialize)]
struct Body<'a> {
    message: &'a str,
    random_info: Value,
}

pub struct Handler<U> {
    upstream: U,
    url: String,
    message: String,
    extraction: Extraction,
}

impl<U: Upstream> Handler<U> {
    pub fn new(
        upstream: U,
        url: impl Into<String>,
        message: impl Into<String>,
        extraction: Extraction,
    ) -> Self {
        Self {
            upstream,
            url: url.into(),
            message: message.into(),
            extraction,
        }
    }

    async fn random_info(&self, request_id: &str) -> Result<Value, HandlerError> {
        let response = self.upstream.get(&self.url).await?;
        tracing::info!(request_id, status = response.status, "upstream responded");

        if response.status != 200 {
            tracing::warn!(
                request_id,
                status = response.status,
                "no upstream data, using fallback"
            );
            return Ok(Value::from(FALLBACK));
        }

        let payload: Value =
            serde_json::from_slice(&response.body).map_err(HandlerError::MalformedJson)?;
        extract(payload, &self.extraction)
    }
}

fn extract(payload: Value, extraction: &Extraction) -> Result<Value, HandlerError> {
    match extraction {
        Extraction::FullPayload => Ok(payload),
        Extraction::Field(name) => match payload {
            Value::Object(mut fields) => fields
                .remove(name)
                .ok_or_else(|| HandlerError::MissingField(name.clone())),
            _ => Err(HandlerError::NotAnObject(name.clone())),
        },
    }
}

/// Fetches the upstream document and wraps it in an API Gateway style envelope.
/// The event payload is accepted but not inspected.
pub(crate) async fn function_handler<U: Upstream>(
    handler: &Handler<U>,
    event: LambdaEvent<Value>,
) -> Result<Response, Error> {
    let random_info = handler.random_info(&event.context.request_id).await?;

    let body = serde_json::to_string(&Body {
        message: &handler.message,
        random_info,
    })
    .map_err(HandlerError::Encode)?;

    Ok(Response {
        status_code: 200,
        body,
    })
}
