use lambda_runtime::{run, service_fn, tracing, Error};
use std::sync::Arc;

mod error;
mod event_handler;
mod upstream;

use event_handler::{function_handler, Extraction, Handler};
use upstream::HttpUpstream;

const UPSTREAM_URL: &str = "https://test-api.k6.io/public/crocodiles/";
const MESSAGE: &str = "We are going to create a DevOps as a service powered by IA and Copilot";
// The crocodile list endpoint returns an array, so report it whole.
// Set a key (e.g. "name") when pointing at a single-crocodile endpoint.
const RANDOM_INFO_FIELD: Option<&str> = None;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let extraction = match RANDOM_INFO_FIELD {
        Some(name) => Extraction::Field(name.to_string()),
        None => Extraction::FullPayload,
    };
    let handler = Handler::new(HttpUpstream::new(), UPSTREAM_URL, MESSAGE, extraction);
    let handler = Arc::new(handler);

    run(service_fn(move |event| {
        let handler = Arc::clone(&handler);
        async move { function_handler(&*handler, event).await }
    }))
    .await
}
