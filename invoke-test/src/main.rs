use aws_config::BehaviorVersion;
use aws_sdk_lambda::Client;
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;

const FALLBACK: &str = "No data!";

#[derive(Default)]
struct Stats {
    data_count: usize,
    fallback_count: usize,
    error_count: usize,
    total_latency_ms: f64,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "statusCode")]
    status_code: u16,
    body: String,
}

#[derive(Deserialize)]
struct Body {
    random_info: Value,
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Data,
    Fallback,
    Error(String),
}

#[derive(Parser, Debug)]
#[command(name = "invoke-test")]
#[command(about = "Invoke the crocodile-info Lambda function and tally its answers")]
struct Args {
    /// Lambda function name
    function: String,

    /// Number of iterations to run
    #[arg(long, default_value = "100")]
    iters: usize,

    /// Number of parallel threads
    #[arg(long, default_value = "1")]
    threads: usize,
}

fn classify(payload: &str) -> Outcome {
    let envelope = match serde_json::from_str::<Envelope>(payload) {
        Ok(envelope) => envelope,
        Err(_) if payload.contains("errorType") || payload.contains("errorMessage") => {
            return Outcome::Error("function error".to_string());
        }
        Err(e) => return Outcome::Error(format!("unexpected response: {e}")),
    };

    if envelope.status_code != 200 {
        return Outcome::Error(format!("unexpected statusCode {}", envelope.status_code));
    }

    match serde_json::from_str::<Body>(&envelope.body) {
        Ok(body) if body.random_info == Value::from(FALLBACK) => Outcome::Fallback,
        Ok(_) => Outcome::Data,
        Err(e) => Outcome::Error(format!("undecodable body: {e}")),
    }
}

async fn run_invocations(
    client: Arc<Client>,
    function_name: String,
    thread_id: usize,
    start: usize,
    end: usize,
    total: usize,
    stats: Arc<Mutex<Stats>>,
) {
    for i in start..=end {
        let started = Instant::now();
        let result = client
            .invoke()
            .function_name(&function_name)
            .payload(aws_sdk_lambda::primitives::Blob::new("{}"))
            .send()
            .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(response) => {
                let response_payload = response
                    .payload()
                    .map(|b| String::from_utf8_lossy(b.as_ref()).to_string())
                    .unwrap_or_else(|| "No response".to_string());

                let outcome = classify(&response_payload);

                {
                    let mut stats = stats.lock().await;
                    match &outcome {
                        Outcome::Data => stats.data_count += 1,
                        Outcome::Fallback => stats.fallback_count += 1,
                        Outcome::Error(_) => stats.error_count += 1,
                    }
                    if !matches!(outcome, Outcome::Error(_)) {
                        stats.total_latency_ms += latency_ms;
                    }
                }

                println!(
                    "[Thread {}: {}/{}] {:?} in {:.3}ms => {}",
                    thread_id, i, total, outcome, latency_ms, response_payload
                );
            }
            Err(e) => {
                {
                    let mut stats = stats.lock().await;
                    stats.error_count += 1;
                }

                eprintln!("[Thread {}: {}/{}] Invoke failed: {}", thread_id, i, total, e);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let threads = args.threads.max(1);

    println!(
        "Running {} invocations across {} thread(s)",
        args.iters, threads
    );

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = Arc::new(Client::new(&config));

    let stats = Arc::new(Mutex::new(Stats::default()));

    let iters_per_thread = args.iters / threads;
    let remainder = args.iters % threads;

    let mut tasks = JoinSet::new();

    let total_iters = args.iters;

    let mut start = 1;
    for t in 1..=threads {
        let count = if t == threads {
            iters_per_thread + remainder
        } else {
            iters_per_thread
        };
        if count == 0 {
            continue;
        }
        let end = start + count - 1;

        let client = Arc::clone(&client);
        let function_name = args.function.clone();
        let stats = Arc::clone(&stats);

        tasks.spawn(async move {
            run_invocations(client, function_name, t, start, end, total_iters, stats).await;
        });

        start = end + 1;
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            eprintln!("Task failed: {}", e);
        }
    }

    let stats = stats.lock().await;
    println!("Completed {} invocations", args.iters);
    println!();
    println!("Results:");
    println!("  Data:     {}", stats.data_count);
    println!("  Fallback: {}", stats.fallback_count);
    println!("  Errors:   {}", stats.error_count);
    let answered = stats.data_count + stats.fallback_count;
    if answered > 0 {
        let avg_latency = stats.total_latency_ms / answered as f64;
        println!("  Avg latency: {:.3}ms", avg_latency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(body: &Value) -> String {
        serde_json::json!({ "statusCode": 200, "body": body.to_string() }).to_string()
    }

    #[test]
    fn test_classify_data() {
        let payload = envelope(&serde_json::json!({
            "message": "hi",
            "random_info": [{"name": "Bert"}]
        }));

        assert_eq!(classify(&payload), Outcome::Data);
    }

    #[test]
    fn test_classify_fallback() {
        let payload = envelope(&serde_json::json!({
            "message": "hi",
            "random_info": "No data!"
        }));

        assert_eq!(classify(&payload), Outcome::Fallback);
    }

    #[test]
    fn test_classify_function_error() {
        let payload = r#"{"errorType":"HandlerError","errorMessage":"upstream returned malformed JSON"}"#;

        assert_eq!(classify(payload), Outcome::Error("function error".to_string()));
    }

    #[test]
    fn test_classify_bad_body() {
        let payload = serde_json::json!({ "statusCode": 200, "body": "not json" }).to_string();

        assert!(matches!(classify(&payload), Outcome::Error(_)));
    }

    #[test]
    fn test_classify_unexpected_status() {
        let payload = serde_json::json!({ "statusCode": 500, "body": "{}" }).to_string();

        assert!(matches!(classify(&payload), Outcome::Error(msg) if msg.contains("500")));
    }
}
