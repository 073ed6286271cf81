use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use tagged_errors::{
    AttemptFailure, AttemptOutcome, Either, OutcomePolicy, RequestClassifier, RequestError,
    Response, RetryPolicy, SerdeSchema, is_response_status_error,
};

#[derive(Debug, Serialize, Deserialize)]
struct Inventory {
    sku: String,
    #[serde(default)]
    reserved: u32,
}

/// Fails with 503 twice, then answers.
async fn flaky_inventory(calls: &AtomicU32) -> AttemptOutcome {
    let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
    println!("  attempt {attempt}");

    if attempt < 3 {
        Either::Failure(AttemptFailure::status(503, json!({ "error": "warming up" })))
    } else {
        Either::Success(Response::new(200, json!({ "sku": "A-100" })))
    }
}

#[tokio::main]
async fn main() {
    let retry = RetryPolicy::new(4)
        .with_status_codes([502, 503, 504])
        .with_retry_on_timeout(true)
        .with_delay_msecs(100);

    println!("--- Retry until success ---");
    let calls = AtomicU32::new(0);
    let classifier = RequestClassifier::new(
        retry.clone(),
        OutcomePolicy::default()
            .request_label("inventory")
            .response_schema(SerdeSchema::<Inventory>::new()),
    );
    match classifier.execute(&mut || flaky_inventory(&calls)).await {
        Ok(Either::Success(response)) => println!("  ok: {}", response.body),
        Ok(Either::Failure(failure)) => println!("  failed: {:?}", failure.status_code),
        Err(err) => println!("  error: {err}"),
    }

    println!("\n--- Failure as a value ---");
    let lenient = RequestClassifier::new(
        RetryPolicy::new(2).with_status_codes([503]),
        OutcomePolicy::default().throw_on_error(false),
    );
    let outcome = lenient
        .execute(&mut || async { AttemptOutcome::Failure(AttemptFailure::status(404, json!(null))) })
        .await;
    if let Ok(Either::Failure(failure)) = outcome {
        println!("  got failure value with status {:?}", failure.status_code);
    }

    println!("\n--- Failure as an error ---");
    let strict = RequestClassifier::new(retry, OutcomePolicy::default().request_label("checkout"));
    let outcome = strict
        .execute(&mut || async { AttemptOutcome::Failure(AttemptFailure::timeout()) })
        .await;
    if let Err(err) = outcome {
        println!(
            "  {} (response status error: {})",
            err,
            is_response_status_error(err.as_tagged())
        );
        if let RequestError::ResponseStatus(public) = &err {
            println!("  details: {}", json!(public.details()));
        }
    }
}
