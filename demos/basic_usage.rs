use serde::{Deserialize, Serialize};
use serde_json::json;
use tagged_errors::logging::ErrorLog;
use tagged_errors::{
    AppError, AppErrorOptions, CommonErrorParams, InternalError, InternalErrorParams, PublicError,
    SerdeSchema, define_errors, is_app_error, is_entity_gone_error, is_internal_error,
    is_public_error,
};

#[derive(Serialize, Deserialize)]
struct QuotaDetails {
    limit: u32,
    used: u32,
}

static QUOTA_DETAILS: SerdeSchema<QuotaDetails> = SerdeSchema::new();

define_errors! {
    RateLimit, public => {
        QUOTA_EXCEEDED => QUOTA_EXCEEDED_ERROR with &QUOTA_DETAILS,
    }
}

define_errors! {
    Internal, internal => {
        LEDGER_CORRUPTED => LEDGER_CORRUPTED_ERROR,
    }
}

fn load_order(id: u64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match id {
        1 => Err(PublicError::entity_gone(
            CommonErrorParams::new("Order was archived").details(json!({ "orderId": id })),
        )
        .into()),
        2 => Err(InternalError::new(
            InternalErrorParams::new("Connection pool exhausted", "DB_POOL_EXHAUSTED")
                .details(json!({ "poolSize": 16 })),
        )
        .into()),
        3 => Err(QUOTA_EXCEEDED_ERROR
            .new(AppErrorOptions::new("Too many orders").details(json!({ "limit": 10, "used": 11 })))
            .into()),
        4 => Err(LEDGER_CORRUPTED_ERROR.new(AppErrorOptions::new("Checksum mismatch")).into()),
        _ => Ok(()),
    }
}

/// What an API layer would send back to the caller.
fn to_response(err: &(dyn std::error::Error + 'static)) -> (u16, serde_json::Value) {
    let Some(tagged) = tagged_errors::tagged_view(err) else {
        return (500, json!({ "code": "UNKNOWN_ERROR", "message": "Internal error" }));
    };

    if is_public_error(tagged) {
        let status = tagged.http_status_code().unwrap_or(500);
        return (status, json!(tagged.standardized()));
    }

    if let Some(app) = err.downcast_ref::<AppError>() {
        if app.is_public() {
            return (app.status_code(), json!(app));
        }
    }

    // Internal details stay in the logs.
    (500, json!({ "code": tagged.error_code(), "message": "Internal error" }))
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    for id in 1..=5 {
        match load_order(id) {
            Ok(()) => println!("order {id}: ok"),
            Err(err) => {
                let err: &(dyn std::error::Error + 'static) = &*err;
                let (status, body) = to_response(err);
                println!("order {id}: [EXTERNAL] {status} {body}");

                if let Some(tagged) = tagged_errors::tagged_view(err) {
                    println!("          [INTERNAL] {}", ErrorLog::from_error(tagged));
                    println!(
                        "          internal={} public={} app={} gone={}",
                        is_internal_error(tagged),
                        is_public_error(tagged),
                        is_app_error(tagged),
                        is_entity_gone_error(tagged),
                    );
                }
            }
        }
    }

    println!("\n--- Schema-checked details ---\n");
    match QUOTA_EXCEEDED_ERROR.try_new(AppErrorOptions::new("bad").details(json!({ "limit": "ten" }))) {
        Ok(_) => println!("unexpectedly accepted"),
        Err(violation) => println!("rejected: {violation}"),
    }
}
