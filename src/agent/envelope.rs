//! Validation of the agent response envelope.
//!
//! The only accepted shape is `{ success: bool, result?: DigestResult,
//! error?: string }`. Anything else is a malformed response; there is no
//! fallback unwrapping of other nestings.

use serde_json::Value;

use super::InvocationError;
use crate::domain::DigestResult;

/// Fields a `result` object must carry.
const REQUIRED_FIELDS: [&str; 6] = [
    "papers_analyzed",
    "papers_included",
    "top_papers",
    "digest_sent",
    "recipient_email",
    "execution_time",
];

/// Turn a raw envelope into a `DigestResult`, or say exactly what is wrong with it.
pub fn unwrap_envelope(envelope: Value) -> Result<DigestResult, InvocationError> {
    let Value::Object(mut envelope) = envelope else {
        return Err(InvocationError::Malformed("envelope is not a JSON object".to_string()));
    };

    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| InvocationError::Malformed("envelope has no boolean `success`".to_string()))?;

    if !success {
        let reason = envelope
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("agent reported failure without a reason");
        return Err(InvocationError::Rejected(reason.to_string()));
    }

    let result = envelope
        .remove("result")
        .ok_or_else(|| InvocationError::Malformed("envelope has no `result`".to_string()))?;

    let Some(fields) = result.as_object() else {
        return Err(InvocationError::Malformed("`result` is not an object".to_string()));
    };

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !fields.contains_key(**field)) {
        return Err(InvocationError::Malformed(format!("result is missing `{}`", missing)));
    }

    serde_json::from_value(result)
        .map_err(|e| InvocationError::Malformed(format!("result does not match the digest shape: {}", e)))
}
