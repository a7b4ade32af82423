use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct DecodedToken {
    pub header: Value,
    pub claims: Value,
    pub signature: String,
}

/// Splits a JWT and decodes its header and claims without verifying the
/// signature. Undecodable parts come back as empty objects.
pub fn decode_jwt(token: &str) -> DecodedToken {
    let mut parts = token.split('.');
    let header = decode_part(parts.next().unwrap_or_default());
    let claims = decode_part(parts.next().unwrap_or_default());
    let signature = parts.next().unwrap_or_default().to_string();

    DecodedToken {
        header,
        claims,
        signature,
    }
}

/// The `exp` claim in seconds since the epoch.
pub fn expiration_time(token: &str) -> Option<i64> {
    claim_as_i64(token, "exp")
}

pub fn issued_at_time(token: &str) -> Option<i64> {
    claim_as_i64(token, "iat")
}

fn claim_as_i64(token: &str, claim: &str) -> Option<i64> {
    match decode_jwt(token).claims {
        Value::Object(map) => map.get(claim).and_then(value_as_i64),
        _ => None,
    }
}

fn decode_part(part: &str) -> Value {
    let trimmed = part.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|seconds| seconds as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build_token(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none"}).to_string());
        let claims = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{claims}.sig")
    }

    #[test]
    fn reads_time_claims() {
        let token = build_token(&json!({"iat": 1_700_000_000, "exp": 1_700_003_600}));
        assert_eq!(issued_at_time(&token), Some(1_700_000_000));
        assert_eq!(expiration_time(&token), Some(1_700_003_600));
        assert_eq!(decode_jwt(&token).signature, "sig");
    }

    #[test]
    fn opaque_tokens_have_no_claims() {
        assert_eq!(expiration_time("not-a-jwt"), None);
        assert_eq!(decode_jwt("").claims, json!({}));
    }
}
