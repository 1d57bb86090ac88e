//! `Authenticator` — JWT verification and claims projection (spec §4.4).
//!
//! Two-phase decode: first an unverified decode to recover the claims
//! needed to resolve a dynamic `secret`, then a real verification against
//! `auth.options` with the resolved key.

use crate::error::PipelineError;
use gateway_kernel::lambda::AuthSpec;
use gateway_kernel::RequestArgs;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

/// `lambda.auth` is statically typed in this crate (`Option<AuthSpec>`), so
/// the spec's "truthy but not an object" configuration error is caught at
/// config-load time (`GatewayConfig::validate`/deserialization), not here.
pub async fn authenticate(
    auth: Option<&AuthSpec>,
    mut args: RequestArgs,
) -> Result<RequestArgs, PipelineError> {
    let Some(auth) = auth else {
        return Ok(args);
    };

    let token = auth
        .token
        .resolve(&args)
        .ok_or_else(|| PipelineError::AuthError("jwt must be provided".to_string()))?;

    let unverified_claims = decode_unverified(&token)?;
    let secret = auth.secret.resolve(&unverified_claims, &args);

    let claims = verify(&token, &secret, auth)?;

    let role = claims.get("role").cloned().unwrap_or(Value::Null);
    let mut auth_obj = Map::new();
    auth_obj.insert("role".to_string(), role.clone());
    for field in &auth.allowed_fields {
        if let Some(v) = claims.get(field) {
            auth_obj.insert(field.clone(), v.clone());
        }
    }

    if !auth.required_roles.is_empty() {
        let role_str = role.as_str().unwrap_or("");
        if !auth.required_roles.iter().any(|r| r == role_str) {
            return Err(PipelineError::AuthError("Forbidden".to_string()));
        }
    }

    args.set_param_json("auth", Value::Object(auth_obj));
    Ok(args)
}

fn decode_unverified(token: &str) -> Result<Value, PipelineError> {
    let header =
        decode_header(token).map_err(|e| PipelineError::AuthError(e.to_string()))?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    let key = DecodingKey::from_secret(&[]);
    let data = decode::<Value>(token, &key, &validation)
        .map_err(|e| PipelineError::AuthError(e.to_string()))?;
    Ok(data.claims)
}

fn verify(token: &str, secret: &str, auth: &AuthSpec) -> Result<Value, PipelineError> {
    let algorithms: Vec<Algorithm> = if auth.options.algorithms.is_empty() {
        vec![Algorithm::HS256]
    } else {
        auth.options
            .algorithms
            .iter()
            .map(|a| parse_algorithm(a))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PipelineError::AuthError("unsupported algorithm".to_string()))?
    };

    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms;
    if let Some(aud) = &auth.options.audience {
        validation.set_audience(&[aud]);
    }
    if let Some(iss) = &auth.options.issuer {
        validation.set_issuer(&[iss]);
    }
    validation.leeway = auth.options.leeway_secs.unwrap_or(0);

    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Value>(token, &key, &validation)
        .map_err(|e| PipelineError::AuthError(e.to_string()))?;
    Ok(data.claims)
}

fn parse_algorithm(name: &str) -> Option<Algorithm> {
    match name {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        "RS256" => Some(Algorithm::RS256),
        "RS384" => Some(Algorithm::RS384),
        "RS512" => Some(Algorithm::RS512),
        "ES256" => Some(Algorithm::ES256),
        "ES384" => Some(Algorithm::ES384),
        "PS256" => Some(Algorithm::PS256),
        "PS384" => Some(Algorithm::PS384),
        "PS512" => Some(Algorithm::PS512),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_kernel::dynamic::{SecretSource, TokenSource};
    use gateway_kernel::lambda::VerifyOptions;
    use gateway_kernel::types::UrlParts;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret";

    fn token_with_claims(claims: Value) -> String {
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn bare_args(token: Option<&str>) -> RequestArgs {
        let mut headers = HashMap::new();
        if let Some(t) = token {
            headers.insert("authorization".to_string(), t.to_string());
        }
        RequestArgs {
            method: "GET".to_string(),
            host: "h".to_string(),
            headers,
            body: Value::Object(Default::default()),
            params: HashMap::new(),
            has_extension: false,
            uri: "/x".to_string(),
            url: UrlParts {
                path: "/x".to_string(),
                pathname: "/x".to_string(),
                query: String::new(),
            },
        }
    }

    fn auth_spec(allowed_fields: &[&str], required_roles: &[&str]) -> AuthSpec {
        AuthSpec {
            allowed_fields: allowed_fields.iter().map(|s| s.to_string()).collect(),
            secret: SecretSource::Static(SECRET.to_string()),
            token: TokenSource::Default,
            options: VerifyOptions::default(),
            required_roles: required_roles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn no_auth_spec_passes_through_unchanged() {
        let args = bare_args(None);
        let result = authenticate(None, args).await.unwrap();
        assert!(!result.params.contains_key("auth"));
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let spec = auth_spec(&[], &[]);
        let result = authenticate(Some(&spec), bare_args(None)).await;
        assert!(matches!(result, Err(PipelineError::AuthError(ref m)) if m.contains("jwt must be provided")));
    }

    #[tokio::test]
    async fn valid_token_projects_role_and_allowed_fields() {
        let token = token_with_claims(json!({"role": "admin", "org": "acme", "secret_internal": "x"}));
        let spec = auth_spec(&["org"], &[]);
        let args = authenticate(Some(&spec), bare_args(Some(&token))).await.unwrap();
        let parsed = args.params.get("auth").unwrap().to_json();
        assert_eq!(parsed["role"], "admin");
        assert_eq!(parsed["org"], "acme");
        assert!(parsed.get("secret_internal").is_none());
    }

    #[tokio::test]
    async fn required_role_mismatch_is_forbidden() {
        let token = token_with_claims(json!({"role": "viewer"}));
        let spec = auth_spec(&[], &["admin"]);
        let result = authenticate(Some(&spec), bare_args(Some(&token))).await;
        assert!(matches!(result, Err(PipelineError::AuthError(ref m)) if m == "Forbidden"));
    }

    #[tokio::test]
    async fn required_role_match_passes() {
        let token = token_with_claims(json!({"role": "admin"}));
        let spec = auth_spec(&[], &["admin", "superuser"]);
        assert!(authenticate(Some(&spec), bare_args(Some(&token))).await.is_ok());
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"role": "admin"}),
            &EncodingKey::from_secret(b"wrong-secret"),
        )
        .unwrap();
        let spec = auth_spec(&[], &[]);
        let result = authenticate(Some(&spec), bare_args(Some(&token))).await;
        assert!(result.is_err());
    }
}
