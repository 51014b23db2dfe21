use base64::Engine;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vertex_imagen::auth::TokenProvider;
use vertex_imagen::auth::service_account::{ServiceAccountCredentials, ServiceAccountTokenProvider};

mod support;

fn token_template() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "access_token": "ya29.test-token",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

fn decode_segment(segment: &str) -> serde_json::Value {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .expect("base64url segment");
    serde_json::from_slice(&bytes).expect("json segment")
}

#[tokio::test]
async fn service_account_token_provider_fetch_and_cache() {
    let server = MockServer::start().await;
    let token_url = format!("{}/token", server.uri());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("assertion=test-assertion"))
        .respond_with(token_template())
        .expect(1)
        .mount(&server)
        .await;

    let mut creds = ServiceAccountCredentials::new("svc@test.iam.gserviceaccount.com", "unused");
    creds.token_uri = Some(token_url);

    // Use assertion override to bypass RSA signing
    let provider = ServiceAccountTokenProvider::new_with_assertion_override(
        creds,
        reqwest::Client::new(),
        None,
        "test-assertion".to_string(),
    );
    let t1 = provider.token().await.expect("token fetch should succeed");
    assert_eq!(t1, "ya29.test-token");
    let t2 = provider.token().await.expect("token cache should serve");
    assert_eq!(t2, "ya29.test-token");
}

#[tokio::test]
async fn signed_assertion_carries_expected_claims() {
    let server = MockServer::start().await;
    let token_url = format!("{}/token", server.uri());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(token_template())
        .mount(&server)
        .await;

    let creds = ServiceAccountCredentials::from_json(
        &support::service_account_json(&token_url, Some("demo")).to_string(),
    )
    .unwrap();
    let provider = ServiceAccountTokenProvider::new(creds, reqwest::Client::new(), None);

    assert_eq!(provider.token().await.unwrap(), "ya29.test-token");
    assert_eq!(provider.project_id().await.unwrap().as_deref(), Some("demo"));

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    let assertion = body
        .split('&')
        .find_map(|kv| kv.strip_prefix("assertion="))
        .expect("assertion field");
    let parts: Vec<&str> = assertion.split('.').collect();
    assert_eq!(parts.len(), 3);

    let header = decode_segment(parts[0]);
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["kid"], "test-kid");

    let claims = decode_segment(parts[1]);
    assert_eq!(claims["iss"], "svc@demo.iam.gserviceaccount.com");
    assert_eq!(claims["aud"], token_url.as_str());
    assert_eq!(
        claims["scope"],
        "https://www.googleapis.com/auth/cloud-platform"
    );
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );
}

#[tokio::test]
async fn token_endpoint_rejection_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"error": "invalid_client"})),
        )
        .mount(&server)
        .await;

    let mut creds = ServiceAccountCredentials::new("svc@test.iam.gserviceaccount.com", "unused");
    creds.token_uri = Some(format!("{}/token", server.uri()));
    let provider = ServiceAccountTokenProvider::new_with_assertion_override(
        creds,
        reqwest::Client::new(),
        None,
        "a".to_string(),
    );

    let err = provider.token().await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.status_code(), Some(401));
}
