mod common;

use common::{test_config, TestApp, MOCK_REPLY};
use prompt_gateway::models::{persona::SKYE_PERSONA, ModelPart};
use prompt_gateway::services::providers::mock::MockTextProvider;
use prompt_gateway::services::ProviderError;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn generate_text_relays_model_result() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": "Apa itu PPLG?" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "result": MOCK_REPLY }));
}

#[tokio::test]
async fn generate_text_submits_persona_and_user_turn_as_one_string() {
    let app = TestApp::spawn().await;

    app.client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": "Apa itu PPLG?" }))
        .send()
        .await
        .expect("Failed to execute request.");

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].parts(),
        &[ModelPart::Text(format!(
            "{}\n\nUser: Apa itu PPLG?",
            SKYE_PERSONA
        ))]
    );
}

#[tokio::test]
async fn generate_text_without_prompt_sends_empty_user_turn() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.provider.calls()[0].parts(),
        &[ModelPart::Text(format!("{}\n\nUser: ", SKYE_PERSONA))]
    );
}

#[tokio::test]
async fn malformed_json_is_rejected_before_model_call() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .header("content-type", "application/json")
        .body("{\"prompt\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn upstream_failure_returns_500_with_message_and_code() {
    let app = TestApp::spawn_with(
        MockTextProvider::failing(ProviderError::RateLimited(
            "Resource has been exhausted (e.g. check quota).".to_string(),
        )),
        test_config(&[]),
    )
    .await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": "Halo" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body["message"],
        "Resource has been exhausted (e.g. check quota)."
    );
    assert_eq!(body["code"], "quota");
}

#[tokio::test]
async fn identical_requests_reach_the_model_twice() {
    let app = TestApp::spawn().await;

    for _ in 0..2 {
        let response = app
            .client
            .post(app.url("/generate-text"))
            .json(&json!({ "prompt": "Kapan PPDB dibuka?" }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}

#[tokio::test]
async fn persona_override_replaces_builtin_text() {
    let path = std::env::temp_dir().join(format!("gateway-persona-{}.txt", Uuid::new_v4()));
    tokio::fs::write(&path, "Kamu adalah asisten perpustakaan.")
        .await
        .unwrap();

    let app = TestApp::spawn_with(
        MockTextProvider::with_reply(MOCK_REPLY),
        test_config(&[("GATEWAY_PERSONA_PATH", path.to_str().unwrap())]),
    )
    .await;

    app.client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": "Jam buka?" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(
        app.provider.calls()[0].parts(),
        &[ModelPart::Text(
            "Kamu adalah asisten perpustakaan.\n\nUser: Jam buka?".to_string()
        )]
    );

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn oversized_json_body_is_413() {
    let app = TestApp::spawn_with(
        MockTextProvider::with_reply(MOCK_REPLY),
        test_config(&[("GATEWAY_MAX_UPLOAD_BYTES", "1024")]),
    )
    .await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": "a".repeat(8 * 1024) }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn non_string_prompt_is_rendered_as_json() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/generate-text"))
        .json(&json!({ "prompt": 42 }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.provider.calls()[0].parts(),
        &[ModelPart::Text(format!("{}\n\nUser: 42", SKYE_PERSONA))]
    );
}
