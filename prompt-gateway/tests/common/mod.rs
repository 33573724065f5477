#![allow(dead_code)]

use prompt_gateway::config::GatewayConfig;
use prompt_gateway::services::providers::mock::MockTextProvider;
use prompt_gateway::services::TextProvider;
use prompt_gateway::startup::Application;
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::Arc;

pub const MOCK_REPLY: &str = "PPLG adalah jurusan Pengembangan Perangkat Lunak & GIM.";

/// Configuration for a mock-backed gateway on a random port.
pub fn test_config(overrides: &[(&str, &str)]) -> GatewayConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("GENAI_PROVIDER".to_string(), "mock".to_string());
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let common = CoreConfig {
        port: 0, // Random port for testing
        ..CoreConfig::default()
    };

    GatewayConfig::from_lookup(common, |key| vars.get(key).cloned())
        .expect("Failed to build test configuration")
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockTextProvider>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockTextProvider::with_reply(MOCK_REPLY), test_config(&[])).await
    }

    pub async fn spawn_with(provider: MockTextProvider, config: GatewayConfig) -> Self {
        let provider = Arc::new(provider);

        let app = Application::build_with_provider(
            config,
            provider.clone() as Arc<dyn TextProvider>,
            None,
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            provider,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}
