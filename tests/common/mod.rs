//! Common test utilities for E2E tests

use serde_json::json;
use sulabh_auth::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            auth: config::AuthConfig {
                cookie_name: "sulabh_session".to_string(),
                short_session_ttl_seconds: 300,
                long_session_ttl_seconds: 2_592_000,
                min_password_length: 6,
                sweep_interval_seconds: 300,
                rate_limit: config::RateLimitConfig {
                    max_attempts: 5,
                    window_seconds: 900,
                    max_tracked_identifiers: 10_000,
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config.clone()).await.unwrap();

        // Create HTTP client with a cookie store so session cookies flow
        // between requests like a browser
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = sulabh_auth::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// A fresh client with its own cookie store (a separate "device")
    pub fn new_device(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap()
    }

    /// Register a test account
    pub async fn register_user(&self, email: &str, username: &str, password: &str) {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "username": username,
                "password": password,
                "firstName": "Test",
                "lastName": "User",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 201, "registration should succeed");
    }

    /// Log in with the given client and return the response
    pub async fn login_with(
        &self,
        client: &reqwest::Client,
        identifier: &str,
        password: &str,
        remember_me: bool,
    ) -> reqwest::Response {
        client
            .post(self.url("/auth/login"))
            .json(&json!({
                "identifier": identifier,
                "password": password,
                "rememberMe": remember_me,
            }))
            .send()
            .await
            .unwrap()
    }

    /// Fetch the session cookie value the server set on the given response
    pub fn session_cookie_value(response: &reqwest::Response) -> Option<String> {
        response
            .cookies()
            .find(|cookie| cookie.name() == "sulabh_session")
            .map(|cookie| cookie.value().to_string())
    }
}
