#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

/// An isolated state file and a mock API to run the CLI against.
pub struct Harness {
    pub server: MockServer,
    dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.path().join("state").join("session.json")
    }

    pub fn state(&self) -> Option<serde_json::Value> {
        let raw = std::fs::read_to_string(self.state_file()).ok()?;
        Some(serde_json::from_str(&raw).expect("State file is not JSON"))
    }

    /// Run the CLI binary with arguments.
    pub async fn run(&self, args: &[&str]) -> Output {
        run_cli(args, &self.state_file(), &self.server.uri()).await
    }

    /// Run the CLI and expect success.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure, returning stderr.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

pub async fn run_cli(args: &[&str], state_file: &Path, api: &str) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_sesh"))
        .args(args)
        .env("SESH_STATE_FILE", state_file)
        .env("SESH_API", api)
        .env_remove("SESH_PASSWORD")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// An unsigned JWT for `user_id`.
pub fn jwt(user_id: i64, role: Option<&str>, nonce: &str) -> String {
    let mut payload = json!({"user_id": user_id, "jti": nonce});
    if let Some(role) = role {
        payload["user_role"] = json!(role);
    }
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// A successful login or refresh response.
pub fn session_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("x-jwt", access)
        .set_body_json(json!({
            "user_id": 1,
            "refresh_token": refresh,
            "refresh_token_expiretime": "2026-12-01T00:00:00",
            "user_agent": "sesh",
        }))
}
