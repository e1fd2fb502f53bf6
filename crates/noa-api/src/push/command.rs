//! Push gateway backed by an external automation program.
//!
//! The program receives the target and credentials through `NOA_*`
//! environment variables and the config lines on stdin. Exit status 0
//! means the device accepted the config.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Credentials, PushGateway, PushTarget};

/// Push program settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Command line of the automation program (e.g., "python3 push.py").
    /// None disables pushing.
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_timeout() -> u64 {
    60
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            program: None,
            timeout_secs: default_timeout(),
            username: None,
            password: None,
        }
    }
}

/// Runs the configured program once per push.
#[derive(Debug, Clone)]
pub struct CommandPushGateway {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandPushGateway {
    /// Split the program command line. An absent or blank program yields a
    /// gateway whose pushes always fail.
    pub fn new(config: &PushConfig) -> Result<Self, shell_words::ParseError> {
        let argv = match config.program.as_deref() {
            Some(program) => shell_words::split(program)?,
            None => Vec::new(),
        };
        Ok(Self {
            argv,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.argv.is_empty()
    }
}

#[async_trait]
impl PushGateway for CommandPushGateway {
    async fn push(
        &self,
        target: &PushTarget,
        credentials: &Credentials,
        config_text: &str,
    ) -> bool {
        let Some((program, args)) = self.argv.split_first() else {
            tracing::error!(device_ip = %target.device_ip, "no push program configured");
            return false;
        };
        let device_type = target.device_type();
        tracing::info!(
            device_ip = %target.device_ip,
            device_name = %target.device_name,
            device_type = %device_type,
            "pushing config"
        );

        let spawned = Command::new(program)
            .args(args)
            .env("NOA_DEVICE_TYPE", device_type.as_str())
            .env("NOA_DEVICE_IP", &target.device_ip)
            .env("NOA_DEVICE_NAME", &target.device_name)
            .env("NOA_SSH_USERNAME", &credentials.username)
            .env("NOA_SSH_PASSWORD", &credentials.password)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(program = %program, error = %e, "failed to start push program");
                return false;
            }
        };

        let mut input = config_text.to_string();
        if !input.ends_with('\n') {
            input.push('\n');
        }
        let stdin = child.stdin.take();

        // Dropping stdin after the write closes the program's input.
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // The program may exit without reading its input.
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::debug!(error = %e, "push program closed stdin early");
                }
            }
        };
        let session = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match tokio::time::timeout(self.timeout, session).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(device_ip = %target.device_ip, error = %e, "push program failed");
                return false;
            }
            Err(_) => {
                tracing::error!(
                    device_ip = %target.device_ip,
                    timeout_secs = self.timeout.as_secs(),
                    "push timed out"
                );
                return false;
            }
        };

        if output.status.success() {
            tracing::info!(
                device_ip = %target.device_ip,
                output = %String::from_utf8_lossy(&output.stdout),
                "push successful"
            );
            true
        } else {
            tracing::error!(
                device_ip = %target.device_ip,
                exit_code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "push failed"
            );
            false
        }
    }
}
