use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::BountydError;
use crate::models::bounty::Bounty;
use super::consumer::BountyProcessor;

/// Hands a dequeued bounty to an external command. The bounty is written
/// to the command's stdin as JSON; the last non-empty stdout line is
/// taken as the pull request identifier.
pub struct CommandProcessor {
    command: String,
}

impl CommandProcessor {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl BountyProcessor for CommandProcessor {
    async fn process(&self, bounty: &Bounty) -> Result<String, BountydError> {
        debug!(bounty_id = %bounty.id, command = %self.command, "Invoking processor command");

        let payload = serde_json::to_vec(bounty)?;
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("BOUNTY_ID", bounty.id.to_string())
            .env("BOUNTY_ISSUE_ID", &bounty.issue_id)
            .env("BOUNTY_REPOSITORY_URL", &bounty.repository_url)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BountydError::Processing(format!("Failed to spawn command: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BountydError::Processing(format!("Command did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BountydError::Processing(format!(
                "Command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match stdout.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(BountydError::Processing(
                "Command produced no pull request identifier".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounty() -> Bounty {
        Bounty::new("42", "https://github.com/acme/widget", "github")
    }

    #[tokio::test]
    async fn test_last_stdout_line_is_pull_request_id() {
        let processor = CommandProcessor::new("echo working...; echo PR-17");
        let pr = processor.process(&bounty()).await.unwrap();
        assert_eq!(pr, "PR-17");
    }

    #[tokio::test]
    async fn test_bounty_json_arrives_on_stdin() {
        let processor = CommandProcessor::new("cat >/dev/null; echo PR-$BOUNTY_ISSUE_ID");
        let pr = processor.process(&bounty()).await.unwrap();
        assert_eq!(pr, "PR-42");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_processing_error() {
        let processor = CommandProcessor::new("echo boom >&2; exit 3");
        let err = processor.process(&bounty()).await.unwrap_err();
        match err {
            BountydError::Processing(msg) => assert!(msg.contains("boom")),
            other => panic!("expected processing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_stdout_is_processing_error() {
        let processor = CommandProcessor::new("true");
        let err = processor.process(&bounty()).await.unwrap_err();
        assert!(matches!(err, BountydError::Processing(_)));
    }
}
