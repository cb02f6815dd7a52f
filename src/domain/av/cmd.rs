use async_trait::async_trait;
use std::io;
use tokio::process::Command as TokioCommand;

/// Exit status and merged stdout/stderr of one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub combined: String,
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Self {
            success: output.status.success(),
            code: output.status.code(),
            combined,
        }
    }
}

/// Runs the transcoder binary. The call blocks the calling task until the
/// process exits; no deadline is applied.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeExecutor: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

#[async_trait]
impl TranscodeExecutor for SystemExecutor {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput> {
        TokioCommand::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map(ProcessOutput::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_failure_is_io_error() {
        let result = SystemExecutor
            .run("definitely-not-a-transcoder-binary", &["-version".to_string()])
            .await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_is_merged() {
        let args = vec!["-c".to_string(), "echo out; echo err 1>&2; exit 3".to_string()];
        let output = SystemExecutor.run("sh", &args).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert!(output.combined.contains("out"));
        assert!(output.combined.contains("err"));
    }
}
