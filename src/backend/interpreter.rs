//! Local interpreter backend.
//!
//! The user's code is instrumented so every zero-argument `.delay()` call
//! carries its 0-based line index, optionally prefixed with a prelude script,
//! and piped to the configured interpreter on stdin. The interpreter prints
//! the command array as JSON on stdout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as ProcessCommand;

use crate::protocol::{parse_commands, Command, TraceError};

use super::{SourceFile, TraceBackend};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Set in the child's environment so tracing libraries emit commands.
pub const VISUALIZER_ENV: &str = "ALGORITHM_VISUALIZER";

#[derive(Debug, Clone)]
pub struct ProcessBackend {
    name: String,
    program: String,
    args: Vec<String>,
    prelude: Option<PathBuf>,
    timeout: Duration,
    delay_call: Regex,
}

impl ProcessBackend {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        prelude: Option<PathBuf>,
    ) -> Result<Self, TraceError> {
        let mut command = command.into_iter();
        let program = command
            .next()
            .ok_or_else(|| TraceError::build("interpreter command is empty"))?;
        let delay_call = Regex::new(r"(\.\s*delay\s*)\(\s*\)")
            .map_err(|e| TraceError::build(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            program,
            args: command.collect(),
            prelude,
            timeout: DEFAULT_TIMEOUT,
            delay_call,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rewrite `.delay()` on each line to `.delay(<line index>)`.
    pub fn instrument(&self, code: &str) -> String {
        code.split('\n')
            .enumerate()
            .map(|(i, line)| {
                self.delay_call
                    .replace_all(line, format!("${{1}}({i})").as_str())
                    .into_owned()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn script(&self, source: &SourceFile) -> Result<String, TraceError> {
        let code = self.instrument(&source.content);
        match &self.prelude {
            Some(path) => {
                let prelude = tokio::fs::read_to_string(path).await.map_err(|e| {
                    TraceError::build(format!("cannot read prelude {}: {e}", path.display()))
                })?;
                Ok(format!("{prelude}\n{code}"))
            }
            None => Ok(code),
        }
    }
}

#[async_trait]
impl TraceBackend for ProcessBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        let binary = which::which(&self.program)
            .map_err(|e| TraceError::build(format!("{} not found: {e}", self.program)))?;
        let script = self.script(source).await?;

        let mut cmd = ProcessCommand::new(binary);
        cmd.args(&self.args)
            .env(VISUALIZER_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| TraceError::build(format!("failed to start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(script.as_bytes()).await {
                    tracing::debug!(error = %e, "Interpreter closed stdin early");
                }
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                TraceError::build(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| TraceError::build(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(TraceError::Build(message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_commands(&stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessBackend {
        ProcessBackend::new(
            "test",
            vec!["sh".into(), "-c".into(), script.into()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn instruments_zero_argument_delays_with_line_index() {
        let backend = sh("cat");
        let code = "tracer.set(a);\nTracer.delay();\nx . delay ( );\ny.delay(7);";
        assert_eq!(
            backend.instrument(code),
            "tracer.set(a);\nTracer.delay(1);\nx . delay (2);\ny.delay(7);"
        );
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            ProcessBackend::new("js", Vec::new(), None),
            Err(TraceError::Build(_))
        ));
    }

    #[tokio::test]
    async fn parses_stdout_as_commands() {
        let backend = sh("cat");
        let source = SourceFile::new(
            "trace.js",
            r#"[{"key":null,"method":"delay","args":[4]}]"#,
        );
        let commands = backend.trace(&source).await.unwrap();
        assert_eq!(commands, vec![Command::delay(4)]);
    }

    #[tokio::test]
    async fn child_sees_visualizer_env() {
        let backend = sh(r#"cat > /dev/null; printf '[{"key":null,"method":"delay","args":[%s]}]' "$ALGORITHM_VISUALIZER""#);
        let commands = backend.trace(&SourceFile::new("a.js", "")).await.unwrap();
        assert_eq!(commands, vec![Command::delay(1)]);
    }

    #[tokio::test]
    async fn prelude_is_prepended() {
        let dir = tempfile::tempdir().unwrap();
        let prelude = dir.path().join("prelude.txt");
        std::fs::write(&prelude, "[").unwrap();
        let backend = ProcessBackend::new(
            "test",
            vec!["sh".into(), "-c".into(), "cat".into()],
            Some(prelude),
        )
        .unwrap();
        let source = SourceFile::new("a.js", r#"{"key":null,"method":"delay","args":[0]}]"#);
        let commands = backend.trace(&source).await.unwrap();
        assert_eq!(commands, vec![Command::delay(0)]);
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let backend = sh("cat > /dev/null; echo 'ReferenceError: x' >&2; exit 3");
        let err = backend.trace(&SourceFile::new("a.js", "x")).await.unwrap_err();
        assert_eq!(err, TraceError::Build("ReferenceError: x".into()));
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_build_error() {
        let backend = ProcessBackend::new(
            "js",
            vec!["stepviz-no-such-interpreter".into()],
            None,
        )
        .unwrap();
        let err = backend.trace(&SourceFile::new("a.js", "")).await.unwrap_err();
        assert!(matches!(err, TraceError::Build(_)));
    }

    #[tokio::test]
    async fn slow_interpreter_times_out() {
        let backend = sh("sleep 5").with_timeout(Duration::from_millis(100));
        let err = backend.trace(&SourceFile::new("a.js", "")).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
