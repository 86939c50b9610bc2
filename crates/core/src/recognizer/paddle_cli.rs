// crates/core/src/recognizer/paddle_cli.rs
//! PaddleOCR CLI recognizer - spawns `paddleocr` and captures its stdout.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::provider::Recognizer;
use super::types::{RecognitionOutput, RecognizeError, RecognizeOptions};

/// Default engine binary, resolved through `PATH`.
pub const DEFAULT_BIN: &str = "paddleocr";

/// Recognizer that runs the PaddleOCR command-line tool.
///
/// Command: `{bin} {prefix_args..} --image_dir {path} --use_angle_cls {bool} --lang {lang} --use_gpu {bool}`
pub struct PaddleCliRecognizer {
    bin: String,
    prefix_args: Vec<String>,
    timeout_secs: u64,
}

impl PaddleCliRecognizer {
    /// Create a recognizer that spawns `bin`.
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            prefix_args: Vec::new(),
            timeout_secs: 120,
        }
    }

    /// Arguments placed before the engine flags, e.g. `-m paddleocr` when
    /// `bin` is a Python interpreter.
    pub fn with_prefix_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the timeout in seconds for one invocation.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    fn command(&self, image: &Path, options: &RecognizeOptions) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(&self.prefix_args)
            .arg("--image_dir")
            .arg(image)
            .arg("--use_angle_cls")
            .arg(bool_arg(options.use_angle_cls))
            .arg("--lang")
            .arg(&options.lang)
            .arg("--use_gpu")
            .arg(bool_arg(options.use_gpu))
            // Null stdin so the child never blocks waiting for input
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

fn bool_arg(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl Recognizer for PaddleCliRecognizer {
    async fn recognize(
        &self,
        image: &Path,
        options: &RecognizeOptions,
    ) -> Result<RecognitionOutput, RecognizeError> {
        options.validate()?;
        if tokio::fs::metadata(image).await.is_err() {
            return Err(RecognizeError::MissingImage(image.display().to_string()));
        }

        let t0 = Instant::now();
        tracing::info!(
            bin = %self.bin,
            image = %image.display(),
            lang = %options.lang,
            use_gpu = options.use_gpu,
            timeout_secs = self.timeout_secs,
            "paddleocr: spawning"
        );

        let future = self.command(image, options).output();
        let output = timeout(Duration::from_secs(self.timeout_secs), future)
            .await
            .map_err(|_| {
                tracing::error!(elapsed_ms = t0.elapsed().as_millis() as u64, "paddleocr: timed out");
                RecognizeError::Timeout(self.timeout_secs)
            })?
            .map_err(|e| {
                tracing::error!(error = %e, bin = %self.bin, "paddleocr: failed to spawn process");
                RecognizeError::SpawnFailed(e.to_string())
            })?;

        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                elapsed_ms,
                exit_code = ?output.status.code(),
                stderr = %stderr.chars().take(500).collect::<String>(),
                "paddleocr: non-zero exit"
            );
            return Err(RecognizeError::CliError(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let result = RecognitionOutput::from_raw(stdout);
        tracing::info!(
            elapsed_ms,
            stdout_len = result.raw.len(),
            detections = result.lines.len(),
            "paddleocr: finished"
        );
        Ok(result)
    }

    async fn health_check(&self) -> Result<(), RecognizeError> {
        let output = Command::new(&self.bin)
            .args(&self.prefix_args)
            .arg("--help")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RecognizeError::SpawnFailed(format!("{} not found: {}", self.bin, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RecognizeError::CliError(format!("{} --help failed", self.bin)))
        }
    }

    fn name(&self) -> &str {
        "paddleocr-cli"
    }
}
