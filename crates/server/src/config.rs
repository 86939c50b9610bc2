// crates/server/src/config.rs
//! Command-line and environment configuration.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use inferbox_core::{PaddleCliRecognizer, RecognizeOptions};

/// Default cap on request bodies (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "inferbox", version, about = "HTTP front-end for the PaddleOCR CLI")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HTTP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "HTTP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// PaddleOCR executable
    #[arg(long, env = "PADDLEOCR_BIN", default_value = "paddleocr")]
    pub paddleocr_bin: String,

    /// Language used when a request does not name one
    #[arg(long, env = "OCR_LANG", default_value = "ch")]
    pub lang: String,

    /// Disable the text-direction classifier by default
    #[arg(long)]
    pub no_angle_cls: bool,

    /// Run the engine on the GPU by default
    #[arg(long)]
    pub use_gpu: bool,

    /// Seconds before a recognizer process is killed
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Directory uploads are staged in (default: <tmp>/inferbox)
    #[arg(long, value_name = "DIR")]
    pub stage_dir: Option<PathBuf>,

    /// Fixed file the /infer endpoint overwrites, relative to the stage dir
    #[arg(long, value_name = "PATH", default_value = "img.png")]
    pub legacy_image: PathBuf,

    /// Seconds a finished job stays queryable
    #[arg(long, default_value_t = 600)]
    pub job_ttl_secs: u64,

    /// Maximum accepted request body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Image recognised once per warm-up language before serving
    #[arg(long, value_name = "PATH")]
    pub warmup_image: Option<PathBuf>,

    /// Language to warm up (repeatable; defaults to --lang)
    #[arg(long = "warmup-lang", value_name = "LANG")]
    pub warmup_langs: Vec<String>,
}

impl Config {
    /// Resolve `host:port`; hostnames such as `localhost` are looked up.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| anyhow::anyhow!("invalid bind address {addr}: {e}"))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("bind address {addr} resolved to nothing"))
    }

    pub fn stage_dir(&self) -> PathBuf {
        self.stage_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("inferbox"))
    }

    /// Options applied when a request leaves them unset.
    pub fn default_options(&self) -> RecognizeOptions {
        RecognizeOptions {
            lang: self.lang.clone(),
            use_angle_cls: !self.no_angle_cls,
            use_gpu: self.use_gpu,
        }
    }

    pub fn recognizer(&self) -> PaddleCliRecognizer {
        PaddleCliRecognizer::new(&self.paddleocr_bin).with_timeout(self.timeout_secs)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    /// Languages to warm up; empty when no warm-up image is configured.
    pub fn warmup_langs(&self) -> Vec<String> {
        if self.warmup_image.is_none() {
            return Vec::new();
        }
        if self.warmup_langs.is_empty() {
            vec![self.lang.clone()]
        } else {
            self.warmup_langs.clone()
        }
    }
}
