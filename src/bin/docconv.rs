//! Command-line front end: convert one Word document to PDF.

use anyhow::{Context, Result, bail};
use clap::Parser;
use docconv::{
    Config, ConversionSession, CookieStore, CredentialStore, NoCredentials, PresentationSink,
    SelectedFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(version, about = "Convert a Word document to PDF with a remote conversion service")]
struct CliArgs {
    /// The .doc or .docx file to convert.
    pub file: PathBuf,

    /// Root URL of the conversion service.
    #[clap(long)]
    pub server: Option<String>,

    /// Directory the PDF is written to.
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Cookie string holding the anti-forgery token, e.g. "csrftoken=abc123".
    #[clap(long)]
    pub csrf_cookie: Option<String>,

    /// Give up polling after this many seconds (0 polls forever).
    #[clap(long)]
    pub poll_timeout: Option<u64>,

    /// JSON configuration file; command-line flags override its values.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Do not ask the service to purge stale files before converting.
    #[clap(long)]
    pub no_cleanup: bool,
}

/// Renders session updates as a terminal progress bar
struct TerminalSink {
    bar: ProgressBar,
}

impl TerminalSink {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PresentationSink for TerminalSink {
    fn report_progress(&self, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(message.to_string());
    }

    fn report_error(&self, message: &str) {
        self.bar.println(format!("error: {}", message));
    }

    fn report_success(&self, message: &str) {
        self.bar.println(message);
    }

    fn set_ready(&self, ready: bool) {
        debug!(ready, "start action");
    }

    fn set_download_available(&self, available: bool) {
        debug!(available, "download action");
    }
}

fn load_config(args: &CliArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {:?}", path))?
        }
        None => Config::default(),
    };

    if let Some(server) = &args.server {
        config.base_url = server.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.save.output_dir = dir.clone();
    }
    if let Some(secs) = args.poll_timeout {
        config.poll_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let config = load_config(&cli_args)?;
    let credentials: Arc<dyn CredentialStore> = match &cli_args.csrf_cookie {
        Some(raw) => Arc::new(CookieStore::new(raw.clone())),
        None => Arc::new(NoCredentials),
    };

    let sink = Arc::new(TerminalSink::new()?);
    let mut session = ConversionSession::from_config(&config, credentials, sink.clone())?;

    if !cli_args.no_cleanup {
        session.request_cleanup();
    }

    let file = SelectedFile::from_path(&cli_args.file)
        .await
        .with_context(|| format!("Failed to read {:?}", cli_args.file))?;
    info!(file = %file.name, server = %config.base_url, "converting");

    session.select_file(file)?;

    let converted = tokio::select! {
        result = session.convert() => result,
        _ = tokio::signal::ctrl_c() => {
            sink.finish();
            bail!("Interrupted, conversion abandoned");
        }
    };
    if let Err(e) = converted {
        sink.finish();
        return Err(e.into());
    }

    let saved = session.request_download().await;
    sink.finish();
    let saved = saved?;

    match &saved.path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", saved.filename),
    }
    info!(filename = %saved.filename, size_bytes = saved.size_bytes, "done");
    Ok(())
}
