//! CLI binary for idcheck.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `VerificationConfig` and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use idcheck::{
    verify_with_aws, FaceVerdict, ProgressCallback, ResidenceOutcome, Stage,
    VerificationConfig, VerificationInputs, VerificationProgressCallback, VerificationReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner: one line per finished stage, a live message while the
/// text job is pending.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl VerificationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.describe());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar
            .println(format!("  {} {}", green("✓"), dim(stage.describe())));
        self.bar.set_message("");
    }

    fn on_job_pending(&self, job_id: &str, attempt: u32) {
        self.bar
            .set_message(format!("job {job_id} pending (query {attempt})"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Face match and ID document fields
  idcheck --selfie selfie.jpg --document rg.png

  # With proof of residence (needs a staging bucket)
  idcheck --selfie selfie.jpg --document rg.png \
          --proof-of-residence conta_luz.pdf --bucket my-kyc-staging

  # Inputs from URLs, JSON report
  idcheck --selfie https://example.com/s.jpg --document https://example.com/d.png --json

ACCEPTED FILES:
  selfie, document       .jpg .jpeg .png
  proof of residence     .pdf

ENVIRONMENT VARIABLES:
  AWS_REGION             Region for Rekognition, Textract and S3 (default us-east-1)
  AWS_PROFILE, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY
                         Standard AWS credential chain
  IDCHECK_BUCKET         Staging bucket for the proof of residence
  RUST_LOG               Overrides the log filter
"#;

/// Verify an identity with a selfie, an ID document and a proof of residence.
#[derive(Parser, Debug)]
#[command(
    name = "idcheck",
    version,
    about = "Verify an identity using AWS Rekognition and Textract",
    long_about = "Compare a selfie with the photo on an ID document, read the holder's name and \
CPF from the document, and optionally read the address from a proof of residence and check \
that the holder's name appears on it.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Selfie image: local path or HTTP/HTTPS URL (.jpg, .jpeg, .png).
    #[arg(long)]
    selfie: String,

    /// ID document image: local path or HTTP/HTTPS URL (.jpg, .jpeg, .png).
    #[arg(long)]
    document: String,

    /// Proof of residence: local path or HTTP/HTTPS URL (.pdf).
    #[arg(long)]
    proof_of_residence: Option<String>,

    /// AWS region for every service.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Minimum face similarity in percent (0–100).
    #[arg(long, env = "IDCHECK_THRESHOLD", default_value_t = 80.0)]
    threshold: f32,

    /// S3 bucket where the proof of residence is staged.
    #[arg(long, env = "IDCHECK_BUCKET")]
    bucket: Option<String>,

    /// Key prefix for staged objects.
    #[arg(long, env = "IDCHECK_PREFIX", default_value = "idcheck-tmp/")]
    prefix: String,

    /// Seconds between job-status queries.
    #[arg(long, env = "IDCHECK_POLL_INTERVAL", default_value_t = 1.0)]
    poll_interval: f64,

    /// Give up after this many job-status queries (default: never).
    #[arg(long, env = "IDCHECK_MAX_POLLS")]
    max_polls: Option<u32>,

    /// Label preceding the name on the ID document.
    #[arg(long, default_value = "NOME")]
    name_label: String,

    /// Label preceding the identifier on the ID document.
    #[arg(long, default_value = "CPF")]
    identifier_label: String,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "IDCHECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the report and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .clone()
        .map(|cb| cb as ProgressCallback);
    let config = build_config(&cli, progress)?;

    let inputs = VerificationInputs {
        selfie: cli.selfie.clone(),
        document: cli.document.clone(),
        proof_of_residence: cli.proof_of_residence.clone(),
    };

    // ── Run verification ─────────────────────────────────────────────────
    let result = verify_with_aws(&inputs, &config).await;
    if let Some(ref s) = spinner {
        s.finish();
    }
    let report = result.context("Verification failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        print!("{report}");
        if !cli.quiet {
            print_summary(&report);
        }
    }

    Ok(())
}

/// Map CLI args to `VerificationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<VerificationConfig> {
    if !cli.poll_interval.is_finite() || cli.poll_interval < 0.0 {
        anyhow::bail!("--poll-interval must be a non-negative number of seconds");
    }

    let mut builder = VerificationConfig::builder()
        .region(cli.region.clone())
        .similarity_threshold(cli.threshold)
        .staging_prefix(cli.prefix.clone())
        .poll_interval(Duration::from_secs_f64(cli.poll_interval))
        .name_label(cli.name_label.clone())
        .identifier_label(cli.identifier_label.clone())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref bucket) = cli.bucket {
        builder = builder.staging_bucket(bucket.clone());
    }
    if let Some(max) = cli.max_polls {
        builder = builder.max_poll_attempts(max);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// One-line verdicts on stderr, after the full report on stdout.
fn print_summary(report: &VerificationReport) {
    eprintln!();
    match report.face.verdict {
        FaceVerdict::Match { similarity } => eprintln!(
            "{} {}",
            green("✔"),
            bold(&format!("Same person ({similarity:.2}%)"))
        ),
        FaceVerdict::NoMatch => eprintln!("{} {}", red("✘"), bold("Faces do not match")),
    }

    match &report.residence {
        Some(ResidenceOutcome::Processed(r)) => match r.name_found {
            Some(true) => eprintln!("{} Name found in proof of residence", green("✔")),
            Some(false) => eprintln!("{} Name not found in proof of residence", red("✘")),
            None => eprintln!("{} Name check skipped", cyan("⚠")),
        },
        Some(ResidenceOutcome::JobFailed { status }) => {
            eprintln!("{} Proof of residence job failed: {}", red("✘"), status)
        }
        Some(ResidenceOutcome::Error(e)) => eprintln!("{} {}", red("✘"), e),
        None => {}
    }

    eprintln!(
        "   {}",
        dim(&format!("{}ms total", report.stats.total_duration_ms))
    );
}
