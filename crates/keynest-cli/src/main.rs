//! `KeyNest` CLI — seal API keys under a passphrase and manage the plan flag.
//!
//! Blobs and decrypted keys go to stdout alone on their line so they can be
//! piped or captured. Confirmations and errors go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keynest_core::{KeyCipher, Plan, PlanGate};
use keynest_storage::{MemoryBackend, RedbBackend, StorageBackend};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, StorageKind};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// ── CLI structure ────────────────────────────────────────────────────

/// KeyNest — API keys, sealed at rest.
#[derive(Parser)]
#[command(
    name = "keynest",
    version,
    about = "KeyNest CLI — seal API keys under a passphrase and manage your plan",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         KEYNEST_PASSPHRASE       Passphrase for encrypt/decrypt\n  \
         KEYNEST_STORAGE          memory | redb (default: redb)\n  \
         KEYNEST_STORAGE_PATH     Plan storage file (default: ~/.keynest/keynest.redb)\n  \
         KEYNEST_KDF_ITERATIONS   PBKDF2 rounds (minimum 100000)\n  \
         KEYNEST_LOG_LEVEL        Log filter (default: warn)\n  \
         KEYNEST_LOG_FORMAT       text | json (default: text)\n\n\
         {DIM}Examples:{RESET}\n  \
         keynest encrypt sk-live-abc123 --passphrase 'correct horse battery staple'\n  \
         keynest decrypt <blob> --passphrase 'correct horse battery staple'\n  \
         keynest plan upgrade"
    ),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt an API key and print the sealed blob.
    Encrypt {
        /// The API key to seal.
        plaintext: String,
        /// Passphrase the key is sealed under.
        #[arg(long, env = "KEYNEST_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
    /// Decrypt a sealed blob and print the API key.
    Decrypt {
        /// Base64 blob produced by `keynest encrypt`.
        blob: String,
        /// Passphrase the key was sealed under.
        #[arg(long, env = "KEYNEST_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
    /// Re-seal a blob under a new passphrase (Pro).
    Rekey {
        /// Base64 blob produced by `keynest encrypt`.
        blob: String,
        /// Current passphrase.
        #[arg(long, env = "KEYNEST_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
        /// Passphrase to seal under from now on.
        #[arg(long)]
        new_passphrase: String,
    },
    /// Show or change the current plan.
    Plan {
        #[command(subcommand)]
        action: PlanCommands,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show the current plan.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Switch to the Pro plan.
    Upgrade,
    /// Switch to the Free plan.
    Downgrade,
    /// Flip between Free and Pro.
    Toggle,
}

// ── Pretty output helpers ────────────────────────────────────────────

fn success(msg: &str) {
    eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn plan_badge(plan: Plan) -> String {
    match plan {
        Plan::Pro => format!("{CYAN}{BOLD}pro{RESET}"),
        Plan::Free => format!("{YELLOW}free{RESET}"),
    }
}

// ── Setup ────────────────────────────────────────────────────────────

fn init_tracing(config: &CliConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Open the configured storage. An unusable store degrades to memory, since
/// the only thing kept there is the plan preference.
fn open_storage(config: &CliConfig) -> Arc<dyn StorageBackend> {
    match &config.storage {
        StorageKind::Memory => Arc::new(MemoryBackend::new()),
        StorageKind::Redb { path } => match RedbBackend::open(path) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!(error = %e, "storage unavailable, plan changes will not persist");
                Arc::new(MemoryBackend::new())
            }
        },
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CliConfig::from_env();
    init_tracing(&config);

    match run(&config, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{RED}{BOLD}✗ Error:{RESET} {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &CliConfig, cmd: Commands) -> Result<()> {
    let cipher = KeyCipher::new(config.kdf_params());
    match cmd {
        Commands::Encrypt {
            plaintext,
            passphrase,
        } => cmd_encrypt(&cipher, &plaintext, &passphrase).await,
        Commands::Decrypt { blob, passphrase } => cmd_decrypt(&cipher, &blob, &passphrase).await,
        Commands::Rekey {
            blob,
            passphrase,
            new_passphrase,
        } => {
            let gate = PlanGate::new(open_storage(config));
            gate.require_pro("Re-keying").await?;
            cmd_rekey(&cipher, &blob, &passphrase, &new_passphrase).await
        }
        Commands::Plan { action } => cmd_plan(&PlanGate::new(open_storage(config)), action).await,
    }
}

// ── Key cipher commands ──────────────────────────────────────────────

async fn cmd_encrypt(cipher: &KeyCipher, plaintext: &str, passphrase: &str) -> Result<()> {
    let blob = cipher
        .encrypt(plaintext, passphrase)
        .await
        .context("failed to seal API key")?;
    println!("{blob}");
    Ok(())
}

async fn cmd_decrypt(cipher: &KeyCipher, blob: &str, passphrase: &str) -> Result<()> {
    let plaintext = cipher.decrypt(blob, passphrase).await?;
    println!("{plaintext}");
    Ok(())
}

async fn cmd_rekey(
    cipher: &KeyCipher,
    blob: &str,
    passphrase: &str,
    new_passphrase: &str,
) -> Result<()> {
    let plaintext = cipher.decrypt(blob, passphrase).await?;
    let resealed = cipher
        .encrypt(&plaintext, new_passphrase)
        .await
        .context("failed to re-seal API key")?;
    println!("{resealed}");
    Ok(())
}

// ── Plan commands ────────────────────────────────────────────────────

async fn cmd_plan(gate: &PlanGate, action: PlanCommands) -> Result<()> {
    match action {
        PlanCommands::Status { json } => {
            let plan = gate.get_plan().await;
            if json {
                let body = serde_json::json!({ "plan": plan, "is_pro": plan == Plan::Pro });
                println!("{body}");
            } else {
                println!("Plan: {}", plan_badge(plan));
            }
        }
        PlanCommands::Upgrade => {
            gate.set_plan(Plan::Pro).await;
            success(&format!("plan is now {}", plan_badge(gate.get_plan().await)));
        }
        PlanCommands::Downgrade => {
            gate.set_plan(Plan::Free).await;
            success(&format!("plan is now {}", plan_badge(gate.get_plan().await)));
        }
        PlanCommands::Toggle => {
            let plan = gate.toggle_plan().await;
            success(&format!("plan is now {}", plan_badge(plan)));
        }
    }
    Ok(())
}
