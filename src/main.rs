//! Command line front end for the templated mailer
//!
//! ```bash
//! # List built-in templates
//! templated-mailer templates
//!
//! # Render a template without sending
//! templated-mailer render --template welcome --var platform=Acme --var username=Jo
//!
//! # Send using MAILER_* / SMTP_* settings from the environment
//! templated-mailer send request.json
//! templated-mailer bulk batch.json
//! templated-mailer check
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use templated_mailer::config::Config;
use templated_mailer::email::{EmailTemplate, TemplateEngine};
use templated_mailer::{create_mailer, telemetry, BulkRequest, Mailer, SendEmailRequest};
use tracing::info;

#[derive(Parser)]
#[command(name = "templated-mailer")]
#[command(about = "Render and send templated HTML emails", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in templates and their placeholders
    Templates,
    /// Render a built-in template to stdout
    Render {
        /// Template name (e.g. welcome, passwordReset)
        #[arg(short, long)]
        template: String,
        /// Placeholder value as key=value
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
        /// CSS override as NAME=css
        #[arg(long = "css", value_parser = parse_key_value)]
        css: Vec<(String, String)>,
    },
    /// Send a single templated email described by a JSON file
    Send {
        request: PathBuf,
    },
    /// Send a bulk batch described by a JSON file
    Bulk {
        request: PathBuf,
    },
    /// Check connectivity and credentials of the configured backend
    Check,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid request in {}", path.display()))
}

fn build_mailer(config: &Config) -> Result<Mailer> {
    create_mailer(&config.kind, &config.mailer, config.css.clone())
        .context("Failed to create mailer")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Templates => {
            for template in EmailTemplate::ALL {
                println!("{:<24} {}", template.name(), template.placeholders().join(", "));
            }
        }
        Commands::Render { template, vars, css } => {
            let template = EmailTemplate::from_name(&template)
                .with_context(|| format!("Unknown template '{}'", template))?;

            let mut engine = TemplateEngine::with_css(css.into_iter().collect());
            engine.set_all(vars.into_iter().collect::<HashMap<_, _>>());
            println!("{}", engine.render_template(template));
        }
        Commands::Send { request } => {
            let config = Config::from_env()?;
            telemetry::init(&config.telemetry);

            let request: SendEmailRequest = read_json(&request)?;
            let mailer = build_mailer(&config)?;
            info!(provider = mailer.provider_name(), to = %request.email, "Sending email");

            let result = mailer.send_email(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Bulk { request } => {
            let config = Config::from_env()?;
            telemetry::init(&config.telemetry);

            let request: BulkRequest = read_json(&request)?;
            let mailer = build_mailer(&config)?;
            info!(
                provider = mailer.provider_name(),
                recipients = request.users.len(),
                "Sending bulk email"
            );

            let result = mailer.send_bulk(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_queued() {
                std::process::exit(2);
            }
        }
        Commands::Check => {
            let config = Config::from_env()?;
            telemetry::init(&config.telemetry);

            let mailer = build_mailer(&config)?;
            mailer.test_connection().await?;
            println!("✓ {} backend reachable", mailer.provider_name());
        }
    }

    Ok(())
}
