use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;

use kyc_progress::config::Config;
use kyc_progress::logging::init_logging;
use kyc_progress::progress::{
    EntryDecision, FormData, NavigationOutcome, PassportOverride, VerificationProgress,
    PHASE_COUNT,
};
use kyc_progress::steps::{ENTRY_STEP, VERIFICATION_STEPS};
use kyc_progress::store::FileStore;

#[derive(Parser)]
#[command(name = "kyc-progress")]
#[command(about = "Inspect and drive verification flow progress")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the verification steps in order
    Steps,

    /// Show saved step, phase count, form data and passport override
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report a navigation to a step
    Visit {
        /// Step route token (e.g. /verify/address)
        step: String,

        /// Form answer to merge, as key=value (value parsed as JSON if possible)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Show where a user landing on a screen would be redirected
    Resume {
        /// Screen the user lands on
        #[arg(long, default_value = "/verify")]
        from: String,
    },

    /// Show what the dashboard entry card would offer
    Entry,

    /// Print accumulated form data as JSON
    Form,

    /// Wipe saved progress and form data
    Clear,

    /// Accept the liveness photo (raises the passport override for passport users)
    Liveness,

    /// Manage the passport re-submission override
    Passport {
        #[command(subcommand)]
        action: PassportAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the effective configuration to .kyc-progress/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
}

#[derive(Subcommand)]
enum PassportAction {
    /// Flag the user for passport re-submission
    Set {
        /// Completed phases to report while flagged
        #[arg(long, default_value_t = 3)]
        phases: u8,
    },
    /// Remove the override
    Clear,
    /// Accept the update prompt: wipe progress and the override
    Confirm,
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let logging = init_logging(&config, cli.debug)?;
    if let Some(path) = &logging.log_file_path {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    let store = FileStore::open(&config).context("Failed to open progress store")?;
    tracing::debug!(path = %store.path().display(), "using progress store");
    let engine = VerificationProgress::new(Arc::new(store), &config.storage);

    match cli.command {
        Commands::Steps => cmd_steps(),
        Commands::Status { json } => cmd_status(&engine, json)?,
        Commands::Visit { step, fields } => cmd_visit(&engine, &step, fields)?,
        Commands::Resume { from } => match engine.redirect_target(&from) {
            Some(step) => println!("{step}"),
            None => println!("no redirect (render {from})"),
        },
        Commands::Entry => match engine.entry_decision() {
            EntryDecision::PassportUpdateRequired => println!("passport update required"),
            EntryDecision::OfferResume(step) => println!("offer resume at {step}"),
            EntryDecision::StartFresh => println!("start at {ENTRY_STEP}"),
        },
        Commands::Form => {
            let form = Value::Object(engine.get_form_data());
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        Commands::Clear => {
            let next = engine.restart();
            println!("progress cleared, restart at {next}");
        }
        Commands::Liveness => {
            if engine.submit_liveness() {
                println!("passport flagged for update");
            } else {
                println!("liveness accepted");
            }
        }
        Commands::Passport { action } => cmd_passport(&engine, action),
        Commands::Config { action } => cmd_config(&config, action)?,
    }

    Ok(())
}

fn cmd_steps() {
    for step in VERIFICATION_STEPS {
        let marker = if step.is_terminal() { " (terminal)" } else { "" };
        println!("{:>2}  {step}{marker}", step.index());
    }
}

fn cmd_status(engine: &VerificationProgress, json: bool) -> Result<()> {
    let saved = engine.get_saved_progress();
    let phases = engine.completed_phases();
    let verified = engine.is_verified();
    let passport = engine.passport_status();
    let form = engine.get_form_data();

    if json {
        let status = serde_json::json!({
            "savedStep": saved,
            "completedPhases": phases,
            "verified": verified,
            "passport": passport,
            "formData": form,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match saved {
        Some(step) => println!(
            "Saved step:  {step} ({}/{})",
            step.index(),
            VERIFICATION_STEPS.len() - 1
        ),
        None => println!("Saved step:  none"),
    }
    println!("Phases:      {phases}/{PHASE_COUNT}");
    println!("Verified:    {}", if verified { "yes" } else { "no" });
    match passport {
        Some(record) => println!(
            "Passport:    needs_update={} completed={}",
            record.needs_update, record.completed_steps
        ),
        None => println!("Passport:    none"),
    }
    println!("Form fields: {}", form.len());
    for (field, value) in &form {
        println!("  {field} = {value}");
    }
    Ok(())
}

fn cmd_visit(
    engine: &VerificationProgress,
    step: &str,
    fields: Vec<(String, Value)>,
) -> Result<()> {
    let answers: FormData = fields.into_iter().collect();
    let partial = if answers.is_empty() {
        None
    } else {
        Some(&answers)
    };

    match engine.on_navigate(step, partial) {
        NavigationOutcome::NotInFlow => bail!("'{step}' is not a verification step"),
        NavigationOutcome::Saved(step) => println!("progress saved at {step}"),
        NavigationOutcome::Skipped(step) => println!("visited {step}, progress unchanged"),
        NavigationOutcome::Cleared => println!("verification complete, progress cleared"),
    }
    Ok(())
}

fn cmd_passport(engine: &VerificationProgress, action: PassportAction) {
    match action {
        PassportAction::Set { phases } => {
            engine.set_passport_status(Some(PassportOverride::needs_update(phases)));
            println!("passport override set ({phases} phases)");
        }
        PassportAction::Clear => {
            engine.set_passport_status(None);
            println!("passport override cleared");
        }
        PassportAction::Confirm => {
            let next = engine.confirm_passport_update();
            println!("passport update accepted, restart at {next}");
        }
    }
}

fn cmd_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = Config::local_config_path();
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            let written = config.save()?;
            println!("wrote {}", written.display());
        }
        ConfigAction::Show => {
            let toml_str =
                toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
            print!("{toml_str}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_visit_with_fields() {
        let cli = Cli::try_parse_from([
            "kyc-progress",
            "visit",
            "/verify/document-type",
            "--field",
            "documentType=passport",
            "-f",
            "points=3",
        ])
        .unwrap();

        match cli.command {
            Commands::Visit { step, fields } => {
                assert_eq!(step, "/verify/document-type");
                assert_eq!(
                    fields,
                    vec![
                        (
                            "documentType".to_string(),
                            Value::String("passport".to_string())
                        ),
                        ("points".to_string(), serde_json::json!(3)),
                    ]
                );
            }
            _ => panic!("expected visit command"),
        }
    }

    #[test]
    fn test_parse_field_rejects_malformed() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=value").is_err());
        assert_eq!(parse_field("a=null").unwrap(), ("a".to_string(), Value::Null));
    }

    #[test]
    fn test_cli_resume_default_from() {
        let cli = Cli::try_parse_from(["kyc-progress", "resume"]).unwrap();
        match cli.command {
            Commands::Resume { from } => assert_eq!(from, "/verify"),
            _ => panic!("expected resume command"),
        }
    }

    #[test]
    fn test_cli_passport_set_default_phases() {
        let cli = Cli::try_parse_from(["kyc-progress", "passport", "set"]).unwrap();
        match cli.command {
            Commands::Passport {
                action: PassportAction::Set { phases },
            } => assert_eq!(phases, 3),
            _ => panic!("expected passport set"),
        }
    }

    #[test]
    fn test_cli_config_init_force() {
        let cli = Cli::try_parse_from(["kyc-progress", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { force },
            } => assert!(force),
            _ => panic!("expected config init"),
        }

        let cli = Cli::try_parse_from(["kyc-progress", "config", "init"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: false }
            }
        ));
    }
}
