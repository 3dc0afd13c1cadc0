//! Command-line interface parsing and handling
//!
//! This module parses arguments, resolves settings and credentials, and then
//! hands off to the full-screen tutor or one of the setup commands.

pub mod explain;
pub mod model_list;
pub mod prompt;
pub mod setup;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cli::explain::explain_topic;
use crate::cli::model_list::list_models;
use crate::cli::setup::{prompt_token_and_confirm, run_settings_prompt};
use crate::core::chat_client::client_from_config;
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::credentials::{CredentialSource, EnvKeyringCredentials};
use crate::core::records::RecordStore;
use crate::core::settings::{
    recommended_model, ConfigurationError, JsonFileSettingsStore, MemorySettingsStore, Settings,
    SettingsGate, SettingsStore,
};
use crate::core::tutor::{Sampling, Tutor};
use crate::logging::init_file_logging;
use crate::ui::{run_tutor, SessionExit};

#[derive(Parser)]
#[command(name = "concept-mentor")]
#[command(about = "A terminal tutor that explains a concept and quizzes you on it")]
#[command(
    long_about = "Concept Mentor explains any concept you type, then generates a short quiz \
and grades your answers. It talks to an OpenAI-compatible chat completion API \
(SiliconFlow by default).\n\n\
Authentication:\n\
  SILICONFLOW_API_TOKEN   API token (takes precedence over the keyring)\n\
  SILICONFLOW_API_URL     Custom API base URL (optional)\n\
  DEFAULT_MODEL           Model preselected in the settings prompt (optional)\n\n\
Controls:\n\
  Enter             Submit the topic or answer / continue\n\
  Up/Down, 1-9      Choose a multiple-choice option\n\
  PgUp/PgDn         Scroll the explanation\n\
  Ctrl+R            Start over with a new topic\n\
  Ctrl+S            Change settings\n\
  Esc               Dismiss a notice\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run (not saved)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Read the API token from the environment only, never the keyring
    #[arg(long, global = true)]
    pub env_only: bool,

    /// Keep chosen settings in memory instead of saving them
    #[arg(long, global = true)]
    pub no_save: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive tutor (default)
    Learn,
    /// Print an explanation of a topic and exit
    Explain {
        /// Topic to explain (may be several words)
        #[arg(trailing_var_arg = true, required = true)]
        topic: Vec<String>,
    },
    /// List the built-in models
    Models,
    /// Show or change the saved model and API token
    Settings {
        #[command(subcommand)]
        action: Option<SettingsCommand>,
    },
    /// Show or change configuration values
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the saved model and whether a token is available
    Show,
    /// Save a model, optionally prompting for a new API token
    Set {
        model: String,
        /// Prompt for an API token and store it in the keyring
        #[arg(long)]
        token: bool,
    },
    /// Choose a model from the interactive menu
    Pick,
    /// Forget the saved model so the next start asks again
    Reset {
        /// Also delete the API token from the keyring
        #[arg(long)]
        forget_token: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Set a configuration value
    Set {
        key: String,
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove a configuration value
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .map_err(|err| format!("failed to start the async runtime: {err}"))?
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;

    let log_path = args
        .log
        .clone()
        .or_else(|| config.log_file.as_ref().map(PathBuf::from));
    if let Some(path) = log_path {
        if let Err(err) = init_file_logging(&path) {
            eprintln!("⚠️  Logging disabled: {err}");
        }
    }

    let result = if args.no_save {
        let gate = SettingsGate::new(MemorySettingsStore::default(), credentials(&args));
        dispatch(args, config, gate).await
    } else {
        let gate = SettingsGate::new(JsonFileSettingsStore::default_location()?, credentials(&args));
        dispatch(args, config, gate).await
    };

    if let Err(err) = result {
        exit_with_error(err.as_ref());
    }
    Ok(())
}

fn credentials(args: &Args) -> EnvKeyringCredentials {
    if args.env_only {
        EnvKeyringCredentials::env_only()
    } else {
        EnvKeyringCredentials::new()
    }
}

/// Print the error, any quick fixes, and exit with the matching code.
fn exit_with_error(err: &(dyn Error + 'static)) -> ! {
    eprintln!("{err}");
    match err.downcast_ref::<ConfigurationError>() {
        Some(config_err) => {
            let fixes = config_err.quick_fixes();
            if !fixes.is_empty() {
                eprintln!();
                eprintln!("💡 Quick fixes:");
                for fix in fixes {
                    eprintln!("  • {fix}");
                }
            }
            std::process::exit(config_err.exit_code());
        }
        None => std::process::exit(1),
    }
}

async fn dispatch<S: SettingsStore>(
    args: Args,
    config: Config,
    gate: SettingsGate<S, EnvKeyringCredentials>,
) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Learn) {
        Commands::Learn => run_learn(&config, &gate, args.model).await,
        Commands::Explain { topic } => {
            run_explain(&config, &gate, args.model.as_deref(), &topic.join(" ")).await
        }
        Commands::Models => {
            let saved = gate.resolve().ok().flatten();
            list_models(&config, saved.as_ref())
        }
        Commands::Settings { action } => {
            run_settings_command(&config, &gate, action.unwrap_or(SettingsCommand::Show))
        }
        Commands::Config { action } => {
            run_config_command(config, action.unwrap_or(ConfigCommand::Show))
        }
    }
}

/// Settings for an interactive session: `--model` wins, then the saved
/// choice, then the menu.
fn settings_for_session<S, C>(
    config: &Config,
    gate: &SettingsGate<S, C>,
    model_override: Option<&str>,
) -> Result<Settings, Box<dyn Error>>
where
    S: SettingsStore,
    C: CredentialSource,
{
    if let Some(model) = model_override {
        gate.api_token()?;
        return Ok(Settings {
            model: model.trim().to_string(),
        });
    }
    match gate.resolve() {
        Ok(Some(settings)) => Ok(settings),
        // No saved choice, or a saved one without a token: ask.
        Ok(None) | Err(ConfigurationError::MissingCredential) => {
            run_settings_prompt(gate, config.resolved_default_model().as_deref())
        }
        Err(err) => Err(Box::new(err)),
    }
}

async fn run_learn<S: SettingsStore>(
    config: &Config,
    gate: &SettingsGate<S, EnvKeyringCredentials>,
    mut model_override: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut records = RecordStore::new();
    loop {
        let settings = settings_for_session(config, gate, model_override.as_deref())?;
        let client = client_from_config(config, gate.api_token()?)?;
        info!(model = %settings.model, "starting tutor session");

        let tutor = Tutor::new(settings, Sampling::from_config(config)).with_records(records);
        let (exit, kept) = run_tutor(tutor, client).await?;
        records = kept;

        match exit {
            SessionExit::Quit => return Ok(()),
            SessionExit::ChangeSettings => {
                gate.reset()?;
                model_override = None;
            }
        }
    }
}

async fn run_explain<S: SettingsStore>(
    config: &Config,
    gate: &SettingsGate<S, EnvKeyringCredentials>,
    model_override: Option<&str>,
    topic: &str,
) -> Result<(), Box<dyn Error>> {
    let model = match model_override {
        Some(model) => model.trim().to_string(),
        None => match gate.resolve()? {
            Some(settings) => settings.model,
            None => config
                .resolved_default_model()
                .unwrap_or_else(|| recommended_model().to_string()),
        },
    };
    let client = client_from_config(config, gate.api_token()?)?;
    let text = explain_topic(
        client,
        Settings { model },
        Sampling::from_config(config),
        topic,
    )
    .await?;
    println!("{text}");
    Ok(())
}

fn run_settings_command<S: SettingsStore>(
    config: &Config,
    gate: &SettingsGate<S, EnvKeyringCredentials>,
    action: SettingsCommand,
) -> Result<(), Box<dyn Error>> {
    match action {
        SettingsCommand::Show => {
            match gate.resolve() {
                Ok(Some(settings)) => println!("Model: {}", settings.model),
                Ok(None) => println!("Model: (not chosen yet)"),
                Err(ConfigurationError::MissingCredential) => {
                    println!("Model: (saved, but unusable without a token)")
                }
                Err(err) => return Err(Box::new(err)),
            }
            match gate.api_token() {
                Ok(_) => println!("API token: available"),
                Err(ConfigurationError::MissingCredential) => println!("API token: missing"),
                Err(err) => return Err(Box::new(err)),
            }
            Ok(())
        }
        SettingsCommand::Set { model, token } => {
            let settings = if token {
                prompt_token_and_confirm(gate, &model)?
            } else {
                gate.confirm(&model, None)?
            };
            println!("✅ Saved model: {}", settings.model);
            Ok(())
        }
        SettingsCommand::Pick => {
            run_settings_prompt(gate, config.resolved_default_model().as_deref())?;
            Ok(())
        }
        SettingsCommand::Reset { forget_token } => {
            gate.reset()?;
            println!("✅ Saved model cleared");
            if forget_token {
                EnvKeyringCredentials::new().clear_stored_token()?;
                println!("✅ API token removed from the keyring");
            }
            Ok(())
        }
    }
}

fn run_config_command(mut config: Config, action: ConfigCommand) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigCommand::Show => {
            if let Ok(path) = Config::get_config_path() {
                println!("Config file: {}", path_display(path));
            }
            config.print_all();
        }
        ConfigCommand::Set { key, value } => {
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
        }
        ConfigCommand::Unset { key } => {
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
        }
    }
    Ok(())
}
