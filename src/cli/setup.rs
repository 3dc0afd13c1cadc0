//! Interactive settings setup: pick a model, supply a token if none is
//! available, and confirm through the settings gate.

use std::error::Error;

use crate::cli::prompt::{prompt_line, prompt_masked};
use crate::core::credentials::{CredentialSource, ENV_API_TOKEN};
use crate::core::settings::{
    find_model, recommended_model, ConfigurationError, Settings, SettingsGate, SettingsStore,
    MODEL_CATALOG,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    Catalog(&'static str),
    Custom,
}

/// Menu entry that asks for a free-form model id.
fn custom_entry() -> usize {
    MODEL_CATALOG.len() + 1
}

/// Interpret the menu answer. An empty answer keeps `default_index`.
pub fn parse_model_choice(input: &str, default_index: usize) -> Result<ModelChoice, String> {
    let input = input.trim();
    let index = if input.is_empty() {
        default_index
    } else {
        input
            .parse::<usize>()
            .map_err(|_| format!("Invalid choice: {input}"))?
    };

    match index {
        0 => Err(format!("Invalid choice: {index}")),
        n if n <= MODEL_CATALOG.len() => Ok(ModelChoice::Catalog(MODEL_CATALOG[n - 1].id)),
        n if n == custom_entry() => Ok(ModelChoice::Custom),
        n => Err(format!("Invalid choice: {n}")),
    }
}

/// 1-based menu index to preselect: the configured default when it is in
/// the catalog, otherwise the recommended model.
pub fn default_menu_index(preferred: Option<&str>) -> usize {
    let target = preferred
        .and_then(find_model)
        .map(|option| option.id)
        .unwrap_or_else(recommended_model);
    MODEL_CATALOG
        .iter()
        .position(|option| option.id == target)
        .map_or(1, |index| index + 1)
}

fn print_menu(default_index: usize) {
    println!("⚙️  Concept Mentor settings");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (i, option) in MODEL_CATALOG.iter().enumerate() {
        let marker = if i + 1 == default_index { "▶" } else { " " };
        let recommended = if option.recommended {
            " (recommended)"
        } else {
            ""
        };
        println!("{marker} {}. {}{recommended}", i + 1, option.label);
        println!("     {}", option.id);
    }
    println!("  {}. Other model id…", custom_entry());
    println!();
}

fn ask_for_model(preferred: Option<&str>) -> Result<String, Box<dyn Error>> {
    let default_index = default_menu_index(preferred);
    print_menu(default_index);
    let answer = prompt_line(&format!(
        "Select a model (1-{}) [{default_index}]: ",
        custom_entry()
    ))?;
    match parse_model_choice(&answer, default_index)? {
        ModelChoice::Catalog(id) => Ok(id.to_string()),
        ModelChoice::Custom => {
            let model = prompt_line("Model id: ")?;
            if model.is_empty() {
                return Err("No model id entered".into());
            }
            Ok(model)
        }
    }
}

/// Ask for a token only when none can be found yet.
fn ask_for_token_if_missing<S, C>(
    gate: &SettingsGate<S, C>,
) -> Result<Option<String>, Box<dyn Error>>
where
    S: SettingsStore,
    C: CredentialSource,
{
    match gate.api_token() {
        Ok(_) => {
            println!("✓ API token found");
            Ok(None)
        }
        Err(ConfigurationError::MissingCredential) => {
            println!("No API token found (checked {ENV_API_TOKEN} and the system keyring).");
            println!("Press F2 to reveal the last characters, Esc to cancel.");
            let token = prompt_masked("🔑 SiliconFlow API token: ")?;
            Ok(Some(token))
        }
        Err(err) => Err(Box::new(err)),
    }
}

/// Walk the user through picking a model and, if needed, a token.
pub fn run_settings_prompt<S, C>(
    gate: &SettingsGate<S, C>,
    preferred_model: Option<&str>,
) -> Result<Settings, Box<dyn Error>>
where
    S: SettingsStore,
    C: CredentialSource,
{
    let model = ask_for_model(preferred_model)?;
    let token = ask_for_token_if_missing(gate)?;
    let settings = gate.confirm(&model, token.as_deref())?;
    println!("✅ Using model {}", settings.model);
    Ok(settings)
}

/// Ask for a token unconditionally and store it through the gate.
pub fn prompt_token_and_confirm<S, C>(
    gate: &SettingsGate<S, C>,
    model: &str,
) -> Result<Settings, Box<dyn Error>>
where
    S: SettingsStore,
    C: CredentialSource,
{
    let token = prompt_masked("🔑 SiliconFlow API token: ")?;
    Ok(gate.confirm(model, Some(&token))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_keeps_the_default() {
        assert_eq!(
            parse_model_choice("", 2),
            Ok(ModelChoice::Catalog(MODEL_CATALOG[1].id))
        );
    }

    #[test]
    fn last_entry_asks_for_a_custom_id() {
        let answer = custom_entry().to_string();
        assert_eq!(parse_model_choice(&answer, 1), Ok(ModelChoice::Custom));
    }

    #[test]
    fn out_of_range_and_garbage_are_rejected() {
        assert!(parse_model_choice("0", 1).is_err());
        assert!(parse_model_choice(&(custom_entry() + 1).to_string(), 1).is_err());
        assert!(parse_model_choice("qwq", 1).is_err());
    }

    #[test]
    fn default_index_prefers_configured_catalog_model() {
        let configured = MODEL_CATALOG[2].id.to_ascii_lowercase();
        assert_eq!(default_menu_index(Some(&configured)), 3);

        let recommended = default_menu_index(None);
        assert_eq!(MODEL_CATALOG[recommended - 1].id, recommended_model());
        assert_eq!(default_menu_index(Some("someone/else")), recommended);
    }
}
