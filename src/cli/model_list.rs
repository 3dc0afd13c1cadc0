//! Model listing
//!
//! Prints the built-in model catalog with the saved and configured choices
//! marked.

use std::error::Error;

use crate::core::config::Config;
use crate::core::settings::{Settings, MODEL_CATALOG};

pub fn list_models(config: &Config, saved: Option<&Settings>) -> Result<(), Box<dyn Error>> {
    let saved_model = saved.map(|settings| settings.model.as_str());
    let configured = config.resolved_default_model();

    println!("🤖 Available Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    for option in MODEL_CATALOG {
        let mut tags = Vec::new();
        if option.recommended {
            tags.push("recommended");
        }
        if saved_model.is_some_and(|model| model.eq_ignore_ascii_case(option.id)) {
            tags.push("saved");
        }
        if configured
            .as_deref()
            .is_some_and(|model| model.eq_ignore_ascii_case(option.id))
        {
            tags.push("default-model");
        }
        if tags.is_empty() {
            println!("  • {}", option.id);
        } else {
            println!("  • {} ({})", option.id, tags.join(", "));
        }
    }

    if let Some(model) = saved_model {
        if !MODEL_CATALOG
            .iter()
            .any(|option| option.id.eq_ignore_ascii_case(model))
        {
            println!();
            println!("🎯 Saved custom model: {model}");
        }
    }
    println!();
    println!("Use 'concept-mentor settings set <MODEL>' to change the saved model.");
    Ok(())
}
