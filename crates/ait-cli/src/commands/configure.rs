use ait::providers::configs::{ProviderConfig, ProviderType};
use ait::providers::factory::{create_provider, parse_provider_type};
use ait::store::{load_providers_config, save_providers_config, ConfigStore};
use anyhow::Result;
use cliclack::spinner;
use console::style;
use strum::IntoEnumIterator;

fn provider_hint(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::Gemini => "Google AI Studio",
        ProviderType::OpenAi => "GPT-4o mini etc",
        ProviderType::Anthropic => "Claude models",
        ProviderType::DeepSeek => "DeepSeek chat",
    }
}

pub async fn handle_configure(
    store: &dyn ConfigStore,
    provided_provider: Option<String>,
    provided_model: Option<String>,
) -> Result<()> {
    cliclack::intro(style(" configure-ait ").on_cyan().black())?;

    let mut configs = load_providers_config(store).await?;

    let provider_type = match provided_provider {
        Some(name) => parse_provider_type(&name)?,
        None => {
            let items: Vec<(ProviderType, String, &str)> = ProviderType::iter()
                .map(|t| (t, ProviderConfig::default_for(t).name, provider_hint(t)))
                .collect();
            cliclack::select("Which provider should we use?")
                .initial_value(configs.active_provider)
                .items(&items)
                .interact()?
        }
    };
    let current = configs.resolve(provider_type);

    let api_key = if current.api_key.is_empty() {
        let _ = cliclack::log::info(format!(
            "Get a key for {} at {}",
            current.name, current.get_api_key_url
        ));
        cliclack::password(format!("Enter your {} API key", current.name))
            .mask('▪')
            .interact()?
    } else if cliclack::confirm("An API key is already saved. Would you like to replace it?")
        .initial_value(false)
        .interact()?
    {
        cliclack::password(format!("Enter your {} API key", current.name))
            .mask('▪')
            .interact()?
    } else {
        current.api_key.clone()
    };

    let model = match provided_model {
        Some(model) => model,
        None => cliclack::input("Enter a model from that provider:")
            .default_input(&current.model)
            .interact()?,
    };

    let config = ProviderConfig {
        api_key,
        model,
        ..current
    };

    // Confirm everything works before saving.
    let spin = spinner();
    spin.start("Checking your configuration...");
    let outcome = match create_provider(config.clone()) {
        Ok(provider) => provider.test_connectivity().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => {
            spin.stop("Connection successful");
            configs.active_provider = provider_type;
            configs.upsert(&config);
            save_providers_config(store, configs).await?;
            cliclack::outro(format!("{} is now the active provider", config.name))?;
        }
        Err(e) => {
            spin.stop(format!("We could not connect: {}", e));
            cliclack::outro("Nothing was saved. Check your credentials and try again.")?;
        }
    }

    Ok(())
}
