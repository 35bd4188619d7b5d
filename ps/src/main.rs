use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;

use promptstore::cli::{Cli, Command};
use promptstore::{Error, LocalRegistry, PromptSystem, Settings, TEMPLATE_EXT};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let settings_path = cli.settings.clone();
    let settings =
        Settings::load(settings_path.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Command::Set { directory } => {
            let directory = std::path::absolute(&directory)
                .context("Failed to resolve absolute path")?;
            if !directory.is_dir() {
                bail!("directory does not exist: {}", directory.display());
            }
            let settings = Settings {
                registry_dir: Some(directory.clone()),
            };
            settings
                .save(settings_path.as_deref())
                .context("Failed to save settings")?;
            println!(
                "{} Registry directory set to: {}",
                "✓".green(),
                directory.display().to_string().cyan()
            );
        }
        Command::Generate {
            template,
            config,
            output,
        } => {
            let system = prompt_system(&settings)?;
            info!("generating prompt from {template} with {config}");
            let prompt = match system.build_from_paths(&template, &config) {
                Ok(prompt) => prompt,
                Err(err) if err.is_recoverable() => {
                    // Fill in whatever the config is missing, then retry once.
                    println!("{} {err}; updating config", "!".yellow());
                    system.generate_config(&template, &config)?;
                    system
                        .build_from_paths(&template, &config)
                        .context("Failed to build prompt with updated config")?
                }
                Err(err) => return Err(err).context("Failed to build prompt"),
            };
            std::fs::write(&output, prompt).context("Failed to write output file")?;
            println!(
                "{} Generated prompt at: {}",
                "✓".green(),
                output.display().to_string().cyan()
            );
        }
        Command::GenCfg { template, config } => {
            let system = prompt_system(&settings)?;
            system
                .generate_config(&template, &config)
                .context("Failed to generate config")?;
            println!("{} Generated config at: {}", "✓".green(), config.cyan());
        }
        Command::NewTemplate { path } => {
            let registry = registry(&settings)?;
            if !path.ends_with(TEMPLATE_EXT) {
                bail!("template must end in {TEMPLATE_EXT}");
            }
            let full_path = registry.directory().join(&path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create directories")?;
            }
            std::fs::write(&full_path, "").context("Failed to create template file")?;
            println!(
                "{} Created template at: {}",
                "✓".green(),
                full_path.display().to_string().cyan()
            );
        }
        Command::NewConfig { path } => {
            let registry = registry(&settings)?;
            let full_path = registry.directory().join(&path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create directories")?;
            }
            std::fs::write(&full_path, "{}").context("Failed to create config file")?;
            println!(
                "{} Created config at: {}",
                "✓".green(),
                full_path.display().to_string().cyan()
            );
        }
    }

    Ok(())
}

fn registry(settings: &Settings) -> Result<LocalRegistry, Error> {
    match &settings.registry_dir {
        Some(directory) => Ok(LocalRegistry::new(directory)),
        None => Err(Error::RegistryNotSet),
    }
}

fn prompt_system(settings: &Settings) -> Result<PromptSystem<LocalRegistry>, Error> {
    Ok(PromptSystem::new(registry(settings)?))
}
