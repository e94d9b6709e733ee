//! Charm-style CLI prompts using cliclack

use std::path::Path;

use anyhow::Result;

use crate::config::{Language, DEFAULT_COMPONENT_PATH};
use crate::install::NpmInstaller;
use crate::ops::{self, DependencyInstaller, PromptProvider, SetupAnswers};
use crate::registry::ComponentFetcher;

/// User agent sent on registry requests
pub const USER_AGENT: &str = concat!("multi-ui/", env!("CARGO_PKG_VERSION"));

/// Answers setup questions through interactive terminal prompts
pub struct CliclackPrompts;

impl PromptProvider for CliclackPrompts {
    fn setup_answers(&mut self) -> Result<SetupAnswers> {
        let language: Language = cliclack::select("Which language do you want to use?")
            .item(Language::TypeScript, "TypeScript", "")
            .item(Language::JavaScript, "JavaScript", "converted from TSX")
            .interact()?;

        let directory: String = cliclack::input("Where would you like to add the components?")
            .placeholder("src/app/")
            .default_input("src/app/")
            .interact()?;

        Ok(SetupAnswers {
            language,
            directory,
        })
    }

    fn confirm_install(&mut self, command: &str) -> Result<bool> {
        let accepted: bool = cliclack::confirm(format!(
            "Install the peer dependencies now? ({command})"
        ))
        .initial_value(true)
        .interact()?;
        Ok(accepted)
    }
}

/// Run the interactive setup flow
pub async fn setup_flow(project_dir: &Path, skip_install: bool) -> Result<()> {
    cliclack::intro("multi-ui setup")?;

    let mut prompts = CliclackPrompts;
    let installer = NpmInstaller::new(project_dir);
    let outcome = ops::run_setup(project_dir, &mut prompts, &installer, skip_install).await?;

    cliclack::log::success(format!(
        "Preferences saved to {}",
        outcome.config_path.display()
    ))?;
    if outcome.installed {
        cliclack::log::success("Peer dependencies installed")?;
    } else if let Some(err) = &outcome.install_error {
        cliclack::log::warning(format!("Peer dependency install failed: {err}"))?;
        cliclack::log::info(format!(
            "You can retry later with: {}",
            installer.command()
        ))?;
    }

    cliclack::outro("Ready. Add a component with: multi-ui add <ComponentName>")?;
    Ok(())
}

/// Run the add flow for one component
pub async fn add_flow(project_dir: &Path, component: &str) -> Result<()> {
    cliclack::intro("multi-ui add")?;

    let fetcher = ComponentFetcher::from_env(USER_AGENT)?;

    let spinner = cliclack::spinner();
    spinner.start(format!("Fetching {component}..."));
    match ops::run_add(project_dir, &fetcher, component).await {
        Ok(outcome) => {
            let how = if outcome.transformed {
                "converted to JavaScript"
            } else {
                "copied as-is"
            };
            spinner.stop(format!(
                "Added {} ({})",
                outcome.file_path.display(),
                how
            ));
            if outcome.used_default_preference {
                cliclack::log::warning(format!(
                    "No {} found; used defaults (TypeScript, {}). Run 'multi-ui setup' to configure.",
                    crate::config::CONFIG_FILE_NAME,
                    DEFAULT_COMPONENT_PATH
                ))?;
            }
            cliclack::outro(format!("{component} is ready to import"))?;
            Ok(())
        }
        Err(e) => {
            spinner.stop(format!("Failed to add {component}"));
            Err(e)
        }
    }
}
