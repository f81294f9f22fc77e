//! Environment file commands.

use super::args::EnvSetConfig;
use crate::envinfo::{EnvSpecificInfo, KNOWN_PARAMETERS, SetOutcome};
use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;

/// Create the environment file for `name` in `context`.
pub fn init(context: &Path, name: &str) -> Result<()> {
    let existing = EnvSpecificInfo::load(context).context("failed to load environment file")?;
    if existing.exists() {
        bail!(
            "the context directory already contains a component ({:?})",
            existing.path()
        );
    }

    EnvSpecificInfo::init(context, name).context("failed to create environment file")?;
    info!("Environment was successfully created");
    Ok(())
}

/// Set one value, asking `confirm` before overriding an existing one.
///
/// Returns whether the file was updated.
pub fn set<F>(config: &EnvSetConfig, confirm: F) -> Result<bool>
where
    F: FnOnce(&str) -> bool,
{
    let mut env_info =
        EnvSpecificInfo::load(&config.context).context("failed to load environment file")?;

    if !env_info.exists() {
        bail!(
            "the context directory doesn't contain a component, please run `devsync env init <name>` first"
        );
    }

    let mut force = config.force;
    if !force && env_info.is_set(&config.name) {
        let prompt = format!(
            "{} is already set. Do you want to override it in the environment",
            config.name
        );
        if !confirm(&prompt) {
            info!("Aborted by the user");
            return Ok(false);
        }
        force = true;
    }

    let outcome = env_info
        .set(&config.name, &config.value, force)
        .with_context(|| {
            format!(
                "failed to set {} (known parameters: {})",
                config.name,
                KNOWN_PARAMETERS.join(", ")
            )
        })?;

    if outcome == SetOutcome::Updated {
        info!("Environment was successfully updated");
    }
    Ok(outcome == SetOutcome::Updated)
}

/// Render the environment file as `key: value` lines.
pub fn view(context: &Path) -> Result<String> {
    let env_info = EnvSpecificInfo::load(context).context("failed to load environment file")?;
    if !env_info.exists() {
        bail!("the context directory doesn't contain a component");
    }

    Ok(env_info
        .settings()
        .iter()
        .map(|(k, v)| format!("{}: {}\n", k, v))
        .collect())
}

/// Ask a yes/no question on stdin.
pub fn prompt_confirmation(question: &str) -> bool {
    print!("? {} (y/N) ", question);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
