//! Command handlers
//!
//! Each handler receives the service container and returns a `CliResult`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::CategoryService;
use crate::application::ApplicationError;
use crate::cli::args::{CategoryCommands, Cli, Commands, ConfigCommands, SourceArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{expand_env_vars, Outcome};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Dispatch a parsed command line.
pub async fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Categories { command }) => cmd_categories(command, container).await,
        Some(Commands::Fetch { path, query, batch }) => {
            cmd_fetch(path, query, *batch, container).await
        }
        Some(Commands::Config { command }) => cmd_config(command, cli, container),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            Ok(())
        }
    }
}

// ============================================================
// Categories
// ============================================================

async fn cmd_categories(command: &CategoryCommands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        CategoryCommands::Tree { source } => {
            let service = load_categories(source, container).await?;
            if service.forest().is_empty() {
                output::warning("no categories");
                return Ok(());
            }
            for node in service.tree() {
                output::info(&output::category_tree(&node));
            }
            Ok(())
        }
        CategoryCommands::Show { id, source } => {
            let service = load_categories(source, container).await?;
            let category = service.category(*id)?;
            let path = service
                .breadcrumb(*id)?
                .iter()
                .map(|c| output::category_label(c))
                .join(" > ");

            output::header(&output::category_label(category));
            output::action("Path", &path);
            for (key, value) in &category.extra {
                output::detail(&format!("{key}: {value}"));
            }
            let children = service.subcategories(*id)?;
            if children.is_empty() {
                output::action("Subcategories", &"none");
            } else {
                output::action("Subcategories", &children.len());
                for child in children {
                    output::detail(&output::category_label(child));
                }
            }
            Ok(())
        }
        CategoryCommands::Find { name, source } => {
            let service = load_categories(source, container).await?;
            let category = service
                .find_by_name(name)
                .ok_or_else(|| CliError::NoMatch(name.clone()))?;
            output::info(&output::category_label(category));
            Ok(())
        }
        CategoryCommands::Json { pretty, source } => {
            let service = load_categories(source, container).await?;
            let tree = service.tree();
            let rendered = if *pretty {
                serde_json::to_string_pretty(&tree)
            } else {
                serde_json::to_string(&tree)
            }
            .map_err(|e| InfraError::json("encode category tree", e))?;
            output::info(&rendered);
            Ok(())
        }
    }
}

#[instrument(level = "debug", skip(container))]
async fn load_categories(
    source: &SourceArgs,
    container: &ServiceContainer,
) -> CliResult<CategoryService> {
    let file = source_file(source)?;
    let mut service = container.category_service(file.as_deref(), source.batch)?;
    service.refresh().await?;
    Ok(service)
}

/// Expanded `--file` path; a path that does not exist is a usage error.
fn source_file(source: &SourceArgs) -> CliResult<Option<PathBuf>> {
    let Some(raw) = source.file.as_deref() else {
        return Ok(None);
    };
    let path = PathBuf::from(expand_env_vars(raw));
    if !path.is_file() {
        return Err(CliError::InvalidArgs(format!(
            "category file not found: {}",
            path.display()
        )));
    }
    Ok(Some(path))
}

// ============================================================
// Fetch
// ============================================================

#[instrument(level = "debug", skip(container))]
async fn cmd_fetch(
    path: &str,
    query: &[(String, String)],
    batch: bool,
    container: &ServiceContainer,
) -> CliResult<()> {
    let executor = if batch {
        container.batch_executor()?
    } else {
        container.executor()?
    };

    let run = executor
        .run(|| {
            let api = Arc::clone(&container.api);
            async move { Outcome::from_envelope(api.get(path, query).await) }
        })
        .await;
    debug!(attempts = run.attempts, waited = ?run.waited, "fetch finished");

    match run.outcome {
        Outcome::Success(value) => {
            let rendered = serde_json::to_string_pretty(&value)
                .map_err(|e| InfraError::json("encode response", e))?;
            output::info(&rendered);
            Ok(())
        }
        Outcome::RateLimited(limit) => Err(ApplicationError::RateLimited {
            limit,
            attempts: run.attempts,
        }
        .into()),
        Outcome::OtherFailure(message) => Err(ApplicationError::Fetch {
            origin: path.to_string(),
            message,
        }
        .into()),
    }
}

// ============================================================
// Config
// ============================================================

fn cmd_config(command: &ConfigCommands, cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global", &path.display()),
                None => output::action("Global", &"<no home directory>"),
            }
            let local_dir = match &cli.config_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?,
            };
            output::action("Local", &local_config_path(&local_dir).display());
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_no_file_flag_when_resolving_source_then_uses_api() {
        assert_eq!(source_file(&SourceArgs::default()).unwrap(), None);
    }

    #[test]
    fn given_existing_file_when_resolving_source_then_returns_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("categories.json");
        std::fs::write(&path, "[]").unwrap();
        let source = SourceArgs {
            file: Some(path.display().to_string()),
            batch: false,
        };

        assert_eq!(source_file(&source).unwrap(), Some(path));
    }

    #[test]
    fn given_missing_file_when_resolving_source_then_invalid_args() {
        let temp = TempDir::new().unwrap();
        let source = SourceArgs {
            file: Some(temp.path().join("absent.json").display().to_string()),
            batch: false,
        };

        let err = source_file(&source).unwrap_err();

        assert!(matches!(err, CliError::InvalidArgs(ref m) if m.contains("absent.json")));
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }
}
