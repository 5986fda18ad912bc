//! Database management commands.

use console::style;
use dialoguer::Confirm;

use ga_core::config::ConfigHandle;
use ga_core::error::GaResult;
use ga_store::DeleteOutcome;
use crate::OutputFormat;

pub async fn delete(config: ConfigHandle, yes: bool, format: OutputFormat) -> GaResult<()> {
    let (store, app_config) = super::open_store(&config).await?;
    let name = &app_config.store.database_name;

    if !yes {
        println!(
            "  {} This will delete ALL locally stored messages.",
            style("WARNING").red().bold()
        );
        println!("  Database: {}", store.database_path(name).display());

        let confirmed = Confirm::new()
            .with_prompt("  Are you sure you want to delete the database?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmed {
            println!("  Delete cancelled.");
            return Ok(());
        }
    }

    let outcome = store.delete_database(name).await;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": name,
                    "outcome": outcome.to_string(),
                    "gone": outcome.is_gone(),
                })
            );
        }
        OutputFormat::Text => match &outcome {
            DeleteOutcome::Deleted => {
                println!("  {} Database '{}' deleted.", style("OK").green().bold(), name)
            }
            DeleteOutcome::Absent => println!("  Nothing to delete."),
            DeleteOutcome::Failed(reason) => println!(
                "  {} Could not delete '{}': {}",
                style("FAIL").red().bold(),
                name,
                reason
            ),
        },
    }
    Ok(())
}

pub async fn path(config: ConfigHandle, format: OutputFormat) -> GaResult<()> {
    let (store, app_config) = super::open_store(&config).await?;
    let db_path = store.database_path(&app_config.store.database_name);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "path": db_path.display().to_string(),
                    "exists": db_path.exists(),
                })
            );
        }
        OutputFormat::Text => {
            println!("{}", db_path.display());
        }
    }
    Ok(())
}
