//! Read-only message commands.

use console::style;

use ga_core::config::ConfigHandle;
use ga_core::error::GaResult;
use crate::OutputFormat;

/// Resolve the partition argument against the configured default.
async fn resolve_partition(config: &ConfigHandle, partition: Option<String>) -> String {
    match partition {
        Some(p) => p,
        None => config.read().await.store.partition.clone(),
    }
}

fn print_missing(format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({"exists": false})),
        OutputFormat::Text => println!(
            "  {} No database found. Run with a persistent policy to keep one.",
            style("WARN").yellow().bold()
        ),
    }
}

pub async fn count(
    config: ConfigHandle,
    partition: Option<String>,
    format: OutputFormat,
) -> GaResult<()> {
    let partition = resolve_partition(&config, partition).await;
    let Some(query) = super::open_existing(&config).await? else {
        print_missing(format);
        return Ok(());
    };

    let count = query.count(&partition).await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"partition": partition, "count": count}));
        }
        OutputFormat::Text => println!("{count}"),
    }
    Ok(())
}

pub async fn list(
    config: ConfigHandle,
    partition: Option<String>,
    limit: Option<usize>,
    format: OutputFormat,
) -> GaResult<()> {
    let partition = resolve_partition(&config, partition).await;
    let Some(query) = super::open_existing(&config).await? else {
        print_missing(format);
        return Ok(());
    };

    let snapshot = query.snapshot(&partition).await?;
    let shown = match limit {
        Some(n) => &snapshot.messages[..n.min(snapshot.messages.len())],
        None => &snapshot.messages[..],
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "partition": partition,
                    "len": snapshot.len,
                    "messages": shown,
                }))?
            );
        }
        OutputFormat::Text => {
            if snapshot.is_empty() {
                println!("No messages in '{partition}'.");
                return Ok(());
            }
            println!("{}", super::message_table(shown));
            println!(
                "Showing {} of {} message(s) in '{}'.",
                shown.len(),
                snapshot.len,
                partition
            );
        }
    }
    Ok(())
}

pub async fn get(
    config: ConfigHandle,
    key: i64,
    partition: Option<String>,
    format: OutputFormat,
) -> GaResult<()> {
    let partition = resolve_partition(&config, partition).await;
    let Some(query) = super::open_existing(&config).await? else {
        print_missing(format);
        return Ok(());
    };

    let record = query.get_one(&partition, key).await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Text => match record {
            Some(record) => {
                println!("{}", style(format!("Message {}", record.key)).bold().underlined());
                println!("  Partition: {partition}");
                println!("  Written:   {}", super::format_timestamp(&record));
                println!("  Content:   {}", record.content);
            }
            None => println!("No message at key {key} in '{partition}'."),
        },
    }
    Ok(())
}

pub async fn partitions(config: ConfigHandle, format: OutputFormat) -> GaResult<()> {
    let Some(query) = super::open_existing(&config).await? else {
        print_missing(format);
        return Ok(());
    };

    let names = query.partitions().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({"partitions": names})),
        OutputFormat::Text => {
            for name in &names {
                let count = query.count(name).await?;
                println!("  {name} ({count} message(s))");
            }
        }
    }
    Ok(())
}
