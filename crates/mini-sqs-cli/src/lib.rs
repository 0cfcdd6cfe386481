//! # Mini SQS CLI
//!
//! Command-line interface over the mini-sqs client.
//!
//! This module provides CLI commands for:
//! - Sending single messages and batches
//! - Long-poll receiving
//! - Deleting messages and changing their visibility, singly or in batches
//!
//! Batch commands read a JSON array of entries from `--file`. Results are
//! written to stdout as pretty-printed JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use mini_sqs::batch::entries_from_json;
use mini_sqs::{
    ChangeMessageVisibilityBatchEntry, ClientConfig, DeleteMessageBatchEntry, MiniSqsClient,
    ReceiveMessage, SendMessage, SendMessageBatchItem, SqsError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Mini SQS CLI - send, receive and manage messages on SQS queues
#[derive(Parser)]
#[command(name = "mini-sqs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lightweight command-line client for Amazon SQS")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MINI_SQS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Region the client is bound to; overrides the configuration file
    #[arg(short, long)]
    pub region: Option<String>,

    /// Endpoint URL; overrides the configuration file
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Logging level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Send a single message
    Send {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// Message body
        #[arg(short, long)]
        body: String,

        /// Delivery delay in seconds
        #[arg(long)]
        delay_seconds: Option<u32>,

        /// FIFO message group
        #[arg(long)]
        group_id: Option<String>,

        /// FIFO deduplication identifier
        #[arg(long, requires = "group_id")]
        deduplication_id: Option<String>,
    },

    /// Send messages from a JSON array file
    SendBatch {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// File holding a JSON array of messages
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Long-poll for messages
    Receive {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// Maximum number of messages to return (1-10)
        #[arg(short, long)]
        max_messages: Option<u32>,

        /// Long-poll wait in seconds; at most 20
        #[arg(short, long)]
        wait_time_seconds: Option<u32>,

        /// Visibility timeout for received messages
        #[arg(long)]
        visibility_timeout: Option<u32>,

        /// System attributes to return, e.g. All or ApproximateReceiveCount
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },

    /// Delete a message
    Delete {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// Receipt handle from a previous receive
        #[arg(short, long)]
        receipt_handle: String,
    },

    /// Delete messages from a JSON array file
    DeleteBatch {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// File holding a JSON array of delete entries
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Change the visibility timeout of a message
    ChangeVisibility {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// Receipt handle from a previous receive
        #[arg(short, long)]
        receipt_handle: String,

        /// New visibility timeout in seconds
        #[arg(short, long)]
        visibility_timeout: u32,
    },

    /// Change visibility timeouts from a JSON array file
    ChangeVisibilityBatch {
        /// Queue ARN
        #[arg(short, long)]
        queue: String,

        /// File holding a JSON array of change-visibility entries
        #[arg(short, long)]
        file: PathBuf,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Sqs(#[from] SqsError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = load_configuration(&cli)?;
    let client = MiniSqsClient::new(config)?;

    let outcome = execute_command(&client, cli.command).await;

    // Tear down before reporting so the pool is closed on every path.
    let teardown = client.destroy(None).await;

    let output = outcome?;
    teardown?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Initialize logging based on CLI arguments.
///
/// `RUST_LOG` wins over `--log-level` when set.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(&cli.log_level)).map_err(|e| {
            CliError::InvalidArgument {
                arg: "--log-level".to_string(),
                message: e.to_string(),
            }
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::Configuration {
        message: format!("Failed to initialize logging: {}", e),
    })
}

/// Filter directive applying `level` to this binary and the client library
pub fn default_filter(level: &str) -> String {
    format!("mini_sqs={},mini_sqs_cli={}", level, level)
}

/// Build the client configuration from the file, environment and flags.
///
/// Without a configuration file, `--region` alone is enough.
pub fn load_configuration(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = match (&cli.config, &cli.region) {
        (None, Some(region)) => ClientConfig::new(region.clone()),
        (path, _) => ClientConfig::load(path.as_deref()).map_err(|e| CliError::Configuration {
            message: e.to_string(),
        })?,
    };

    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }

    config.validate().map_err(|e| CliError::Configuration {
        message: e.to_string(),
    })?;

    debug!(
        region = %config.region,
        endpoint = %config.resolved_endpoint(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Read batch entries from a JSON array file.
///
/// # Errors
///
/// - `Io` if the file cannot be read
/// - `InvalidArgument` if the file is not JSON
/// - `Sqs(InvalidArgument)` if the JSON is not an array
pub fn read_batch_file<T>(path: &Path, what: &str) -> Result<Vec<T>, CliError>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|e| CliError::InvalidArgument {
            arg: path.display().to_string(),
            message: format!("not valid JSON: {}", e),
        })?;

    Ok(entries_from_json(value, what)?)
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute a command and return its result as JSON
pub async fn execute_command(client: &MiniSqsClient, command: Commands) -> Result<Value, CliError> {
    match command {
        Commands::Send {
            queue,
            body,
            delay_seconds,
            group_id,
            deduplication_id,
        } => {
            let mut message = SendMessage::new(body);
            if let Some(delay) = delay_seconds {
                message = message.with_delay_seconds(delay);
            }
            if let Some(group_id) = group_id {
                message = message.with_fifo(group_id, deduplication_id);
            }

            let result = client.send_message(&queue, message).await?;
            info!(queue = %queue, "Message sent");
            Ok(serde_json::to_value(result)?)
        }

        Commands::SendBatch { queue, file } => {
            let messages: Vec<SendMessageBatchItem> = read_batch_file(&file, "messages")?;
            let count = messages.len();

            let result = client.send_message_batch(&queue, messages).await?;
            info!(
                queue = %queue,
                count,
                failed = result.failed.len(),
                "Message batch sent"
            );
            Ok(serde_json::to_value(result)?)
        }

        Commands::Receive {
            queue,
            max_messages,
            wait_time_seconds,
            visibility_timeout,
            attributes,
        } => {
            let mut request = ReceiveMessage::new();
            request.max_number_of_messages = max_messages;
            request.wait_time_seconds = wait_time_seconds;
            request.visibility_timeout = visibility_timeout;
            if !attributes.is_empty() {
                request = request.with_attribute_names(attributes);
            }

            let result = client.receive_message(&queue, request).await?;
            info!(queue = %queue, count = result.messages.len(), "Messages received");
            Ok(serde_json::to_value(result)?)
        }

        Commands::Delete {
            queue,
            receipt_handle,
        } => {
            let deleted = client.delete_message(&queue, &receipt_handle).await?;
            Ok(Value::Bool(deleted))
        }

        Commands::DeleteBatch { queue, file } => {
            let entries: Vec<DeleteMessageBatchEntry> = read_batch_file(&file, "receiptHandles")?;

            let result = client.delete_message_batch(&queue, entries).await?;
            Ok(serde_json::to_value(result)?)
        }

        Commands::ChangeVisibility {
            queue,
            receipt_handle,
            visibility_timeout,
        } => {
            let changed = client
                .change_message_visibility(&queue, &receipt_handle, visibility_timeout)
                .await?;
            Ok(Value::Bool(changed))
        }

        Commands::ChangeVisibilityBatch { queue, file } => {
            let entries: Vec<ChangeMessageVisibilityBatchEntry> =
                read_batch_file(&file, "receiptHandles")?;

            let result = client
                .change_message_visibility_batch(&queue, entries)
                .await?;
            Ok(serde_json::to_value(result)?)
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
