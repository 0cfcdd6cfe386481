use mini_sqs_cli::{run_cli, CliError};
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("CLI error: {}", e);
        eprintln!("{}", e);

        // Exit with appropriate code based on error type
        let exit_code = match e {
            CliError::Configuration { .. } => 1,
            CliError::Sqs(_) => 2,
            CliError::InvalidArgument { .. } => 4,
            CliError::Io(_) => 5,
            CliError::Output(_) => 6,
        };

        std::process::exit(exit_code);
    }
}
