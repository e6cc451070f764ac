//! Command-line interface definition.

use clap::{Parser, Subcommand};

/// Log ingestion and query service
#[derive(Parser, Debug)]
#[command(name = "log-ingestor", version)]
#[command(about = "Ingest structured log records and query them over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create a user that can log in and obtain a token
    CreateUser {
        #[arg(long)]
        username: String,

        /// Password (can also be set via CREATE_USER_PASSWORD env var)
        #[arg(long, env = "CREATE_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

impl Cli {
    /// The selected command, defaulting to `serve`.
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["log-ingestor"]);
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn test_create_user_args() {
        let cli = Cli::parse_from([
            "log-ingestor",
            "create-user",
            "--username",
            "ingest-bot",
            "--password",
            "s3cret",
            "--admin",
        ]);
        assert_eq!(
            cli.command(),
            &Command::CreateUser {
                username: "ingest-bot".to_string(),
                password: "s3cret".to_string(),
                admin: true,
            }
        );
    }

    #[test]
    fn test_create_user_requires_username() {
        let result = Cli::try_parse_from(["log-ingestor", "create-user", "--password", "x"]);
        assert!(result.is_err());
    }
}
