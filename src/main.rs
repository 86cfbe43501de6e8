//! Bullpen - a multi-tenant control plane for infrastructure workflows.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bullpen::cli::output;
use bullpen::cli::{execute, Cli};
use bullpen::error::{ConfigError, Error, FetchError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("BULLPEN_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("bullpen=debug")
        } else {
            EnvFilter::new("bullpen=warn")
        }
    });

    let json = std::env::var("BULLPEN_LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).without_time())
            .init();
    }

    if let Err(e) = execute(cli) {
        debug!(kind = e.kind(), error = ?e, "command failed");

        let suggestion = match &e {
            Error::Config(ConfigError::NotFound(_)) => {
                Some("create bullpen.toml or pass --config <path>")
            }
            Error::AuthorizationMalformed(_) => {
                Some("set --auth or BULLPEN_AUTH to <provider>:<key>:<secret>")
            }
            Error::NotAuthorizedAdmin => Some("use vault:admin:<admin secret>"),
            Error::Fetch(FetchError::GitUnavailable) => Some("install git and put it on PATH"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(e.exit_code());
    }
}
