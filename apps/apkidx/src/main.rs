//! apkidx - fetch the freshest signed APKINDEX from a list of mirrors
//!
//! Races every configured mirror, keeps the index whose signature verifies
//! against a trusted key and carries the newest signing time, and writes it
//! to the output directory.

mod cli;
mod error;

use crate::cli::Cli;
use crate::error::CliError;
use apkidx_config::{load_mirrors, Config};
use apkidx_net::{fetch_missing_keys, IndexRequest, NetClient, NetConfig};
use apkidx_select::{select_freshest, write_selection};
use apkidx_signing::SignatureVerifier;
use apkidx_types::{IndexFormat, Selection};
use clap::Parser;
use std::process;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting apkidx v{}", env!("CARGO_PKG_VERSION"));

    // defaults < file < environment < flags
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli);
    config.validate()?;

    let client = NetClient::new(NetConfig::from(&config.network))?;

    if config.repository.fetch_keys {
        let added = fetch_missing_keys(
            &client,
            &config.repository.keys_url,
            &config.paths.keys_dir,
        )
        .await?;
        info!(count = added.len(), "key bootstrap finished");
    }

    let credentials = config.network.credentials();
    let mirrors = load_mirrors(&config.paths.mirror_list, credentials.as_ref()).await?;
    if mirrors.is_empty() {
        warn!(
            list = %config.paths.mirror_list.display(),
            "mirror list has no usable entries"
        );
    }

    let request = IndexRequest {
        repo_path: config.repository.repo_path().to_string(),
        file_name: config.repository.index_file_name.clone(),
        stagger: config.network.stagger(),
    };

    let formats: &[IndexFormat] = if config.repository.allow_legacy {
        &IndexFormat::ALL
    } else {
        &[IndexFormat::Current]
    };
    let verifier = SignatureVerifier::new(config.paths.keys_dir.clone()).with_formats(formats);

    let selection = select_freshest(&client, &mirrors, &request, verifier).await?;

    let written = write_selection(
        &config.paths.output_dir,
        &config.repository.index_file_name,
        &selection,
    )
    .await?;

    report(&cli, &selection)?;

    match (written, &selection) {
        (Some(path), Selection::Best(best)) => {
            info!(
                path = %path.display(),
                mirror = %best.mirror(),
                timestamp = %best.timestamp(),
                "index written"
            );
            Ok(())
        }
        _ if config.general.require_verified => {
            Err(apkidx_errors::Error::NoVerifiedMirror.into())
        }
        _ => {
            warn!(mirrors = mirrors.len(), "no mirror served a verifiable index");
            Ok(())
        }
    }
}

/// Print the results requested on the command line to stdout
fn report(cli: &Cli, selection: &Selection) -> Result<(), CliError> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&selection.summary())?);
    } else if cli.print_mirrors {
        print!("{}", selection.mirror_report());
    }
    Ok(())
}

/// Apply CLI flags on top of file and environment configuration
fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(repo) = &cli.repo {
        config.repository.repo_path.clone_from(repo);
    }
    if let Some(mirrors) = &cli.mirrors {
        config.paths.mirror_list.clone_from(mirrors);
    }
    if let Some(output) = &cli.output {
        config.paths.output_dir.clone_from(output);
    }
    if let Some(keys_url) = &cli.keys_url {
        config.repository.keys_url.clone_from(keys_url);
    }
    if let Some(keys_dir) = &cli.keys_dir {
        config.paths.keys_dir.clone_from(keys_dir);
    }
    if let Some(timeout) = cli.timeout {
        config.network.timeout = timeout;
        config.network.connect_timeout = timeout;
    }
    if cli.client_cert.is_some() {
        config.network.client_cert.clone_from(&cli.client_cert);
        config.network.client_key.clone_from(&cli.client_key);
    }
    if cli.client_user.is_some() {
        config.network.username.clone_from(&cli.client_user);
        config.network.password.clone_from(&cli.client_pass);
    }

    config.repository.fetch_keys |= cli.fetch_keys;
    config.general.debug |= cli.debug;
    config.general.require_verified |= cli.require_verified;
    if cli.no_legacy {
        config.repository.allow_legacy = false;
    }
}

fn init_tracing(debug_enabled: bool) {
    // RUST_LOG always wins over --debug
    let default_filter = if debug_enabled {
        "warn,apkidx=debug,apkidx_net=debug,apkidx_select=debug,apkidx_signing=debug,apkidx_config=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}
