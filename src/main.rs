use crate::{
    dns::cloudflare::CloudflareProvider,
    public_ip::{PublicIpResolver, TRACE_URL},
    settings::Settings,
    updater::{Outcome, Updater},
};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

mod dns;
mod public_ip;
mod settings;
mod updater;

build_info::build_info!(fn build_info);

/// Points a Cloudflare A record at this host's public IPv4 address.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path; defaults to ./config.* then /config.*
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::new();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("unable to install logger: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(outcome) => {
            info!(?outcome, "success");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<Outcome, Box<dyn std::error::Error>> {
    info!(version = %build_info().crate_info.version, "starting Cloudflare DDNS client");

    // Nothing touches the network until the settings are complete.
    let cfg = Settings::load(args.config.as_deref())?;
    update(cfg).await
}

async fn update(cfg: Settings) -> Result<Outcome, Box<dyn std::error::Error>> {
    let record_name = cfg.record_name();

    let provider = CloudflareProvider::new(cfg.cloudflare_token)?;

    let public_ip = PublicIpResolver::new(TRACE_URL)?.public_ip().await?;
    info!(%public_ip, "public ip");

    let updater = Updater::new(provider);
    Ok(updater.reconcile(&cfg.zone, &record_name, &public_ip).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsError;
    use std::io::Write;

    #[tokio::test]
    async fn missing_zone_fails_before_any_network_call() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"cloudflare_token = \"secret\"\nsubdomain = \"home\"\n").unwrap();

        let args = Args {
            config: file.path().to_str().map(ToOwned::to_owned),
        };
        let err = run(args).await.unwrap_err();
        assert!(err.downcast_ref::<SettingsError>().is_some());
    }
}
