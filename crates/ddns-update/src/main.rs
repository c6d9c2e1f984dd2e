// # ddns-update
//
// Updates Cloudflare A and/or AAAA records to the current public IP
// address(es) of the machine, then exits. Meant to be run from cron or a
// systemd timer.
//
// This binary is a thin integration layer: it parses flags and environment
// variables, wires the HTTP IP source, the Cloudflare provider and the file
// cache store into `DdnsEngine`, and maps the result to an exit code. All
// reconciliation logic lives in ddns-core.
//
// ## Environment
//
// - `CLOUDFLARE_API_TOKEN`: API token (same as `--api-token`)
// - `CLOUDFLARE_API_TOKEN_FILE`: file holding the token (same as `--api-token-file`)
// - `CLOUDFLARE_DOMAINS`: whitespace-separated domains, instead of arguments
// - `XDG_CACHE_HOME`: base directory of the default cache file
// - `RUST_LOG`: overrides the log filter
//
// ## Exit codes
//
// - 0: every family reconciled
// - 1: bad flags, configuration or cache file error
// - 2: no address found for a requested family
// - 3: provider error (invalid token, API error, failed domain)
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// ddns-update -6 example.com '*.example.com'
// ```

mod console;

use clap::Parser;
use clap::error::ErrorKind;
use ddns_core::config::{parse_domains, resolve_api_token};
use ddns_core::{DdnsConfig, DdnsEngine, ExitStatus, FileCacheStore, verify_token};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

/// Update Cloudflare DNS A and/or AAAA records to the current IP address(es)
/// of this machine.
///
/// For the apex record, simply put "example.com". Subdomains can also be
/// given, e.g. "*.example.com" or "sub.example.com".
///
/// The domain list can come from the CLOUDFLARE_DOMAINS environment
/// variable instead, separated by whitespace.
#[derive(Parser, Debug)]
#[command(name = "ddns-update", version, about, long_about)]
struct Cli {
    /// Domains to update
    #[arg(value_name = "DOMAINS")]
    domains: Vec<String>,

    /// Cloudflare API token (create one at My Profile / API Tokens)
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// File containing the Cloudflare API token
    #[arg(long, env = "CLOUDFLARE_API_TOKEN_FILE", value_name = "PATH")]
    api_token_file: Option<PathBuf>,

    /// Check the API token, list the zones it can manage and exit
    #[arg(long)]
    verify_token: bool,

    /// Route traffic through Cloudflare's proxy for the updated records
    #[arg(long)]
    proxied: bool,

    /// Turn on IPv4 detection and set A records [default: on]
    #[arg(short = '4', long = "ipv4", overrides_with = "no_ipv4")]
    ipv4: bool,

    /// Turn off IPv4 detection
    #[arg(long = "no-4", overrides_with = "ipv4")]
    no_ipv4: bool,

    /// Turn on IPv6 detection and set AAAA records [default: off]
    #[arg(short = '6', long = "ipv6", overrides_with = "no_ipv6")]
    ipv6: bool,

    /// Turn off IPv6 detection
    #[arg(long = "no-6", overrides_with = "ipv6")]
    no_ipv6: bool,

    /// Delete the A record when no IPv4 address is found, the AAAA record
    /// when no IPv6 address is found
    #[arg(long)]
    delete_missing: bool,

    /// Cache file [default: $XDG_CACHE_HOME/cloudflare-dyndns/ip.cache]
    #[arg(long, value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Ignore the cache and update every domain
    #[arg(long)]
    force: bool,

    /// More verbose messages, including cache contents
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// Build the pass configuration; `domains_env` is `CLOUDFLARE_DOMAINS`
    fn into_config(self, domains_env: Option<&str>) -> ddns_core::Result<DdnsConfig> {
        let domains = parse_domains(self.domains, domains_env)?;
        info!("Domains to update: {}", domains.join(", "));

        let mut config = DdnsConfig::new(domains);
        config.proxied = self.proxied;
        // each switch clears its opposite, so at most one side is set
        config.ipv4 = self.ipv4 || !self.no_ipv4;
        config.ipv6 = self.ipv6 && !self.no_ipv6;
        config.delete_missing = self.delete_missing;
        config.force = self.force;
        config.debug = self.debug;
        if let Some(cache_file) = self.cache_file {
            config.cache_path = cache_file;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Exit status for a rejected command line
///
/// Help and version output are successful exits; every other parse failure
/// is a usage error.
fn parse_error_status(err: &clap::Error) -> ExitStatus {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        | ErrorKind::DisplayVersion => ExitStatus::Ok,
        _ => ExitStatus::UnknownError,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap renders help and usage errors itself
            let _ = e.print();
            return parse_error_status(&e).into();
        }
    };

    if let Err(e) = console::init(cli.debug) {
        eprintln!("{}", e);
        return ExitStatus::UnknownError.into();
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitStatus::UnknownError.into();
        }
    };

    let status = runtime.block_on(async {
        match run(cli).await {
            Ok(status) => status,
            Err(e) => {
                error!("{}", e);
                ExitStatus::UnknownError
            }
        }
    });

    debug!("Exiting with status {:?}", status);
    status.into()
}

/// Run one pass, or token verification; `Err` means nothing was attempted
async fn run(cli: Cli) -> anyhow::Result<ExitStatus> {
    let api_token = resolve_api_token(cli.api_token.clone(), cli.api_token_file.as_deref())?;
    let provider = CloudflareProvider::new(api_token)?;

    if cli.verify_token {
        return Ok(verify_token(&provider).await);
    }

    let domains_env = std::env::var("CLOUDFLARE_DOMAINS").ok();
    let config = cli.into_config(domains_env.as_deref())?;

    let cache_store = FileCacheStore::new(&config.cache_path);
    let ip_source = HttpIpSource::new()?;
    let engine = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(cache_store),
        config,
    )?;

    Ok(engine.run().await.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ddns-update"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bad_flags_exit_with_usage_error() {
        let err = Cli::try_parse_from(["ddns-update", "--bogus-flag", "example.com"]).unwrap_err();
        assert_eq!(parse_error_status(&err), ExitStatus::UnknownError);
        assert_eq!(ExitStatus::UnknownError.code(), 1);

        let err = Cli::try_parse_from(["ddns-update", "--cache-file"]).unwrap_err();
        assert_eq!(parse_error_status(&err), ExitStatus::UnknownError);
    }

    #[test]
    fn test_help_and_version_exit_cleanly() {
        for flag in ["--help", "--version"] {
            let err = Cli::try_parse_from(["ddns-update", flag]).unwrap_err();
            assert_eq!(parse_error_status(&err), ExitStatus::Ok, "{}", flag);
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["example.com"]).into_config(None).unwrap();

        assert_eq!(config.domains, vec!["example.com".to_string()]);
        assert!(config.ipv4);
        assert!(!config.ipv6);
        assert!(!config.proxied);
        assert!(!config.delete_missing);
        assert!(!config.force);
    }

    #[test]
    fn test_family_switches() {
        let config = parse(&["-6", "--no-4", "example.com"]).into_config(None).unwrap();
        assert!(!config.ipv4);
        assert!(config.ipv6);

        // the last switch wins
        let config = parse(&["--no-4", "-4", "-6", "--no-6", "example.com"])
            .into_config(None)
            .unwrap();
        assert!(config.ipv4);
        assert!(!config.ipv6);
    }

    #[test]
    fn test_no_family_is_config_error() {
        let err = parse(&["--no-4", "example.com"]).into_config(None).unwrap_err();
        assert!(matches!(err, ddns_core::Error::Config(_)));
    }

    #[test]
    fn test_domains_from_env() {
        let config = parse(&["--proxied", "--cache-file", "/tmp/ddns/ip.cache"])
            .into_config(Some("a.example.com  b.example.com"))
            .unwrap();

        assert_eq!(config.domains, vec!["a.example.com", "b.example.com"]);
        assert!(config.proxied);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/ddns/ip.cache"));
    }

    #[test]
    fn test_domains_from_both_sources_rejected() {
        let err = parse(&["example.com"])
            .into_config(Some("other.example.com"))
            .unwrap_err();
        assert!(matches!(err, ddns_core::Error::Config(_)));
    }
}
