//!
//! certportal server binary
//! ------------------------
//! Starts the certificate portal HTTP server. Configuration comes from the
//! environment (see `config`); a few CLI flags override it.

use std::env;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use certportal::config::Config;

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn print_usage() {
    println!(
        "certportal\n\nUSAGE:\n  certportal [--http-port N] [--db-path PATH] [--seed-demo]\n\nOPTIONS:\n  --http-port N     HTTP port (env: PORTAL_HTTP_PORT, default 5000)\n  --db-path PATH    SQLite database file (env: PORTAL_DB_PATH, default auth.db)\n  --seed-demo       Seed the demo mentor account into an empty staff table (env: PORTAL_SEED_DEMO_STAFF)\n  -h, --help        Show this help\n\nBlob storage: AZURE_STORAGE_ACCOUNT, AZURE_STORAGE_KEY, AZURE_CONTAINER\n"
    );
}

fn apply_args(config: &mut Config, args: &[String]) -> Result<()> {
    if let Some(v) = flag_value(args, "--http-port") {
        config.http_port = v.parse::<u16>().with_context(|| format!("invalid --http-port '{}'", v))?;
    } else if has_flag(args, "--http-port") {
        bail!("--http-port needs a value");
    }
    if let Some(v) = flag_value(args, "--db-path") {
        config.db_path = v.to_string();
    } else if has_flag(args, "--db-path") {
        bail!("--db-path needs a value");
    }
    if has_flag(args, "--seed-demo") {
        config.seed_demo_staff = true;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = Config::from_env();
    apply_args(&mut config, &args)?;

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "certportal",
        "certportal {} starting: RUST_LOG='{}', http_port={}, db_path='{}'",
        env!("CARGO_PKG_VERSION"), rust_log, config.http_port, config.db_path
    );

    certportal::server::run_with_config(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cli_overrides_env_config() {
        let mut cfg = Config::default();
        apply_args(&mut cfg, &args(&["certportal", "--http-port", "8080", "--db-path", "/tmp/p.db", "--seed-demo"])).unwrap();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.db_path, "/tmp/p.db");
        assert!(cfg.seed_demo_staff);
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut cfg = Config::default();
        assert!(apply_args(&mut cfg, &args(&["certportal", "--http-port", "nope"])).is_err());
        assert!(apply_args(&mut cfg, &args(&["certportal", "--http-port"])).is_err());
    }
}
