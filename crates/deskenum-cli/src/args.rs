//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use deskenum_core::{AppConfig, SessionCookie};
use std::path::PathBuf;

/// Command-line arguments accepted by the `deskenum` binary.
#[derive(Parser, Debug)]
#[command(
    name = "deskenum",
    version,
    about = "Enumerate service desk portal users and help center documents"
)]
pub(crate) struct CliArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub(crate) struct CommonArgs {
    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Target base URL (e.g. https://example.atlassian.net)"
    )]
    pub(crate) url: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env = "DESKENUM_COOKIE",
        hide_env_values = true,
        help = "Session cookie value"
    )]
    pub(crate) cookie: Option<String>,
    #[arg(
        long = "tenant-session",
        global = true,
        help = "Send the cookie as tenant.session.token"
    )]
    pub(crate) tenant_session: bool,
    #[arg(long, global = true, value_name = "N", help = "Concurrent search workers")]
    pub(crate) workers: Option<usize>,
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        help = "Per-request timeout in seconds"
    )]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        value_name = "CHARS",
        help = "Alphabet for the first expansion layer"
    )]
    pub(crate) alphabet: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "CHARS",
        help = "Alphabet for deeper expansion layers"
    )]
    pub(crate) alphabet2: Option<String>,
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Write results to a CSV file instead of stdout"
    )]
    pub(crate) output: Option<PathBuf>,
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "DESKENUM_CONFIG",
        help = "Configuration file to load"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub(crate) verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Enumerate users across service desks
    Users(UsersArgs),
    /// Enumerate help center documents
    Docs(DocsArgs),
}

#[derive(Args, Debug)]
pub(crate) struct UsersArgs {
    #[arg(
        long,
        value_name = "N",
        help = "Maximum users per service desk (0 = unlimited)"
    )]
    pub(crate) max: Option<usize>,
    #[arg(long, value_name = "ID", help = "Only enumerate this service desk")]
    pub(crate) desk: Option<String>,
    #[arg(
        short,
        long,
        value_name = "QUERY",
        help = "Run a single search instead of expanding"
    )]
    pub(crate) query: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DocsArgs {
    #[arg(
        short,
        long,
        value_name = "QUERY",
        help = "Run a single search instead of expanding"
    )]
    pub(crate) query: Option<String>,
    #[arg(long, value_name = "N", help = "Results requested per search")]
    pub(crate) limit: Option<usize>,
}

impl CliArgs {
    /// Layer command-line flags over the loaded configuration.
    pub(crate) fn apply_to(&self, config: &mut AppConfig) {
        let common = &self.common;

        if let Some(url) = &common.url {
            config.target.base_url = Some(url.clone());
        }
        if let Some(cookie) = &common.cookie {
            config.target.cookie = Some(cookie.clone());
        }
        if common.tenant_session {
            config.target.session_cookie = SessionCookie::Tenant;
        }
        if let Some(workers) = common.workers {
            config.enumeration.workers = workers;
        }
        if let Some(timeout) = common.timeout {
            config.client.timeout_secs = timeout;
        }
        if let Some(alphabet) = &common.alphabet {
            config.enumeration.alphabet.clone_from(alphabet);
        }
        if let Some(alphabet2) = &common.alphabet2 {
            config.enumeration.alphabet2.clone_from(alphabet2);
        }

        match &self.command {
            Command::Users(users) => {
                if let Some(max) = users.max {
                    config.enumeration.max_users = max;
                }
            }
            Command::Docs(docs) => {
                if let Some(limit) = docs.limit {
                    config.enumeration.docs_page_size = limit;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_users_flags() {
        let args = CliArgs::try_parse_from([
            "deskenum",
            "users",
            "--url",
            "https://acme.atlassian.net",
            "--cookie",
            "token",
            "--max",
            "0",
            "--desk",
            "4",
            "--workers",
            "20",
        ])
        .expect("parse users args");

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(
            config.target.base_url.as_deref(),
            Some("https://acme.atlassian.net")
        );
        assert_eq!(config.target.cookie.as_deref(), Some("token"));
        assert_eq!(config.enumeration.max_users, 0);
        assert_eq!(config.enumeration.workers, 20);
        match args.command {
            Command::Users(users) => assert_eq!(users.desk.as_deref(), Some("4")),
            Command::Docs(_) => panic!("expected users command"),
        }
    }

    #[test]
    fn test_docs_flags() {
        let args = CliArgs::try_parse_from([
            "deskenum",
            "docs",
            "--tenant-session",
            "--limit",
            "25",
            "--alphabet",
            "abc",
            "--query",
            "vpn",
        ])
        .expect("parse docs args");

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.target.session_cookie, SessionCookie::Tenant);
        assert_eq!(config.enumeration.docs_page_size, 25);
        assert_eq!(config.enumeration.alphabet, "abc");
        match args.command {
            Command::Docs(docs) => assert_eq!(docs.query.as_deref(), Some("vpn")),
            Command::Users(_) => panic!("expected docs command"),
        }
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = CliArgs::try_parse_from(["deskenum", "users"]).expect("parse bare args");
        let mut config = AppConfig::default();
        config.enumeration.max_users = 7;
        args.apply_to(&mut config);
        assert_eq!(config.enumeration.max_users, 7);
        assert_eq!(config.target.session_cookie, SessionCookie::Customer);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["deskenum"]).is_err());
    }
}
