//! Command-line interface for session-gate.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Unset options leave lower-priority configuration sources in effect.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Hosted provider base URL.
    pub provider_url: Option<String>,
    /// Hosted provider anon key.
    pub anon_key: Option<String>,
    /// Bypass login (development builds).
    pub dev_skip_login: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('u') | Long("provider-url") => {
                result.provider_url = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("anon-key") => {
                result.anon_key = Some(parser.value()?.parse()?);
            }
            Long("dev-skip-login") => {
                result.dev_skip_login = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-gate {version}
Session-gated navigation service backed by a hosted auth provider

USAGE:
    session-gate [OPTIONS]

OPTIONS:
    -H, --host <ADDR>          Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>          Port to listen on [default: 3000]
    -c, --config <FILE>        Path to configuration file (JSON)
    -u, --provider-url <URL>   Hosted provider project URL
    -k, --anon-key <KEY>       Hosted provider anon key
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
        --dev-skip-login       Bypass login and always show the main subtree
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    SESSION_GATE_PROVIDER_URL    Provider URL (overrides config)
    SESSION_GATE_ANON_KEY        Anon key (overrides config)
    SESSION_GATE_DEV_SKIP_LOGIN  "true" bypasses login
    SESSION_GATE_HOST            Host address (overrides config)
    SESSION_GATE_PORT            Port number (overrides config)
    SESSION_GATE_LOG_LEVEL       Log level (overrides config)
    RUST_LOG                     Alternative log level setting

EXAMPLES:
    # Gate against a hosted project
    session-gate -u https://abc.supabase.co -k <anon-key>

    # Start with config file
    session-gate -c /etc/session-gate/config.json

    # Development mode (no provider needed)
    session-gate --dev-skip-login
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-gate {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("session-gate")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.host.is_none());
        assert!(result.port.is_none());
        assert!(!result.dev_skip_login);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_provider_options() {
        let result = parse_args_from(args(&[
            "--provider-url",
            "https://abc.supabase.co",
            "-k",
            "anon",
        ]))
        .unwrap();
        assert_eq!(result.provider_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(result.anon_key.as_deref(), Some("anon"));
    }

    #[test]
    fn test_dev_skip_login() {
        let result = parse_args_from(args(&["--dev-skip-login"])).unwrap();
        assert!(result.dev_skip_login);
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_help_and_version() {
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_args_from(args(&["-p", "invalid"])).is_err());
        assert!(parse_args_from(args(&["-H", "not-an-ip"])).is_err());
        assert!(matches!(
            parse_args_from(args(&["stray"])),
            Err(ArgsError::UnexpectedArgument(_))
        ));
    }
}
