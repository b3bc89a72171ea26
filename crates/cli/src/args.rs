//! Command-line surface.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use intel::{SampleHash, Sha1};
use ticloud::{Classification, Rha1Type};

#[derive(Debug, Parser)]
#[command(
    name = "ticloud-cookbook",
    version,
    about = "Query ReversingLabs TitaniumCloud and dump the JSON responses"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TitaniumCloud host (e.g. https://data.reversinglabs.com)
    #[arg(long = "url", global = true, env = "TICLOUD_URL")]
    pub host: Option<String>,

    /// TitaniumCloud account username
    #[arg(short, long, global = true, env = "TICLOUD_USERNAME")]
    pub username: Option<String>,

    /// TitaniumCloud account password
    #[arg(short, long, global = true, env = "TICLOUD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Alternate config file path (defaults to config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file with "username" and "password" keys
    #[arg(long, global = true, default_value = "ticloud_credentials.json")]
    pub credentials: PathBuf,

    /// User-Agent header sent with every request
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Query(QueryCommand),

    /// Collect samples of a threat family first seen in a date range,
    /// with their dynamic-analysis network activity and mutexes
    Hunt(HuntArgs),
}

/// Subcommands that send one request (or one short walk) and print the
/// response.
#[derive(Debug, Subcommand)]
pub enum QueryCommand {
    /// File reputation (malware presence)
    Reputation { hash: SampleHash },

    /// AV scanner results
    AvScanners { hash: SampleHash },

    /// File analysis results
    Analysis {
        #[arg(required = true)]
        hashes: Vec<SampleHash>,
    },

    /// RHA1 functionally similar samples
    Similar(SimilarArgs),

    /// Domain threat-intelligence report
    DomainReport { domain: String },

    /// Domain to IP resolutions
    DomainResolutions { domain: String },

    /// URLs observed on an IP address
    IpUrls { ip: IpAddr },

    /// URL threat-intelligence report
    UrlReport { url: String },

    /// Files downloaded from a URL
    UrlDownloadedFiles { url: String },

    /// Submit a URL for analysis
    AnalyzeUrl { url: String },

    /// Walk domain -> first resolved IP -> first URL -> URL report
    NetworkWalk { domain: String },

    /// Upload a sample
    Upload { path: PathBuf },

    /// Download a sample
    Download {
        hash: SampleHash,
        #[arg(short, long, default_value = "downloaded_file")]
        output: PathBuf,
    },

    /// Reanalyze samples
    Reanalyze {
        #[arg(required = true)]
        hashes: Vec<SampleHash>,
    },

    /// Delete samples
    Delete {
        #[arg(required = true)]
        hashes: Vec<SampleHash>,
    },
}

#[derive(Debug, Args)]
pub struct SimilarArgs {
    #[arg(value_parser = parse_sha1)]
    pub sha1: Sha1,

    /// Walk every page instead of returning the first one
    #[arg(long)]
    pub aggregated: bool,

    /// Only return samples with this classification
    #[arg(long)]
    pub classification: Option<Classification>,

    /// Stop the aggregated walk after this many results
    #[arg(long, default_value_t = 5000)]
    pub max_results: usize,

    #[arg(long, default_value_t = 1000)]
    pub results_per_page: u32,

    /// Return only hashes, without sample metadata
    #[arg(long)]
    pub compact: bool,

    /// RHA1 type (pe01, elf01, macho01); looked up when omitted
    #[arg(long)]
    pub rha1_type: Option<Rha1Type>,
}

#[derive(Debug, Args)]
pub struct HuntArgs {
    /// Start of the first-seen range (e.g. 2019-01-03T04:10:00Z)
    #[arg(long)]
    pub since: Option<String>,

    /// End of the first-seen range (e.g. 2019-01-03T04:10:00Z)
    #[arg(long)]
    pub until: Option<String>,

    /// Threat family name
    #[arg(long)]
    pub family: Option<String>,

    /// Output file name
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn parse_sha1(value: &str) -> Result<Sha1, String> {
    Sha1::new(value).ok_or_else(|| format!("'{value}' is not a SHA-1 hex digest"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hunt_flags_parse() {
        let cli = Cli::try_parse_from([
            "ticloud-cookbook",
            "hunt",
            "--since",
            "2019-01-01",
            "--family",
            "Emotet",
            "-u",
            "user",
        ])
        .unwrap();
        assert_eq!(cli.global.username.as_deref(), Some("user"));
        match cli.command {
            Command::Hunt(args) => {
                assert_eq!(args.since.as_deref(), Some("2019-01-01"));
                assert!(args.until.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn hashes_are_validated_at_parse_time() {
        let sha256 = "a".repeat(64);
        let sha1 = "a".repeat(40);
        assert!(Cli::try_parse_from(["ticloud-cookbook", "reputation", "xyz"]).is_err());
        let cli = Cli::try_parse_from(["ticloud-cookbook", "reputation", sha1.as_str()]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Query(QueryCommand::Reputation { .. })
        ));
        assert!(Cli::try_parse_from(["ticloud-cookbook", "similar", sha256.as_str()]).is_err());
        assert!(Cli::try_parse_from([
            "ticloud-cookbook",
            "similar",
            sha1.as_str(),
            "--classification",
            "malicious"
        ])
        .is_ok());
    }
}
