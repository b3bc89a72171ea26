//! Subcommand handlers.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use intel::{
    hunt, pivot, FirstSeenRange, HashType, SampleAnalysis, SampleHash, SampleSearch, SearchQuery,
    ThreatFamily,
};
use ticloud::{SimilarityOptions, TiCloudClient, TiCloudConfig};
use tracing::{info, instrument};

use crate::args::{Cli, Command, GlobalArgs, HuntArgs, QueryCommand, SimilarArgs};
use crate::output::{print_json, save_bytes, save_results};
use crate::settings::{Key, Settings};

/// Runs the parsed command line to completion.
pub async fn run(cli: Cli, program: &str) -> Result<()> {
    let settings = Settings::load(
        cli.global.config.as_deref(),
        &cli.global.credentials,
        program,
    )?;

    match cli.command {
        Command::Hunt(args) => run_hunt(&cli.global, &settings, args).await,
        Command::Query(command) => {
            let client = build_client(&cli.global, &settings)?;
            run_query(&client, command).await
        }
    }
}

fn build_client(global: &GlobalArgs, settings: &Settings) -> Result<TiCloudClient> {
    let host = settings.resolve(Key::Url, global.host.as_deref())?;
    let username = settings.resolve(Key::Username, global.username.as_deref())?;
    let password = settings.resolve(Key::Password, global.password.as_deref())?;

    let mut config = TiCloudConfig::new(username, password)
        .with_host(host)
        .with_timeout(Duration::from_secs(global.timeout_secs));
    if let Some(agent) = &global.user_agent {
        config = config.with_user_agent(agent.clone());
    }
    TiCloudClient::new(config).context("cannot create TitaniumCloud client")
}

async fn run_query(client: &TiCloudClient, command: QueryCommand) -> Result<()> {
    match command {
        QueryCommand::Reputation { hash } => print_json(&client.file_reputation(&hash).await?),
        QueryCommand::AvScanners { hash } => print_json(&client.av_scanners(&hash).await?),
        QueryCommand::Analysis { hashes } => analysis(client, &hashes).await,
        QueryCommand::Similar(args) => similar(client, args).await,
        QueryCommand::DomainReport { domain } => print_json(&client.domain_report(&domain).await?),
        QueryCommand::DomainResolutions { domain } => {
            print_json(&client.domain_to_ip_resolutions(&domain).await?)
        }
        QueryCommand::IpUrls { ip } => print_json(&client.urls_from_ip(ip).await?),
        QueryCommand::UrlReport { url } => print_json(&client.url_report(&url).await?),
        QueryCommand::UrlDownloadedFiles { url } => {
            print_json(&client.url_downloaded_files(&url).await?)
        }
        QueryCommand::AnalyzeUrl { url } => print_json(&client.submit_url(&url).await?),
        QueryCommand::NetworkWalk { domain } => print_json(&pivot(client, &domain).await?),
        QueryCommand::Upload { path } => {
            let status = client.upload_sample_from_path(&path).await?;
            println!("{status}");
            Ok(())
        }
        QueryCommand::Download { hash, output } => {
            let bytes = client.download_sample(&hash).await?;
            save_bytes(&output, &bytes)?;
            info!(path = %output.display(), size = bytes.len(), "Sample saved");
            Ok(())
        }
        QueryCommand::Reanalyze { hashes } => {
            println!("{}", client.reanalyze_samples(&hashes).await?);
            Ok(())
        }
        QueryCommand::Delete { hashes } => {
            println!("{}", client.delete_samples(&hashes).await?);
            Ok(())
        }
    }
}

/// Single lookups use the GET endpoint; several hashes go through the bulk
/// endpoint and print the collected entries.
async fn analysis(client: &TiCloudClient, hashes: &[SampleHash]) -> Result<()> {
    if let [hash] = hashes {
        return print_json(&client.file_analysis(hash).await?);
    }
    let hash_type = uniform_hash_type(hashes)?;
    let raw: Vec<&str> = hashes.iter().map(SampleHash::as_str).collect();
    print_json(&client.file_analysis_bulk(hash_type, &raw).await?)
}

fn uniform_hash_type(hashes: &[SampleHash]) -> Result<HashType> {
    let first = hashes
        .first()
        .map(SampleHash::hash_type)
        .ok_or_else(|| anyhow!("no hashes given"))?;
    if hashes.iter().any(|h| h.hash_type() != first) {
        return Err(anyhow!("all hashes must be of the same type"));
    }
    Ok(first)
}

async fn similar(client: &TiCloudClient, args: SimilarArgs) -> Result<()> {
    let options = SimilarityOptions {
        extended: !args.compact,
        classification: args.classification,
        results_per_page: args.results_per_page,
        max_results: args.max_results,
        rha1_type: args.rha1_type,
    };
    if args.aggregated {
        print_json(&client.similar_hashes_aggregated(&args.sha1, &options).await?)
    } else {
        print_json(&client.similar_hashes(&args.sha1, None, &options).await?)
    }
}

/// Settings are resolved in a fixed order so the first missing one is the
/// one reported.
#[instrument(skip_all)]
async fn run_hunt(global: &GlobalArgs, settings: &Settings, args: HuntArgs) -> Result<()> {
    let (query, output) = hunt_plan(settings, &args)?;
    let client = build_client(global, settings)?;
    hunt_to_file(&client, &client, &query, &output, &mut io::stdout()).await?;
    Ok(())
}

/// Resolves the search window, family and output path for a hunt.
fn hunt_plan(settings: &Settings, args: &HuntArgs) -> Result<(SearchQuery, PathBuf)> {
    let since = settings.resolve(Key::Since, args.since.as_deref())?;
    let until = settings.resolve(Key::Until, args.until.as_deref())?;
    let family = settings.resolve(Key::Family, args.family.as_deref())?;

    let range = FirstSeenRange::parse(&since, &until)?;
    let family =
        ThreatFamily::new(&family).ok_or_else(|| anyhow!("invalid threat family '{family}'"))?;
    Ok((
        SearchQuery::new(range, family),
        settings.output(args.output.as_deref()),
    ))
}

/// Runs the hunt, reports the outcome on `out` and writes the records to
/// `output`. Nothing is written when no sample matched.
async fn hunt_to_file<S, A, W>(
    search: &S,
    analysis: &A,
    query: &SearchQuery,
    output: &Path,
    out: &mut W,
) -> Result<usize>
where
    S: SampleSearch + ?Sized,
    A: SampleAnalysis + ?Sized,
    W: Write,
{
    let report = hunt(search, analysis, query).await?;
    if report.is_empty() {
        writeln!(out, "No files found within range")?;
        return Ok(0);
    }

    let count = report.len();
    writeln!(out, "Total interesting samples: {count}")?;
    save_results(output, &report.into_records())?;
    info!(path = %output.display(), "Results saved");
    Ok(count)
}
