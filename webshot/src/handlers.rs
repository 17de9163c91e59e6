use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;
use webshot_core::crawl::{CrawlOptions, capture_candidates, execute_crawl};
use webshot_core::credentials::load_credentials;
use webshot_core::report::{ReportFormat, generate_report, write_report};
use webshot_spider::{CrawlResults, ProgressCallback, SpiderConfig, VisitStatus};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug and the
/// default is warn. Logs go to stderr so reports on stdout stay clean.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file, skipping blank lines and `#` comments
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Build the crawl configuration from `--config` plus the crawl flags.
///
/// Flags only override what they actually set, so a config file can supply
/// any value the command line leaves out.
pub fn build_config(args: &ArgMatches) -> anyhow::Result<SpiderConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => SpiderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SpiderConfig::default(),
    };

    let url = args.get_one::<Url>("url");
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    if url.is_some() || hosts_file.is_some() || config.seed_uris.is_empty() {
        config.seed_uris = load_urls_from_source(url, hosts_file).map_err(|e| anyhow!(e))?;
    }

    if args.get_flag("external") {
        config = config.with_follow_external_links(true);
    }
    if args.get_flag("no-internal") {
        config = config.with_follow_internal_links(false);
    }
    if let Some(pattern) = args.get_one::<String>("blacklist") {
        config = config.with_blacklist_pattern(pattern.clone());
    }
    if let Some(depth) = args.get_one::<usize>("depth") {
        config = config.with_recursion_depth(*depth);
    }
    if let Some(threads) = args.get_one::<usize>("threads") {
        config = config.with_workers(*threads);
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config = config.with_timeout(*timeout);
    }
    if let Some(path) = args.get_one::<PathBuf>("credentials") {
        let credentials = load_credentials(path).map_err(|e| anyhow!(e))?;
        config = config.with_credentials(credentials);
    }

    Ok(config)
}

// Status output goes to stderr; stdout only ever carries the report

fn print_crawl_plan(config: &SpiderConfig) {
    eprintln!("\n🕷️  Crawling {} seed(s)", config.seed_uris.len());
    eprintln!("Workers: {}", config.workers);
    let internal = if config.follow_internal_links {
        "yes".green()
    } else {
        "no".red()
    };
    let external = if config.follow_external_links {
        "yes".green()
    } else {
        "no".red()
    };
    eprintln!("Follow internal: {}  external: {}", internal, external);
    if !config.uri_blacklist_pattern.is_empty() {
        eprintln!("Blacklist: {}", config.uri_blacklist_pattern);
    }
    if !config.credentials.is_empty() {
        eprintln!("Credentials for {} host(s)", config.credentials.len());
    }
    eprintln!();
}

fn write_summary<S: Write>(status: &mut S, results: &CrawlResults) -> io::Result<()> {
    writeln!(
        status,
        "\n{} Crawl complete! {} addresses discovered",
        "✓".green().bold(),
        results.len()
    )?;
    writeln!(
        status,
        "  {} visited  {} redirected  {} excluded  {} errors",
        results.count(VisitStatus::Visited).to_string().green(),
        results.count(VisitStatus::Redirected).to_string().cyan(),
        results.count(VisitStatus::Excluded).to_string().bright_black(),
        results.count(VisitStatus::Error).to_string().red(),
    )?;
    writeln!(
        status,
        "  {} page(s) ready for capture\n",
        capture_candidates(results).len().to_string().bright_white()
    )
}

/// Deliver a finished crawl.
///
/// The report goes to `output` when given (never coloured), otherwise to
/// `out`. The summary and save confirmation go to `status` unless `quiet`.
pub fn emit_results<O: Write, S: Write>(
    results: &CrawlResults,
    format: ReportFormat,
    output: Option<&Path>,
    quiet: bool,
    out: &mut O,
    status: &mut S,
) -> anyhow::Result<()> {
    if !quiet {
        write_summary(status, results)?;
    }

    match output {
        Some(path) => {
            let report = generate_report(results, format, false).map_err(|e| anyhow!(e))?;
            write_report(path, &report).map_err(|e| anyhow!(e))?;
            if !quiet {
                writeln!(
                    status,
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                )?;
            }
        }
        None => {
            let report = generate_report(results, format, true).map_err(|e| anyhow!(e))?;
            write!(out, "{}", report)?;
            out.flush()?;
        }
    }

    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = build_config(sub_matches)?;
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches
        .get_one::<String>("output")
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()));

    if !quiet {
        print_crawl_plan(&config);
    }

    // Ctrl-C aborts the crawl; the spider releases credentials on the way out
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling crawl");
            cancel_on_signal.cancel();
        }
    });

    let options = CrawlOptions::new(config).with_progress_bars(!quiet);
    let progress_callback: ProgressCallback = Arc::new(|index, total, label| {
        debug!("[{}/{}] {}", index, total, label);
    });

    let results = execute_crawl(options, Some(progress_callback), cancel)
        .await
        .map_err(|e| anyhow!(e))?;

    emit_results(
        &results,
        format,
        output.as_deref(),
        quiet,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}
