use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;
use webshot::command_argument_builder;
use webshot::handlers::*;
use webshot_core::report::ReportFormat;
use webshot_spider::{CrawlResults, Frontier, Link, VisitStatus, canonicalize};

fn crawl_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["webshot", "crawl"];
    argv.extend_from_slice(args);
    command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap()
        .subcommand_matches("crawl")
        .unwrap()
        .clone()
}

// ============================================================================
// URL Loading Tests
// ============================================================================

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_host_and_port() {
    let result = parse_url_line("localhost:8080");
    assert_eq!(result, Some("http://localhost:8080".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "archive.example.org")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# staging hosts")?;
    writeln!(temp_file, "  https://docs.example.com/guide/  ")?;

    let urls = load_urls_from_file(temp_file.path())?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://archive.example.org");
    assert_eq!(urls[2], "https://docs.example.com/guide/");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let result = load_urls_from_file(temp_file.path());

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_file_missing() {
    let result = load_urls_from_file(&PathBuf::from("/nonexistent/hosts.txt"));
    assert!(result.unwrap_err().contains("Failed to read hosts file"));
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("https://example.com").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0], "https://example.com/");
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .contains("Either --url or --hosts-file must be provided")
    );
}

// ============================================================================
// Config Building Tests
// ============================================================================

#[test]
fn test_build_config_defaults() {
    let config = build_config(&crawl_matches(&["-u", "https://example.com"])).unwrap();

    assert_eq!(config.seed_uris, vec!["https://example.com/".to_string()]);
    assert!(config.follow_internal_links);
    assert!(!config.follow_external_links);
    assert_eq!(config.workers, 1);
    assert_eq!(config.recursion_depth, 2);
    assert!(config.uri_blacklist_pattern.is_empty());
    assert!(config.request_timeout_secs.is_none());
}

#[test]
fn test_build_config_flags() {
    let config = build_config(&crawl_matches(&[
        "-u",
        "https://example.com",
        "--external",
        "--no-internal",
        "-b",
        r".*\/admin.*",
        "-t",
        "8",
        "--timeout",
        "15",
        "-d",
        "3",
    ]))
    .unwrap();

    assert!(!config.follow_internal_links);
    assert!(config.follow_external_links);
    assert_eq!(config.uri_blacklist_pattern, r".*\/admin.*");
    assert_eq!(config.workers, 8);
    assert_eq!(config.request_timeout_secs, Some(15));
    assert_eq!(config.recursion_depth, 3);
}

#[test]
fn test_build_config_file_with_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let mut config_file = NamedTempFile::new()?;
    writeln!(
        config_file,
        r#"{{ "seed_uris": ["http://intranet.example/"], "workers": 4, "uri_blacklist_pattern": "logout" }}"#
    )?;
    let path = config_file.path().to_str().unwrap();

    // Seeds come from the file when no url is given
    let config = build_config(&crawl_matches(&["-c", path]))?;
    assert_eq!(config.seed_uris, vec!["http://intranet.example/".to_string()]);
    assert_eq!(config.workers, 4);
    assert_eq!(config.uri_blacklist_pattern, "logout");

    // Flags win over the file
    let config = build_config(&crawl_matches(&["-c", path, "-u", "http://other.example", "-t", "2"]))?;
    assert_eq!(config.seed_uris, vec!["http://other.example/".to_string()]);
    assert_eq!(config.workers, 2);
    assert_eq!(config.uri_blacklist_pattern, "logout");

    Ok(())
}

#[test]
fn test_build_config_credentials() -> Result<(), Box<dyn std::error::Error>> {
    let mut creds_file = NamedTempFile::new()?;
    writeln!(
        creds_file,
        r#"{{ "Intranet.Example": {{ "user": "archivist", "password": "s3cret" }} }}"#
    )?;

    let config = build_config(&crawl_matches(&[
        "-u",
        "http://intranet.example",
        "--credentials",
        creds_file.path().to_str().unwrap(),
    ]))?;

    assert_eq!(config.credentials["intranet.example"].user, "archivist");
    Ok(())
}

#[test]
fn test_build_config_requires_seeds() {
    let result = build_config(&crawl_matches(&[]));
    assert!(result.is_err());
}

#[test]
fn test_build_config_bad_config_file() {
    let result = build_config(&crawl_matches(&["-c", "/nonexistent/webshot.json"]));
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to load config"));
}

#[test]
fn test_url_and_hosts_file_conflict() {
    let result = command_argument_builder().try_get_matches_from([
        "webshot",
        "crawl",
        "-u",
        "http://example.com",
        "-H",
        "hosts.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_format_rejects_unknown() {
    let result = command_argument_builder().try_get_matches_from([
        "webshot", "crawl", "-u", "http://example.com", "-f", "pdf",
    ]);
    assert!(result.is_err());
}

// ============================================================================
// Result Delivery Tests
// ============================================================================

fn finished_crawl() -> CrawlResults {
    let mut frontier = Frontier::new();
    let home = canonicalize("http://site.example/");
    let gone = canonicalize("http://site.example/gone/");
    frontier.set_status(&home, VisitStatus::Visited);
    frontier.record_link(&gone, Link::new(home.clone(), "/gone"));
    frontier.set_error(&gone, "HTTP 410 Gone returned by http://site.example/gone/");
    frontier.snapshot()
}

#[test]
fn test_emit_results_keeps_stdout_for_the_report() {
    let results = finished_crawl();
    let mut out = Vec::new();
    let mut status = Vec::new();

    emit_results(&results, ReportFormat::Json, None, false, &mut out, &mut status).unwrap();

    let parsed: CrawlResults = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.status_by_address, results.status_by_address);
    assert!(String::from_utf8(status).unwrap().contains("Crawl complete!"));
}

#[test]
fn test_emit_results_quiet_writes_nothing_else() {
    let results = finished_crawl();
    let mut out = Vec::new();
    let mut status = Vec::new();

    emit_results(&results, ReportFormat::Markdown, None, true, &mut out, &mut status).unwrap();

    assert!(String::from_utf8(out).unwrap().starts_with("# Crawl Report"));
    assert!(status.is_empty());
}

#[test]
fn test_emit_results_to_file_is_plain_text() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("out").join("report.txt");
    let results = finished_crawl();
    let mut out = Vec::new();
    let mut status = Vec::new();

    colored::control::set_override(true);
    let emitted = emit_results(
        &results,
        ReportFormat::Text,
        Some(&path),
        false,
        &mut out,
        &mut status,
    );
    colored::control::unset_override();
    emitted?;

    assert!(out.is_empty());
    let saved = std::fs::read_to_string(&path)?;
    assert!(!saved.contains('\u{1b}'));
    assert!(saved.contains("Broken links: 1"));
    assert!(String::from_utf8(status)?.contains("Report saved to"));
    Ok(())
}
