use colored::Colorize;

pub mod crawl;
pub mod credentials;
pub mod report;

/// Banner on stderr, so stdout stays free for reports
pub fn print_banner() {
    let banner = r#"
                 __         __          __
 _      _____  / /_  _____/ /_  ____  / /_
| | /| / / _ \/ __ \/ ___/ __ \/ __ \/ __/
| |/ |/ /  __/ /_/ (__  ) / / / /_/ / /_
|__/|__/\___/_.___/____/_/ /_/\____/\__/
"#;
    eprintln!("{}", banner.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "site discovery for archival".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
