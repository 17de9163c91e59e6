// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub mod commands;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_config, emit_results, handle_crawl, init_tracing, load_urls_from_file,
    load_urls_from_source, parse_url_line,
};

pub use commands::{CLAP_STYLING, command_argument_builder};

// Re-export crawl functionality from webshot-core
pub use webshot_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
