//! tenk-highlight - command-line host for the 10-K keyword highlighter
//!
//! Loads a saved filing, tells the session the document is ready, and either
//! writes the highlighted HTML or logs per-pattern counts. `download` fetches
//! the filings from EDGAR into the `10K/{ticker}/{date}.html` tree first.

mod download;

use clap::{ArgAction, Args, Parser, Subcommand};
use dom::DomService;
use download::{Downloader, HttpFetcher};
use highlighter::Company;
use highlighter::edgar::{companies_from_list, find_company, parse_ticker_index, ten_k_filings};
use highlighter::{
    HighlightSession, HighlighterConfig, HostEvent, RunMode, SessionConfig, file_url,
    load_patterns,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "tenk-highlight")]
#[command(about = "Highlight or count disclosure keywords in 10-K filings")]
struct Cli {
    /// Repeat for more detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap every match in a styled marker and write the document
    Highlight {
        #[command(flatten)]
        document: DocumentArgs,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Log how often each pattern matches, without touching the document
    Count {
        #[command(flatten)]
        document: DocumentArgs,
    },
    /// List the 10-K filings in a saved EDGAR submissions document
    Filings {
        /// Submissions JSON (data.sec.gov/submissions/CIK##########.json)
        submissions: PathBuf,
        /// Ticker index (ticker.txt)
        #[arg(long)]
        index: PathBuf,
        /// Ticker or CIK
        #[arg(long)]
        company: String,
        /// Directory holding the `10K/` tree
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Save 10-K filings from EDGAR; documents already saved are skipped
    Download(DownloadArgs),
}

#[derive(Args)]
struct DocumentArgs {
    /// Filing HTML file
    input: PathBuf,
    /// JSON array of patterns, replacing the configured list
    #[arg(long)]
    patterns: Option<PathBuf>,
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Process the file even if its location matches no trigger
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct DownloadArgs {
    /// Tickers or CIKs
    companies: Vec<String>,
    /// Batch list of `ticker,cik` or `ticker<TAB>cik` lines (a fail-out file works)
    #[arg(long, conflicts_with = "companies")]
    from_file: Option<PathBuf>,
    /// Every company in the ticker index
    #[arg(long, conflicts_with_all = ["companies", "from_file"])]
    all: bool,
    /// `Name contact@example.com`, sent with every request
    #[arg(long)]
    user_agent: String,
    /// Directory to create the `10K/` tree in
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Companies with no 10-K are listed here
    #[arg(long, default_value = "fail_cik.txt")]
    fail_out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Highlight { document, output } => {
            let Some(doc) = process(&document, RunMode::Highlight).await? else {
                return Ok(());
            };
            let html = doc.to_html()?;
            match output {
                Some(path) => {
                    fs::write(&path, html)?;
                    info!("Wrote {}", path.display());
                }
                None => print!("{html}"),
            }
        }
        Commands::Count { document } => {
            process(&document, RunMode::Count).await?;
        }
        Commands::Filings {
            submissions,
            index,
            company,
            root,
        } => list_filings(&submissions, &index, &company, &root)?,
        Commands::Download(args) => run_download(&args).await?,
    }

    Ok(())
}

/// Run one document through a session; `None` when it was not processed
async fn process(
    args: &DocumentArgs,
    mode: RunMode,
) -> Result<Option<DomService>, Box<dyn std::error::Error>> {
    let settings = settings(args, mode)?;
    let session = HighlightSession::new(
        SessionConfig {
            force: args.force,
            ..SessionConfig::default()
        },
        settings,
    );
    let events = session.subscribe();

    let mut doc = DomService::new();
    doc.load_file(&args.input)?;

    // Fully loaded: signal ready
    let url = file_url(&args.input)?;
    session.event_bus.publish(HostEvent::DocumentReady {
        url: url.to_string(),
    });

    let Some(report) = session.run_when_ready(events, &mut doc).await else {
        warn!("{} was not processed (use --force to override)", args.input.display());
        return Ok(None);
    };

    if !report.skipped_patterns.is_empty() {
        warn!("{} pattern(s) skipped", report.skipped_patterns.len());
    }

    Ok(Some(doc))
}

fn settings(
    args: &DocumentArgs,
    mode: RunMode,
) -> Result<HighlighterConfig, Box<dyn std::error::Error>> {
    let mut settings = match &args.config {
        Some(path) => HighlighterConfig::load(path)?,
        None => HighlighterConfig::default(),
    };
    settings.mode = mode;

    if let Some(path) = &args.patterns {
        settings.patterns = load_patterns(path)?;
    }

    Ok(settings)
}

fn list_filings(
    submissions: &Path,
    index: &Path,
    query: &str,
    root: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let companies = parse_ticker_index(&fs::read_to_string(index)?);
    info!("Matched {} ticker to CIK values", companies.len());

    let Some(company) = find_company(&companies, query) else {
        return Err(format!("Company not found: {query}").into());
    };

    let filings = ten_k_filings(&fs::read_to_string(submissions)?, company)?;
    for filing in &filings {
        let path = filing.local_path(root)?;
        let saved = if path.exists() { "saved" } else { "missing" };
        println!("{}\t{}\t{}\t{}", filing.date, filing.url, path.display(), saved);
    }

    Ok(())
}

async fn run_download(args: &DownloadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let downloader = Downloader::new(
        HttpFetcher::new(&args.user_agent)?,
        &args.root,
        &args.fail_out,
    );
    let index = downloader.ticker_index().await?;
    let selected = select_companies(&index, args)?;

    let summary = downloader.download(&selected).await?;
    if !summary.without_filings.is_empty() {
        info!(
            "{} companies without a 10-K listed in {}",
            summary.without_filings.len(),
            args.fail_out.display()
        );
    }
    if !summary.failed.is_empty() {
        return Err(format!("{} companies failed to download", summary.failed.len()).into());
    }

    Ok(())
}

fn select_companies<'a>(
    index: &'a [Company],
    args: &DownloadArgs,
) -> Result<Vec<&'a Company>, Box<dyn std::error::Error>> {
    if args.all {
        return Ok(index.iter().collect());
    }

    let (found, missing) = match &args.from_file {
        Some(path) => companies_from_list(index, &fs::read_to_string(path)?),
        None if !args.companies.is_empty() => {
            let mut found = Vec::new();
            let mut missing = Vec::new();
            for query in &args.companies {
                match find_company(index, query) {
                    Some(company) => found.push(company),
                    None => missing.push(query.clone()),
                }
            }
            (found, missing)
        }
        None => return Err("Name companies, or pass --from-file or --all".into()),
    };

    for query in &missing {
        warn!("Company not found: {}", query);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_highlight() {
        let cli = Cli::try_parse_from([
            "tenk-highlight",
            "highlight",
            "10K/AAPL/2024-11-01.html",
            "-o",
            "out.html",
            "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Highlight { document, output } => {
                assert_eq!(document.input, PathBuf::from("10K/AAPL/2024-11-01.html"));
                assert_eq!(output, Some(PathBuf::from("out.html")));
                assert!(document.force);
                assert!(document.patterns.is_none());
            }
            _ => panic!("Expected highlight command"),
        }
    }

    #[test]
    fn test_parse_count_verbose() {
        let cli = Cli::try_parse_from([
            "tenk-highlight",
            "count",
            "filing.html",
            "--patterns",
            "patterns.json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            &cli.command,
            Commands::Count { document } if document.patterns == Some(PathBuf::from("patterns.json"))
        ));
    }

    #[test]
    fn test_count_rejects_output_flag() {
        assert!(Cli::try_parse_from(["tenk-highlight", "count", "f.html", "-o", "x"]).is_err());
    }

    fn download_args(extra: &[&str]) -> DownloadArgs {
        let argv = ["tenk-highlight", "download"].iter().chain(extra).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Download(args) => args,
            _ => panic!("Expected download command"),
        }
    }

    #[test]
    fn test_parse_download() {
        let args = download_args(&[
            "aapl",
            "789019",
            "--user-agent",
            "Jane Analyst jane@example.com",
            "--root",
            "/data",
        ]);
        assert_eq!(args.companies, vec!["aapl", "789019"]);
        assert_eq!(args.root, PathBuf::from("/data"));
        assert_eq!(args.fail_out, PathBuf::from("fail_cik.txt"));
        assert!(!args.all);

        // EDGAR refuses requests without a User-Agent
        assert!(Cli::try_parse_from(["tenk-highlight", "download", "aapl"]).is_err());
        assert!(
            Cli::try_parse_from([
                "tenk-highlight",
                "download",
                "aapl",
                "--all",
                "--user-agent",
                "Jane jane@example.com",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_select_companies() {
        let index = parse_ticker_index("aapl\t320193\nmsft\t789019\n");
        const UA: &str = "--user-agent=Jane jane@example.com";

        let args = download_args(&["MSFT", "goog", UA]);
        assert_eq!(select_companies(&index, &args).unwrap(), vec![&index[1]]);

        let args = download_args(&["--all", UA]);
        assert_eq!(select_companies(&index, &args).unwrap().len(), 2);

        let list = std::env::temp_dir().join(format!("tenk-list-{}.txt", std::process::id()));
        fs::write(&list, "aapl,320193\n").unwrap();
        let from_file = format!("--from-file={}", list.display());
        let args = download_args(&[from_file.as_str(), UA]);
        let selected = select_companies(&index, &args).unwrap();
        fs::remove_file(&list).unwrap();
        assert_eq!(selected, vec![&index[0]]);

        let args = download_args(&[UA]);
        assert!(select_companies(&index, &args).is_err());
    }

    #[test]
    fn test_settings_override_mode_and_patterns() {
        let dir = std::env::temp_dir();
        let patterns = dir.join(format!("tenk-patterns-{}.json", std::process::id()));
        fs::write(&patterns, r#"["swap"]"#).unwrap();

        let args = DocumentArgs {
            input: PathBuf::from("filing.html"),
            patterns: Some(patterns.clone()),
            config: None,
            force: false,
        };
        let settings = settings(&args, RunMode::Count).unwrap();
        fs::remove_file(&patterns).unwrap();

        assert_eq!(settings.mode, RunMode::Count);
        assert_eq!(settings.patterns, vec!["swap"]);
    }

    #[tokio::test]
    async fn test_untriggered_file_needs_force() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("tenk-filing-{}.html", std::process::id()));
        fs::write(&input, "<html><head></head><body>hedge</body></html>").unwrap();

        let mut args = DocumentArgs {
            input: input.clone(),
            patterns: None,
            config: None,
            force: false,
        };
        let skipped = process(&args, RunMode::Highlight).await.unwrap();

        args.force = true;
        let doc = process(&args, RunMode::Highlight).await.unwrap();
        fs::remove_file(&input).unwrap();

        assert!(skipped.is_none());
        let html = doc.unwrap().to_html().unwrap();
        assert!(html.contains(r#"<span class="highlight">hedge</span>"#));
        assert!(html.contains(".highlight { background-color: yellow; font-weight: bold; }"));
    }
}
