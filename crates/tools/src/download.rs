//! EDGAR downloader
//!
//! Saves every 10-K primary document of the selected companies under
//! `{root}/10K/{ticker}/{date}.html`, the layout the default trigger watches.
//! Documents already on disk are not fetched again. Companies with no 10-K
//! are appended to a fail-out list whose `ticker<TAB>cik` lines can be fed
//! back in with `--from-file`.

use highlighter::HighlightError;
use highlighter::edgar::{
    Company, TICKER_INDEX_URL, parse_ticker_index, submissions_url, ten_k_filings,
};
use reqwest::StatusCode;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const FETCH_ATTEMPTS: u32 = 3;
const BACKOFF_MS: u64 = 500;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const FAIL_OUT_HEADER: &str = "Failed to find 10-K for these companies: \n";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("User-Agent must be `Name contact@example.com`, got {0:?}")]
    UserAgent(String),

    #[error(transparent)]
    Filing(#[from] HighlightError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Byte source for EDGAR URLs
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// EDGAR rejects anonymous clients; a name and contact address is required
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    let mut words = user_agent.split_whitespace();
    let named = words.next().is_some_and(|w| !w.contains('@'));
    let contact = words.any(|w| {
        w.split_once('@')
            .is_some_and(|(user, host)| !user.is_empty() && host.contains('.'))
    });

    if named && contact {
        Ok(())
    } else {
        Err(DownloadError::UserAgent(user_agent.to_string()))
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        validate_user_agent(user_agent)?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent.trim())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp.bytes().await?.to_vec());
                }
                Ok(resp) => {
                    let status = resp.status();
                    let failure = DownloadError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !is_transient(status) {
                        return Err(failure);
                    }
                    failure
                }
                Err(e) => DownloadError::Http(e),
            };

            if attempt >= FETCH_ATTEMPTS {
                return Err(failure);
            }
            debug!(url, attempt, "Retrying: {}", failure);
            tokio::time::sleep(Duration::from_millis(BACKOFF_MS.saturating_mul(attempt as u64)))
                .await;
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub saved: Vec<PathBuf>,
    pub already_saved: usize,
    /// Submissions listed no 10-K
    pub without_filings: Vec<Company>,
    /// `(ticker, error)` for companies whose download stopped early
    pub failed: Vec<(String, String)>,
}

pub struct Downloader<F> {
    fetcher: F,
    root: PathBuf,
    fail_out: PathBuf,
}

impl<F: Fetch> Downloader<F> {
    pub fn new(fetcher: F, root: impl Into<PathBuf>, fail_out: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            root: root.into(),
            fail_out: fail_out.into(),
        }
    }

    pub async fn ticker_index(&self) -> Result<Vec<Company>> {
        let bytes = self.fetcher.fetch(TICKER_INDEX_URL).await?;
        let companies = parse_ticker_index(&String::from_utf8_lossy(&bytes));
        info!("Matched {} ticker to CIK values", companies.len());
        Ok(companies)
    }

    /// Download every company in order; one company's failure does not stop the rest
    pub async fn download(&self, companies: &[&Company]) -> Result<DownloadSummary> {
        fs::write(&self.fail_out, FAIL_OUT_HEADER)?;

        let mut summary = DownloadSummary::default();
        for company in companies {
            if let Err(e) = self.download_company(company, &mut summary).await {
                warn!(ticker = %company.ticker, cik = %company.cik, "Download stopped: {}", e);
                summary.failed.push((company.ticker.clone(), e.to_string()));
            }
        }

        info!(
            saved = summary.saved.len(),
            already_saved = summary.already_saved,
            without_filings = summary.without_filings.len(),
            failed = summary.failed.len(),
            "Download finished"
        );
        Ok(summary)
    }

    async fn download_company(&self, company: &Company, summary: &mut DownloadSummary) -> Result<()> {
        let json = self.fetcher.fetch(&submissions_url(company)).await?;
        let filings = ten_k_filings(&String::from_utf8_lossy(&json), company)?;

        if filings.is_empty() {
            self.record_without_filings(company)?;
            summary.without_filings.push(company.clone());
            return Ok(());
        }

        for filing in &filings {
            let path = filing.local_path(&self.root)?;
            if path.exists() {
                debug!("Already saved {}", path.display());
                summary.already_saved += 1;
                continue;
            }

            let bytes = self.fetcher.fetch(&filing.url).await?;
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            // A partial file must not count as saved on the next run
            let partial = path.with_extension("html.part");
            fs::write(&partial, &bytes)?;
            fs::rename(&partial, &path)?;

            info!("Saved {} {} to {}", filing.company_name, filing.date, path.display());
            summary.saved.push(path);
        }

        Ok(())
    }

    fn record_without_filings(&self, company: &Company) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.fail_out)?;
        writeln!(file, "{}\t{}", company.ticker, company.cik)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use highlighter::edgar::companies_from_list;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const APPLE_SUBMISSIONS: &str = r#"{
        "name": "Apple Inc.",
        "filings": { "recent": {
            "accessionNumber": ["0000320193-24-000123", "0000320193-24-000081", "0000320193-23-000106"],
            "filingDate": ["2024-11-01", "2024-08-02", "2023-11-03"],
            "form": ["10-K", "10-Q", "10-K"],
            "primaryDocument": ["aapl-20240928.htm", "aapl-20240629.htm", "aapl-20230930.htm"]
        } }
    }"#;

    const SHELL_SUBMISSIONS: &str = r#"{
        "name": "Shell Co",
        "filings": { "recent": {
            "accessionNumber": ["0000000999-24-000001"],
            "filingDate": ["2024-03-01"],
            "form": ["8-K"],
            "primaryDocument": ["shell-8k.htm"]
        } }
    }"#;

    const APPLE_2024: &str = "https://www.sec.gov/Archives/edgar/data/0000320193/000032019324000123/aapl-20240928.htm";
    const APPLE_2023: &str = "https://www.sec.gov/Archives/edgar/data/0000320193/000032019323000106/aapl-20230930.htm";

    /// Serves saved responses; any other URL is a 404
    struct FixtureFetcher {
        responses: HashMap<String, Vec<u8>>,
        requests: RefCell<Vec<String>>,
    }

    impl FixtureFetcher {
        fn new(responses: &[(&str, &[u8])]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_vec()))
                    .collect(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetch for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| DownloadError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn edgar_fixtures() -> FixtureFetcher {
        FixtureFetcher::new(&[
            (TICKER_INDEX_URL, b"aapl\t320193\nshell\t999\nghost\t888\n"),
            (
                "https://data.sec.gov/submissions/CIK0000320193.json",
                APPLE_SUBMISSIONS.as_bytes(),
            ),
            (
                "https://data.sec.gov/submissions/CIK0000000999.json",
                SHELL_SUBMISSIONS.as_bytes(),
            ),
            (APPLE_2024, b"<html><body>FY2024 hedge \x92s</body></html>"),
            (APPLE_2023, b"<html><body>FY2023</body></html>"),
        ])
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tenk-download-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_ticker_index() {
        let root = scratch_dir("index");
        let downloader = Downloader::new(edgar_fixtures(), &root, root.join("fail_cik.txt"));

        let companies = downloader.ticker_index().await.unwrap();
        assert_eq!(companies.len(), 3);
        assert_eq!(companies[1].cik, "0000000999");
        fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_download_saves_each_filing_once() {
        let root = scratch_dir("saves");
        let fail_out = root.join("fail_cik.txt");
        let downloader = Downloader::new(edgar_fixtures(), &root, &fail_out);
        let companies = downloader.ticker_index().await.unwrap();
        let selected = [&companies[0], &companies[1]];

        // The older filing is already on disk
        let old = root.join("10K/aapl/2023-11-03.html");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, "kept").unwrap();

        let summary = downloader.download(&selected).await.unwrap();

        let new = root.join("10K/aapl/2024-11-01.html");
        assert_eq!(summary.saved, vec![new.clone()]);
        assert_eq!(summary.already_saved, 1);
        assert_eq!(summary.without_filings, vec![companies[1].clone()]);
        assert!(summary.failed.is_empty());

        // Raw bytes, not re-encoded
        assert_eq!(
            fs::read(&new).unwrap(),
            b"<html><body>FY2024 hedge \x92s</body></html>"
        );
        assert_eq!(fs::read_to_string(&old).unwrap(), "kept");
        assert!(!root.join("10K/aapl/2024-11-01.html.part").exists());
        assert!(!downloader.fetcher.requests.borrow().iter().any(|u| u == APPLE_2023));

        // Second run fetches no documents
        let again = downloader.download(&selected).await.unwrap();
        assert!(again.saved.is_empty());
        assert_eq!(again.already_saved, 2);

        fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_fail_out_list_feeds_back_in() {
        let root = scratch_dir("fail-out");
        let fail_out = root.join("fail_cik.txt");
        let downloader = Downloader::new(edgar_fixtures(), &root, &fail_out);
        let companies = downloader.ticker_index().await.unwrap();

        downloader
            .download(&[&companies[1], &companies[0]])
            .await
            .unwrap();

        let listed = fs::read_to_string(&fail_out).unwrap();
        assert_eq!(listed, format!("{}shell\t0000000999\n", FAIL_OUT_HEADER));

        let (retry, missing) = companies_from_list(&companies, &listed);
        assert_eq!(retry, vec![&companies[1]]);
        assert!(missing.is_empty());

        fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_failed_company_does_not_stop_the_batch() {
        let root = scratch_dir("failed");
        let downloader = Downloader::new(edgar_fixtures(), &root, root.join("fail_cik.txt"));
        let companies = downloader.ticker_index().await.unwrap();

        // ghost has no submissions document
        let summary = downloader
            .download(&[&companies[2], &companies[0]])
            .await
            .unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "ghost");
        assert!(summary.failed[0].1.contains("CIK0000000888.json returned HTTP 404"));
        assert_eq!(summary.saved.len(), 2);
        assert!(root.join("10K/aapl/2023-11-03.html").exists());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent("Jane Analyst jane@example.com").is_ok());
        assert!(validate_user_agent("Acme Research ops@acme.io").is_ok());
        assert!(validate_user_agent("").is_err());
        assert!(validate_user_agent("reqwest/0.12").is_err());
        assert!(validate_user_agent("jane@example.com").is_err());
        assert!(validate_user_agent("Jane jane@localhost").is_err());
        assert!(matches!(
            HttpFetcher::new("anonymous"),
            Err(DownloadError::UserAgent(_))
        ));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient(StatusCode::NOT_FOUND));
        assert!(!is_transient(StatusCode::FORBIDDEN));
    }
}
