//! EDGAR filing helpers
//!
//! Network-free pieces for locating 10-K documents: the ticker index, the
//! per-company submissions document, archive URLs and the local layout
//! `10K/{ticker}/{date}.html` that the default trigger watches.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{HighlightError, Result};

/// Ticker → CIK index published by the SEC
pub const TICKER_INDEX_URL: &str = "https://www.sec.gov/include/ticker.txt";

pub const EDGAR_ARCHIVE_BASE: &str = "https://www.sec.gov/Archives/edgar/data";

const SUBMISSIONS_BASE: &str = "https://data.sec.gov/submissions";

const ANNUAL_REPORT_FORM: &str = "10-K";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub ticker: String,
    /// Ten digits, zero-padded
    pub cik: String,
}

/// Zero-pad a CIK to ten digits
pub fn pad_cik(cik: &str) -> String {
    format!("{:0>10}", cik.trim())
}

/// Parse `ticker<TAB>cik` lines; lines without both fields are skipped
pub fn parse_ticker_index(text: &str) -> Vec<Company> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.trim().split('\t');
            let ticker = fields.next()?;
            let cik = fields.next()?;
            Some(Company {
                ticker: ticker.to_string(),
                cik: pad_cik(cik),
            })
        })
        .collect()
}

/// Look a company up by ticker (case-insensitive) or CIK (padded or not)
pub fn find_company<'a>(companies: &'a [Company], query: &str) -> Option<&'a Company> {
    let query = query.trim();
    let cik = pad_cik(query);
    companies
        .iter()
        .find(|c| c.ticker.eq_ignore_ascii_case(query) || c.cik == cik)
}

/// Resolve a batch list: one `ticker,cik` (or tab-separated) pair per line
///
/// A line matches on either field. Returns the matches in list order and
/// the tickers that matched nothing; lines without two fields are skipped.
pub fn companies_from_list<'a>(
    companies: &'a [Company],
    text: &str,
) -> (Vec<&'a Company>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line
            .trim()
            .split(|c| c == '\t' || c == ',')
            .map(str::trim)
            .collect();
        if fields.len() < 2 {
            continue;
        }

        let cik = pad_cik(fields[1]);
        match companies
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(fields[0]) || c.cik == cik)
        {
            Some(company) => found.push(company),
            None => missing.push(fields[0].to_string()),
        }
    }

    (found, missing)
}

/// Submissions document URL for a company
pub fn submissions_url(company: &Company) -> String {
    format!("{}/CIK{}.json", SUBMISSIONS_BASE, company.cik)
}

#[derive(Debug, Default, Deserialize)]
struct Submissions {
    name: Option<String>,
    #[serde(default)]
    filings: SubmissionFilings,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionFilings {
    #[serde(default)]
    recent: RecentFilings,
}

/// Column-oriented: index `i` across the arrays is one filing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RecentFilings {
    form: Vec<String>,
    primary_document: Vec<String>,
    filing_date: Vec<String>,
    accession_number: Vec<String>,
}

/// One 10-K filing in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filing {
    pub company_name: String,
    pub ticker: String,
    pub cik: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub primary_document: String,
    pub url: String,
}

impl Filing {
    /// `{root}/10K/{ticker}/{date}.html`
    pub fn local_path(&self, root: &Path) -> Result<PathBuf> {
        for (field, value) in [("ticker", &self.ticker), ("date", &self.date)] {
            if !is_path_segment(value) {
                return Err(HighlightError::Filing(format!(
                    "{} {:?} cannot be used as a file name",
                    field, value
                )));
            }
        }

        Ok(root
            .join("10K")
            .join(&self.ticker)
            .join(format!("{}.html", self.date)))
    }
}

/// Select the 10-K filings from a submissions document
///
/// A document without a company name yields no filings.
pub fn ten_k_filings(submissions_json: &str, company: &Company) -> Result<Vec<Filing>> {
    let submissions: Submissions = serde_json::from_str(submissions_json)?;

    let name = match submissions.name {
        Some(name) if !name.is_empty() => name,
        _ => {
            tracing::warn!(cik = %company.cik, "Submissions document has no company name");
            return Ok(Vec::new());
        }
    };

    let recent = submissions.filings.recent;
    let filings: Vec<Filing> = recent
        .form
        .iter()
        .enumerate()
        .filter(|(_, form)| form.as_str() == ANNUAL_REPORT_FORM)
        .filter_map(|(i, _)| {
            let document = recent.primary_document.get(i)?;
            let date = recent.filing_date.get(i)?;
            let accession = recent.accession_number.get(i)?.replace('-', "");
            if accession.is_empty() {
                return None;
            }

            Some(Filing {
                company_name: name.clone(),
                ticker: company.ticker.clone(),
                cik: company.cik.clone(),
                date: date.clone(),
                primary_document: document.clone(),
                url: format!(
                    "{}/{}/{}/{}",
                    EDGAR_ARCHIVE_BASE, company.cik, accession, document
                ),
            })
        })
        .collect();

    if filings.is_empty() {
        tracing::info!(ticker = %company.ticker, cik = %company.cik, "No 10-K filings found");
    }

    Ok(filings)
}

fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}
