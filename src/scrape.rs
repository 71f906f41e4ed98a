//! IEEE Xplore scraping through a headless browser.
//!
//! The search results page is rendered client-side, so the pager drives a real
//! browser: load the results URL, wait for the result list, read it, then click
//! through the paginator until the last page. The browser sits behind the
//! [`BrowserSession`] trait so the paging logic can run against a scripted session
//! in tests.

use crate::chromium::{BrowserOptions, ChromiumSession};
use crate::error::{IeeeError, Result};
use crate::query::YearRange;
use crate::record::{Record, ResultEnvelope};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default IEEE Xplore search results page
pub const DEFAULT_SEARCH_URL: &str = "https://ieeexplore.ieee.org/search/searchresult.jsp";

/// How long to wait for results before deciding there are none
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// One result entry in the list
pub const RESULT_ITEMS: &str = "div.row.result-item.hide-mobile > div.col.result-item-align";

/// "Next page" link of the paginator
pub const NEXT_PAGE: &str = concat!(
    "div.ng-SearchResults.row > div.main-section > xpl-paginator > ",
    "div.pagination-bar.hide-mobile > ul > li.next-btn > a"
);

/// Page-index entries of the paginator
pub const PAGE_INDEXES: &str = concat!(
    "div.ng-SearchResults.row > div.main-section > xpl-paginator > ",
    "div.pagination-bar.hide-mobile > ul > ",
    "li:not(.prev-btn):not(.next-btn):not(.next-page-set)"
);

/// Browser operations the pager needs.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to `url` and wait for the load to complete.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` exists.
    ///
    /// Returns [`IeeeError::Timeout`] when `timeout` passes first.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Number of elements currently matching `selector`.
    async fn count_elements(&self, selector: &str) -> Result<usize>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Rendered HTML of the current page.
    async fn content(&self) -> Result<String>;

    /// Shut the browser down.
    async fn close(&self) -> Result<()>;
}

/// Options for a scraping run
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Results page URL (override for mirrors and tests)
    pub base_url: String,
    /// Bound on every wait for the result list
    pub timeout: Duration,
    /// Publication year filter
    pub years: Option<YearRange>,
    /// Browser launch settings
    pub browser: BrowserOptions,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: DEFAULT_WAIT_TIMEOUT,
            years: None,
            browser: BrowserOptions::default(),
        }
    }
}

/// Where the pager is in its walk over the result pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    NavigatePending,
    AwaitingResults,
    PageExtracted { page: usize, total_pages: usize },
    AwaitingNextPage { page: usize, total_pages: usize },
    Done,
    TimedOutEmpty,
}

/// Scrape every result page for `query` with a freshly launched Chromium.
///
/// # Errors
///
/// Returns error if the browser cannot start or any step after the first wait
/// fails. A first wait that times out yields an empty envelope instead.
pub async fn scrape(query: &str, options: &ScrapeOptions) -> Result<ResultEnvelope<Record>> {
    let session = ChromiumSession::launch(&options.browser).await?;
    let records = scrape_with(&session, query, options).await?;
    Ok(ResultEnvelope::from_records(records))
}

/// Run the pager on an existing session, closing it before returning.
pub async fn scrape_with<B: BrowserSession + ?Sized>(
    session: &B,
    query: &str,
    options: &ScrapeOptions,
) -> Result<Vec<Record>> {
    let outcome = ScrapingPager::new(session, options).run(query).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close browser");
    }

    outcome
}

/// Drives one session through the result pages.
pub struct ScrapingPager<'a, B: ?Sized> {
    session: &'a B,
    options: &'a ScrapeOptions,
    state: PagerState,
}

impl<'a, B: BrowserSession + ?Sized> ScrapingPager<'a, B> {
    pub fn new(session: &'a B, options: &'a ScrapeOptions) -> Self {
        Self {
            session,
            options,
            state: PagerState::NavigatePending,
        }
    }

    /// Current state, mainly for diagnostics.
    pub fn state(&self) -> PagerState {
        self.state
    }

    /// Walk all pages and return the records in display order.
    pub async fn run(&mut self, query: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        loop {
            self.state = match self.state {
                PagerState::NavigatePending => {
                    let url = build_search_url(&self.options.base_url, query, self.options.years)?;
                    info!(query = query, url = %url, "Starting IEEE Xplore scrape");
                    let navigation = self.session.navigate(url.as_str());
                    match tokio::time::timeout(self.options.timeout, navigation).await {
                        Ok(Ok(())) => PagerState::AwaitingResults,
                        Ok(Err(e)) if e.is_timeout() => PagerState::TimedOutEmpty,
                        Ok(Err(e)) => return Err(e),
                        Err(_) => {
                            debug!(timeout = ?self.options.timeout, "Navigation did not complete");
                            PagerState::TimedOutEmpty
                        }
                    }
                }
                PagerState::AwaitingResults => {
                    match self
                        .session
                        .wait_for_selector(RESULT_ITEMS, self.options.timeout)
                        .await
                    {
                        Ok(()) => {
                            records.extend(self.extract_page(1).await?);
                            let total_pages =
                                self.session.count_elements(PAGE_INDEXES).await?.max(1);
                            debug!(total_pages = total_pages, "Counted result pages");
                            PagerState::PageExtracted {
                                page: 1,
                                total_pages,
                            }
                        }
                        Err(e) if e.is_timeout() => PagerState::TimedOutEmpty,
                        Err(e) => return Err(e),
                    }
                }
                PagerState::PageExtracted { page, total_pages } => {
                    if page >= total_pages {
                        PagerState::Done
                    } else {
                        PagerState::AwaitingNextPage {
                            page: page + 1,
                            total_pages,
                        }
                    }
                }
                PagerState::AwaitingNextPage { page, total_pages } => {
                    self.session.click(NEXT_PAGE).await?;
                    self.session
                        .wait_for_selector(RESULT_ITEMS, self.options.timeout)
                        .await?;
                    records.extend(self.extract_page(page).await?);
                    PagerState::PageExtracted { page, total_pages }
                }
                PagerState::Done => {
                    info!(total = records.len(), "Scrape complete");
                    return Ok(records);
                }
                PagerState::TimedOutEmpty => {
                    info!("No result list appeared, treating as no results");
                    return Ok(Vec::new());
                }
            };
        }
    }

    async fn extract_page(&self, page: usize) -> Result<Vec<Record>> {
        let html = self.session.content().await?;
        let page_records = parse_result_items(&html)?;
        info!(page = page, count = page_records.len(), "Parsed results");
        Ok(page_records)
    }
}

/// Build the results page URL for `query`, optionally filtered by year.
pub fn build_search_url(base_url: &str, query: &str, years: Option<YearRange>) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| IeeeError::Config(format!("Invalid base URL: {}", e)))?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("queryText", query);
        if let Some(range) = years {
            params.append_pair("ranges", &format!("{}_{}_Year", range.start, range.end));
        }
    }

    Ok(url)
}

/// Parse a rendered results page into records.
pub fn parse_result_items(html: &str) -> Result<Vec<Record>> {
    let document = Html::parse_document(html);

    let item_selector = selector(RESULT_ITEMS)?;
    let title_selector = selector("h2 a, h3 a")?;
    let author_selector = selector("p.author a")?;
    let journal_selector = selector("div.description > a")?;
    let info_selector = selector("div.publisher-info-container")?;
    let abstract_selector = selector("div.js-displayer-content span, div.twist-container span")?;

    let year_regex = compile_regex(r"Year:\s*(\d{4})")?;
    let document_regex = compile_regex(r"/document/(\d+)")?;

    let mut results = Vec::new();

    for item in document.select(&item_selector) {
        let mut record = Record::default();

        if let Some(link) = item.select(&title_selector).next() {
            record.title = text_of(link);
            let href = link.value().attr("href").unwrap_or("");
            record.document_id = document_regex
                .captures(href)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
        }

        record.authors = item
            .select(&author_selector)
            .map(text_of)
            .filter(|name| !name.is_empty())
            .collect();

        if let Some(journal) = item.select(&journal_selector).next() {
            record.journal = text_of(journal);
        }

        if let Some(info) = item.select(&info_selector).next() {
            let info_text = info.text().collect::<String>();
            if let Some(year) = year_regex
                .captures(&info_text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
            {
                record.year = year;
            }
        }

        if let Some(abstract_elem) = item.select(&abstract_selector).next() {
            record.abstract_text = text_of(abstract_elem);
        }

        // Only add if we have a title
        if !record.title.is_empty() {
            results.push(record);
        }
    }

    Ok(results)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| IeeeError::Parse(e.to_string()))
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| IeeeError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
