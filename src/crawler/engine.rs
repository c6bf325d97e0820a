//! Crawl engine - worker pool driver
//!
//! The driver loop owns the [`Frontier`]. Workers are tokio tasks that only
//! perform the request and hand the outcome back through a `JoinSet`; every
//! table update, link extraction and output row happens on the driver
//! between `.await` points.

use crate::config::{Config, ExtraColumn};
use crate::crawler::fetcher::{FetchMethod, FetchRequest, FetchResponse, Fetcher};
use crate::crawler::frontier::{Admission, Frontier};
use crate::crawler::parser::{extract_metadata, resolve_link, LinkExtractor};
use crate::output::{CrawlObserver, CrawlRow, CrawlStats};
use crate::state::{ContentType, FetchError, FetchSummary, VisitedRecord};
use crate::url::{Fingerprint, ParsedUrl};
use crate::MirrorError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// What a worker hands back to the driver
struct WorkerOutput {
    fingerprint: Fingerprint,
    url: String,
    outcome: Result<FetchResponse, FetchError>,
    elapsed: Duration,
}

/// Everything a finished (or interrupted) crawl produced
#[derive(Debug)]
pub struct CrawlReport {
    pub initial_url: String,
    pub stats: CrawlStats,
    /// Visited table in the order fetches started
    pub records: Vec<VisitedRecord>,
    /// Response bodies by fingerprint, kept only when an export is configured
    pub bodies: HashMap<Fingerprint, Vec<u8>>,
    pub interrupted: bool,
    /// URLs that were in flight when the crawl was interrupted
    pub incomplete: Vec<String>,
}

pub struct CrawlEngine<F: Fetcher> {
    fetcher: Arc<F>,
    frontier: Frontier,
    extractor: LinkExtractor,
    seed: String,
    max_workers: usize,
    remove_query_params: bool,
    extra_columns: Vec<ExtraColumn>,
    keep_bodies: bool,
    bodies: HashMap<Fingerprint, Vec<u8>>,
    observers: Vec<Box<dyn CrawlObserver>>,
}

impl<F: Fetcher> CrawlEngine<F> {
    pub fn new(config: &Config, fetcher: F) -> Result<Self, MirrorError> {
        Ok(Self {
            fetcher: Arc::new(fetcher),
            frontier: Frontier::from_config(config)?,
            extractor: LinkExtractor::new(&config.crawler.crawl_assets)?,
            seed: config.crawler.url.trim().to_string(),
            max_workers: config.crawler.max_workers.max(1),
            remove_query_params: config.crawler.remove_query_params,
            extra_columns: config.crawler.extra_columns.clone(),
            keep_bodies: config.export.is_some(),
            bodies: HashMap::new(),
            observers: Vec::new(),
        })
    }

    /// Registers an observer receiving one row per completed fetch
    pub fn add_observer(&mut self, observer: Box<dyn CrawlObserver>) {
        self.observers.push(observer);
    }

    /// Keeps response bodies (and fetches assets with GET) even without `[export]`
    pub fn keep_bodies(&mut self, keep: bool) {
        self.keep_bodies = keep;
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl until the queue drains or `shutdown` resolves
    ///
    /// On shutdown all in-flight requests are aborted and the returned
    /// statistics cover completed URLs only. Capacity errors end the crawl
    /// with an error.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<CrawlReport, MirrorError> {
        let started = Instant::now();
        tracing::info!(
            url = %self.seed,
            workers = self.max_workers,
            "Starting crawl"
        );

        let seed = self.seed.clone();
        self.frontier.enqueue_seed(&seed)?;

        let mut workers: JoinSet<WorkerOutput> = JoinSet::new();
        let mut interrupted = false;
        tokio::pin!(shutdown);

        self.refill(&mut workers).await?;

        while !workers.is_empty() {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::warn!(
                        in_flight = workers.len(),
                        "Crawl interrupted, aborting in-flight requests"
                    );
                    workers.abort_all();
                    interrupted = true;
                    break;
                }

                joined = workers.join_next() => {
                    match joined {
                        Some(Ok(output)) => self.handle_completion(output)?,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Worker task failed");
                            self.frontier.release_worker();
                        }
                        None => break,
                    }
                    self.refill(&mut workers).await?;
                }
            }
        }

        let stats = CrawlStats::from_records(self.frontier.records(), started, interrupted);
        for observer in &mut self.observers {
            observer.on_finish(&stats);
        }

        let incomplete: Vec<String> = self
            .frontier
            .in_flight()
            .map(|record| record.url.clone())
            .collect();

        tracing::info!(
            urls = stats.total_urls,
            elapsed = ?started.elapsed(),
            interrupted,
            "Crawl finished"
        );

        Ok(CrawlReport {
            initial_url: self.seed,
            stats,
            records: self.frontier.into_records(),
            bodies: self.bodies,
            interrupted,
            incomplete,
        })
    }

    /// Starts workers until the pool is full or the queue is empty
    async fn refill(&mut self, workers: &mut JoinSet<WorkerOutput>) -> Result<(), MirrorError> {
        while self.frontier.active_workers() < self.max_workers {
            let Some(entry) = self.frontier.pop_next()? else {
                break;
            };

            // the mirror needs asset bodies, so HEAD is only used without export
            let method = if self.keep_bodies {
                FetchMethod::Get
            } else {
                FetchMethod::for_url(&ParsedUrl::parse(&entry.url))
            };
            let request = FetchRequest {
                url: entry.url.clone(),
                method,
            };
            let fetcher = Arc::clone(&self.fetcher);

            workers.spawn(async move {
                let start = Instant::now();
                let outcome = fetcher.fetch(request).await;
                WorkerOutput {
                    fingerprint: entry.fingerprint,
                    url: entry.url,
                    outcome,
                    elapsed: start.elapsed(),
                }
            });

            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn handle_completion(&mut self, output: WorkerOutput) -> Result<(), MirrorError> {
        let WorkerOutput {
            fingerprint,
            url,
            outcome,
            elapsed,
        } = output;

        let summary = match outcome {
            Ok(response) => self.process_response(fingerprint, &url, response, elapsed)?,
            Err(error) => {
                tracing::debug!(url = %url, error = %error, "Request failed");
                FetchSummary::failed(error, elapsed)
            }
        };

        let row = CrawlRow {
            url,
            status: summary.status,
            elapsed: summary.elapsed,
            size: summary.size,
            content_type: summary.content_type,
            extras: summary.metadata.clone(),
            progress: (0, 0),
        };

        if self.frontier.complete(&fingerprint, summary).is_none() {
            return Ok(());
        }

        let row = CrawlRow {
            progress: (self.frontier.done_urls(), self.frontier.total_urls()),
            ..row
        };
        for observer in &mut self.observers {
            observer.on_row(&row);
        }
        Ok(())
    }

    fn process_response(
        &mut self,
        fingerprint: Fingerprint,
        url: &str,
        response: FetchResponse,
        elapsed: Duration,
    ) -> Result<FetchSummary, MirrorError> {
        let content_type =
            ContentType::from_header(response.content_type.as_deref().unwrap_or_default());

        let mut metadata = None;
        if response.is_html() && !response.body.is_empty() {
            let body = String::from_utf8_lossy(&response.body);
            self.enqueue_links(&body, url, fingerprint)?;
            metadata = extract_metadata(&body, &self.extra_columns);
        }

        let summary = FetchSummary {
            status: i32::from(response.status),
            elapsed,
            size: response.size,
            content_type,
            metadata,
        };

        if self.keep_bodies && !response.body.is_empty() {
            self.bodies.insert(fingerprint, response.body);
        }

        Ok(summary)
    }

    fn enqueue_links(
        &mut self,
        body: &str,
        page_url: &str,
        source: Fingerprint,
    ) -> Result<(), MirrorError> {
        let Ok(page) = Url::parse(page_url) else {
            return Ok(());
        };

        let links: Vec<String> = self
            .extractor
            .extract(body)
            .into_iter()
            .filter_map(|raw| {
                resolve_link(
                    raw,
                    &page,
                    self.frontier.initial_url(),
                    self.remove_query_params,
                )
            })
            .collect();

        let mut queued = 0;
        for link in &links {
            if self.frontier.enqueue(link, Some(source))? == Admission::Queued {
                queued += 1;
            }
        }
        tracing::debug!(url = page_url, found = links.len(), queued, "Links extracted");
        Ok(())
    }
}
