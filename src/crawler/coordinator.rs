//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a run:
//! - Seeding the frontier with the canonical base URL
//! - Spawning `num_threads` workers that claim, fetch, extract and write pages
//! - Feeding accepted child links back into the frontier
//! - Stopping gracefully on request and summarizing the run

use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::parser::LinkCollector;
use crate::crawler::throttle::Throttle;
use crate::extract::{extract_with_base, ExtractError, ExtractedDocument};
use crate::output::{write_markdown_summary, CrawlSummary, FileSystemWriter, OutputWriter};
use crate::rules::CrawlScope;
use crate::state::{CrawlTask, Enqueue, Frontier, VisitOutcome};
use crate::SpiderError;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Requests a graceful stop of a running crawl
///
/// Cloneable and cheap; typically moved into a Ctrl-C handler. After `stop`
/// no new tasks are claimed, in-flight tasks finish, and [`Crawler::run`]
/// returns its summary.
#[derive(Debug, Clone)]
pub struct CrawlHandle {
    frontier: Arc<Frontier>,
}

impl CrawlHandle {
    pub fn stop(&self) {
        tracing::info!("Stop requested, letting in-flight pages finish");
        self.frontier.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.frontier.is_stopped()
    }
}

/// Main crawler structure
pub struct Crawler {
    scope: Arc<CrawlScope>,
    frontier: Arc<Frontier>,
    client: Client,
    writer: Arc<dyn OutputWriter>,
    num_threads: usize,
    max_depth: u32,
    max_children: Option<usize>,
    throttle: Duration,
    summary_path: Option<PathBuf>,
}

impl Crawler {
    /// Creates a crawler writing into `config.output_dir`
    ///
    /// Everything that can be checked up front is checked here, before any
    /// page is fetched.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(SpiderError)` - Invalid configuration or the output directory could not be created
    pub fn new(config: Config) -> Result<Self, SpiderError> {
        validate(&config)?;
        let writer = FileSystemWriter::new(&config.output_dir, config.force_overwrite)?;
        Self::with_writer(config, Arc::new(writer))
    }

    /// Creates a crawler that hands documents to `writer`
    pub fn with_writer(config: Config, writer: Arc<dyn OutputWriter>) -> Result<Self, SpiderError> {
        validate(&config)?;
        let scope = CrawlScope::from_config(&config)?;
        let client = build_http_client(&config)?;

        tracing::debug!(
            "Compiled {} path config(s) for seed {}",
            scope.rules().len(),
            scope.seed()
        );

        Ok(Self {
            scope: Arc::new(scope),
            frontier: Arc::new(Frontier::new(config.max_depth, config.max_pages)),
            client,
            writer,
            num_threads: config.num_threads,
            max_depth: config.max_depth,
            max_children: config.max_children_per_page,
            throttle: config.throttle_duration(),
            summary_path: config.summary_path,
        })
    }

    pub fn handle(&self) -> CrawlHandle {
        CrawlHandle {
            frontier: Arc::clone(&self.frontier),
        }
    }

    /// The run's frontier, for inspecting visit records
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.frontier)
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the frontier is drained with nothing in flight, the page
    /// cap is reached, or a stop was requested. Individual page failures are
    /// recorded in the summary and never end the run.
    pub async fn run(self) -> Result<CrawlSummary, SpiderError> {
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            "Starting crawl of {} with {} worker(s), max depth {}",
            self.scope.seed(),
            self.num_threads,
            self.max_depth
        );

        self.frontier
            .try_enqueue(CrawlTask::seed(self.scope.seed().clone()));

        let pages_written = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.num_threads);

        for id in 0..self.num_threads {
            let worker = Worker {
                id,
                scope: Arc::clone(&self.scope),
                frontier: Arc::clone(&self.frontier),
                client: self.client.clone(),
                writer: Arc::clone(&self.writer),
                throttle: Throttle::new(self.throttle),
                max_depth: self.max_depth,
                max_children: self.max_children,
                pages_written: Arc::clone(&pages_written),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task ended abnormally: {}", e);
            }
        }

        let mut summary = CrawlSummary::from_records(
            &self.frontier.records(),
            started_at,
            start.elapsed(),
            pages_written.load(Ordering::Relaxed),
        );
        summary.stopped = self.frontier.is_stopped();

        tracing::info!(
            "Crawl completed in {:?}: {} succeeded, {} failed, {} skipped",
            summary.duration,
            summary.succeeded,
            summary.failed,
            summary.skipped
        );

        if let Some(path) = &self.summary_path {
            match write_markdown_summary(&summary, path) {
                Ok(()) => tracing::info!("Wrote crawl summary to {}", path.display()),
                Err(e) => tracing::warn!("Failed to write crawl summary: {}", e),
            }
        }

        Ok(summary)
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    scope: Arc<CrawlScope>,
    frontier: Arc<Frontier>,
    client: Client,
    writer: Arc<dyn OutputWriter>,
    throttle: Throttle,
    max_depth: u32,
    max_children: Option<usize>,
    pages_written: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(mut self) {
        tracing::debug!("Worker {} started", self.id);
        let frontier = Arc::clone(&self.frontier);

        while let Some(task) = frontier.next_task().await {
            let started = Instant::now();
            let mut guard = MarkGuard::new(&frontier, &task.url);

            let outcome = self.process(&task).await;

            tracing::info!(
                url = %task.url,
                depth = task.depth,
                outcome = %outcome,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Processed page"
            );
            guard.mark(outcome);
        }

        tracing::debug!("Worker {} finished", self.id);
    }

    /// Processes one claimed task; every error becomes an outcome
    async fn process(&mut self, task: &CrawlTask) -> VisitOutcome {
        if task.depth > self.max_depth {
            return VisitOutcome::Skipped(format!(
                "depth {} exceeds max depth {}",
                task.depth, self.max_depth
            ));
        }

        self.throttle.wait().await;

        let page = match fetch_page(&self.client, &task.url).await {
            Ok(page) => page,
            Err(e) if e.is_skip() => return VisitOutcome::Skipped(e.to_string()),
            Err(e) => return VisitOutcome::Failed(e.to_string()),
        };

        if page.final_url != task.url {
            tracing::debug!("{} redirected to {}", task.url, page.final_url);
        }

        let (document, links) = self.analyze(&page.body, task, &page.final_url);

        let mut accepted = 0;
        for link in links {
            if self.frontier.try_enqueue(CrawlTask::child(link, task)) == Enqueue::Accepted {
                accepted += 1;
            }
        }
        tracing::debug!("Queued {} new link(s) from {}", accepted, task.url);

        let document = match document {
            Ok(document) => document,
            Err(e @ ExtractError::NoContentMatched { .. }) => {
                return VisitOutcome::Skipped(e.to_string())
            }
            Err(e) => return VisitOutcome::Failed(e.to_string()),
        };

        if let Some(title) = &document.title {
            tracing::debug!("Extracted '{}' from {}", title, task.url);
        }

        match self.writer.write(&document.output_path, &document.content) {
            Ok(write) => {
                if write.wrote() {
                    self.pages_written.fetch_add(1, Ordering::Relaxed);
                }
                tracing::debug!("{} {}", write, document.output_path);
                VisitOutcome::Success
            }
            Err(e) => VisitOutcome::Failed(e.to_string()),
        }
    }

    /// Collects child links and extracts the document
    ///
    /// Only links that will actually be crawled from this page are rewritten
    /// to local paths; a page at the depth limit has none. Kept synchronous:
    /// parsed HTML never lives across an await point.
    fn analyze(
        &self,
        body: &str,
        task: &CrawlTask,
        base: &Url,
    ) -> (Result<ExtractedDocument, ExtractError>, Vec<Url>) {
        let url = &task.url;
        let rule = self.scope.rule_for(url);
        tracing::debug!("Using '{}' for {}", rule.description, url);

        let links = LinkCollector {
            scope: &self.scope,
            ignore: &rule.ignore_selectors,
            max_children: self.max_children,
        }
        .collect(body, url, base);

        let local: &[Url] = if task.depth < self.max_depth { &links } else { &[] };
        let document = extract_with_base(body, rule, url, base, &self.scope, Some(local));

        (document, links)
    }
}

/// Guarantees a claimed task is marked exactly once
///
/// If a worker unwinds before marking, the task is recorded as failed so the
/// frontier's in-flight count still drops and the other workers can finish.
struct MarkGuard<'a> {
    frontier: &'a Frontier,
    url: &'a Url,
    marked: bool,
}

impl<'a> MarkGuard<'a> {
    fn new(frontier: &'a Frontier, url: &'a Url) -> Self {
        Self {
            frontier,
            url,
            marked: false,
        }
    }

    fn mark(&mut self, outcome: VisitOutcome) {
        self.marked = true;
        if let Err(e) = self.frontier.mark(self.url, outcome) {
            tracing::warn!("{}", e);
        }
    }
}

impl Drop for MarkGuard<'_> {
    fn drop(&mut self) {
        if !self.marked {
            let _ = self
                .frontier
                .mark(self.url, VisitOutcome::Failed("worker aborted".to_string()));
        }
    }
}
