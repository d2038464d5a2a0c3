//! Frontier and dedup store
//!
//! The frontier is the only state shared between workers. It owns the visit
//! records (the single answer to "has this URL been seen") and the queue of
//! tasks waiting to be claimed. All access goes through one mutex; waiting
//! workers are woken through a [`Notify`] whenever the queue or the number of
//! in-flight tasks changes.

use crate::state::page_state::{VisitOutcome, VisitRecord, VisitStatus};
use crate::SpiderError;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use url::Url;

/// A unit of work: one canonical URL at a given depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,

    /// Distance from the seed (seed = 0)
    pub depth: u32,

    /// Page the URL was discovered on
    pub parent: Option<Url>,
}

impl CrawlTask {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            parent: None,
        }
    }

    pub fn child(url: Url, parent: &CrawlTask) -> Self {
        Self {
            url,
            depth: parent.depth + 1,
            parent: Some(parent.url.clone()),
        }
    }
}

/// Result of [`Frontier::try_enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Accepted,
    AlreadySeen,
}

/// Result of a non-blocking claim attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A task was handed out and is now in flight
    Task(CrawlTask),

    /// Nothing queued right now, but in-flight work may still add tasks
    Wait,

    /// The crawl is over: queue drained, page cap reached, or stopped
    Done,
}

/// Tallies of visit records by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, VisitRecord>,

    /// Waiting tasks keyed by depth; the lowest depth is always served first
    queues: BTreeMap<u32, VecDeque<CrawlTask>>,

    /// Tasks claimed but not yet marked
    in_flight: usize,

    /// Claimed tasks that count against the page cap
    counted: usize,

    stopped: bool,
}

impl Inner {
    fn cap_reached(&self, max_pages: Option<usize>) -> bool {
        max_pages.is_some_and(|cap| self.counted >= cap)
    }

    fn pop_next(&mut self) -> Option<CrawlTask> {
        let mut entry = self.queues.first_entry()?;
        let task = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        task
    }

    fn queued(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

/// Shared, thread-safe frontier
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<Inner>,
    changed: Notify,

    /// Tasks deeper than this are handed out (so they can be recorded as
    /// skipped) but do not count against `max_pages`
    max_depth: u32,
    max_pages: Option<usize>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Deepest level that will actually be fetched
    /// * `max_pages` - Optional cap on the number of fetched pages
    pub fn new(max_depth: u32, max_pages: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            changed: Notify::new(),
            max_depth,
            max_pages,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking worker must not wedge the rest of the crawl
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `task.url` as seen and queues it, unless it was seen before
    ///
    /// The lookup and the insert happen under one lock, so two workers
    /// offering the same URL can never both get [`Enqueue::Accepted`].
    pub fn try_enqueue(&self, task: CrawlTask) -> Enqueue {
        {
            let mut inner = self.lock();
            let key = task.url.as_str();
            if inner.records.contains_key(key) {
                return Enqueue::AlreadySeen;
            }

            inner
                .records
                .insert(key.to_string(), VisitRecord::pending(key, task.depth));
            inner.queues.entry(task.depth).or_default().push_back(task);
        }

        self.changed.notify_waiters();
        Enqueue::Accepted
    }

    /// Hands out the next task without waiting
    ///
    /// Tasks come out breadth-first: every queued task at depth `d` is handed
    /// out before any task at depth `d + 1`, in the order they were accepted.
    pub fn claim(&self) -> Claim {
        let mut inner = self.lock();

        if inner.stopped || inner.cap_reached(self.max_pages) {
            return Claim::Done;
        }

        let Some(task) = inner.pop_next() else {
            return if inner.in_flight == 0 {
                Claim::Done
            } else {
                Claim::Wait
            };
        };

        inner.in_flight += 1;
        if task.depth <= self.max_depth {
            inner.counted += 1;
        }
        if let Some(record) = inner.records.get_mut(task.url.as_str()) {
            record.attempts += 1;
        }

        Claim::Task(task)
    }

    /// Waits for the next task
    ///
    /// Returns `None` once the queue is empty with nothing in flight, the page
    /// cap has been reached, or [`stop`](Self::stop) was called.
    pub async fn next_task(&self) -> Option<CrawlTask> {
        loop {
            // Register interest before checking so a wake-up between the
            // check and the await is not lost
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.claim() {
                Claim::Task(task) => return Some(task),
                Claim::Done => return None,
                Claim::Wait => notified.await,
            }
        }
    }

    /// Records the terminal outcome for `url`
    ///
    /// Only a pending record may be marked; anything else is an
    /// [`SpiderError::InvalidTransition`].
    pub fn mark(&self, url: &Url, outcome: VisitOutcome) -> Result<(), SpiderError> {
        {
            let mut inner = self.lock();
            let record = inner.records.get_mut(url.as_str()).ok_or_else(|| {
                SpiderError::InvalidTransition {
                    url: url.to_string(),
                    from: VisitStatus::Pending,
                    to: outcome.status(),
                }
            })?;

            if record.status != VisitStatus::Pending {
                return Err(SpiderError::InvalidTransition {
                    url: url.to_string(),
                    from: record.status,
                    to: outcome.status(),
                });
            }

            let was_claimed = record.attempts > 0;
            record.status = outcome.status();
            record.reason = outcome.reason().map(str::to_string);

            if was_claimed {
                inner.in_flight = inner.in_flight.saturating_sub(1);
            }
        }

        self.changed.notify_waiters();
        Ok(())
    }

    /// Stops handing out tasks; in-flight tasks are left to finish
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.changed.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Returns a copy of the record for `url`, if it was ever seen
    pub fn record(&self, url: &Url) -> Option<VisitRecord> {
        self.lock().records.get(url.as_str()).cloned()
    }

    /// Returns a copy of every record, sorted by URL
    pub fn records(&self) -> Vec<VisitRecord> {
        let mut records: Vec<_> = self.lock().records.values().cloned().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    pub fn counts(&self) -> StatusCounts {
        let inner = self.lock();
        let mut counts = StatusCounts::default();
        for record in inner.records.values() {
            match record.status {
                VisitStatus::Pending => counts.pending += 1,
                VisitStatus::Success => counts.success += 1,
                VisitStatus::Failed => counts.failed += 1,
                VisitStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    pub fn queued(&self) -> usize {
        self.lock().queued()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn task(url: &str, depth: u32) -> CrawlTask {
        CrawlTask {
            url: Url::parse(url).unwrap(),
            depth,
            parent: None,
        }
    }

    fn claimed(frontier: &Frontier) -> CrawlTask {
        match frontier.claim() {
            Claim::Task(task) => task,
            other => panic!("expected a task, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_enqueue_rejected() {
        let frontier = Frontier::new(3, None);
        assert_eq!(frontier.try_enqueue(task("https://ex.com/a", 1)), Enqueue::Accepted);
        assert_eq!(frontier.try_enqueue(task("https://ex.com/a", 2)), Enqueue::AlreadySeen);
        assert_eq!(frontier.queued(), 1);
        assert_eq!(frontier.record(&Url::parse("https://ex.com/a").unwrap()).unwrap().depth, 1);
    }

    #[test]
    fn test_marked_url_stays_seen() {
        let frontier = Frontier::new(3, None);
        frontier.try_enqueue(task("https://ex.com/", 0));
        let t = claimed(&frontier);
        frontier.mark(&t.url, VisitOutcome::Success).unwrap();

        assert_eq!(frontier.try_enqueue(task("https://ex.com/", 1)), Enqueue::AlreadySeen);
    }

    #[test]
    fn test_breadth_first_claim_order() {
        let frontier = Frontier::new(3, None);
        frontier.try_enqueue(task("https://ex.com/deep", 2));
        frontier.try_enqueue(task("https://ex.com/a", 1));
        frontier.try_enqueue(task("https://ex.com/b", 1));

        assert_eq!(claimed(&frontier).url.path(), "/a");
        assert_eq!(claimed(&frontier).url.path(), "/b");
        assert_eq!(claimed(&frontier).url.path(), "/deep");
    }

    #[test]
    fn test_claim_waits_while_work_in_flight() {
        let frontier = Frontier::new(3, None);
        assert_eq!(frontier.claim(), Claim::Done);

        frontier.try_enqueue(task("https://ex.com/", 0));
        let t = claimed(&frontier);
        assert_eq!(frontier.claim(), Claim::Wait);
        assert_eq!(frontier.in_flight(), 1);

        frontier.mark(&t.url, VisitOutcome::Success).unwrap();
        assert_eq!(frontier.claim(), Claim::Done);
        assert_eq!(frontier.in_flight(), 0);
    }

    #[test]
    fn test_mark_only_from_pending() {
        let frontier = Frontier::new(3, None);
        frontier.try_enqueue(task("https://ex.com/", 0));
        let t = claimed(&frontier);

        frontier
            .mark(&t.url, VisitOutcome::Failed("HTTP 500".to_string()))
            .unwrap();
        let err = frontier.mark(&t.url, VisitOutcome::Success).unwrap_err();
        assert!(matches!(
            err,
            SpiderError::InvalidTransition {
                from: VisitStatus::Failed,
                to: VisitStatus::Success,
                ..
            }
        ));

        let record = frontier.record(&t.url).unwrap();
        assert_eq!(record.status, VisitStatus::Failed);
        assert_eq!(record.reason.as_deref(), Some("HTTP 500"));
        assert_eq!(record.attempts, 1);
    }

    #[test]
    fn test_mark_unknown_url_is_error() {
        let frontier = Frontier::new(3, None);
        let url = Url::parse("https://ex.com/nowhere").unwrap();
        assert!(frontier.mark(&url, VisitOutcome::Success).is_err());
    }

    #[test]
    fn test_page_cap_stops_claims() {
        let frontier = Frontier::new(3, Some(2));
        for path in ["a", "b", "c"] {
            frontier.try_enqueue(task(&format!("https://ex.com/{}", path), 1));
        }

        claimed(&frontier);
        claimed(&frontier);
        assert_eq!(frontier.claim(), Claim::Done);
        assert_eq!(frontier.queued(), 1);
    }

    #[test]
    fn test_too_deep_tasks_do_not_count_against_cap() {
        let frontier = Frontier::new(1, Some(1));
        frontier.try_enqueue(task("https://ex.com/deep", 2));
        frontier.try_enqueue(task("https://ex.com/a", 1));

        assert_eq!(claimed(&frontier).depth, 1);
        assert_eq!(frontier.claim(), Claim::Done);

        let frontier = Frontier::new(1, Some(1));
        frontier.try_enqueue(task("https://ex.com/deep", 2));
        assert_eq!(claimed(&frontier).depth, 2);
        frontier.try_enqueue(task("https://ex.com/b", 1));
        assert_eq!(claimed(&frontier).depth, 1);
    }

    #[test]
    fn test_stop_ends_claims() {
        let frontier = Frontier::new(3, None);
        frontier.try_enqueue(task("https://ex.com/", 0));
        frontier.stop();
        assert!(frontier.is_stopped());
        assert_eq!(frontier.claim(), Claim::Done);
    }

    #[test]
    fn test_counts() {
        let frontier = Frontier::new(3, None);
        frontier.try_enqueue(task("https://ex.com/a", 0));
        frontier.try_enqueue(task("https://ex.com/b", 0));
        frontier.try_enqueue(task("https://ex.com/c", 0));

        let a = claimed(&frontier);
        let b = claimed(&frontier);
        frontier.mark(&a.url, VisitOutcome::Success).unwrap();
        frontier
            .mark(&b.url, VisitOutcome::Skipped("non-HTML".to_string()))
            .unwrap();

        let counts = frontier.counts();
        assert_eq!(counts.success, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.failed, 0);
    }

    #[test]
    fn test_concurrent_enqueue_accepts_once() {
        let frontier = Arc::new(Frontier::new(3, None));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| {
                            frontier.try_enqueue(task(&format!("https://ex.com/{}", i), 1))
                                == Enqueue::Accepted
                        })
                        .count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 100);
        assert_eq!(frontier.queued(), 100);
    }

    #[tokio::test]
    async fn test_next_task_wakes_on_enqueue() {
        let frontier = Arc::new(Frontier::new(3, None));
        frontier.try_enqueue(task("https://ex.com/", 0));
        let root = frontier.next_task().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task().await })
        };

        tokio::task::yield_now().await;
        frontier.try_enqueue(task("https://ex.com/child", 1));
        frontier.mark(&root.url, VisitOutcome::Success).unwrap();

        let child = waiter.await.unwrap().unwrap();
        assert_eq!(child.url.path(), "/child");
    }

    #[tokio::test]
    async fn test_next_task_ends_when_drained() {
        let frontier = Arc::new(Frontier::new(3, None));
        frontier.try_enqueue(task("https://ex.com/", 0));
        let root = frontier.next_task().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task().await })
        };

        tokio::task::yield_now().await;
        frontier.mark(&root.url, VisitOutcome::Success).unwrap();

        assert!(waiter.await.unwrap().is_none());
    }
}
