//! Batch enrichment: target → resolve → fetch → extract → score → ranked results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};
use uuid::Uuid;

use prospector_extractor::{Extractor, OpenRouterClient};
use prospector_fetcher::{ContentSource, HttpFetcher};
use prospector_shared::{AppConfig, EnrichmentResult, FetchConfig, IcpCriteria, PacingConfig, Result};

use crate::pacing::Pacer;
use crate::resolver::{DomainResolver, SlugResolver, resolve_target};
use crate::scoring;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called before a target is resolved.
    fn target_started(&self, _index: usize, _total: usize, _target: &str) {}
    /// Called once per target, in input order, after it is included or skipped.
    fn target_finished(&self, done: usize, total: usize);
}

/// No-op progress for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn target_finished(&self, _done: usize, _total: usize) {}
}

impl<F> BatchProgress for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn target_finished(&self, done: usize, total: usize) {
        self(done, total)
    }
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// A target that produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTarget {
    pub target: String,
    pub reason: String,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Identifier attached to the run's log span.
    pub run_id: Uuid,
    /// Results sorted by confidence, highest first; ties keep input order.
    pub results: Vec<EnrichmentResult>,
    pub skipped: Vec<SkippedTarget>,
    /// True when the run stopped early because it was cancelled.
    pub cancelled: bool,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The enrichment pipeline with its injected collaborators.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn ContentSource>,
    extractor: Extractor,
    resolver: Arc<dyn DomainResolver>,
    pacing: PacingConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        extractor: Extractor,
        resolver: Arc<dyn DomainResolver>,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            resolver,
            pacing,
        }
    }

    /// Wire the HTTP fetcher, OpenRouter extractor and slug resolver from config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(FetchConfig::from(config))?;
        let generator = OpenRouterClient::from_config(config)?;

        Ok(Self::new(
            Arc::new(fetcher),
            Extractor::new(Arc::new(generator)),
            Arc::new(SlugResolver),
            PacingConfig::from(config),
        ))
    }

    /// Override the pacing interval.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Enrich a single company name or URL.
    ///
    /// Unlike a batch, a target that cannot be resolved is reported as an error.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn enrich_one(&self, target: &str, icp: &IcpCriteria) -> Result<EnrichmentResult> {
        self.process_target(target, icp).await
    }

    /// Enrich every target and return results ranked by confidence.
    pub async fn enrich_batch(
        &self,
        targets: &[String],
        icp: &IcpCriteria,
        progress: &dyn BatchProgress,
    ) -> Vec<EnrichmentResult> {
        self.run_batch(targets, icp, progress, &CancellationToken::new())
            .await
            .results
    }

    /// Enrich every target, one at a time, until done or `cancel` fires.
    ///
    /// A failing target is logged and skipped; the batch itself never fails.
    /// Cancellation is honoured between targets and during pacing waits, and
    /// whatever was accumulated so far is returned, sorted.
    pub async fn run_batch(
        &self,
        targets: &[String],
        icp: &IcpCriteria,
        progress: &dyn BatchProgress,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let run_id = Uuid::now_v7();
        let span = info_span!("batch", %run_id, targets = targets.len());
        self.run_batch_inner(run_id, targets, icp, progress, cancel)
            .instrument(span)
            .await
    }

    async fn run_batch_inner(
        &self,
        run_id: Uuid,
        targets: &[String],
        icp: &IcpCriteria,
        progress: &dyn BatchProgress,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started = Instant::now();
        let total = targets.len();
        let mut pacer = Pacer::new(self.pacing);
        let mut results: Vec<EnrichmentResult> = Vec::with_capacity(total);
        let mut skipped: Vec<SkippedTarget> = Vec::new();
        let mut cancelled = false;

        if let Err(e) = icp.validate() {
            warn!(error = %e, "ICP size range is empty; no company will fit it");
        }

        info!(
            total,
            min_interval_ms = self.pacing.min_interval.as_millis() as u64,
            "starting batch"
        );

        for (index, target) in targets.iter().enumerate() {
            if !pacer.ready(cancel).await {
                cancelled = true;
                break;
            }

            progress.target_started(index, total, target);

            // Each target runs in its own task so a panic in any stage stays local.
            let pipeline = self.clone();
            let owned_target = target.clone();
            let owned_icp = icp.clone();
            let handle = tokio::spawn(async move {
                pipeline.process_target(&owned_target, &owned_icp).await
            });

            match handle.await {
                Ok(Ok(result)) => {
                    debug!(target = %target, confidence = result.confidence, "target scored");
                    results.push(result);
                }
                Ok(Err(e)) => {
                    warn!(target = %target, error = %e, "skipping target");
                    skipped.push(SkippedTarget {
                        target: target.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(target = %target, error = %e, "target task failed, skipping");
                    skipped.push(SkippedTarget {
                        target: target.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            progress.target_finished(index + 1, total);
        }

        sort_by_confidence(&mut results);

        let report = BatchReport {
            run_id,
            results,
            skipped,
            cancelled,
            elapsed: started.elapsed(),
        };

        info!(
            included = report.results.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            duration_ms = report.elapsed.as_millis() as u64,
            "batch completed"
        );

        report
    }

    /// Resolve, fetch, extract and score one target.
    async fn process_target(&self, target: &str, icp: &IcpCriteria) -> Result<EnrichmentResult> {
        let url = resolve_target(self.resolver.as_ref(), target).await?;
        let content = self.source.fetch(&url).await;
        let company = self.extractor.extract(&content, &url).await;
        let confidence = scoring::score(&company, icp);

        Ok(EnrichmentResult {
            company,
            confidence,
            target: target.to_string(),
            enriched_at: Utc::now(),
        })
    }
}

/// Stable sort, highest confidence first.
pub fn sort_by_confidence(results: &mut [EnrichmentResult]) {
    results.sort_by(|a, b| b.confidence.cmp(&a.confidence));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use prospector_extractor::{ChatMessage, OutputSchema, StructuredGenerator};
    use prospector_shared::{ExtractedCompany, ProspectorError};
    use serde_json::{Value, json};

    use super::*;

    /// Serves canned page text per URL; unknown URLs yield empty content.
    struct PageStub {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl PageStub {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, text)| (url.to_string(), text.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for PageStub {
        async fn fetch(&self, url: &str) -> String {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().unwrap_or_default()
        }
    }

    /// Looks up the payload by a marker line in the page text.
    struct PayloadStub {
        payloads: HashMap<String, Value>,
    }

    #[async_trait::async_trait]
    impl StructuredGenerator for PayloadStub {
        async fn generate_structured(
            &self,
            messages: &[ChatMessage],
            _schema: &OutputSchema,
        ) -> Result<Value> {
            let prompt = &messages.last().expect("user message").content;
            if prompt.contains("PANIC") {
                panic!("generator blew up");
            }
            self.payloads
                .iter()
                .find(|(marker, _)| prompt.contains(marker.as_str()))
                .map(|(_, payload)| payload.clone())
                .ok_or_else(|| ProspectorError::Extraction("model refused".into()))
        }
    }

    fn pipeline(pages: Arc<PageStub>, payloads: &[(&str, Value)]) -> Pipeline {
        let generator = PayloadStub {
            payloads: payloads
                .iter()
                .map(|(marker, payload)| (marker.to_string(), payload.clone()))
                .collect(),
        };
        Pipeline::new(
            pages,
            Extractor::new(Arc::new(generator)),
            Arc::new(SlugResolver),
            PacingConfig::unpaced(),
        )
    }

    fn targets(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    fn saas_icp() -> IcpCriteria {
        IcpCriteria {
            industries: vec!["SaaS".into()],
            company_size_min: Some(50),
            company_size_max: Some(500),
            ..Default::default()
        }
    }

    /// Records progress calls.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl BatchProgress for Recorder {
        fn target_finished(&self, done: usize, total: usize) {
            self.calls.lock().unwrap().push((done, total));
        }
    }

    #[tokio::test]
    async fn end_to_end_two_targets() {
        let pages = PageStub::new(&[
            ("https://www.acmecorp.com", "ACME Acme Corp sells SaaS billing. We're hiring."),
            ("https://contoso.example", "CONTOSO Contoso runs a bakery."),
        ]);
        let pipeline = pipeline(
            pages.clone(),
            &[
                (
                    "ACME",
                    json!({
                        "name": "Acme Corp", "industry": "B2B SaaS", "location": "Austin",
                        "employee_count": 120, "description": "Billing.", "products": [],
                        "services": [], "hiring_signals": ["We're hiring"],
                        "contact_email": "hi@acmecorp.com", "contact_phone": null
                    }),
                ),
                (
                    "CONTOSO",
                    json!({
                        "name": "Contoso", "industry": "Bakery", "location": "Lyon",
                        "employee_count": 8, "description": "Bread.", "products": ["Bread"],
                        "services": [], "hiring_signals": [],
                        "contact_email": null, "contact_phone": null
                    }),
                ),
            ],
        );
        let recorder = Recorder::default();

        let results = pipeline
            .enrich_batch(&targets(&["Acme Corp", "https://contoso.example"]), &saas_icp(), &recorder)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.confidence <= 100 && !r.company.name.is_empty()));
        assert!(results[0].confidence >= results[1].confidence);
        assert_eq!(results[0].company.name, "Acme Corp");
        assert_eq!(results[0].target, "Acme Corp");
        assert_eq!(results[0].confidence, 100);
        assert_eq!(results[1].confidence, 0);
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(1, 2), (2, 2)]);
        assert_eq!(
            *pages.requested.lock().unwrap(),
            vec!["https://www.acmecorp.com".to_string(), "https://contoso.example".to_string()]
        );
    }

    #[tokio::test]
    async fn extraction_failure_still_yields_a_result() {
        // Second page has content but the model refuses; fallback record is kept.
        let pages = PageStub::new(&[
            ("https://a.example", "MARK_A"),
            ("https://b.example", "no marker here"),
            ("https://c.example", "MARK_C"),
        ]);
        let payload = |name: &str| json!({"name": name, "hiring_signals": ["hiring"]});
        let pipeline = pipeline(pages, &[("MARK_A", payload("A")), ("MARK_C", payload("C"))]);
        let recorder = Recorder::default();

        let results = pipeline
            .enrich_batch(
                &targets(&["https://a.example", "https://b.example", "https://c.example"]),
                &IcpCriteria::default(),
                &recorder,
            )
            .await;

        assert_eq!(results.len(), 3);
        let names: Vec<&str> = results.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "b.example"]);
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn unresolvable_and_panicking_targets_are_skipped() {
        let pages = PageStub::new(&[("https://boom.example", "PANIC")]);
        let pipeline = pipeline(pages, &[]);
        let recorder = Recorder::default();

        let report = pipeline
            .run_batch(
                &targets(&["   ", "https://boom.example", "https://www.empty.example"]),
                &IcpCriteria::default(),
                &recorder,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].company.name, "empty.example");
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].target, "   ");
        assert!(report.skipped[0].reason.contains("resolution error"));
        assert_eq!(report.skipped[1].target, "https://boom.example");
        assert!(!report.cancelled);
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn ties_keep_input_order() {
        let pipeline = pipeline(PageStub::new(&[]), &[]);
        let input = targets(&[
            "https://one.example",
            "https://two.example",
            "https://three.example",
        ]);

        let results = pipeline
            .enrich_batch(&input, &IcpCriteria::default(), &SilentProgress)
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, vec!["one.example", "two.example", "three.example"]);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let result = |name: &str, confidence| EnrichmentResult {
            company: ExtractedCompany::minimal(name, "https://x.example"),
            confidence,
            target: name.to_string(),
            enriched_at: Utc::now(),
        };
        let mut results = vec![
            result("a", 40),
            result("b", 90),
            result("c", 40),
            result("d", 100),
            result("e", 90),
        ];
        sort_by_confidence(&mut results);
        let names: Vec<&str> = results.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, vec!["d", "b", "e", "a", "c"]);
    }

    #[tokio::test]
    async fn cancellation_returns_partial_sorted_results() {
        let pages = PageStub::new(&[]);
        let pipeline = pipeline(pages.clone(), &[]).with_pacing(PacingConfig {
            min_interval: Duration::from_secs(3_600),
        });
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let cancel_after_first = move |done: usize, _total: usize| {
            if done == 1 {
                trigger.cancel();
            }
        };

        let report = pipeline
            .run_batch(
                &targets(&["https://first.example", "https://second.example"]),
                &IcpCriteria::default(),
                &cancel_after_first,
                &cancel,
            )
            .await;

        assert!(report.cancelled);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].company.name, "first.example");
        assert_eq!(pages.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enrich_one_reports_resolution_errors() {
        let pipeline = pipeline(PageStub::new(&[]), &[]);

        let err = pipeline.enrich_one("", &IcpCriteria::default()).await.unwrap_err();
        assert!(matches!(err, ProspectorError::Resolution(_)));

        let result = pipeline
            .enrich_one("https://www.acme.io/about", &IcpCriteria::default())
            .await
            .unwrap();
        assert_eq!(result.company.name, "acme.io");
        assert_eq!(result.company.website, "https://www.acme.io/about");
    }

    #[tokio::test]
    async fn empty_batch_completes() {
        let pipeline = pipeline(PageStub::new(&[]), &[]);
        let report = pipeline
            .run_batch(&[], &IcpCriteria::default(), &SilentProgress, &CancellationToken::new())
            .await;
        assert!(report.results.is_empty());
        assert!(report.skipped.is_empty());
        assert!(!report.cancelled);
    }

    /// Resolves names from a fixed directory instead of guessing domains.
    struct DirectoryResolver {
        entries: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl DomainResolver for DirectoryResolver {
        async fn resolve(&self, name: &str) -> Result<String> {
            self.entries
                .get(name)
                .cloned()
                .ok_or_else(|| ProspectorError::Resolution(format!("'{name}' not in directory")))
        }
    }

    /// Records when each URL was fetched.
    #[derive(Default)]
    struct TimedPages {
        fetched: Mutex<Vec<(String, tokio::time::Instant)>>,
    }

    #[async_trait::async_trait]
    impl ContentSource for TimedPages {
        async fn fetch(&self, url: &str) -> String {
            self.fetched
                .lock()
                .unwrap()
                .push((url.to_string(), tokio::time::Instant::now()));
            String::new()
        }
    }

    #[tokio::test]
    async fn injected_resolver_and_pacing_drive_the_batch() {
        let interval = Duration::from_millis(120);
        let pages = Arc::new(TimedPages::default());
        let resolver = DirectoryResolver {
            entries: HashMap::from([
                ("Acme Corp".to_string(), "https://acme.example".to_string()),
                ("Globex".to_string(), "https://globex.example".to_string()),
            ]),
        };
        let generator = PayloadStub {
            payloads: HashMap::new(),
        };
        let pipeline = Pipeline::new(
            pages.clone(),
            Extractor::new(Arc::new(generator)),
            Arc::new(resolver),
            PacingConfig {
                min_interval: interval,
            },
        );

        let report = pipeline
            .run_batch(
                &targets(&["Acme Corp", "Initech", "Globex"]),
                &IcpCriteria::default(),
                &SilentProgress,
                &CancellationToken::new(),
            )
            .await;

        let names: Vec<&str> = report.results.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, vec!["acme.example", "globex.example"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].target, "Initech");

        let fetched = pages.fetched.lock().unwrap();
        let urls: Vec<&str> = fetched.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(urls, vec!["https://acme.example", "https://globex.example"]);
        // The unresolvable target still takes a paced slot between the two fetches.
        let gap = fetched[1].1 - fetched[0].1;
        assert!(gap >= interval * 2 - Duration::from_millis(10), "gap was {gap:?}");
    }
}
