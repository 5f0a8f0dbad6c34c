//! Analysis orchestration
//!
//! Two entry points share the same normalization and aggregation steps:
//!
//! - [`Orchestrator`]: drives live collaborators through the ordered phase
//!   list (fingerprint, network, behavior, optional email, aggregation). At
//!   most one run is active. The latest progress is published on a watch
//!   channel and every update is also sent on a broadcast channel, so
//!   listeners that need the full sequence can subscribe to events.
//! - [`evaluate_recorded`]: stateless replay of a recorded session, used by
//!   the CLI and for offline checks.

use crate::aggregator::aggregate;
use crate::behavior::{
    analyze_session_time, InteractionSample, InteractionTrace, MotionAnalyzer, MotionStats,
    ScrollAnalyzer, ScrollSample,
};
use crate::collectors::{DnsLeakProbe, EmailVerifier, FingerprintProvider, NetworkProvider};
use crate::config::AnalysisConfig;
use crate::email::{validate_address, EmailTiers};
use crate::error::AnalysisError;
use crate::normalizer::{NormalizedSignal, Normalizer, RawSignal};
use crate::types::{
    AggregateVerdict, DeviceFingerprint, DnsLeakReport, EmailReputation, NetworkInfo,
    PatternResult, ProxyReport, SignalCategory, SignalLabels, SignalTiers,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use uuid::Uuid;

// ============================================================================
// Run state and progress
// ============================================================================

/// Collection phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fingerprint,
    Network,
    Behavior,
    Email,
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Collecting(Phase),
    Aggregating,
    /// Display-only state published after a pipeline failure
    Error,
}

/// Progress update published while a run advances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub state: RunState,
    /// Completion percentage (0-100), non-decreasing within a run
    pub percent: u8,
    pub message: String,
}

impl Progress {
    fn new(state: RunState, percent: u8, message: impl Into<String>) -> Self {
        Self {
            state,
            percent,
            message: message.into(),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(RunState::Idle, 0, "Ready")
    }
}

// ============================================================================
// Analysis run
// ============================================================================

/// State of one analysis run: interaction buffers, collected tiers and labels
pub struct AnalysisRun {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    trace: InteractionTrace,
    tiers: SignalTiers,
    labels: SignalLabels,
    in_progress: bool,
}

impl AnalysisRun {
    /// Start a fresh run with empty buffers and all tiers `unknown`
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            trace: InteractionTrace::new(config.pointer_capacity, config.scroll_capacity),
            tiers: SignalTiers::default(),
            labels: SignalLabels::new(),
            in_progress: true,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn tiers(&self) -> &SignalTiers {
        &self.tiers
    }

    pub fn labels(&self) -> &SignalLabels {
        &self.labels
    }

    pub fn trace(&self) -> &InteractionTrace {
        &self.trace
    }

    /// Store a normalized signal in its slot
    pub fn apply(&mut self, signal: NormalizedSignal) {
        self.tiers.set(signal.category, signal.tier);
        self.labels.insert(signal.category, signal.label);
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn report(
        &self,
        behavior: BehaviorOutcome,
        email: Option<EmailReputation>,
        config: &AnalysisConfig,
    ) -> AnalysisReport {
        let verdict = aggregate(&self.tiers, email.as_ref(), &config.weights);
        AnalysisReport {
            run_id: self.run_id,
            started_at: self.started_at,
            completed_at: Utc::now(),
            tiers: self.tiers.clone(),
            labels: self.labels.clone(),
            mouse: behavior.mouse,
            scroll: behavior.scroll,
            session_time: behavior.session_time,
            motion: behavior.motion,
            email,
            verdict,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub tiers: SignalTiers,
    pub labels: SignalLabels,
    pub mouse: PatternResult,
    pub scroll: PatternResult,
    pub session_time: PatternResult,
    /// Pointer statistics, absent when the trace was too short
    pub motion: Option<MotionStats>,
    pub email: Option<EmailReputation>,
    pub verdict: AggregateVerdict,
}

impl AnalysisReport {
    pub fn to_json(&self, pretty: bool) -> Result<String, AnalysisError> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }
}

/// Outcome of a full-analysis request
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(Box<AnalysisReport>),
    /// Another run was active; nothing was started
    AlreadyRunning,
}

/// Result of an email check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCheck {
    pub reputation: EmailReputation,
    pub tiers: EmailTiers,
    /// Re-aggregated verdict, when a completed run was available
    pub verdict: Option<AggregateVerdict>,
}

// ============================================================================
// Shared phase steps
// ============================================================================

struct BehaviorOutcome {
    mouse: PatternResult,
    scroll: PatternResult,
    session_time: PatternResult,
    motion: Option<MotionStats>,
}

impl BehaviorOutcome {
    fn signals(&self) -> [NormalizedSignal; 3] {
        [
            (SignalCategory::Mouse, &self.mouse),
            (SignalCategory::Scroll, &self.scroll),
            (SignalCategory::SessionTime, &self.session_time),
        ]
        .map(|(category, result)| {
            NormalizedSignal::new(category, result.risk, result.pattern.clone())
        })
    }
}

fn analyze_behavior(
    pointer: &[InteractionSample],
    scroll: &[ScrollSample],
    elapsed_secs: Option<f64>,
    config: &AnalysisConfig,
) -> BehaviorOutcome {
    BehaviorOutcome {
        mouse: MotionAnalyzer::analyze(pointer, &config.motion),
        scroll: ScrollAnalyzer::analyze(scroll, &config.scroll),
        session_time: analyze_session_time(elapsed_secs, &config.timing),
        motion: MotionAnalyzer::stats(pointer, &config.motion),
    }
}

const FINGERPRINT_CATEGORIES: [SignalCategory; 5] = [
    SignalCategory::Fingerprint,
    SignalCategory::Canvas,
    SignalCategory::Webgl,
    SignalCategory::Audio,
    SignalCategory::DeviceMemory,
];

const LOOKUP_CATEGORIES: [SignalCategory; 3] = [
    SignalCategory::Ip,
    SignalCategory::Location,
    SignalCategory::Isp,
];

fn fingerprint_signals(fingerprint: Option<&DeviceFingerprint>) -> Vec<NormalizedSignal> {
    let Some(fp) = fingerprint else {
        return FINGERPRINT_CATEGORIES
            .into_iter()
            .map(Normalizer::failed)
            .collect();
    };

    let identifier = |category, value: Option<&str>| {
        Normalizer::normalize(RawSignal::Identifier { category, value })
    };
    vec![
        identifier(SignalCategory::Fingerprint, Some(fp.id.as_str())),
        identifier(SignalCategory::Canvas, fp.canvas.as_deref()),
        identifier(SignalCategory::Webgl, fp.webgl.as_deref()),
        identifier(SignalCategory::Audio, fp.audio.as_deref()),
        Normalizer::normalize(RawSignal::DeviceMemory(fp.device_memory_gb)),
    ]
}

fn consistency_signals(
    fingerprint: Option<&DeviceFingerprint>,
    info: Option<&NetworkInfo>,
) -> [NormalizedSignal; 2] {
    [
        Normalizer::normalize(RawSignal::Language {
            browser_language: fingerprint.and_then(|fp| fp.language.as_deref()),
            country_code: info.and_then(|i| i.country.as_deref()),
        }),
        Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: fingerprint.and_then(|fp| fp.timezone.as_deref()),
            network_timezone: info.and_then(|i| i.timezone.as_deref()),
        }),
    ]
}

/// Keep a collaborator failure local to its signal unless it is fatal
fn isolate<T>(check: &str, result: Result<T, AnalysisError>) -> Result<Option<T>, AnalysisError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            log::warn!("{} check failed: {}", check, e);
            Ok(None)
        }
    }
}

// ============================================================================
// Stateless replay
// ============================================================================

/// Collaborator results and interaction traces captured from one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedSession {
    pub fingerprint: Option<DeviceFingerprint>,
    /// Geolocation result; absent means the lookup returned nothing
    pub network: Option<NetworkInfo>,
    pub proxy: Option<ProxyReport>,
    pub dns_leak: Option<DnsLeakReport>,
    pub pointer: Vec<InteractionSample>,
    /// Scroll samples; gaps are recomputed from timestamps
    pub scroll: Vec<ScrollSample>,
    /// Elapsed session time at behavior analysis
    pub session_secs: Option<f64>,
    pub email: Option<EmailReputation>,
}

impl RecordedSession {
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Evaluate a recorded session (stateless, one-shot).
///
/// Samples are replayed through fresh bounded buffers, so traces longer
/// than the configured capacities keep only their most recent samples.
pub fn evaluate_recorded(session: &RecordedSession, config: &AnalysisConfig) -> AnalysisReport {
    let mut run = AnalysisRun::new(config);

    for signal in fingerprint_signals(session.fingerprint.as_ref()) {
        run.apply(signal);
    }
    for signal in Normalizer::network(session.network.as_ref()) {
        run.apply(signal);
    }
    run.apply(Normalizer::normalize(RawSignal::Proxy(session.proxy.as_ref())));
    run.apply(Normalizer::normalize(RawSignal::DnsLeak(session.dns_leak.as_ref())));
    for signal in consistency_signals(session.fingerprint.as_ref(), session.network.as_ref()) {
        run.apply(signal);
    }

    for sample in &session.pointer {
        run.trace.record_pointer(sample.x, sample.y, sample.timestamp_ms);
    }
    for sample in &session.scroll {
        run.trace.record_scroll(sample.scroll_position, sample.timestamp_ms);
    }
    let behavior = analyze_behavior(
        &run.trace.pointer_snapshot(),
        &run.trace.scroll_snapshot(),
        session.session_secs,
        config,
    );
    for signal in behavior.signals() {
        run.apply(signal);
    }

    run.in_progress = false;
    run.report(behavior, session.email.clone(), config)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// External collaborators used by the orchestrator
#[derive(Clone)]
pub struct Collaborators {
    pub fingerprint: Arc<dyn FingerprintProvider>,
    pub network: Arc<dyn NetworkProvider>,
    pub dns: Arc<dyn DnsLeakProbe>,
    pub email: Arc<dyn EmailVerifier>,
}

#[derive(Default)]
struct SharedState {
    state: RunState,
    run: Option<AnalysisRun>,
    email: Option<EmailReputation>,
    last_report: Option<AnalysisReport>,
}

fn lock_state(shared: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("analysis state lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Handle for page event listeners to append interaction samples.
///
/// Samples are only kept while a run is in progress.
#[derive(Clone)]
pub struct InteractionRecorder {
    shared: Arc<Mutex<SharedState>>,
}

impl InteractionRecorder {
    /// Append a pointer sample; returns whether it was kept
    pub fn record_pointer(&self, x: f64, y: f64, timestamp_ms: i64) -> bool {
        let mut shared = lock_state(&self.shared);
        match shared.run.as_mut() {
            Some(run) if run.in_progress => {
                run.trace.record_pointer(x, y, timestamp_ms);
                true
            }
            _ => false,
        }
    }

    /// Append a scroll sample; returns whether it was kept
    pub fn record_scroll(&self, scroll_position: f64, timestamp_ms: i64) -> bool {
        let mut shared = lock_state(&self.shared);
        match shared.run.as_mut() {
            Some(run) if run.in_progress => {
                run.trace.record_scroll(scroll_position, timestamp_ms);
                true
            }
            _ => false,
        }
    }
}

/// Buffered progress events per subscriber
const PROGRESS_EVENT_CAPACITY: usize = 32;

/// Single-flight driver for live analysis runs
pub struct Orchestrator {
    config: AnalysisConfig,
    collaborators: Collaborators,
    shared: Arc<Mutex<SharedState>>,
    progress: watch::Sender<Progress>,
    events: broadcast::Sender<Progress>,
}

/// Resets the shared state to idle unless disarmed.
///
/// Covers both a failed run and a run future dropped before completion.
struct RunGuard<'a> {
    orchestrator: &'a Orchestrator,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        {
            let mut shared = lock_state(&self.orchestrator.shared);
            if let Some(run) = shared.run.take() {
                log::warn!("analysis run {} aborted", run.run_id);
            }
            shared.state = RunState::Idle;
        }
        self.orchestrator
            .emit(Progress::new(RunState::Error, 0, "Analysis failed"));
    }
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, config: AnalysisConfig) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        let (events, _) = broadcast::channel(PROGRESS_EVENT_CAPACITY);
        Self {
            config,
            collaborators,
            shared: Arc::new(Mutex::new(SharedState::default())),
            progress,
            events,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Subscribe to the latest progress value
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Subscribe to every progress update published from now on
    pub fn subscribe_events(&self) -> broadcast::Receiver<Progress> {
        self.events.subscribe()
    }

    /// Handle for feeding pointer and scroll samples into the active run
    pub fn recorder(&self) -> InteractionRecorder {
        InteractionRecorder {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> RunState {
        lock_state(&self.shared).state
    }

    /// Report of the last completed run
    pub fn last_report(&self) -> Option<AnalysisReport> {
        lock_state(&self.shared).last_report.clone()
    }

    /// Email reputation attached to future aggregations
    pub fn email(&self) -> Option<EmailReputation> {
        lock_state(&self.shared).email.clone()
    }

    /// Run every phase and aggregate.
    ///
    /// Returns `AlreadyRunning` without touching any state when a run is
    /// active. A fatal collaborator error aborts the run, publishes the
    /// error state and resets to idle. Dropping the returned future before
    /// it completes does the same.
    pub async fn run_full_analysis(&self) -> Result<RunOutcome, AnalysisError> {
        {
            let mut shared = lock_state(&self.shared);
            if shared.state != RunState::Idle {
                log::info!("analysis already running ({:?}), request ignored", shared.state);
                return Ok(RunOutcome::AlreadyRunning);
            }
            let run = AnalysisRun::new(&self.config);
            log::info!("starting analysis run {}", run.run_id);
            shared.run = Some(run);
            shared.state = RunState::Collecting(Phase::Fingerprint);
        }
        let guard = RunGuard {
            orchestrator: self,
            armed: true,
        };

        match self.run_phases().await {
            Ok(report) => {
                guard.disarm();
                log::info!(
                    "analysis run {} complete: score {} ({})",
                    report.run_id,
                    report.verdict.score,
                    report.verdict.tier
                );
                Ok(RunOutcome::Completed(Box::new(report)))
            }
            Err(e) => {
                log::error!("analysis failed: {}", e);
                drop(guard);
                Err(e)
            }
        }
    }

    /// Verify an email address and attach the result.
    ///
    /// When idle after at least one completed run, the last report is
    /// re-aggregated with the new reputation; nothing is re-collected.
    pub async fn check_email(&self, address: &str) -> Result<EmailCheck, AnalysisError> {
        let address = validate_address(address)?;

        let reputation = self
            .collaborators
            .email
            .verify(&address)
            .await
            .map_err(|e| {
                log::warn!("email verification failed: {}", e);
                match e {
                    AnalysisError::Collection { .. } => e,
                    other => AnalysisError::collection("email", other.to_string()),
                }
            })?;
        let tiers = EmailTiers::from_reputation(&reputation);

        let verdict = {
            let mut shared = lock_state(&self.shared);
            shared.email = Some(reputation.clone());
            let idle = shared.state == RunState::Idle;
            match shared.last_report.as_mut() {
                Some(report) if idle => {
                    report.verdict = aggregate(&report.tiers, Some(&reputation), &self.config.weights);
                    report.email = Some(reputation.clone());
                    Some(report.verdict.clone())
                }
                _ => None,
            }
        };
        if let Some(verdict) = &verdict {
            log::info!("re-aggregated with email: score {} ({})", verdict.score, verdict.tier);
        }

        Ok(EmailCheck {
            reputation,
            tiers,
            verdict,
        })
    }

    async fn run_phases(&self) -> Result<AnalysisReport, AnalysisError> {
        let fingerprint_phase = RunState::Collecting(Phase::Fingerprint);
        self.publish(fingerprint_phase, 5, "Starting analysis");
        self.publish(fingerprint_phase, 10, "Collecting device fingerprint");
        let fingerprint = isolate("fingerprint", self.collaborators.fingerprint.collect().await)?;
        self.apply(fingerprint_signals(fingerprint.as_ref()));
        self.publish(fingerprint_phase, 25, "Fingerprint collected");

        let network_phase = RunState::Collecting(Phase::Network);
        self.publish(network_phase, 30, "Checking network");
        let info = match isolate("network info", self.collaborators.network.network_info().await)? {
            Some(info) => {
                self.apply(Normalizer::network(info.as_ref()));
                info
            }
            None => {
                self.apply(LOOKUP_CATEGORIES.map(Normalizer::failed));
                None
            }
        };

        let ip = info
            .as_ref()
            .map(|i| i.ip.as_str())
            .filter(|ip| !ip.is_empty());
        let (proxy, dns_leak) = match ip {
            Some(ip) => {
                let proxy = isolate("proxy", self.collaborators.network.check_proxy(ip).await)?;
                let dns_leak = self.observe_dns(ip).await?;
                (proxy, dns_leak)
            }
            None => {
                log::warn!("no public IP available, skipping proxy and DNS checks");
                (None, None)
            }
        };
        self.apply([
            Normalizer::normalize(RawSignal::Proxy(proxy.as_ref())),
            Normalizer::normalize(RawSignal::DnsLeak(dns_leak.as_ref())),
        ]);
        self.apply(consistency_signals(fingerprint.as_ref(), info.as_ref()));
        self.publish(network_phase, 70, "Network checks complete");

        let behavior_phase = RunState::Collecting(Phase::Behavior);
        self.publish(behavior_phase, 75, "Analyzing behavior");
        let (pointer, scroll, elapsed) = {
            let shared = lock_state(&self.shared);
            let run = shared.run.as_ref().ok_or_else(missing_run)?;
            (
                run.trace.pointer_snapshot(),
                run.trace.scroll_snapshot(),
                run.elapsed_secs(),
            )
        };
        let behavior = analyze_behavior(&pointer, &scroll, Some(elapsed), &self.config);
        self.apply(behavior.signals());
        self.publish(behavior_phase, 90, "Behavior analyzed");

        let has_email = lock_state(&self.shared).email.is_some();
        if has_email {
            self.publish(
                RunState::Collecting(Phase::Email),
                90,
                "Including email reputation",
            );
        }

        self.publish(RunState::Aggregating, 95, "Calculating risk score");
        let report = {
            let mut shared = lock_state(&self.shared);
            let email = shared.email.clone();
            let run = shared.run.as_mut().ok_or_else(missing_run)?;
            run.in_progress = false;
            let report = run.report(behavior, email, &self.config);
            shared.last_report = Some(report.clone());
            shared.state = RunState::Idle;
            report
        };
        self.emit(Progress::new(RunState::Idle, 100, "Analysis complete"));

        Ok(report)
    }

    /// Bound the probe by its window plus grace; expiry leaves DNS unknown
    async fn observe_dns(&self, ip: &str) -> Result<Option<DnsLeakReport>, AnalysisError> {
        let window = Duration::from_millis(self.config.dns_wait_ms);
        let deadline = window + Duration::from_millis(self.config.dns_grace_ms);

        match tokio::time::timeout(deadline, self.collaborators.dns.observe(ip, window)).await {
            Ok(result) => isolate("DNS leak", result),
            Err(_) => {
                log::warn!("DNS leak probe did not report within {:?}", deadline);
                Ok(None)
            }
        }
    }

    fn publish(&self, state: RunState, percent: u8, message: &str) {
        lock_state(&self.shared).state = state;
        log::debug!("{}% {}", percent, message);
        self.emit(Progress::new(state, percent, message));
    }

    fn emit(&self, progress: Progress) {
        self.progress.send_replace(progress.clone());
        // No event subscribers is fine
        let _ = self.events.send(progress);
    }

    fn apply(&self, signals: impl IntoIterator<Item = NormalizedSignal>) {
        let mut shared = lock_state(&self.shared);
        if let Some(run) = shared.run.as_mut() {
            for signal in signals {
                run.apply(signal);
            }
        }
    }
}

fn missing_run() -> AnalysisError {
    AnalysisError::Pipeline("no active analysis run".to_string())
}
