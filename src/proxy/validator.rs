//! Validation of whole proxy lists
//!
//! Parses every descriptor, probes the valid ones with bounded concurrency
//! and waits for every probe before reporting. Working proxies are returned
//! in input order, whatever order the probes finished in.

use crate::proxy::checker::ProxyProbe;
use crate::proxy::models::ProxyCheckResult;
use crate::proxy::parser::{ParseError, ProxyParser};
use futures::stream::{self, StreamExt};
use std::future::pending;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Default number of probes in flight at once
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Everything a validation run produced
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of descriptors handed in
    pub total: usize,
    /// Descriptors that did not parse
    pub rejected: Vec<ParseError>,
    /// One verdict per probed proxy, in input order
    pub verdicts: Vec<ProxyCheckResult>,
    /// `user:pass@host:port` for each working proxy, in input order
    pub working: Vec<String>,
    /// Whether the run was cancelled before every proxy was launched
    pub cancelled: bool,
}

impl ValidationReport {
    pub fn parsed(&self) -> usize {
        self.total - self.rejected.len()
    }
}

/// Handle used to stop a running validation
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel_tx: tx }, rx)
    }

    /// Stop launching new probes. Probes already running finish on their own.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Resolves once cancellation is requested; never resolves if the handle is gone.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            pending::<()>().await;
        }
    }
}

/// Fans probes out over a proxy list and collects the verdicts
pub struct Validator<P> {
    probe: P,
    concurrency: usize,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl<P: ProxyProbe> Validator<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            concurrency: DEFAULT_CONCURRENCY,
            cancel_rx: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Validate descriptors and return the working ones
    pub async fn run<S: AsRef<str>>(&self, descriptors: &[S]) -> Vec<String> {
        self.validate(descriptors).await.working
    }

    /// Validate descriptors and return the full report
    #[instrument(skip(self, descriptors), fields(total = descriptors.len()))]
    pub async fn validate<S: AsRef<str>>(&self, descriptors: &[S]) -> ValidationReport {
        let (proxies, rejected) = ProxyParser::parse_lines(descriptors);
        for error in &rejected {
            warn!("{}", error);
        }

        let queued = proxies.len();
        info!(
            "Checking {} proxies ({} rejected), up to {} at a time",
            queued,
            rejected.len(),
            self.concurrency
        );

        let stop = match &self.cancel_rx {
            Some(rx) => futures::future::Either::Left(cancelled(rx.clone())),
            None => futures::future::Either::Right(pending::<()>()),
        };

        let mut checked = 0usize;
        let mut working = 0usize;
        let mut results: Vec<(usize, ProxyCheckResult)> = Vec::with_capacity(queued);

        let verdicts = stream::iter(proxies)
            .take_until(stop)
            .map(|(index, proxy)| async move { (index, self.probe.probe(&proxy).await) })
            .buffer_unordered(self.concurrency);
        futures::pin_mut!(verdicts);

        while let Some((index, result)) = verdicts.next().await {
            checked += 1;
            if result.is_working() {
                working += 1;
                info!(
                    "Working proxy: {} ({}/{} working, {}/{} checked)",
                    result.proxy().to_credential_string(),
                    working,
                    checked,
                    checked,
                    queued
                );
            }
            results.push((index, result));
        }

        let cancelled = checked < queued;
        if cancelled {
            warn!(
                "Validation cancelled after launching {} of {} proxies",
                checked, queued
            );
        }

        results.sort_by_key(|(index, _)| *index);
        let verdicts: Vec<ProxyCheckResult> = results.into_iter().map(|(_, r)| r).collect();
        let working = verdicts
            .iter()
            .filter(|r| r.is_working())
            .map(|r| r.proxy().to_credential_string())
            .collect();

        ValidationReport {
            total: descriptors.len(),
            rejected,
            verdicts,
            working,
            cancelled,
        }
    }
}
