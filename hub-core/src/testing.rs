//! Testing utilities for the hub.
//!
//! This module provides tools for integration testing:
//! - `MockService` for deterministic lab tests without API calls
//! - Sample records for scripting replies

use crate::lab::RequestKind;
use crate::service::{
    AuditReport, ContentService, RiskLevel, ServiceError, SynthesisFormat, SynthesisReply,
    Vulnerability,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// A content service that returns scripted replies.
///
/// Each request kind has its own queue, consumed in order. A scripted
/// failure surfaces as a network error; an exhausted queue as a malformed
/// reply.
#[derive(Default)]
pub struct MockService {
    audits: Mutex<VecDeque<Result<AuditReport, String>>>,
    syntheses: Mutex<VecDeque<Result<SynthesisReply, String>>>,
    visuals: Mutex<VecDeque<Result<String, String>>>,
    /// Prompts received, in order.
    prompts: Mutex<Vec<(RequestKind, String)>>,
    /// Requests of this kind wait for a permit before replying.
    gate: Option<(RequestKind, Arc<Semaphore>)>,
    calls: AtomicU32,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audit(mut self, report: AuditReport) -> Self {
        self.audits.get_mut().push_back(Ok(report));
        self
    }

    pub fn with_synthesis(mut self, reply: SynthesisReply) -> Self {
        self.syntheses.get_mut().push_back(Ok(reply));
        self
    }

    pub fn with_visual(mut self, uri: impl Into<String>) -> Self {
        self.visuals.get_mut().push_back(Ok(uri.into()));
        self
    }

    /// Script a failure for the next request of `kind`.
    pub fn with_failure(mut self, kind: RequestKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            RequestKind::Audit => self.audits.get_mut().push_back(Err(message)),
            RequestKind::Synthesis => self.syntheses.get_mut().push_back(Err(message)),
            RequestKind::Manifestation => self.visuals.get_mut().push_back(Err(message)),
        }
        self
    }

    /// Hold requests of `kind` until a permit is added to the returned
    /// semaphore, one permit per request.
    pub fn gated(mut self, kind: RequestKind) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some((kind, gate.clone()));
        (self, gate)
    }

    /// Total requests received, of any kind.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<(RequestKind, String)> {
        self.prompts.lock().await.clone()
    }

    async fn receive(&self, kind: RequestKind, prompt: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push((kind, prompt.to_string()));

        if let Some((gated, gate)) = &self.gate {
            if *gated == kind {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }
    }
}

fn reply<T>(next: Option<Result<T, String>>, kind: RequestKind) -> Result<T, ServiceError> {
    match next {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(ServiceError::Api(genai::Error::Network(message))),
        None => Err(ServiceError::Malformed(format!("no scripted {kind} reply"))),
    }
}

#[async_trait]
impl ContentService for MockService {
    async fn audit(&self, subject: &str) -> Result<AuditReport, ServiceError> {
        self.receive(RequestKind::Audit, subject).await;
        let next = self.audits.lock().await.pop_front();
        reply(next, RequestKind::Audit)
    }

    async fn synthesize(
        &self,
        prompt: &str,
        _format: &SynthesisFormat,
    ) -> Result<SynthesisReply, ServiceError> {
        self.receive(RequestKind::Synthesis, prompt).await;
        let next = self.syntheses.lock().await.pop_front();
        reply(next, RequestKind::Synthesis)
    }

    async fn manifest(&self, prompt: &str) -> Result<String, ServiceError> {
        self.receive(RequestKind::Manifestation, prompt).await;
        let next = self.visuals.lock().await.pop_front();
        reply(next, RequestKind::Manifestation)
    }
}

/// A plausible audit with one finding.
pub fn sample_audit() -> AuditReport {
    AuditReport {
        risk_level: RiskLevel::Medium,
        encryption_strength: 72,
        integrity_score: 64,
        vulnerabilities: vec![Vulnerability {
            kind: "Replay attack".to_string(),
            description: "Session tokens can be captured and reused".to_string(),
            mitigation: "Bind tokens to a nonce and expire them quickly".to_string(),
        }],
    }
}

/// A complete synthesized report.
pub fn sample_report(title: &str) -> SynthesisReply {
    SynthesisReply {
        title: title.to_string(),
        content: "A lattice of entangled relays that reroutes traffic around intrusions."
            .to_string(),
        category: "Networking".to_string(),
        tags: vec!["MESH".to_string(), "QUANTUM".to_string()],
    }
}
