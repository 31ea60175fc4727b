//! Lab - drives content service requests into the hub.
//!
//! Each request kind has its own in-flight flag: a second request of the
//! same kind is refused while one is pending, but different kinds run
//! independently. The hub lock is only taken once a reply is in hand, so a
//! slow request never blocks other work. A failed request changes nothing.

use crate::hub::{Hub, HubError};
use crate::invention::{Draft, InventionId, Origin};
use crate::persist::KeyValueStore;
use crate::service::{AuditReport, ContentService, ServiceError, SynthesisFormat, SynthesisReply};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Errors from lab requests.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("A {0} request is already in flight")]
    InFlight(RequestKind),

    #[error("Content service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Hub error: {0}")]
    Hub(#[from] HubError),
}

/// The kinds of outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Synthesis,
    Audit,
    Manifestation,
}

impl RequestKind {
    fn index(self) -> usize {
        match self {
            RequestKind::Synthesis => 0,
            RequestKind::Audit => 1,
            RequestKind::Manifestation => 2,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Synthesis => "synthesis",
            RequestKind::Audit => "audit",
            RequestKind::Manifestation => "manifestation",
        })
    }
}

/// Fallbacks for blank fields in a synthesized report.
pub const UNTITLED: &str = "Untitled Discovery";
pub const UNCATEGORIZED: &str = "Classified Tech";
pub const DEFAULT_TAGS: [&str; 2] = ["CYBER", "QUANTUM"];

/// Category and tags of manifested inventions.
pub const MANIFESTATION_CATEGORY: &str = "Visual Asset";
pub const MANIFESTATION_TAGS: [&str; 3] = ["MANIFESTED", "VISUAL", "QUANTUM"];

/// Clears its flag when the request ends, however it ends.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Controller pairing a hub with a content service.
pub struct Lab<S> {
    hub: Mutex<Hub<S>>,
    service: Arc<dyn ContentService>,
    pending: [AtomicBool; 3],
    last_audit: Mutex<Option<AuditReport>>,
}

impl<S: KeyValueStore> Lab<S> {
    pub fn new(hub: Hub<S>, service: Arc<dyn ContentService>) -> Self {
        Self {
            hub: Mutex::new(hub),
            service,
            pending: Default::default(),
            last_audit: Mutex::new(None),
        }
    }

    /// Lock the hub for queries or direct mutations.
    pub async fn hub(&self) -> MutexGuard<'_, Hub<S>> {
        self.hub.lock().await
    }

    pub fn into_hub(self) -> Hub<S> {
        self.hub.into_inner()
    }

    /// Whether a request of this kind is awaiting its reply.
    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending[kind.index()].load(Ordering::SeqCst)
    }

    /// The most recent successful audit, cleared when a new audit starts.
    pub async fn last_audit(&self) -> Option<AuditReport> {
        self.last_audit.lock().await.clone()
    }

    /// Synthesize a report and file it as a new invention.
    pub async fn synthesize(
        &self,
        prompt: &str,
        format: &SynthesisFormat,
    ) -> Result<InventionId, LabError> {
        let prompt = non_empty(prompt)?;
        let _in_flight = self.begin(RequestKind::Synthesis)?;

        let reply = self
            .service
            .synthesize(prompt, format)
            .await
            .map_err(|e| failed(RequestKind::Synthesis, e))?;

        let id = self
            .hub
            .lock()
            .await
            .create_invention(draft_from_report(reply), Origin::Synthesis)?;
        Ok(id)
    }

    /// Audit a technology; success earns the configured essence reward.
    pub async fn audit(&self, subject: &str) -> Result<AuditReport, LabError> {
        let subject = non_empty(subject)?;
        let _in_flight = self.begin(RequestKind::Audit)?;
        *self.last_audit.lock().await = None;

        let report = self
            .service
            .audit(subject)
            .await
            .map_err(|e| failed(RequestKind::Audit, e))?;

        tracing::info!(
            risk = ?report.risk_level,
            findings = report.vulnerabilities.len(),
            "audit complete"
        );
        *self.last_audit.lock().await = Some(report.clone());

        let mut hub = self.hub.lock().await;
        let reward = hub.config().audit_reward;
        hub.credit_essence(reward)?;
        Ok(report)
    }

    /// Generate a visual and file it as a new invention.
    pub async fn manifest(&self, prompt: &str) -> Result<InventionId, LabError> {
        let prompt = non_empty(prompt)?;
        let _in_flight = self.begin(RequestKind::Manifestation)?;

        let image_url = self
            .service
            .manifest(prompt)
            .await
            .map_err(|e| failed(RequestKind::Manifestation, e))?;

        let draft = manifestation_draft(prompt, image_url);
        let id = self
            .hub
            .lock()
            .await
            .create_invention(draft, Origin::Manifestation)?;
        Ok(id)
    }

    fn begin(&self, kind: RequestKind) -> Result<InFlight<'_>, LabError> {
        let flag = &self.pending[kind.index()];
        if flag.swap(true, Ordering::SeqCst) {
            return Err(LabError::InFlight(kind));
        }
        Ok(InFlight { flag })
    }
}

fn non_empty(prompt: &str) -> Result<&str, LabError> {
    if prompt.trim().is_empty() {
        Err(LabError::EmptyPrompt)
    } else {
        Ok(prompt)
    }
}

fn failed(kind: RequestKind, error: ServiceError) -> LabError {
    tracing::warn!(%kind, error = %error, "request failed");
    LabError::Service(error)
}

/// Map a synthesized report onto invention content.
pub fn draft_from_report(reply: SynthesisReply) -> Draft {
    let or = |value: String, fallback: &str| {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value
        }
    };
    Draft {
        name: or(reply.title, UNTITLED),
        description: reply.content,
        category: or(reply.category, UNCATEGORIZED),
        tags: if reply.tags.is_empty() {
            DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
        } else {
            reply.tags
        },
        image_url: None,
    }
}

/// Content of an invention manifested from `prompt`.
pub fn manifestation_draft(prompt: &str, image_url: String) -> Draft {
    let lead = prompt.split(' ').take(3).collect::<Vec<_>>().join(" ");
    Draft {
        name: format!("Manifestation: {lead}..."),
        description: format!("Visual manifestation based on neural prompt: \"{prompt}\""),
        category: MANIFESTATION_CATEGORY.to_string(),
        tags: MANIFESTATION_TAGS.iter().map(|t| t.to_string()).collect(),
        image_url: Some(image_url),
    }
}
