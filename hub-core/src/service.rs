//! The boundary to the external generative service.
//!
//! [`ContentService`] is the capability the lab depends on. Replies are
//! parsed into typed records and validated here, so nothing unchecked
//! reaches the hub.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use genai::{Claude, Image, ImageClient, Request, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from the content service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Generative API error: {0}")]
    Api(#[from] genai::Error),

    #[error("Malformed reply: {0}")]
    Malformed(String),
}

/// Overall risk rating of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Schema)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A weakness found during an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Schema)]
pub struct Vulnerability {
    /// Short name of the vulnerability class
    #[serde(rename = "type")]
    pub kind: String,
    /// What the weakness is and how it could be exploited
    pub description: String,
    /// Recommended countermeasure
    pub mitigation: String,
}

/// Record the findings of a cybersecurity audit of a technology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Schema)]
#[schema(name = "record_security_audit")]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Overall risk rating
    pub risk_level: RiskLevel,
    /// Strength of the encryption involved, 0-100
    #[schema(min = 0, max = 100)]
    pub encryption_strength: u8,
    /// Overall integrity of the technology, 0-100
    #[schema(min = 0, max = 100)]
    pub integrity_score: u8,
    /// Identified vulnerabilities, most severe first
    pub vulnerabilities: Vec<Vulnerability>,
}

impl AuditReport {
    /// Check the bounds the schema asks the model to respect.
    pub fn validate(self) -> Result<Self, ServiceError> {
        for (field, value) in [
            ("encryptionStrength", self.encryption_strength),
            ("integrityScore", self.integrity_score),
        ] {
            if value > 100 {
                return Err(ServiceError::Malformed(format!(
                    "{field} out of range: {value}"
                )));
            }
        }
        Ok(self)
    }
}

/// Record a cybersecurity intelligence report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Schema)]
#[schema(name = "record_intelligence_report")]
pub struct SynthesisReply {
    /// A catchy title
    pub title: String,
    /// The detailed report body
    pub content: String,
    /// Technology category
    pub category: String,
    /// Relevant tags
    pub tags: Vec<String>,
}

/// Writing style requested for a synthesized report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SynthesisFormat {
    #[default]
    TacticalBrief,
    CommunityPost,
    TechnicalWhitepaper,
    Custom(String),
}

impl SynthesisFormat {
    /// The preset formats, in display order.
    pub const PRESETS: [SynthesisFormat; 3] = [
        SynthesisFormat::TacticalBrief,
        SynthesisFormat::CommunityPost,
        SynthesisFormat::TechnicalWhitepaper,
    ];

    pub fn label(&self) -> &str {
        match self {
            SynthesisFormat::TacticalBrief => "Tactical Brief",
            SynthesisFormat::CommunityPost => "Community Post",
            SynthesisFormat::TechnicalWhitepaper => "Technical Whitepaper",
            SynthesisFormat::Custom(label) => label,
        }
    }
}

impl fmt::Display for SynthesisFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for SynthesisFormat {
    fn from(label: &str) -> Self {
        Self::PRESETS
            .into_iter()
            .find(|preset| preset.label() == label)
            .unwrap_or_else(|| SynthesisFormat::Custom(label.to_string()))
    }
}

/// Capability for the three generative exchanges.
///
/// Each call is a single request/response; it either yields one validated
/// record or fails.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Analyze a technology for vulnerabilities.
    async fn audit(&self, subject: &str) -> Result<AuditReport, ServiceError>;

    /// Write an intelligence report in the given format.
    async fn synthesize(
        &self,
        prompt: &str,
        format: &SynthesisFormat,
    ) -> Result<SynthesisReply, ServiceError>;

    /// Generate a visual; returns an image URI.
    async fn manifest(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// [`ContentService`] backed by Claude for text and an image API for visuals.
#[derive(Clone)]
pub struct GenAiService {
    claude: Claude,
    images: ImageClient,
    config: ServiceConfig,
}

impl GenAiService {
    pub fn new(claude: Claude, images: ImageClient, config: ServiceConfig) -> Self {
        Self {
            claude,
            images,
            config,
        }
    }

    /// Build from `ANTHROPIC_API_KEY`, `IMAGE_API_KEY` and friends.
    pub fn from_env() -> Result<Self, ServiceError> {
        Ok(Self::new(
            Claude::from_env()?,
            ImageClient::from_env()?,
            ServiceConfig::from_env(),
        ))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn request(&self, model: &str, prompt: String) -> Request {
        let request = Request::prompt(prompt)
            .with_model(model)
            .with_max_tokens(self.config.max_tokens);
        match self.config.temperature {
            Some(temp) => request.with_temperature(temp),
            None => request,
        }
    }
}

/// Prompt for [`ContentService::audit`].
pub fn audit_prompt(subject: &str) -> String {
    format!(
        "Analyze the following technology for cybersecurity vulnerabilities: \"{subject}\".\n\
         Identify potential risks, describe them, and suggest mitigations.\n\
         Provide scores for encryption strength and overall integrity (0-100)."
    )
}

/// Prompt for [`ContentService::synthesize`].
pub fn synthesis_prompt(prompt: &str, format: &SynthesisFormat) -> String {
    format!(
        "Write a high-quality cybersecurity intelligence report based on: \"{prompt}\".\n\
         Format: {format}. Include a catchy title, detailed content, and relevant tags."
    )
}

#[async_trait]
impl ContentService for GenAiService {
    async fn audit(&self, subject: &str) -> Result<AuditReport, ServiceError> {
        let request = self.request(&self.config.audit_model, audit_prompt(subject));
        let report: AuditReport = self.claude.extract(request).await?;
        report.validate()
    }

    async fn synthesize(
        &self,
        prompt: &str,
        format: &SynthesisFormat,
    ) -> Result<SynthesisReply, ServiceError> {
        let request = self.request(
            &self.config.synthesis_model,
            synthesis_prompt(prompt, format),
        );
        Ok(self.claude.extract(request).await?)
    }

    async fn manifest(&self, prompt: &str) -> Result<String, ServiceError> {
        let image: Image = self.images.generate(prompt).await?;
        Ok(image.to_uri())
    }
}
