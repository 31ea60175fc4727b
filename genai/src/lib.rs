//! Minimal generative-AI client.
//!
//! This crate provides two focused clients:
//! - [`Claude`] for the Messages API, including forced structured output
//!   via [`Claude::extract`]
//! - [`ImageClient`] for OpenAI-compatible image generation
//!
//! Structured output is described by the [`Schema`] trait, normally
//! implemented with `#[derive(Schema)]`.

// Lets the derive's `::genai::` paths resolve inside this crate's own tests.
extern crate self as genai;

mod images;
mod messages;

pub use genai_macros::Schema;
pub use images::{Image, ImageClient, DEFAULT_IMAGE_MODEL};
pub use messages::{Claude, Request, Response, StopReason, Tool, ToolCall, Usage, DEFAULT_MODEL};

use thiserror::Error;

/// Errors that can occur when talking to a generative service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A type with a JSON schema the model can be asked to fill in.
pub trait Schema {
    /// Name of the tool the model is forced to call.
    fn schema_name() -> &'static str;

    /// Description shown to the model, taken from the type's doc comment.
    fn schema_description() -> &'static str;

    /// The JSON schema of the type.
    fn json_schema() -> serde_json::Value;
}

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    /// Severity of a finding.
    #[derive(Schema, Deserialize, Debug, PartialEq)]
    enum Severity {
        Low,
        High,
    }

    /// A single finding.
    #[derive(Schema, Deserialize)]
    struct Finding {
        /// Kind of finding
        #[serde(rename = "type")]
        kind: String,
        severity: Severity,
    }

    /// Record the findings of a scan
    #[derive(Schema, Deserialize)]
    #[schema(name = "record_scan")]
    #[serde(rename_all = "camelCase")]
    struct ScanReport {
        /// Overall score
        #[schema(min = 0, max = 100)]
        overall_score: u8,
        findings: Vec<Finding>,
        note: Option<String>,
    }

    #[test]
    fn test_schema_name_and_description() {
        assert_eq!(ScanReport::schema_name(), "record_scan");
        assert_eq!(
            ScanReport::schema_description(),
            "Record the findings of a scan"
        );
        assert_eq!(Finding::schema_name(), "finding");
    }

    #[test]
    fn test_struct_schema() {
        let schema = ScanReport::json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["overallScore"]["type"], "integer");
        assert_eq!(schema["properties"]["overallScore"]["maximum"], 100);
        let score = &schema["properties"]["overallScore"];
        assert_eq!(score["description"], "Overall score");
        assert_eq!(schema["properties"]["findings"]["type"], "array");

        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "overallScore"));
        assert!(required.iter().any(|v| v == "findings"));
        assert!(!required.iter().any(|v| v == "note"));
    }

    #[test]
    fn test_nested_schema() {
        let schema = ScanReport::json_schema();
        let item = &schema["properties"]["findings"]["items"];
        assert_eq!(item["type"], "object");
        assert_eq!(item["properties"]["type"]["type"], "string");
        assert_eq!(item["properties"]["severity"]["enum"][1], "High");
    }

    #[test]
    fn test_enum_schema() {
        let schema = Severity::json_schema();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["enum"].as_array().unwrap().len(), 2);
    }
}
