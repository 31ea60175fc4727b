//! Configuration for the hub and its content service.

use crate::invention::{Origin, ScoreProfile};
use crate::persist::STORAGE_KEY;

/// Essence credited for each completed audit.
pub const AUDIT_REWARD: u64 = 75;

/// Configuration for a [`Hub`](crate::Hub).
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Store key the snapshot lives under.
    pub storage_key: String,

    /// Essence credited when an audit succeeds.
    pub audit_reward: u64,

    /// Scores for inventions synthesized from reports.
    pub synthesis_scores: ScoreProfile,

    /// Scores for inventions manifested from images.
    pub manifestation_scores: ScoreProfile,

    /// Seed for identity and score generation; entropy when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            audit_reward: AUDIT_REWARD,
            synthesis_scores: ScoreProfile::synthesis(),
            manifestation_scores: ScoreProfile::manifestation(),
            rng_seed: None,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the snapshot under a different key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the audit reward.
    pub fn with_audit_reward(mut self, reward: u64) -> Self {
        self.audit_reward = reward;
        self
    }

    /// Replace the score policy for one origin.
    pub fn with_scores(mut self, origin: Origin, profile: ScoreProfile) -> Self {
        match origin {
            Origin::Synthesis => self.synthesis_scores = profile,
            Origin::Manifestation => self.manifestation_scores = profile,
        }
        self
    }

    /// Make identities and scores reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Score policy for inventions of the given origin.
    pub fn scores_for(&self, origin: Origin) -> &ScoreProfile {
        match origin {
            Origin::Synthesis => &self.synthesis_scores,
            Origin::Manifestation => &self.manifestation_scores,
        }
    }
}

/// Model used for security audits.
pub const DEFAULT_AUDIT_MODEL: &str = "claude-3-5-haiku-20241022";

/// Configuration for [`GenAiService`](crate::service::GenAiService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Model for security audits.
    pub audit_model: String,

    /// Model for report synthesis.
    pub synthesis_model: String,

    /// Maximum tokens per structured reply.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            audit_model: DEFAULT_AUDIT_MODEL.to_string(),
            synthesis_model: genai::DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: None,
        }
    }
}

impl ServiceConfig {
    /// Defaults, with `HUB_AUDIT_MODEL` and `HUB_SYNTHESIS_MODEL` applied
    /// when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("HUB_AUDIT_MODEL") {
            config.audit_model = model;
        }
        if let Ok(model) = std::env::var("HUB_SYNTHESIS_MODEL") {
            config.synthesis_model = model;
        }
        config
    }

    pub fn with_audit_model(mut self, model: impl Into<String>) -> Self {
        self.audit_model = model.into();
        self
    }

    pub fn with_synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.synthesis_model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invention::ScoreRule;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.storage_key, "quantum_cyber_hub_v3");
        assert_eq!(config.audit_reward, 75);
        assert_eq!(
            config.scores_for(Origin::Manifestation),
            &ScoreProfile::manifestation()
        );
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_builders() {
        let fixed = ScoreProfile {
            quantum_stability: ScoreRule::Fixed(1),
            energy_output: ScoreRule::Fixed(2),
            cyber_sync: ScoreRule::Fixed(3),
        };
        let config = HubConfig::new()
            .with_storage_key("alt")
            .with_audit_reward(10)
            .with_scores(Origin::Synthesis, fixed.clone())
            .with_seed(9);
        assert_eq!(config.storage_key, "alt");
        assert_eq!(config.audit_reward, 10);
        assert_eq!(config.scores_for(Origin::Synthesis), &fixed);
        assert_eq!(config.rng_seed, Some(9));
    }

    #[test]
    fn test_service_config_builders() {
        let config = ServiceConfig::default()
            .with_audit_model("a")
            .with_synthesis_model("s")
            .with_max_tokens(512)
            .with_temperature(0.4);
        assert_eq!(config.audit_model, "a");
        assert_eq!(config.synthesis_model, "s");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, Some(0.4));
    }
}
