//! Inventions: the catalog records the hub stores.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Opaque identity of an invention.
///
/// Generated locally as a short base-36 token; unique within a hub's
/// collection at the time it is issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventionId(String);

impl InventionId {
    const LEN: usize = 9;
    const ALPHABET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    /// Draw a fresh random token.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let token = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.gen_range(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InventionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InventionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for InventionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an invention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Experimental,
    Prototype,
    Stable,
    Classified,
}

/// Upper bound of every score axis.
pub const MAX_SCORE: u8 = 100;

/// Clamp a raw value onto a score axis.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, MAX_SCORE as i64) as u8
}

/// A catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invention {
    pub id: InventionId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub status: Status,
    pub quantum_stability: u8,
    pub energy_output: u8,
    pub cyber_sync: u8,
    pub tags: Vec<String>,
    /// Researcher field notes.
    #[serde(default)]
    pub notes: String,
    /// Engagement counter; only ever incremented.
    #[serde(default)]
    pub resonance: u64,
    /// Hosted URL or `data:` URI of an attached visual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Content fields supplied when creating an invention.
///
/// Identity, status and scores are assigned by the hub.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl Draft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// How an invention came to exist; selects its score profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Synthesis,
    Manifestation,
}

/// One score axis: either a fixed value or a half-open random range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreRule {
    Fixed(u8),
    Range(Range<u8>),
}

impl ScoreRule {
    pub fn sample(&self, rng: &mut impl Rng) -> u8 {
        match self {
            ScoreRule::Fixed(value) => (*value).min(MAX_SCORE),
            ScoreRule::Range(range) if range.is_empty() => range.start.min(MAX_SCORE),
            ScoreRule::Range(range) => rng.gen_range(range.clone()).min(MAX_SCORE),
        }
    }
}

/// Score policy for newly created inventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreProfile {
    pub quantum_stability: ScoreRule,
    pub energy_output: ScoreRule,
    pub cyber_sync: ScoreRule,
}

impl ScoreProfile {
    /// Inventions synthesized from text reports.
    pub fn synthesis() -> Self {
        Self {
            quantum_stability: ScoreRule::Range(60..90),
            energy_output: ScoreRule::Range(50..90),
            cyber_sync: ScoreRule::Range(70..90),
        }
    }

    /// Inventions manifested from generated images.
    pub fn manifestation() -> Self {
        Self {
            quantum_stability: ScoreRule::Fixed(85),
            energy_output: ScoreRule::Fixed(70),
            cyber_sync: ScoreRule::Fixed(90),
        }
    }

    /// Draw `(stability, output, sync)`.
    pub fn sample(&self, rng: &mut impl Rng) -> (u8, u8, u8) {
        (
            self.quantum_stability.sample(rng),
            self.energy_output.sample(rng),
            self.cyber_sync.sample(rng),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = InventionId::generate(&mut rng);
        assert_eq!(id.as_str().len(), 9);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_synthesis_profile_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let profile = ScoreProfile::synthesis();
        for _ in 0..500 {
            let (stability, output, sync) = profile.sample(&mut rng);
            assert!((60..90).contains(&stability));
            assert!((50..90).contains(&output));
            assert!((70..90).contains(&sync));
        }
    }

    #[test]
    fn test_manifestation_profile_is_fixed() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ScoreProfile::manifestation().sample(&mut rng), (85, 70, 90));
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-5), 0);
        assert_eq!(clamp_score(55), 55);
        assert_eq!(clamp_score(250), 100);
    }

    #[test]
    fn test_out_of_range_rules_are_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ScoreRule::Fixed(180).sample(&mut rng), 100);
        assert_eq!(ScoreRule::Range(120..120).sample(&mut rng), 100);
    }

    #[test]
    fn test_invention_wire_names() {
        let invention = Invention {
            id: "abc".into(),
            name: "Widget".into(),
            description: String::new(),
            category: "Gadget".into(),
            status: Status::Stable,
            quantum_stability: 1,
            energy_output: 2,
            cyber_sync: 3,
            tags: vec![],
            notes: String::new(),
            resonance: 0,
            image_url: None,
        };
        let value = serde_json::to_value(&invention).unwrap();
        assert_eq!(value["quantumStability"], 1);
        assert_eq!(value["energyOutput"], 2);
        assert_eq!(value["cyberSync"], 3);
        assert_eq!(value["status"], "Stable");
        assert!(value.get("imageUrl").is_none());
    }
}
