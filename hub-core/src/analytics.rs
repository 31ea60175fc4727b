//! Deterministic mock analysis shown on an invention's detail view.
//!
//! The output depends only on the lengths of the identity and name, so the
//! same invention always shows the same confidence and suggestions.

/// Mitigation protocols the suggestions are drawn from.
pub const MITIGATIONS: [&str; 8] = [
    "Implement Layer-3 Encryption",
    "Deploy Quantum Firewalls",
    "Recalibrate Neural Uplink",
    "Enable Bio-metric Verification",
    "Isolate Sub-atomic Core",
    "Monitor Spectral Leakage",
    "Purge Buffer Overflows",
    "Sync Temporal Oscillators",
];

const BASE_CONFIDENCE: u32 = 75;
const CONFIDENCE_SPREAD: usize = 21;
const WINDOW_STARTS: usize = 4;
const WINDOW_LEN: usize = 3;

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Heuristic confidence, 75..=95.
    pub confidence: u32,
    /// Three consecutive entries of [`MITIGATIONS`].
    pub suggestions: Vec<&'static str>,
}

/// Score an invention from its identity and name.
///
/// Lengths count UTF-16 code units.
pub fn analyze(id: &str, name: &str) -> Analysis {
    let seed = id.encode_utf16().count() + name.encode_utf16().count();
    let confidence = BASE_CONFIDENCE + (seed % CONFIDENCE_SPREAD) as u32;
    let start = seed % WINDOW_STARTS;

    Analysis {
        confidence,
        suggestions: MITIGATIONS[start..start + WINDOW_LEN].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_input() {
        let analysis = analyze("abc123", "Widget");
        assert_eq!(analysis.confidence, 87);
        assert_eq!(
            analysis.suggestions,
            vec![
                "Implement Layer-3 Encryption",
                "Deploy Quantum Firewalls",
                "Recalibrate Neural Uplink"
            ]
        );
    }

    #[test]
    fn test_repeatable() {
        let first = analyze("k3j9x0q1z", "Aether Lens");
        assert_eq!(first, analyze("k3j9x0q1z", "Aether Lens"));
    }

    #[test]
    fn test_bounds_over_many_lengths() {
        for id_len in 0..40 {
            for name_len in 0..40 {
                let analysis = analyze(&"i".repeat(id_len), &"n".repeat(name_len));
                assert!((75..=95).contains(&analysis.confidence));
                assert_eq!(analysis.suggestions.len(), 3);
            }
        }
    }

    #[test]
    fn test_window_start_follows_seed() {
        // seed 15: confidence 90, window starts at 3
        let analysis = analyze("123456789", "Probe!");
        assert_eq!(analysis.confidence, 90);
        assert_eq!(analysis.suggestions[0], "Enable Bio-metric Verification");
        assert_eq!(analysis.suggestions[2], "Monitor Spectral Leakage");
    }

    #[test]
    fn test_utf16_length() {
        // "é" is one code unit, "𝔸" is two.
        assert_eq!(analyze("", "é").confidence, 76);
        assert_eq!(analyze("", "𝔸").confidence, 77);
    }
}
