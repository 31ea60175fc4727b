//! Purchasable upgrades with geometrically growing cost.

use serde::{Deserialize, Serialize};

/// A levelable enhancement bought with essence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    pub max_level: u32,
    pub cost: u64,
    pub benefit_label: String,
    pub icon: String,
}

impl Upgrade {
    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }

    /// Fraction of the level track completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.max_level == 0 {
            return 1.0;
        }
        (self.level as f64 / self.max_level as f64).min(1.0)
    }

    /// Raise the level by one and grow the cost. Returns the cost paid.
    ///
    /// Callers check affordability and [`Upgrade::is_maxed`] first.
    pub(crate) fn advance(&mut self) -> u64 {
        let paid = self.cost;
        self.level += 1;
        self.cost = next_cost(paid);
        paid
    }
}

/// Cost after one purchase: `floor(cost * 1.6)`.
pub fn next_cost(cost: u64) -> u64 {
    // 1.6 == 8/5, kept in integers so large costs stay exact.
    cost.saturating_mul(8) / 5
}

/// The upgrades every new hub starts with.
pub fn default_upgrades() -> Vec<Upgrade> {
    vec![
        Upgrade {
            id: "scanner".to_string(),
            name: "Neural Vulnerability Scanner".to_string(),
            description: "Enhances AI ability to detect hidden backdoors and exploits.".to_string(),
            level: 1,
            max_level: 10,
            cost: 100,
            benefit_label: "Audit Depth".to_string(),
            icon: "🔍".to_string(),
        },
        Upgrade {
            id: "processor".to_string(),
            name: "Quantum Logic Processor".to_string(),
            description: "Increases the detail and coherence of synthesized reports.".to_string(),
            level: 1,
            max_level: 10,
            cost: 150,
            benefit_label: "Synthesis Speed".to_string(),
            icon: "💎".to_string(),
        },
    ]
}
