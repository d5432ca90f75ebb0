use serde::{Deserialize, Serialize};

/// Settings controlling definite integration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegrationSettings {
    /// Absolute tolerance of the adaptive Simpson fallback.
    pub tolerance: f64,
    /// Maximum bisection depth of the adaptive Simpson fallback.
    pub max_depth: usize,
    /// Maximum nesting of integration by parts in the antiderivative table.
    pub max_parts_depth: usize,
    /// Fall back to quadrature when no antiderivative is found.
    pub numeric_fallback: bool,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_depth: 40,
            max_parts_depth: 6,
            numeric_fallback: true,
        }
    }
}

/// Settings controlling the numeric equivalence test used when structural
/// simplification cannot decide whether two expressions are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquivalenceSettings {
    pub samples: usize,
    /// Relative tolerance; absolute below unit magnitude.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for EquivalenceSettings {
    fn default() -> Self {
        Self {
            samples: 8,
            tolerance: 1e-8,
            seed: 0x5eed_2024,
        }
    }
}
