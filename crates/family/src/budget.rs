//! Output-token budgets for family generation calls.
//!
//! ```text
//! tool count known:  raw = tool_count × per_tool_tokens + base_tokens
//! otherwise:         raw = ceil(word_count / words_per_token × buffer_factor)
//! budget             = clamp(raw, min_floor, model_ceiling)
//! ```
//!
//! A raw need above the ceiling means the family will not fit in one call;
//! the budget is still capped and the result is flagged so the operator can
//! split the family.

use serde::Serialize;
use toolscribe_config::BudgetConfig;
use tracing::warn;
use crate::grouper::FamilyGroup;

/// Which input the raw need was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "strategy")]
pub enum BudgetStrategy {
    ToolCount { tool_count: usize },
    WordCount { word_count: usize },
}

/// A bounded output-token allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenBudget {
    pub max_output_tokens: u32,
    /// The unclamped estimate
    pub raw_need: u32,
    /// True when `raw_need` exceeded the model ceiling
    pub capped: bool,
    #[serde(flatten)]
    pub strategy: BudgetStrategy,
}

impl TokenBudget {
    /// A fixed sub-budget that never exceeds this one.
    pub fn limit(&self, fixed: u32) -> u32 {
        fixed.min(self.max_output_tokens)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenBudgetEstimator {
    config: BudgetConfig,
}

impl TokenBudgetEstimator {
    pub fn new(config: BudgetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Estimate from a declared tool count, or from a word count when the
    /// tool count is unknown. Pure apart from the capping warning.
    pub fn estimate(&self, tool_count: Option<usize>, word_count: usize) -> TokenBudget {
        let (raw_need, strategy) = match tool_count {
            Some(tool_count) => (self.from_tool_count(tool_count), BudgetStrategy::ToolCount { tool_count }),
            None => (self.from_word_count(word_count), BudgetStrategy::WordCount { word_count }),
        };

        let ceiling = self.config.model_ceiling;
        // A floor above the ceiling is rejected by config validation; never exceed the ceiling anyway.
        let floor = self.config.min_floor.min(ceiling);
        let capped = raw_need > ceiling;
        if capped {
            warn!(
                raw_need,
                model_ceiling = ceiling,
                ?strategy,
                "Token need exceeds the model ceiling, output capped; consider splitting the family"
            );
        }

        TokenBudget {
            max_output_tokens: raw_need.min(ceiling).max(floor),
            raw_need,
            capped,
            strategy,
        }
    }

    /// Budget for a whole family, from its tool count.
    pub fn for_family(&self, family: &FamilyGroup) -> TokenBudget {
        if family.tool_count() == 0 {
            self.estimate(None, family.word_count())
        } else {
            self.estimate(Some(family.tool_count()), family.word_count())
        }
    }

    fn from_tool_count(&self, tool_count: usize) -> u32 {
        let count = u32::try_from(tool_count).unwrap_or(u32::MAX);
        count
            .saturating_mul(self.config.per_tool_tokens)
            .saturating_add(self.config.base_tokens)
    }

    fn from_word_count(&self, word_count: usize) -> u32 {
        let tokens = (word_count as f64 / self.config.words_per_token) * self.config.buffer_factor;
        if !tokens.is_finite() || tokens >= u32::MAX as f64 {
            u32::MAX
        } else {
            tokens.ceil().max(0.0) as u32
        }
    }
}
