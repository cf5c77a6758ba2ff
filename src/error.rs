//! Structured errors and warnings.
//!
//! All of these serialize as `{"type": "<kebab-name>", ...fields}` so the
//! UI layer can branch on `type` and revert rejected edits.

use serde::{Deserialize, Serialize};

/// Rejected rarity-rate edits and invalid tier snapshots.
#[derive(Clone, Debug, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RateError {
    #[error("rarity rates would total {total}, above 100%")]
    TotalExceedsLimit { total: f64 },

    #[error("unknown rarity: {rarity_id}")]
    #[serde(rename_all = "camelCase")]
    UnknownRarity { rarity_id: String },

    #[error("more than one auto-adjust rarity: {ids:?}")]
    MultipleAutoAdjust { ids: Vec<String> },
}

/// Unsatisfiable plan configurations; the plan carries no pulls.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PlanError {
    #[error("the gacha has no item types")]
    NoItems,

    #[error("no pull pricing is configured")]
    NoPricing,

    #[error("{points} points is below the cheapest price ({cheapest})")]
    InsufficientPoints { points: u64, cheapest: u64 },

    #[error("no budget reached {target} pulls within {iterations} steps")]
    InversionLimit { target: u64, iterations: usize },
}

/// Advisory notes attached to a plan; the plan is still valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PlanWarning {
    /// Points left over that no pricing unit can spend.
    LeftoverPoints { points: u64 },
    /// The budget also covers the complete-set price.
    CompleteReachable { price: u64 },
}

/// Execution failures; no partial results are returned alongside these.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DrawError {
    #[error("{error}")]
    Plan { error: PlanError },

    #[error("the pool has no item with a positive rate")]
    EmptyPool,

    #[error("{pulls} pulls exceeds the per-execution limit of {limit}")]
    TooManyPulls { pulls: u64, limit: u64 },

    #[error("no complete price is configured")]
    CompleteUnavailable,
}

impl From<PlanError> for DrawError {
    fn from(error: PlanError) -> Self {
        DrawError::Plan { error }
    }
}

/// Non-fatal execution notes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DrawWarning {
    Plan { warning: PlanWarning },

    /// The guarantee's target has zero weight in the pool; it was skipped.
    #[serde(rename_all = "camelCase")]
    GuaranteeUnsatisfiable { guarantee_id: String },

    /// A window ran out of replaceable pulls before reaching `quantity`.
    #[serde(rename_all = "camelCase")]
    GuaranteeWindowExhausted { guarantee_id: String, window: usize, missing: u64 },
}

impl From<PlanWarning> for DrawWarning {
    fn from(warning: PlanWarning) -> Self {
        DrawWarning::Plan { warning }
    }
}
