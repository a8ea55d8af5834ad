//! Detect overlapping blocks and enforce the configured overlap policy.
//!
//! Overlaps are allowed by default. `OverlapPolicy::Reject` turns any
//! overlap with another block into an error at create, edit and drag time.
//! Adjacent blocks (one ends exactly when another starts) never overlap.

use serde::{Deserialize, Serialize};

use crate::block::BlockSpan;
use crate::error::{EngineError, Result};
use crate::model::{BlockId, ScheduledBlock};

/// Whether overlapping blocks are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Overlaps are the user's responsibility.
    #[default]
    Allow,
    /// Refuse any placement that overlaps an existing block.
    Reject,
}

/// An existing block that a candidate span runs into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub block: ScheduledBlock,
    pub overlap_minutes: i64,
}

/// Find every block in `others` that overlaps `candidate`.
///
/// `skip` excludes the candidate's own block, so a moved block is not
/// reported against its previous position.
pub fn find_overlaps(
    candidate: &BlockSpan,
    skip: Option<BlockId>,
    others: &[ScheduledBlock],
) -> Vec<Overlap> {
    others
        .iter()
        .filter(|b| Some(b.id) != skip)
        .filter(|b| candidate.overlaps(&b.span()))
        .map(|b| {
            let overlap_start = candidate.start.max(b.start);
            let overlap_end = candidate.end.min(b.end);
            Overlap {
                block: b.clone(),
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect()
}

impl OverlapPolicy {
    /// Apply the policy to a candidate placement.
    ///
    /// # Errors
    /// Under `Reject`, returns `EngineError::Overlap` naming the first block
    /// the candidate overlaps.
    pub fn check(
        self,
        candidate: &BlockSpan,
        skip: Option<BlockId>,
        others: &[ScheduledBlock],
    ) -> Result<()> {
        if self == OverlapPolicy::Allow {
            return Ok(());
        }
        match find_overlaps(candidate, skip, others).first() {
            Some(hit) => Err(EngineError::Overlap {
                block: skip.map_or_else(|| "new".to_string(), |id| id.to_string()),
                with: hit.block.id.to_string(),
            }),
            None => Ok(()),
        }
    }
}
