//! Skip-vote ledger and quorum policy

use crate::error::{ChorusError, Result};
use std::collections::HashSet;

/// Fraction of current participants whose votes skip an item
///
/// The default of 0.5 means a simple majority: `ceil(participants / 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumPolicy {
    ratio: f64,
}

impl QuorumPolicy {
    /// Create a policy, clamping the ratio into `(0, 1]`
    pub fn new(ratio: f64) -> Self {
        let ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio.min(1.0)
        } else {
            0.5
        };
        Self { ratio }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Votes needed with `participants` listeners present
    ///
    /// Never less than one, so an empty ledger cannot satisfy quorum.
    pub fn required_votes(&self, participants: usize) -> usize {
        let required = (participants as f64 * self.ratio).ceil() as usize;
        required.max(1)
    }

    pub fn is_reached(&self, votes: usize, participants: usize) -> bool {
        votes >= self.required_votes(participants)
    }
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

/// Distinct participants who voted to skip one item
///
/// Every track and playlist owns its own ledger. A vote against a playlist's
/// current member never counts against the playlist itself.
#[derive(Debug, Clone, Default)]
pub struct SkipLedger {
    voters: HashSet<String>,
}

impl SkipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote, returning the new distinct voter count
    pub fn record(&mut self, voter: &str) -> Result<usize> {
        if !self.voters.insert(voter.to_string()) {
            return Err(ChorusError::AlreadyVoted(voter.to_string()));
        }
        Ok(self.voters.len())
    }

    pub fn count(&self) -> usize {
        self.voters.len()
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.voters.contains(voter)
    }

    /// Forget every vote
    pub fn reset(&mut self) {
        self.voters.clear();
    }

    /// Evaluate against the live participant count
    pub fn quorum_reached(&self, participants: usize, policy: &QuorumPolicy) -> bool {
        policy.is_reached(self.count(), participants)
    }
}
