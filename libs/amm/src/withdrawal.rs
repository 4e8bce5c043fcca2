//! Multi-step withdrawal plans and their caller-driven execution state
//!
//! A [`WithdrawalPlan`] is pure data produced by
//! [`crate::liquidity::plan_withdrawal`]. A [`WithdrawalSequence`] walks it one
//! step at a time: the caller submits the next step, observes its result and
//! records it. A failed step stops the sequence; steps already settled stay
//! settled and nothing is retried.

use crate::error::{AmmError, AmmResult};
use crate::registry::PoolId;
use relay_types::{Decimal, Quantity, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One single-asset burn of share tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burn {
    /// Reserve received for this burn
    pub reserve: TokenId,
    pub share_amount: Quantity,
}

/// One transaction of a split withdrawal: two burns, one per reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalStep {
    pub index: usize,
    pub share_amount: Quantity,
    pub burns: [Burn; 2],
}

impl WithdrawalStep {
    /// Split `share_amount` evenly across the two reserves; the second burn
    /// carries the rounding remainder
    pub fn new(index: usize, share_amount: Quantity, reserves: &[TokenId; 2]) -> AmmResult<Self> {
        let first = share_amount.with_amount(share_amount.amount() / Decimal::TWO);
        let second = share_amount.checked_sub(&first)?;
        Ok(Self {
            index,
            burns: [
                Burn {
                    reserve: reserves[0].clone(),
                    share_amount: first,
                },
                Burn {
                    reserve: reserves[1].clone(),
                    share_amount: second,
                },
            ],
            share_amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPlan {
    pub pool: PoolId,
    /// Caller's single-side target
    pub target: Quantity,
    pub opposing: Quantity,
    /// Total shares burned across every step
    pub share_amount: Quantity,
    pub steps: Vec<WithdrawalStep>,
}

/// Observed result of one submitted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Settled { receipt: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceState {
    /// Steps remain and none has failed
    InProgress { next: usize },
    /// Every step settled
    Completed,
    /// Stopped at `step`; earlier steps remain settled
    Failed { step: usize, reason: String },
}

/// Explicit execution state for a [`WithdrawalPlan`]
#[derive(Debug, Clone)]
pub struct WithdrawalSequence {
    plan: WithdrawalPlan,
    outcomes: Vec<StepOutcome>,
}

impl WithdrawalSequence {
    pub fn new(plan: WithdrawalPlan) -> Self {
        Self {
            outcomes: Vec::with_capacity(plan.steps.len()),
            plan,
        }
    }

    pub fn plan(&self) -> &WithdrawalPlan {
        &self.plan
    }

    pub fn state(&self) -> SequenceState {
        if let Some((step, StepOutcome::Failed { reason })) = self
            .outcomes
            .iter()
            .enumerate()
            .find(|(_, outcome)| matches!(outcome, StepOutcome::Failed { .. }))
        {
            return SequenceState::Failed {
                step,
                reason: reason.clone(),
            };
        }
        if self.outcomes.len() == self.plan.steps.len() {
            SequenceState::Completed
        } else {
            SequenceState::InProgress {
                next: self.outcomes.len(),
            }
        }
    }

    /// Step to submit next, if the sequence is still running
    pub fn next_step(&self) -> Option<&WithdrawalStep> {
        match self.state() {
            SequenceState::InProgress { next } => self.plan.steps.get(next),
            _ => None,
        }
    }

    pub fn record_success(&mut self, receipt: impl Into<String>) -> AmmResult<SequenceState> {
        self.record(StepOutcome::Settled {
            receipt: receipt.into(),
        })
    }

    pub fn record_failure(&mut self, reason: impl Into<String>) -> AmmResult<SequenceState> {
        self.record(StepOutcome::Failed {
            reason: reason.into(),
        })
    }

    fn record(&mut self, outcome: StepOutcome) -> AmmResult<SequenceState> {
        let step = match self.state() {
            SequenceState::InProgress { next } => next,
            finished => {
                return Err(AmmError::InvalidInput(format!(
                    "withdrawal sequence for {} already finished: {finished:?}",
                    self.plan.pool
                )))
            }
        };
        match &outcome {
            StepOutcome::Settled { receipt } => {
                info!(pool = %self.plan.pool, step, %receipt, "Withdrawal step settled")
            }
            StepOutcome::Failed { reason } => {
                warn!(pool = %self.plan.pool, step, %reason, "Withdrawal step failed, sequence stopped")
            }
        }
        self.outcomes.push(outcome);
        Ok(self.state())
    }

    /// Outcomes recorded so far, in step order
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = &WithdrawalStep> {
        self.plan
            .steps
            .iter()
            .zip(&self.outcomes)
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Settled { .. }))
            .map(|(step, _)| step)
    }

    /// Steps never submitted
    pub fn pending_steps(&self) -> &[WithdrawalStep] {
        let submitted = self.outcomes.len().min(self.plan.steps.len());
        &self.plan.steps[submitted..]
    }

    /// Shares burned by settled steps
    pub fn settled_share_amount(&self) -> AmmResult<Quantity> {
        self.completed_steps()
            .try_fold(self.plan.share_amount.with_amount(Decimal::ZERO), |total, step| {
                total.checked_add(&step.share_amount)
            })
            .map_err(AmmError::from)
    }
}
