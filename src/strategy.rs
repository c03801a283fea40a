//! Strategy providers. Each answers "with this card at this history, how often do
//! I pass and how often do I bet?"
//!
//! Two real providers exist: the learned table built from a `StrategyModel`,
//! and the closed-form textbook equilibrium. Both sit behind
//! `StrategyProvider`, so the match can seat either one (or a test stub) in
//! either chair.

use std::fmt;

use itertools::iproduct;

use crate::cards::{Card, ALL_CARDS};
use crate::error::{KuhnError, KuhnResult};
use crate::game_tree::{Action, History, DECISION_HISTORIES};
use crate::model::{encode_features, StrategyModel, OUTPUT_DIM};

/// How far a probability vector may drift from summing to 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Equilibrium frequency for the Jack's opening bluff and the Queen's mixed
/// bet when checked to or bet into.
pub const BLUFF_FREQUENCY: f64 = 1.0 / 3.0;

/// Key used in logs and tables, e.g. `0/pb` for a Jack facing check-bet.
pub fn state_key(card: Card, history: History) -> String {
    format!("{}/{}", card.index(), history.as_str())
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// A validated pass/bet distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    pass: f64,
    bet: f64,
}

impl Strategy {
    /// Validate a raw probability vector, e.g. a model's output for `state`.
    pub fn from_probabilities(state: &str, probs: &[f64]) -> KuhnResult<Strategy> {
        let malformed = |reason: String| KuhnError::MalformedDistribution {
            state: state.to_string(),
            reason,
        };
        if probs.len() != OUTPUT_DIM {
            return Err(malformed(format!(
                "expected {} probabilities, got {}",
                OUTPUT_DIM,
                probs.len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(malformed(format!("entries must be finite: {:?}", probs)));
        }
        if probs.iter().any(|p| *p < 0.0) {
            return Err(malformed(format!("entries must be non-negative: {:?}", probs)));
        }
        let total: f64 = probs.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(malformed(format!("entries sum to {}", total)));
        }
        Ok(Strategy {
            pass: probs[0],
            bet: probs[1],
        })
    }

    /// Always take `action`.
    pub fn pure(action: Action) -> Strategy {
        match action {
            Action::Pass => Strategy { pass: 1.0, bet: 0.0 },
            Action::Bet => Strategy { pass: 0.0, bet: 1.0 },
        }
    }

    fn bet_with(frequency: f64) -> Strategy {
        Strategy {
            pass: 1.0 - frequency,
            bet: frequency,
        }
    }

    pub fn pass(&self) -> f64 {
        self.pass
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn probabilities(&self) -> [f64; 2] {
        [self.pass, self.bet]
    }

    /// Pick an action from one uniform draw `u` in `[0, 1)`.
    ///
    /// A single comparison keeps Pass and Bet exclusive and exhaustive even
    /// when the stored probabilities do not sum to exactly 1.
    #[inline]
    pub fn sample(&self, u: f64) -> Action {
        if u < self.pass {
            Action::Pass
        } else {
            Action::Bet
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass {:.1}% | bet {:.1}%", self.pass * 100.0, self.bet * 100.0)
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

pub trait StrategyProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Distribution for the player holding `card` and on turn at `history`.
    /// Terminal histories have no decision and return an error.
    fn strategy(&self, card: Card, history: History) -> KuhnResult<Strategy>;
}

// ---------------------------------------------------------------------------
// Learned table
// ---------------------------------------------------------------------------

/// The learned model's strategy, evaluated once per decision state.
///
/// Built before the match starts so the per-hand path is a table lookup.
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct LearnedStrategy {
    table: [[Strategy; 4]; 3],
}

impl LearnedStrategy {
    /// Query `model` exactly once for each of the 12 (card, history) states,
    /// rejecting any output that is not a valid distribution.
    pub fn precompute(model: &dyn StrategyModel) -> KuhnResult<LearnedStrategy> {
        let mut table = [[Strategy::pure(Action::Pass); 4]; 3];
        for (card, history) in iproduct!(ALL_CARDS, DECISION_HISTORIES) {
            let key = state_key(card, history);
            let output = model.predict(&encode_features(card, history)?)?;
            let strategy = Strategy::from_probabilities(&key, &output)?;
            log::debug!("precomputed {:<5} {}", key, strategy);
            if let Some(slot) = history.decision_index() {
                table[card.index()][slot] = strategy;
            }
        }
        Ok(LearnedStrategy { table })
    }
}

impl StrategyProvider for LearnedStrategy {
    fn name(&self) -> &str {
        "learned"
    }

    fn strategy(&self, card: Card, history: History) -> KuhnResult<Strategy> {
        let slot = history
            .decision_index()
            .ok_or_else(|| KuhnError::NoDecision(state_key(card, history)))?;
        Ok(self.table[card.index()][slot])
    }
}

// ---------------------------------------------------------------------------
// Textbook equilibrium
// ---------------------------------------------------------------------------

/// Closed-form equilibrium for three-card Kuhn poker.
pub fn textbook_strategy(card: Card, history: History) -> KuhnResult<Strategy> {
    use Action::{Bet, Pass};

    let strategy = match (history, card) {
        // Opening: bluff the Jack, check the Queen, value-bet the King.
        (History::Root, Card::Low) => Strategy::bet_with(BLUFF_FREQUENCY),
        (History::Root, Card::Middle) => Strategy::pure(Pass),
        (History::Root, Card::High) => Strategy::pure(Bet),
        // Second seat, facing a bet or a check.
        (History::B | History::P, Card::Low) => Strategy::pure(Pass),
        (History::B | History::P, Card::Middle) => Strategy::bet_with(BLUFF_FREQUENCY),
        (History::B | History::P, Card::High) => Strategy::pure(Bet),
        // Checked, then bet into: call only with the King.
        (History::PB, Card::High) => Strategy::pure(Bet),
        (History::PB, _) => Strategy::pure(Pass),
        (terminal, _) => return Err(KuhnError::NoDecision(state_key(card, terminal))),
    };
    Ok(strategy)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextbookStrategy;

impl StrategyProvider for TextbookStrategy {
    fn name(&self) -> &str {
        "textbook GTO"
    }

    fn strategy(&self, card: Card, history: History) -> KuhnResult<Strategy> {
        textbook_strategy(card, history)
    }
}

// ---------------------------------------------------------------------------
// Fixed action
// ---------------------------------------------------------------------------

/// Plays the same action at every decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedAction(pub Action);

impl StrategyProvider for FixedAction {
    fn name(&self) -> &str {
        match self.0 {
            Action::Pass => "always pass",
            Action::Bet => "always bet",
        }
    }

    fn strategy(&self, card: Card, history: History) -> KuhnResult<Strategy> {
        match history.decision_index() {
            Some(_) => Ok(Strategy::pure(self.0)),
            None => Err(KuhnError::NoDecision(state_key(card, history))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
