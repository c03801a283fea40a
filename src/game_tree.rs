//! Kuhn poker game tree.
//!
//! Each player antes 1 and receives one card. A single betting round follows:
//! seat 0 passes or bets, seat 1 answers, and if seat 0 passed into a bet it
//! gets one more decision. Nine histories exist in total, five of them terminal.

use std::fmt;
use std::str::FromStr;

use crate::cards::Deal;
use crate::error::{KuhnError, KuhnResult};

// ---------------------------------------------------------------------------
// Actions and seats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Check, or fold when facing a bet.
    Pass,
    /// Bet, or call when facing a bet.
    Bet,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pass => write!(f, "pass"),
            Action::Bet => write!(f, "bet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    Zero,
    One,
}

impl Seat {
    pub fn index(self) -> usize {
        match self {
            Seat::Zero => 0,
            Seat::One => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::Zero => Seat::One,
            Seat::One => Seat::Zero,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.index())
    }
}

// ---------------------------------------------------------------------------
// Histories
// ---------------------------------------------------------------------------

/// Every reachable betting history. Variant names spell the action string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum History {
    Root,
    P,
    B,
    PB,
    PP,
    BP,
    BB,
    PBP,
    PBB,
}

/// The four histories where someone still has to act, in feature order.
pub const DECISION_HISTORIES: [History; 4] = [History::Root, History::P, History::B, History::PB];

/// The five histories that end the hand.
pub const TERMINAL_HISTORIES: [History; 5] = [
    History::PP,
    History::BP,
    History::BB,
    History::PBP,
    History::PBB,
];

impl History {
    pub fn as_str(self) -> &'static str {
        match self {
            History::Root => "",
            History::P => "p",
            History::B => "b",
            History::PB => "pb",
            History::PP => "pp",
            History::BP => "bp",
            History::BB => "bb",
            History::PBP => "pbp",
            History::PBB => "pbb",
        }
    }

    pub fn is_empty(self) -> bool {
        self == History::Root
    }

    pub fn is_terminal(self) -> bool {
        self.to_act().is_none()
    }

    /// The seat that acts next, or `None` once the hand is over.
    pub fn to_act(self) -> Option<Seat> {
        match self {
            History::Root | History::PB => Some(Seat::Zero),
            History::P | History::B => Some(Seat::One),
            History::PP | History::BP | History::BB | History::PBP | History::PBB => None,
        }
    }

    /// Position of a decision history in `DECISION_HISTORIES`.
    pub fn decision_index(self) -> Option<usize> {
        match self {
            History::Root => Some(0),
            History::P => Some(1),
            History::B => Some(2),
            History::PB => Some(3),
            _ => None,
        }
    }

    /// The actions taken so far, in order.
    pub fn actions(self) -> impl Iterator<Item = Action> {
        self.as_str().chars().map(|c| match c {
            'p' => Action::Pass,
            _ => Action::Bet,
        })
    }

    /// Append an action. Acting after the hand has ended is an error.
    pub fn play(self, action: Action) -> KuhnResult<History> {
        let next = match (self, action) {
            (History::Root, Action::Pass) => History::P,
            (History::Root, Action::Bet) => History::B,
            (History::P, Action::Pass) => History::PP,
            (History::P, Action::Bet) => History::PB,
            (History::B, Action::Pass) => History::BP,
            (History::B, Action::Bet) => History::BB,
            (History::PB, Action::Pass) => History::PBP,
            (History::PB, Action::Bet) => History::PBB,
            (terminal, _) => return Err(KuhnError::NoDecision(terminal.as_str().to_string())),
        };
        Ok(next)
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "(open)")
        } else {
            write!(f, "{}", self.as_str())
        }
    }
}

impl FromStr for History {
    type Err = KuhnError;

    fn from_str(s: &str) -> KuhnResult<History> {
        s.chars().try_fold(History::Root, |history, c| {
            let action = match c {
                'p' => Action::Pass,
                'b' => Action::Bet,
                _ => return Err(KuhnError::InvalidHistory(s.to_string())),
            };
            history
                .play(action)
                .map_err(|_| KuhnError::InvalidHistory(s.to_string()))
        })
    }
}

// ---------------------------------------------------------------------------
// Payoffs
// ---------------------------------------------------------------------------

/// Seat 0's net winnings, in antes, once `history` has ended.
///
/// A pass-pass goes to showdown for the antes; a called bet goes to showdown
/// for antes plus bets; a fold hands the pot to the bettor.
pub fn payoff(history: History, deal: &Deal) -> KuhnResult<i32> {
    let showdown = if deal.seat0_wins_showdown() { 1 } else { -1 };
    match history {
        History::PP => Ok(showdown),
        History::BP => Ok(1),
        History::BB => Ok(2 * showdown),
        History::PBP => Ok(-1),
        History::PBB => Ok(2 * showdown),
        History::Root | History::P | History::B | History::PB => {
            Err(KuhnError::NotTerminal(history.as_str().to_string()))
        }
    }
}

/// Largest amount either seat can win or lose in one hand.
pub const MAX_PAYOFF: i32 = 2;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Card;

    #[test]
    fn test_parse_all_histories() {
        for h in DECISION_HISTORIES.iter().chain(TERMINAL_HISTORIES.iter()) {
            assert_eq!(h.as_str().parse::<History>().unwrap(), *h);
        }
    }

    #[test]
    fn test_parse_rejects_illegal() {
        for s in ["x", "ppb", "bpb", "bbp", "pbbp", "pp "] {
            assert!(s.parse::<History>().is_err(), "{:?} should not parse", s);
        }
    }

    #[test]
    fn test_turn_order() {
        assert_eq!(History::Root.to_act(), Some(Seat::Zero));
        assert_eq!(History::P.to_act(), Some(Seat::One));
        assert_eq!(History::B.to_act(), Some(Seat::One));
        assert_eq!(History::PB.to_act(), Some(Seat::Zero));
        for h in TERMINAL_HISTORIES {
            assert!(h.is_terminal());
        }
    }

    #[test]
    fn test_history_length_bounds() {
        for h in DECISION_HISTORIES.iter().chain(TERMINAL_HISTORIES.iter()) {
            assert!(h.actions().count() <= 3);
        }
    }

    #[test]
    fn test_actions_replay_history() {
        let replayed = History::PBB
            .actions()
            .try_fold(History::Root, |h, a| h.play(a))
            .unwrap();
        assert_eq!(replayed, History::PBB);
        assert_eq!(History::Root.actions().count(), 0);
    }

    #[test]
    fn test_play_after_terminal_fails() {
        assert!(matches!(
            History::BB.play(Action::Pass),
            Err(KuhnError::NoDecision(_))
        ));
    }

    #[test]
    fn test_payoff_non_terminal_fails() {
        let deal = Deal::new(Card::High, Card::Low);
        for h in DECISION_HISTORIES {
            assert!(matches!(payoff(h, &deal), Err(KuhnError::NotTerminal(_))));
        }
    }

    #[test]
    fn test_payoff_bounded() {
        let deal = Deal::new(Card::Middle, Card::High);
        for h in TERMINAL_HISTORIES {
            assert!(payoff(h, &deal).unwrap().abs() <= MAX_PAYOFF);
        }
    }
}
