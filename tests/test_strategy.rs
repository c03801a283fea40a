use approx::assert_abs_diff_eq;

use kuhn_match::cards::{Card, ALL_CARDS};
use kuhn_match::error::KuhnResult;
use kuhn_match::game_tree::{Action, History, DECISION_HISTORIES};
use kuhn_match::model::{StrategyModel, TextbookModel, FEATURE_DIM};
use kuhn_match::strategy::{
    LearnedStrategy, Strategy, StrategyProvider, TextbookStrategy, BLUFF_FREQUENCY,
};

/// Bets with the King, passes otherwise, whatever the history.
struct KingOnly;

impl StrategyModel for KingOnly {
    fn predict(&self, features: &[f64; FEATURE_DIM]) -> KuhnResult<Vec<f64>> {
        if features[2] == 1.0 {
            Ok(vec![0.0, 1.0])
        } else {
            Ok(vec![1.0, 0.0])
        }
    }
}

struct ThreeOutputs;

impl StrategyModel for ThreeOutputs {
    fn predict(&self, _features: &[f64; FEATURE_DIM]) -> KuhnResult<Vec<f64>> {
        Ok(vec![0.2, 0.3, 0.5])
    }
}

#[test]
fn test_learned_matches_model_output() {
    let learned = LearnedStrategy::precompute(&KingOnly).unwrap();
    for history in DECISION_HISTORIES {
        assert_eq!(learned.strategy(Card::High, history).unwrap().bet(), 1.0);
        assert_eq!(learned.strategy(Card::Low, history).unwrap().pass(), 1.0);
    }
}

#[test]
fn test_learned_from_labels_equals_textbook() {
    let learned = LearnedStrategy::precompute(&TextbookModel).unwrap();
    for card in ALL_CARDS {
        for history in DECISION_HISTORIES {
            let a = learned.strategy(card, history).unwrap();
            let b = TextbookStrategy.strategy(card, history).unwrap();
            assert_abs_diff_eq!(a.bet(), b.bet(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_wrong_dimension_rejected_before_play() {
    assert!(LearnedStrategy::precompute(&ThreeOutputs).is_err());
}

#[test]
fn test_sampling_is_pure_in_the_draw() {
    let pass = Strategy::pure(Action::Pass);
    let bet = Strategy::pure(Action::Bet);
    for i in 0..100 {
        let u = i as f64 / 100.0;
        assert_eq!(pass.sample(u), Action::Pass);
        assert_eq!(bet.sample(u), Action::Bet);
    }
}

#[test]
fn test_textbook_bluff_frequency() {
    let s = TextbookStrategy.strategy(Card::Low, History::Root).unwrap();
    assert_abs_diff_eq!(s.bet(), BLUFF_FREQUENCY);
    let bets = (0..300)
        .map(|i| s.sample(i as f64 / 300.0))
        .filter(|&a| a == Action::Bet)
        .count();
    assert!((99..=101).contains(&bets), "{} bets in 300 draws", bets);
}

#[test]
fn test_textbook_has_no_terminal_decisions() {
    for history in ["pp", "bp", "bb", "pbp", "pbb"] {
        let history: History = history.parse().unwrap();
        assert!(TextbookStrategy.strategy(Card::High, history).is_err());
    }
}
