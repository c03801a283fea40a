use kuhn_match::cards::{Card, Deal, ALL_CARDS};
use kuhn_match::game_tree::{payoff, Action, History, Seat, TERMINAL_HISTORIES};

fn all_deals() -> Vec<Deal> {
    let mut deals = Vec::new();
    for &a in &ALL_CARDS {
        for &b in &ALL_CARDS {
            if a != b {
                deals.push(Deal::new(a, b));
            }
        }
    }
    deals
}

// ---------------------------------------------------------------------------
// Showdowns
// ---------------------------------------------------------------------------

#[test]
fn test_showdown_favors_higher_card() {
    for deal in all_deals() {
        let winner = if deal.seat0 > deal.seat1 { Seat::Zero } else { Seat::One };
        for history in [History::PP, History::BB, History::PBB] {
            let p0 = payoff(history, &deal).unwrap();
            match winner {
                Seat::Zero => assert!(p0 > 0, "{} on {} should favor seat 0", history, deal),
                Seat::One => assert!(p0 < 0, "{} on {} should favor seat 1", history, deal),
            }
        }
    }
}

#[test]
fn test_showdown_negates_when_cards_swap() {
    for deal in all_deals() {
        for history in [History::PP, History::BB, History::PBB] {
            assert_eq!(
                payoff(history, &deal).unwrap(),
                -payoff(history, &deal.swapped()).unwrap()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed lines
// ---------------------------------------------------------------------------

#[test]
fn test_bet_fold_pays_seat0_one() {
    for deal in all_deals() {
        assert_eq!(payoff(History::BP, &deal).unwrap(), 1);
    }
}

#[test]
fn test_bet_call_king_vs_jack_pays_two() {
    let deal = Deal::new(Card::High, Card::Low);
    assert_eq!(payoff(History::BB, &deal).unwrap(), 2);
}

#[test]
fn test_check_bet_fold_costs_seat0_one() {
    for deal in all_deals() {
        assert_eq!(payoff(History::PBP, &deal).unwrap(), -1);
    }
}

#[test]
fn test_check_check_stakes_one() {
    assert_eq!(payoff(History::PP, &Deal::new(Card::Middle, Card::Low)).unwrap(), 1);
    assert_eq!(payoff(History::PP, &Deal::new(Card::Middle, Card::High)).unwrap(), -1);
}

#[test]
fn test_check_raise_call_stakes_two() {
    assert_eq!(payoff(History::PBB, &Deal::new(Card::Low, Card::Middle)).unwrap(), -2);
    assert_eq!(payoff(History::PBB, &Deal::new(Card::High, Card::Middle)).unwrap(), 2);
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[test]
fn test_every_line_reaches_canonical_terminal() {
    let actions = [Action::Pass, Action::Bet];
    let mut reached = Vec::new();
    for &a1 in &actions {
        let h1 = History::Root.play(a1).unwrap();
        for &a2 in &actions {
            let h2 = h1.play(a2).unwrap();
            if h2.is_terminal() {
                reached.push(h2);
                continue;
            }
            for &a3 in &actions {
                let h3 = h2.play(a3).unwrap();
                assert!(h3.is_terminal());
                reached.push(h3);
            }
        }
    }
    reached.sort();
    let mut expected = TERMINAL_HISTORIES.to_vec();
    expected.sort();
    assert_eq!(reached, expected);
}

#[test]
fn test_history_strings_round_trip_display() {
    assert_eq!("pb".parse::<History>().unwrap().as_str(), "pb");
    assert_eq!(History::Root.to_string(), "(open)");
    assert_eq!(History::PBP.to_string(), "pbp");
}
