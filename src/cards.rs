use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{KuhnError, KuhnResult};

/// The three ranks of the Kuhn deck. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Card {
    Low = 0,
    Middle = 1,
    High = 2,
}

impl Card {
    pub fn from_char(c: char) -> KuhnResult<Card> {
        match c.to_ascii_uppercase() {
            'J' | '0' => Ok(Card::Low),
            'Q' | '1' => Ok(Card::Middle),
            'K' | '2' => Ok(Card::High),
            _ => Err(KuhnError::InvalidCard(c.to_string())),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Card::Low => 'J',
            Card::Middle => 'Q',
            Card::High => 'K',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Card::Low => "Jack",
            Card::Middle => "Queen",
            Card::High => "King",
        }
    }
}

pub const ALL_CARDS: [Card; 3] = [Card::Low, Card::Middle, Card::High];

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// One hand's private cards. The third card of the deck stays face down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deal {
    pub seat0: Card,
    pub seat1: Card,
}

impl Deal {
    pub fn new(seat0: Card, seat1: Card) -> Deal {
        assert_ne!(seat0, seat1, "both seats dealt {}", seat0);
        Deal { seat0, seat1 }
    }

    /// Shuffle the full deck and hand the top two cards to seat 0 and seat 1.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Deal {
        let mut deck = ALL_CARDS;
        deck.shuffle(rng);
        Deal::new(deck[0], deck[1])
    }

    /// True when seat 0 holds the higher card.
    pub fn seat0_wins_showdown(&self) -> bool {
        self.seat0 > self.seat1
    }

    /// The same deal with the seats' cards exchanged.
    pub fn swapped(&self) -> Deal {
        Deal::new(self.seat1, self.seat0)
    }

    pub fn unused(&self) -> Card {
        // indices 0 + 1 + 2 sum to 3
        ALL_CARDS[3 - self.seat0.index() - self.seat1.index()]
    }
}

/// Parse a deal written seat 0 first, e.g. `KJ` or `q/k`.
impl FromStr for Deal {
    type Err = KuhnError;

    fn from_str(s: &str) -> KuhnResult<Deal> {
        let cards = s
            .trim()
            .chars()
            .filter(|&c| c != '/')
            .map(Card::from_char)
            .collect::<KuhnResult<Vec<Card>>>()?;
        match cards[..] {
            [seat0, seat1] if seat0 != seat1 => Ok(Deal::new(seat0, seat1)),
            _ => Err(KuhnError::InvalidCard(format!(
                "{:?} is not two distinct cards",
                s
            ))),
        }
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.seat0, self.seat1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_card_order() {
        assert!(Card::Low < Card::Middle);
        assert!(Card::Middle < Card::High);
        assert_eq!(ALL_CARDS.map(Card::index), [0, 1, 2]);
    }

    #[test]
    fn test_card_from_char() {
        assert_eq!(Card::from_char('K').unwrap(), Card::High);
        assert_eq!(Card::from_char('q').unwrap(), Card::Middle);
        assert_eq!(Card::from_char('0').unwrap(), Card::Low);
        assert!(Card::from_char('A').is_err());
    }

    #[test]
    fn test_deal_parse() {
        let deal: Deal = "KJ".parse().unwrap();
        assert_eq!(deal, Deal::new(Card::High, Card::Low));
        assert_eq!("q/k".parse::<Deal>().unwrap(), Deal::new(Card::Middle, Card::High));
        assert_eq!(deal.to_string().parse::<Deal>().unwrap(), deal);
    }

    #[test]
    fn test_deal_parse_rejects() {
        for s in ["K", "KK", "KJQ", "KA", ""] {
            assert!(
                matches!(s.parse::<Deal>(), Err(KuhnError::InvalidCard(_))),
                "{:?} should not parse",
                s
            );
        }
    }

    #[test]
    fn test_random_deal_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let deal = Deal::random(&mut rng);
            assert_ne!(deal.seat0, deal.seat1);
            assert_ne!(deal.unused(), deal.seat0);
            assert_ne!(deal.unused(), deal.seat1);
        }
    }

    #[test]
    fn test_random_deal_covers_all_pairs() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let deal = Deal::random(&mut rng);
            seen.insert((deal.seat0, deal.seat1));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    #[should_panic]
    fn test_deal_rejects_same_card() {
        Deal::new(Card::High, Card::High);
    }
}
