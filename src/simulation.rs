//! Match simulation: the learned strategy against the textbook equilibrium.
//!
//! Every hand re-draws who sits in which chair, deals two of the three cards,
//! walks the betting tree with each seat's own provider, and credits the
//! learned side with its share of the result. Running totals are reported at
//! every tenth of the match.

use std::fmt;
use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::cards::Deal;
use crate::error::{KuhnError, KuhnResult};
use crate::game_tree::{payoff, History, Seat, MAX_PAYOFF};
use crate::strategy::StrategyProvider;

pub const DEFAULT_HANDS: u64 = 1_000_000;

/// Progress is reported this many times over a match.
pub const CHECKPOINTS: u64 = 10;

/// Win rates closer to zero than this (milli-units per hand) count as a tie.
pub const TIE_THRESHOLD: f64 = 10.0;

/// Hands per parallel work unit. Fixed so a seeded run gives the same result
/// on any number of threads.
const PARALLEL_CHUNK: u64 = 16_384;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub hands: u64,
    /// Fixed seed for a reproducible match; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub parallel: bool,
}

impl MatchConfig {
    pub fn new(hands: u64, seed: Option<u64>, parallel: bool) -> KuhnResult<MatchConfig> {
        if hands == 0 {
            return Err(KuhnError::InvalidConfig(
                "hand count must be positive".to_string(),
            ));
        }
        Ok(MatchConfig {
            hands,
            seed,
            parallel,
        })
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            hands: DEFAULT_HANDS,
            seed: None,
            parallel: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Single hand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandRecord {
    pub deal: Deal,
    pub learned_seat: Seat,
    pub history: History,
    /// Seat 0's result in antes.
    pub payoff: i32,
    /// The learned side's result in antes.
    pub utility: i32,
}

/// Drive one deal from the empty history to a terminal one.
///
/// `seats[i]` acts only when seat `i` is on turn, and only with its own card.
pub fn play_out<R: Rng + ?Sized>(
    seats: [&dyn StrategyProvider; 2],
    deal: &Deal,
    rng: &mut R,
) -> KuhnResult<History> {
    let cards = [deal.seat0, deal.seat1];
    let mut history = History::Root;
    let mut actions = 0;
    while let Some(seat) = history.to_act() {
        assert!(actions < 3, "betting ran past three actions at {}", history);
        let strategy = seats[seat.index()].strategy(cards[seat.index()], history)?;
        let action = strategy.sample(rng.gen::<f64>());
        history = history.play(action)?;
        actions += 1;
    }
    Ok(history)
}

/// Fair coin for the learned side's chair.
pub fn draw_seat<R: Rng + ?Sized>(rng: &mut R) -> Seat {
    if rng.gen_bool(0.5) {
        Seat::Zero
    } else {
        Seat::One
    }
}

/// Play one hand of `learned` against `opponent` with a fresh seat draw and deal.
pub fn play_hand<R: Rng + ?Sized>(
    learned: &dyn StrategyProvider,
    opponent: &dyn StrategyProvider,
    rng: &mut R,
) -> KuhnResult<HandRecord> {
    let learned_seat = draw_seat(rng);
    let deal = Deal::random(rng);
    play_deal(learned, opponent, learned_seat, deal, rng)
}

/// Play a hand with the chairs and cards already fixed.
pub fn play_deal<R: Rng + ?Sized>(
    learned: &dyn StrategyProvider,
    opponent: &dyn StrategyProvider,
    learned_seat: Seat,
    deal: Deal,
    rng: &mut R,
) -> KuhnResult<HandRecord> {
    let seats = match learned_seat {
        Seat::Zero => [learned, opponent],
        Seat::One => [opponent, learned],
    };
    let history = play_out(seats, &deal, rng)?;
    let payoff = payoff(history, &deal)?;
    let utility = match learned_seat {
        Seat::Zero => payoff,
        Seat::One => -payoff,
    };

    log::trace!(
        "deal {} learned {} history {} payoff {:+}",
        deal,
        learned_seat,
        history.as_str(),
        payoff
    );
    Ok(HandRecord {
        deal,
        learned_seat,
        history,
        payoff,
        utility,
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Running utility credited to the learned side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchTally {
    pub total_utility: i64,
    pub hands: u64,
}

impl MatchTally {
    pub fn record(&mut self, utility: i32) {
        self.total_utility += utility as i64;
        self.hands += 1;
        debug_assert!(self.within_bounds());
    }

    /// Combine two independent partial tallies.
    pub fn merge(&mut self, other: &MatchTally) {
        self.total_utility += other.total_utility;
        self.hands += other.hands;
    }

    /// No hand moves more than `MAX_PAYOFF`, so the sum never exceeds it per hand.
    pub fn within_bounds(&self) -> bool {
        self.total_utility.unsigned_abs() <= MAX_PAYOFF as u64 * self.hands
    }

    /// Mean utility per hand, in antes.
    pub fn average(&self) -> f64 {
        if self.hands == 0 {
            return 0.0;
        }
        self.total_utility as f64 / self.hands as f64
    }

    /// Mean utility per hand in milli-units (thousandths of an ante).
    pub fn win_rate(&self) -> f64 {
        self.average() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    StatisticalTie,
    LearnedWins,
    TextbookWins,
}

impl Verdict {
    pub fn from_win_rate(win_rate: f64) -> Verdict {
        if win_rate.abs() < TIE_THRESHOLD {
            Verdict::StatisticalTie
        } else if win_rate > 0.0 {
            Verdict::LearnedWins
        } else {
            Verdict::TextbookWins
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::StatisticalTie => write!(f, "statistical tie"),
            Verdict::LearnedWins => write!(f, "learned model wins"),
            Verdict::TextbookWins => write!(f, "theoretical GTO wins"),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub hands_done: u64,
    pub total: u64,
    pub win_rate: f64,
}

impl Checkpoint {
    pub fn percent(&self) -> f64 {
        self.hands_done as f64 / self.total as f64 * 100.0
    }
}

pub trait ProgressSink {
    fn checkpoint(&mut self, checkpoint: &Checkpoint);
}

/// Discards progress reports.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn checkpoint(&mut self, _checkpoint: &Checkpoint) {}
}

/// Collects progress reports in order.
#[derive(Debug, Default)]
pub struct ProgressLog(pub Vec<Checkpoint>);

impl ProgressSink for ProgressLog {
    fn checkpoint(&mut self, checkpoint: &Checkpoint) {
        self.0.push(*checkpoint);
    }
}

/// Hand counts at which progress is reported: the k-th tenth of `total`
/// rounded down, for k = 1..=10, skipping zero and repeats. The last one is
/// always `total`.
pub fn checkpoints(total: u64) -> Vec<u64> {
    (1..=CHECKPOINTS)
        .map(|k| k * total / CHECKPOINTS)
        .filter(|&n| n > 0)
        .dedup()
        .collect()
}

// ---------------------------------------------------------------------------
// Match drivers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct MatchSummary {
    pub tally: MatchTally,
    pub elapsed: Duration,
    pub verdict: Verdict,
}

impl MatchSummary {
    fn new(tally: MatchTally, elapsed: Duration) -> MatchSummary {
        MatchSummary {
            tally,
            elapsed,
            verdict: Verdict::from_win_rate(tally.win_rate()),
        }
    }
}

/// Machine-readable match result, as printed by `kuhn match --json`.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub hands: u64,
    pub seed: Option<u64>,
    pub total_utility: i64,
    /// Milli-units per hand for the learned side.
    pub win_rate: f64,
    pub elapsed_secs: f64,
    pub verdict: Verdict,
}

impl MatchSummary {
    pub fn report(&self, config: &MatchConfig) -> MatchReport {
        MatchReport {
            hands: self.tally.hands,
            seed: config.seed,
            total_utility: self.tally.total_utility,
            win_rate: self.tally.win_rate(),
            elapsed_secs: self.elapsed.as_secs_f64(),
            verdict: self.verdict,
        }
    }
}

/// Run a match as configured, seeding the random source from the config.
pub fn simulate(
    config: &MatchConfig,
    learned: &dyn StrategyProvider,
    opponent: &dyn StrategyProvider,
    sink: &mut dyn ProgressSink,
) -> KuhnResult<MatchSummary> {
    let mut rng = config.rng();
    log::info!(
        "match: {} hands, {} vs {}{}",
        config.hands,
        learned.name(),
        opponent.name(),
        if config.parallel { " (parallel)" } else { "" }
    );
    if config.parallel {
        run_parallel(config.hands, learned, opponent, &mut rng, sink)
    } else {
        run_sequential(config.hands, learned, opponent, &mut rng, sink)
    }
}

/// Play `hands` hands one after another on a single thread.
pub fn run_sequential<R: Rng + ?Sized>(
    hands: u64,
    learned: &dyn StrategyProvider,
    opponent: &dyn StrategyProvider,
    rng: &mut R,
    sink: &mut dyn ProgressSink,
) -> KuhnResult<MatchSummary> {
    let start = Instant::now();
    let mut tally = MatchTally::default();
    for target in checkpoints(hands) {
        while tally.hands < target {
            tally.record(play_hand(learned, opponent, rng)?.utility);
        }
        report(sink, &tally, hands);
    }
    Ok(MatchSummary::new(tally, start.elapsed()))
}

/// Play `hands` hands across the rayon pool.
///
/// Each stretch between checkpoints is cut into fixed-size chunks, every chunk
/// gets its own generator seeded from `rng`, and the partial tallies are summed
/// before the checkpoint is reported, so progress always reflects the whole
/// match.
pub fn run_parallel<R: Rng + ?Sized>(
    hands: u64,
    learned: &dyn StrategyProvider,
    opponent: &dyn StrategyProvider,
    rng: &mut R,
    sink: &mut dyn ProgressSink,
) -> KuhnResult<MatchSummary> {
    let start = Instant::now();
    let mut tally = MatchTally::default();
    for target in checkpoints(hands) {
        let pending = target - tally.hands;
        let chunks: Vec<(u64, u64)> = (0..pending)
            .step_by(PARALLEL_CHUNK as usize)
            .map(|offset| (rng.gen::<u64>(), PARALLEL_CHUNK.min(pending - offset)))
            .collect();

        let partials = chunks
            .into_par_iter()
            .map(|(seed, len)| {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut partial = MatchTally::default();
                for _ in 0..len {
                    partial.record(play_hand(learned, opponent, &mut rng)?.utility);
                }
                Ok(partial)
            })
            .collect::<KuhnResult<Vec<MatchTally>>>()?;

        for partial in &partials {
            tally.merge(partial);
        }
        report(sink, &tally, hands);
    }
    Ok(MatchSummary::new(tally, start.elapsed()))
}

fn report(sink: &mut dyn ProgressSink, tally: &MatchTally, total: u64) {
    let checkpoint = Checkpoint {
        hands_done: tally.hands,
        total,
        win_rate: tally.win_rate(),
    };
    log::debug!(
        "checkpoint {}/{} utility {:+}",
        tally.hands,
        total,
        tally.total_utility
    );
    sink.checkpoint(&checkpoint);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
