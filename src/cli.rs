use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cards::Deal;
use crate::display::{
    print_error, print_section, strategy_table, styled_action, styled_verdict, summary_table,
    ConsoleProgress,
};
use crate::error::{KuhnError, KuhnResult};
use crate::game_tree::Seat;
use crate::model::{Mlp, StrategyModel, TextbookModel};
use crate::simulation::{draw_seat, play_deal, simulate, MatchConfig, NoProgress, DEFAULT_HANDS};
use crate::strategy::{LearnedStrategy, StrategyProvider, TextbookStrategy};

#[derive(Parser)]
#[command(
    name = "kuhn",
    version,
    about = "Kuhn poker: measure a learned strategy against the textbook equilibrium."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a Monte Carlo match: learned strategy vs textbook GTO
    Match {
        /// Number of hands to simulate
        #[arg(short = 'n', long, default_value_t = DEFAULT_HANDS)]
        hands: u64,
        /// Seed for a reproducible match
        #[arg(short, long)]
        seed: Option<u64>,
        /// Network weights (safetensors); defaults to the equilibrium label table
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Spread hands across all cores
        #[arg(long)]
        parallel: bool,
        /// Print the result as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Show the learned strategy next to the textbook equilibrium
    Strategy {
        /// Network weights (safetensors); defaults to the equilibrium label table
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Deal and narrate a single hand
    Hand {
        /// Seed for a reproducible hand
        #[arg(short, long)]
        seed: Option<u64>,
        /// Cards for seat 0 then seat 1, e.g. KJ
        #[arg(short, long, value_parser = parse_deal)]
        cards: Option<Deal>,
        /// Network weights (safetensors); defaults to the equilibrium label table
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

pub fn run_with_args(args: Vec<String>) {
    let cli = Cli::parse_from(args);
    dispatch(cli);
}

fn dispatch(cli: Cli) {
    let result = match cli.command {
        Commands::Match {
            hands,
            seed,
            model,
            parallel,
            json,
        } => cmd_match(hands, seed, model, parallel, json),
        Commands::Strategy { model } => cmd_strategy(model),
        Commands::Hand { seed, cards, model } => cmd_hand(seed, cards, model),
    };
    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn parse_deal(s: &str) -> Result<Deal, String> {
    s.parse().map_err(|e: KuhnError| e.to_string())
}

fn load_model(path: Option<PathBuf>) -> KuhnResult<Box<dyn StrategyModel>> {
    match path {
        Some(path) => {
            log::info!("loading network weights from {}", path.display());
            let mlp = Mlp::load(&path)?;
            log::debug!("network shape {:?}", mlp.shape());
            Ok(Box::new(mlp))
        }
        None => Ok(Box::new(TextbookModel)),
    }
}

fn learned_strategy(path: Option<PathBuf>) -> KuhnResult<LearnedStrategy> {
    let model = load_model(path)?;
    LearnedStrategy::precompute(&*model)
}

fn cmd_match(
    hands: u64,
    seed: Option<u64>,
    model: Option<PathBuf>,
    parallel: bool,
    json: bool,
) -> KuhnResult<()> {
    let config = MatchConfig::new(hands, seed, parallel)?;
    let learned = learned_strategy(model)?;

    if json {
        let summary = simulate(&config, &learned, &TextbookStrategy, &mut NoProgress)?;
        println!("{}", serde_json::to_string_pretty(&summary.report(&config))?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} hands | {} vs {}{}",
        "Match".bold(),
        hands.to_string().bold(),
        learned.name().green(),
        TextbookStrategy.name().red(),
        seed.map(|s| format!(" | seed {}", s)).unwrap_or_default(),
    );
    println!();

    let summary = simulate(&config, &learned, &TextbookStrategy, &mut ConsoleProgress)?;

    println!();
    println!("{}", summary_table(&summary));
    print_section("Result", &styled_verdict(summary.verdict));
    println!();
    Ok(())
}

fn cmd_strategy(model: Option<PathBuf>) -> KuhnResult<()> {
    let learned = learned_strategy(model)?;

    println!();
    println!("{}", strategy_table(&learned, "Learned strategy"));
    println!();
    println!("{}", strategy_table(&TextbookStrategy, "Textbook GTO"));
    println!();
    Ok(())
}

fn cmd_hand(seed: Option<u64>, cards: Option<Deal>, model: Option<PathBuf>) -> KuhnResult<()> {
    let learned = learned_strategy(model)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let learned_seat = draw_seat(&mut rng);
    let deal = match cards {
        Some(deal) => deal,
        None => Deal::random(&mut rng),
    };
    let hand = play_deal(&learned, &TextbookStrategy, learned_seat, deal, &mut rng)?;
    let seat_name = |seat: Seat| {
        if seat == hand.learned_seat {
            learned.name().green().to_string()
        } else {
            TextbookStrategy.name().red().to_string()
        }
    };
    let cards = [hand.deal.seat0, hand.deal.seat1];

    println!();
    for seat in [Seat::Zero, Seat::One] {
        println!(
            "  {} {:<14} holds {}",
            seat.to_string().bold(),
            seat_name(seat),
            cards[seat.index()].name().bold(),
        );
    }
    println!("  {} {}", "Unused:".dimmed(), hand.deal.unused().name().dimmed());
    println!();

    let mut seat = Seat::Zero;
    for action in hand.history.actions() {
        println!("  {} {}", seat_name(seat), styled_action(action));
        seat = seat.other();
    }

    println!();
    println!(
        "  {} {} | seat 0 {:+} | learned {:+}",
        "Final:".bold(),
        hand.history.as_str(),
        hand.payoff,
        hand.utility,
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Card;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_args() {
        let cli = Cli::parse_from(["kuhn", "match", "-n", "5000", "--seed", "9", "--parallel"]);
        match cli.command {
            Commands::Match {
                hands,
                seed,
                model,
                parallel,
                json,
            } => {
                assert_eq!(hands, 5000);
                assert_eq!(seed, Some(9));
                assert!(model.is_none());
                assert!(parallel);
                assert!(!json);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_match_default_hands() {
        let cli = Cli::parse_from(["kuhn", "match"]);
        assert!(matches!(cli.command, Commands::Match { hands: DEFAULT_HANDS, .. }));
    }

    #[test]
    fn test_default_model_precomputes() {
        assert!(learned_strategy(None).is_ok());
    }

    #[test]
    fn test_run_strategy_command() {
        run_with_args(vec!["kuhn".to_string(), "strategy".to_string()]);
    }

    #[test]
    fn test_parse_hand_cards() {
        let cli = Cli::parse_from(["kuhn", "hand", "--cards", "KJ", "-s", "3"]);
        match cli.command {
            Commands::Hand { seed, cards, .. } => {
                assert_eq!(seed, Some(3));
                assert_eq!(cards, Some(Deal::new(Card::High, Card::Low)));
            }
            _ => panic!("expected hand command"),
        }
        assert!(Cli::try_parse_from(["kuhn", "hand", "--cards", "KK"]).is_err());
        assert!(Cli::try_parse_from(["kuhn", "hand", "--cards", "KA"]).is_err());
    }

    #[test]
    fn test_hand_with_fixed_cards() {
        let deal = Deal::new(Card::Middle, Card::Low);
        assert!(cmd_hand(Some(4), Some(deal), None).is_ok());
    }

    #[test]
    fn test_match_json_output() {
        assert!(cmd_match(200, Some(1), None, false, true).is_ok());
    }

    #[test]
    fn test_missing_model_file_errors() {
        let path = PathBuf::from("/nonexistent/kuhn-weights.safetensors");
        assert!(learned_strategy(Some(path)).is_err());
    }
}
