use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::ALL_CARDS;
use crate::game_tree::{Action, DECISION_HISTORIES};
use crate::simulation::{Checkpoint, MatchSummary, ProgressSink, Verdict};
use crate::strategy::StrategyProvider;

/// Describe who is on turn at each decision history, as used in table headers.
fn history_label(index: usize) -> &'static str {
    match index {
        0 => "open",
        1 => "facing pass",
        2 => "facing bet",
        _ => "pass, facing bet",
    }
}

/// Grid of bet frequencies: one row per card, one column per decision history.
pub fn strategy_table(provider: &dyn StrategyProvider, title: &str) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("")];
    for (i, history) in DECISION_HISTORIES.iter().enumerate() {
        header.push(
            Cell::new(format!("{} ({})", history_label(i), history.as_str()))
                .set_alignment(CellAlignment::Center),
        );
    }
    table.set_header(header);

    for card in ALL_CARDS {
        let mut row = vec![Cell::new(card.name().bold().to_string())];
        for &history in &DECISION_HISTORIES {
            let cell = match provider.strategy(card, history) {
                Ok(s) => Cell::new(bet_frequency(s.bet())),
                Err(_) => Cell::new("-".dimmed().to_string()),
            };
            row.push(cell.set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    format!("  {} {}\n{}", title.bold(), "(bet/call %)".dimmed(), table)
}

fn bet_frequency(bet: f64) -> String {
    let pct = format!("{:.1}%", bet * 100.0);
    if bet >= 0.9995 {
        pct.red().bold().to_string()
    } else if bet < 0.0005 {
        pct.dimmed().to_string()
    } else {
        pct.yellow().to_string()
    }
}

pub fn styled_action(action: Action) -> String {
    match action {
        Action::Bet => action.to_string().red().bold().to_string(),
        Action::Pass => action.to_string().yellow().bold().to_string(),
    }
}

pub fn progress_line(checkpoint: &Checkpoint) -> String {
    format!(
        "  Progress: {:>3.0}%... (win rate: {} mu/hand)",
        checkpoint.percent(),
        signed_rate(checkpoint.win_rate),
    )
}

fn signed_rate(win_rate: f64) -> String {
    let s = format!("{:+.4}", win_rate);
    if win_rate.abs() < crate::simulation::TIE_THRESHOLD {
        s.normal().to_string()
    } else if win_rate > 0.0 {
        s.green().to_string()
    } else {
        s.red().to_string()
    }
}

pub fn summary_table(summary: &MatchSummary) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Metric").set_alignment(CellAlignment::Left),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);

    table.add_row(vec![
        Cell::new("Hands".bold().to_string()),
        Cell::new(summary.tally.hands.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Total utility".bold().to_string()),
        Cell::new(format!("{:+}", summary.tally.total_utility)),
    ]);
    table.add_row(vec![
        Cell::new("Average utility".bold().to_string()),
        Cell::new(format!("{:+.8}", summary.tally.average())),
    ]);
    table.add_row(vec![
        Cell::new("Win rate".bold().to_string()),
        Cell::new(format!("{} mu/hand", signed_rate(summary.tally.win_rate()))),
    ]);
    table.add_row(vec![
        Cell::new("Elapsed".bold().to_string()),
        Cell::new(format!("{:.2}s", summary.elapsed.as_secs_f64())),
    ]);

    table.to_string()
}

pub fn styled_verdict(verdict: Verdict) -> String {
    let text = verdict.to_string().to_uppercase();
    match verdict {
        Verdict::StatisticalTie => text.cyan().bold().to_string(),
        Verdict::LearnedWins => text.green().bold().to_string(),
        Verdict::TextbookWins => text.red().bold().to_string(),
    }
}

/// Prints each checkpoint as it arrives.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn checkpoint(&mut self, checkpoint: &Checkpoint) {
        println!("{}", progress_line(checkpoint));
    }
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}
