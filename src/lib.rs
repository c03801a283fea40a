pub mod cards;
pub mod cli;
pub mod display;
pub mod error;
pub mod game_tree;
pub mod model;
pub mod simulation;
pub mod strategy;
