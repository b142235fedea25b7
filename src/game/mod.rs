//! Game core: domain types, rules engine, and bot search.

pub mod bot;
pub mod rules;
mod types;

pub use types::{Board, Difficulty, GameMode, GameStatus, Move, Player};
