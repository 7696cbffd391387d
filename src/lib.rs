//! Pocket Sim - a rules engine for a pocket trading card battle game
//!
//! Card text is compiled once at load time into executable effects; the
//! engine then runs matches between two decision agents, turn by turn, and
//! keeps a typed log of everything that happened.

pub mod compiler;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod tournament;
pub mod zones;

pub use error::{GameError, Result};
