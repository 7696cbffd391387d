//! Match state, turn structure and the decision agents that drive it

pub mod actions;
pub mod checkup;
pub mod combat;
pub mod context;
pub mod controller;
pub mod events;
pub mod game_loop;
pub mod logger;
pub mod phase;
pub mod random_controller;
pub mod rules;
pub mod scripted_controller;
pub mod state;
pub mod zero_controller;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::{PlayerAction, TurnContext};
pub use context::EffectCtx;
pub use controller::{
    Agents, ChoiceOption, ChoiceRequest, DecisionAgent, DistributionRequest, GameView, SetupChoice,
};
pub use events::{DrawSkip, GameEvent};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use logger::{GameLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::TurnPhase;
pub use random_controller::RandomAgent;
pub use rules::RulesConfig;
pub use scripted_controller::ScriptedAgent;
pub use state::{Game, Seat, TurnGates, TurnTracking};
pub use zero_controller::ZeroAgent;
