//! Domain models for the assistant service.

pub mod analysis;
pub mod turn;

pub use analysis::{Severity, SymptomAnalysis, Urgency};
pub use turn::{ConversationHistory, ConversationTurn, HistoryRetention};
