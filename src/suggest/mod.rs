//! Candidate generation and selection: prompt the model, clean what comes
//! back, pick the best message, and fall back to rules when nothing is usable.

pub mod extract;
pub mod fallback;
pub mod pipeline;
pub mod rank;
pub mod tag;

pub use pipeline::{CancelToken, Limits, Origin, Selection, Suggester, Suggestion};
