//! Conversation context: the history window and prompt assembly.
//!
//! 1. **History Window**: bounded FIFO of recent turns, the only state that
//!    survives between turns.
//!
//! 2. **Prompt Assembler**: pure merge of persona instruction, history and
//!    the new input into an ordered message sequence.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Context                     │
//! │                                              │
//! │  ┌─────────────┐  snapshot  ┌─────────────┐  │
//! │  │  History    │───────────▶│   Prompt    │  │
//! │  │  Window (k) │            │  Assembler  │  │
//! │  └─────────────┘            └──────┬──────┘  │
//! │                                    ▼         │
//! │                     system · (in, out)* · in │
//! └──────────────────────────────────────────────┘
//! ```

pub mod history;
pub mod prompt;

pub use history::{HistoryWindow, Turn};
pub use prompt::assemble;
