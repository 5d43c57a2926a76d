//! Prompt assembly.
//!
//! Merges the persona instruction, the history window, and the new input
//! into the ordered message sequence sent to the model. The sequence is
//! rebuilt from scratch on every turn; only the history window persists.

use crate::llm::Message;
use crate::persona::PersonaSpec;

use super::history::Turn;

/// Assemble the prompt for one turn.
///
/// Order is fixed: the system instruction, then each past turn oldest-first
/// as an input/output pair, then the new input wrapped in the persona's
/// template. Pure and deterministic.
pub fn assemble(persona: &PersonaSpec, history: &[Turn], input: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2 + history.len() * 2);
    messages.push(Message::system(persona.instruction.as_str()));
    for turn in history {
        messages.push(Message::history_input(turn.input()));
        messages.push(Message::history_output(turn.output()));
    }
    messages.push(Message::current_input(persona.render_input(input)));
    messages
}
