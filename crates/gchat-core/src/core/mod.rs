//! Core module: UI-agnostic dispatch runtime.
//!
//! This module contains:
//! - `dispatcher`: Prompt dispatcher (settle, provider call, timed reveal)
//! - `session`: Dispatch session, generation ids and status
//! - `display`: Display snapshot published to the front end
//! - `format`: Answer-to-display markup transform and tokenizer
//! - `history`: In-memory prompt history
//! - `interrupt`: Signal handling for stopping a generation

pub mod dispatcher;
pub mod display;
pub mod format;
pub mod history;
pub mod interrupt;
pub mod session;
