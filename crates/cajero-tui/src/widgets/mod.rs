//! Reusable widgets.

pub mod code_card;
pub mod input_field;
