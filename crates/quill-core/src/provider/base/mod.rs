//! Base implementations and shared logic for provider adapters.

mod openai_compatible;

pub(crate) use openai_compatible::{
    openai_compatible_complete, openai_compatible_transcribe,
};
