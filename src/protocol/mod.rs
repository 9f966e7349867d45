//! The Socialist Millionaires' Protocol: wire format, messages and state machine.

/// SMP messages for stages 1 to 4.
pub mod messages;
/// Comparison secrets.
pub mod secret;
/// Per-party state machine.
pub mod state;
/// TLV framing and fixed-width fields.
pub mod wire;

pub use messages::{SmpMessage, SmpMessage1, SmpMessage2, SmpMessage3, SmpMessage4, Stage, StageMessage};
pub use secret::Secret;
pub use state::{EphemeralKeys, SmpState, SmpStateMachine};
pub use wire::{Field, FieldKind, FieldReader, Short, Tlv};
