//! Generic event-engine infrastructure shared by the subscribe and presence engines.
//!
//! - [`machine`]: [`State`] trait, [`Transition`], [`StateMachine::trigger`]
//! - [`dispatcher`]: [`Invocation`] classification, [`Effects`] seam, [`Dispatcher`] registry
//! - [`runtime`]: [`EngineHandle`] actor that wires the two together
//!
//! ```text
//! event ─► StateMachine ─► [exit?, transition…, enter?] ─► Dispatcher ─► effects
//!   ▲                                                                     │
//!   └────────────────────────── Completion (if still current) ◄───────────┘
//! ```

pub mod dispatcher;
pub mod machine;
pub mod runtime;

pub use dispatcher::{Completion, Dispatch, Dispatcher, Effects, Invocation};
pub use machine::{State, StateMachine, Transition};
pub use runtime::{EngineHandle, Snapshot};

/// Stable snake_case name of a state, event or invocation, used in logs.
pub trait Named {
    fn name(&self) -> &'static str;
}
