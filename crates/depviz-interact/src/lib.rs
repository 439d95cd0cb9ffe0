//! DepViz Interact — the canvas session: drag gestures, history, search and host events

pub mod drag;
pub mod events;
pub mod frame;
pub mod history;
pub mod reassemble;
pub mod search;
pub mod session;


#[cfg(test)]
pub mod test_utils;

pub use drag::{Drag, Gesture, MoveOutcome, ReleaseOutcome};
pub use events::{ExportKind, OutboundEvent};
pub use frame::FrameState;
pub use history::History;
pub use reassemble::{has_lost_children, reassemble, reattach};
pub use search::{Search, find};
pub use session::{ActiveSlice, ExportPayload, Session};
