mod session_action;
mod session_state;

pub use session_action::SessionAction;
pub use session_state::{SessionPhase, SessionState};
