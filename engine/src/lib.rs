pub mod controls;
pub mod dom;
pub mod error;
pub mod form;
pub mod script;
pub mod submission;

pub use controls::{Action, Control};
pub use error::EngineError;
pub use form::FormState;
pub use script::{Gesture, ScriptLine, parse_script, run_script};
pub use submission::{Submission, decode};
