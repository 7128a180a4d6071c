pub mod dialogue;
pub mod stt;
pub mod tts;

pub use dialogue::{ScriptCursor, ScriptedDialogue};
