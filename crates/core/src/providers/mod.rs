//! Script and video generation providers.

mod heygen;
mod openai;
mod prompt;
mod traits;

pub use heygen::HeyGenVideoProvider;
pub use openai::OpenAiScriptProvider;
pub use prompt::{build_prompt, platform_spec, SYSTEM_PROMPT};
pub use traits::{GenerationError, ScriptProvider, VideoHandle, VideoProvider, VideoStatus};
