//! Podcast generation: turn a batch of article URLs into a two-host episode.
//!
//! # Submodules
//!
//! - [`pipeline`]: the staged job and its status stream
//! - [`script`]: script generation through a text model with web search
//! - [`chunker`]: line-aligned splitting within the speech byte budget
//! - [`speech`]: per-chunk two-speaker synthesis
//! - [`artifacts`]: writing, finding and deleting the `.txt` / `.mp3` pair
//! - [`prompts`]: fixed instructions for both services
//!
//! # Output Structure
//!
//! ```text
//! output_dir/podcasts/
//! ├── show_1718000000.txt
//! └── show_1718000000.mp3
//! ```

pub mod artifacts;
pub mod chunker;
pub mod pipeline;
pub mod prompts;
pub mod script;
pub mod speech;

pub use artifacts::ArtifactStore;
pub use pipeline::PodcastPipeline;
pub use script::{OpenAiScriptWriter, ScriptWriter};
pub use speech::{CloudSpeechSynthesizer, SpeechSynthesizer};
