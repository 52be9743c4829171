pub mod decode;
pub mod output;
pub mod playback;
pub mod resample;

pub use decode::{PcmBuffer, SYNTH_CHANNELS, SYNTH_SAMPLE_RATE};
pub use output::{default_backend, HeadlessOutput, OutputBackend, UnsupportedOutput};
pub use playback::{AudioPlaybackController, PlayOutcome};
