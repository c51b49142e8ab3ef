use std::fmt;

use crate::job::JobStep;

/// The three working stages of a job, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractAudio,
    Transcribe,
    Generate,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::ExtractAudio, Stage::Transcribe, Stage::Generate];

    /// Step recorded on the job when the stage starts.
    pub fn step(&self) -> JobStep {
        match self {
            Stage::ExtractAudio => JobStep::ExtractingAudio,
            Stage::Transcribe => JobStep::Transcribing,
            Stage::Generate => JobStep::GeneratingResponse,
        }
    }

    /// Progress checkpoint written when the stage starts.
    pub fn progress(&self) -> u8 {
        match self {
            Stage::ExtractAudio => 25,
            Stage::Transcribe => 50,
            Stage::Generate => 75,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Stage::ExtractAudio => "Extracting audio from video...",
            Stage::Transcribe => "Transcribing audio...",
            Stage::Generate => "Generating response...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step().as_str())
    }
}
