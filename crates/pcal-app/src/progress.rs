#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStage {
    Preparing,
    WritingInputs,
    RunningModel { attempt: u32 },
    Extracting,
    Scoring,
    Recording,
    Completed,
    Cancelled,
    Aborted,
}

impl SweepStage {
    pub fn label(&self) -> &'static str {
        match self {
            SweepStage::Preparing => "preparing",
            SweepStage::WritingInputs => "writing inputs",
            SweepStage::RunningModel { .. } => "running model",
            SweepStage::Extracting => "extracting",
            SweepStage::Scoring => "scoring",
            SweepStage::Recording => "recording",
            SweepStage::Completed => "completed",
            SweepStage::Cancelled => "cancelled",
            SweepStage::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepProgressEvent {
    pub stage: SweepStage,
    /// Index of the trial in progress, if any
    pub trial: Option<u32>,
    pub trial_count: u32,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl SweepProgressEvent {
    /// Fraction of trials finished before this event.
    pub fn fraction_complete(&self) -> f64 {
        if self.trial_count == 0 {
            return 1.0;
        }
        match (self.stage, self.trial) {
            (SweepStage::Completed, _) => 1.0,
            (_, Some(trial)) => f64::from(trial) / f64::from(self.trial_count),
            (_, None) => 0.0,
        }
    }
}
