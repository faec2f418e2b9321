/// Fixed progress points of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Accepted,
    AnalysisStarted,
    ExtractionInFlight,
    ClassificationInFlight,
    Finalizing,
}

impl Milestone {
    pub fn progress(self) -> u8 {
        match self {
            Milestone::Accepted => 0,
            Milestone::AnalysisStarted => 20,
            Milestone::ExtractionInFlight => 40,
            Milestone::ClassificationInFlight => 60,
            Milestone::Finalizing => 90,
        }
    }

    pub fn step(self) -> &'static str {
        match self {
            Milestone::Accepted => "Initializing processing...",
            Milestone::AnalysisStarted => "Starting document analysis...",
            Milestone::ExtractionInFlight => "Processing with document extraction...",
            Milestone::ClassificationInFlight => "Classifying page groups...",
            Milestone::Finalizing => "Finalizing results...",
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, milestone: Milestone);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _milestone: Milestone) {}
}
