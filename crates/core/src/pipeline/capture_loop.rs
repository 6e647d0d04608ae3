use crate::capture::domain::frame_source::FrameSource;
use crate::pipeline::detect_faces_use_case::DetectFacesUseCase;
use crate::pipeline::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// What a single tick produced.
#[derive(Debug)]
pub enum TickOutcome {
    /// A frame was pulled, processed and annotated.
    Processed {
        frame: Frame,
        result: DetectionResult,
    },
    /// The source had nothing this tick; no state changed.
    Idle,
    /// The loop was stopped; no frame was dispatched.
    Stopped,
}

/// Owns one detect-and-annotate cycle per tick.
///
/// All loop state lives here rather than in ambient globals: the frame
/// source, the pipeline, and the stop latch travel together, so the loop is
/// testable without any UI runtime. One frame is fully processed before the
/// next is pulled; a slow detector means later frames are picked up late
/// (and a live source drops them), never queued.
///
/// `stop` takes effect at the next tick boundary: no further frames are
/// dispatched, and work already in flight runs to completion.
pub struct CaptureLoop {
    source: Box<dyn FrameSource>,
    use_case: DetectFacesUseCase,
    stopped: bool,
}

impl CaptureLoop {
    pub fn new(source: Box<dyn FrameSource>, use_case: DetectFacesUseCase) -> Self {
        Self {
            source,
            use_case,
            stopped: false,
        }
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Pulls at most one frame and runs it through the pipeline.
    pub fn tick(&mut self) -> Result<TickOutcome, Box<dyn std::error::Error>> {
        if self.stopped {
            return Ok(TickOutcome::Stopped);
        }
        match self.source.next_frame()? {
            None => Ok(TickOutcome::Idle),
            Some(mut frame) => {
                let result = self.use_case.execute(&mut frame)?;
                Ok(TickOutcome::Processed { frame, result })
            }
        }
    }

    /// Drains the source, handing each annotated frame to `sink`.
    ///
    /// The sink returning `false` is a stop request, honored before the next
    /// frame is pulled. Returns the number of frames processed.
    pub fn run<F>(&mut self, mut sink: F) -> Result<usize, Box<dyn std::error::Error>>
    where
        F: FnMut(Frame, &DetectionResult) -> bool,
    {
        let mut processed = 0;
        loop {
            match self.tick()? {
                TickOutcome::Processed { frame, result } => {
                    processed += 1;
                    if !sink(frame, &result) {
                        self.stop();
                    }
                }
                TickOutcome::Idle | TickOutcome::Stopped => break,
            }
        }
        Ok(processed)
    }
}
