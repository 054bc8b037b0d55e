//! Selection of training faces from a live stream of preprocessed faces.

use std::time::{Duration, Instant};

use crate::{image::Image, recognition::similarity};

/// Minimum difference to the previously collected face for a new face to be collected.
pub const CHANGE_IN_IMAGE_FOR_COLLECTION: f64 = 0.3;

/// Minimum time between two collected faces.
pub const CHANGE_IN_SECONDS_FOR_COLLECTION: Duration = Duration::from_secs(1);

/// Decides which preprocessed faces are worth adding to a training set.
///
/// Consecutive camera frames are nearly identical. Training on all of them would only make the
/// model slower, so a face is only collected if it noticeably differs from the last collected one
/// and enough time has passed since then.
pub struct FaceCollector {
    min_change: f64,
    min_interval: Duration,
    last: Option<(Image, Instant)>,
}

impl Default for FaceCollector {
    fn default() -> Self {
        Self {
            min_change: CHANGE_IN_IMAGE_FOR_COLLECTION,
            min_interval: CHANGE_IN_SECONDS_FOR_COLLECTION,
            last: None,
        }
    }
}

impl FaceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_change(mut self, min_change: f64) -> Self {
        self.min_change = min_change;
        self
    }

    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Returns whether `face` should be collected now, and remembers it if so.
    pub fn consider(&mut self, face: &Image) -> bool {
        self.consider_at(face, Instant::now())
    }

    /// Like [`FaceCollector::consider`], with an explicit timestamp.
    pub fn consider_at(&mut self, face: &Image, now: Instant) -> bool {
        if let Some((last, at)) = &self.last {
            let change = similarity(face, last);
            let elapsed = now.saturating_duration_since(*at);
            if change <= self.min_change || elapsed < self.min_interval {
                return false;
            }
            log::debug!("collecting face (change {:.3}, {:?} since last)", change, elapsed);
        }

        self.last = Some((face.clone(), now));
        true
    }

    /// Forgets the previously collected face, so that the next face is always collected.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
