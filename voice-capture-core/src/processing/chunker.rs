use std::time::Duration;

/// Cuts a continuous mono sample stream into fixed-length time slices.
///
/// Slices come out in the order their samples went in; a trailing partial
/// slice is only released by `finish`.
#[derive(Debug)]
pub struct TimeSliceChunker {
    slice_frames: usize,
    pending: Vec<f32>,
}

impl TimeSliceChunker {
    pub fn new(sample_rate: f64, timeslice: Duration) -> Self {
        let slice_frames = ((sample_rate * timeslice.as_secs_f64()).round() as usize).max(1);
        Self {
            slice_frames,
            pending: Vec::with_capacity(slice_frames),
        }
    }

    pub fn slice_frames(&self) -> usize {
        self.slice_frames
    }

    /// Number of samples waiting for their slice to fill.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Append samples, returning every slice that became complete.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut slices = Vec::new();
        let mut rest = samples;

        while !rest.is_empty() {
            let room = self.slice_frames - self.pending.len();
            let take = room.min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.pending.len() == self.slice_frames {
                let full = std::mem::replace(&mut self.pending, Vec::with_capacity(self.slice_frames));
                slices.push(full);
            }
        }
        slices
    }

    /// Release the trailing partial slice, if any.
    pub fn finish(&mut self) -> Option<Vec<f32>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_length_follows_rate() {
        let chunker = TimeSliceChunker::new(16000.0, Duration::from_millis(100));
        assert_eq!(chunker.slice_frames(), 1600);
    }

    #[test]
    fn emits_full_slices_only() {
        let mut chunker = TimeSliceChunker::new(100.0, Duration::from_millis(100)); // 10 frames

        assert!(chunker.push(&[0.0; 7]).is_empty());
        let slices = chunker.push(&[1.0; 7]);
        assert_eq!(slices.len(), 1);
        assert_eq!(&slices[0][..7], &[0.0; 7]);
        assert_eq!(&slices[0][7..], &[1.0; 3]);
        assert_eq!(chunker.pending(), 4);
    }

    #[test]
    fn large_push_splits_in_order() {
        let mut chunker = TimeSliceChunker::new(100.0, Duration::from_millis(100));
        let samples: Vec<f32> = (0..25).map(|i| i as f32).collect();

        let slices = chunker.push(&samples);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0][0], 0.0);
        assert_eq!(slices[1][0], 10.0);
        assert_eq!(chunker.finish(), Some((20..25).map(|i| i as f32).collect()));
        assert_eq!(chunker.finish(), None);
    }

    #[test]
    fn tiny_timeslice_still_makes_progress() {
        let mut chunker = TimeSliceChunker::new(10.0, Duration::from_millis(1));
        assert_eq!(chunker.slice_frames(), 1);
        assert_eq!(chunker.push(&[0.5, 0.25]).len(), 2);
    }
}
