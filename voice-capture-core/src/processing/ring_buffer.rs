/// Fixed-capacity circular history of the most recent audio samples.
///
/// Wrap in `parking_lot::Mutex` for cross-thread access.
///
/// Overflow behavior: drops oldest samples.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    write_index: usize,
    available: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            write_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Write samples into the ring buffer.
    ///
    /// If the buffer overflows, the oldest samples are dropped.
    /// If `samples` is larger than capacity, only the last `capacity` samples are kept.
    pub fn write(&mut self, samples: &[f32]) {
        if samples.is_empty() || self.capacity == 0 {
            return;
        }

        let samples = if samples.len() > self.capacity {
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available = (self.available + samples.len()).min(self.capacity);
    }

    /// Copy out the newest `count` samples, oldest first, without consuming them.
    ///
    /// Returns fewer samples if fewer have been written.
    pub fn latest(&self, count: usize) -> Vec<f32> {
        let to_read = count.min(self.available);
        if to_read == 0 {
            return Vec::new();
        }

        let start = (self.write_index + self.capacity - to_read) % self.capacity;
        (0..to_read)
            .map(|i| self.buffer[(start + i) % self.capacity])
            .collect()
    }

    /// Number of samples currently held.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// The total capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
