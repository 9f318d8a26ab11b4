// SampleBuffer - fixed-capacity rolling store of temperature samples
//
// Backs both the live-chart window and the recording buffer. Appends are
// O(1); once full, each append evicts the oldest sample. The buffer itself
// is not synchronized: it lives inside `SharedBuffers` behind the single
// acquisition lock.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

/// One timestamped temperature reading. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub unit: TemperatureUnit,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, unit: TemperatureUnit) -> Self {
        Self {
            timestamp,
            temperature,
            unit,
        }
    }

    pub fn temperature_f(&self) -> f64 {
        self.unit.to_fahrenheit(self.temperature)
    }

    /// Temperature expressed in `unit`, unchanged when already in that unit
    pub fn temperature_in(&self, unit: TemperatureUnit) -> f64 {
        if self.unit == unit {
            self.temperature
        } else {
            unit.from_fahrenheit(self.temperature_f())
        }
    }
}

/// Ring buffer of samples in insertion order
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer holding at most `capacity` samples
    ///
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted oldest sample when full
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Copy of the contents, oldest first
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Move the contents out, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<Sample> {
        self.samples.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn sample(i: i64) -> Sample {
        Sample::new(
            DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(i),
            i as f64,
            TemperatureUnit::Celsius,
        )
    }

    #[test]
    fn test_push_until_full() {
        let mut buffer = SampleBuffer::new(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.push(sample(0)), None);
        assert_eq!(buffer.push(sample(1)), None);
        assert_eq!(buffer.push(sample(2)), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_ring_keeps_last_n_in_order() {
        for capacity in [1usize, 2, 5, 17] {
            for extra in [0usize, 1, 3, 40] {
                let mut buffer = SampleBuffer::new(capacity);
                let total = capacity + extra;
                for i in 0..total {
                    buffer.push(sample(i as i64));
                }

                let kept: Vec<f64> = buffer.iter().map(|s| s.temperature).collect();
                let expected: Vec<f64> = (extra..total).map(|i| i as f64).collect();
                assert_eq!(kept, expected, "capacity={capacity} extra={extra}");
            }
        }
    }

    #[test]
    fn test_push_returns_evicted_oldest() {
        let mut buffer = SampleBuffer::new(2);
        buffer.push(sample(0));
        buffer.push(sample(1));
        assert_eq!(buffer.push(sample(2)), Some(sample(0)));
        assert_eq!(buffer.first(), Some(&sample(1)));
        assert_eq!(buffer.latest(), Some(&sample(2)));
    }

    #[test]
    fn test_drain_empties_buffer() {
        let mut buffer = SampleBuffer::new(4);
        buffer.push(sample(0));
        buffer.push(sample(1));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_temperature_f_converts_celsius() {
        assert!((sample(100).temperature_f() - 212.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = SampleBuffer::new(0);
    }
}
