use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress while an archive directory is read. Implementations
/// must tolerate being called from whichever thread runs the parse.
pub trait ProgressSink {
	fn set_maximum(&self, max: u64);
	fn set_value(&self, value: u64);
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
	fn set_maximum(&self, _: u64) {}
	fn set_value(&self, _: u64) {}
}

/// Keeps the last reported values, for callers polling from elsewhere.
#[derive(Default)]
pub struct AtomicProgress {
	pub maximum: AtomicU64,
	pub value: AtomicU64
}

impl ProgressSink for AtomicProgress {
	fn set_maximum(&self, max: u64) {
		self.maximum.store(max, Ordering::Relaxed);
	}

	fn set_value(&self, value: u64) {
		self.value.store(value, Ordering::Relaxed);
	}
}

/// Wraps a sink so plugins can report freely: values never go backwards and
/// never exceed the maximum.
pub struct Progress<'a> {
	sink: &'a dyn ProgressSink,
	maximum: u64,
	value: u64
}

impl<'a> Progress<'a> {
	pub fn new(sink: &'a dyn ProgressSink) -> Self {
		Self {sink, maximum: 0, value: 0}
	}

	pub fn set_maximum(&mut self, max: u64) {
		self.maximum = max;
		self.value = self.value.min(max);
		self.sink.set_maximum(max);
	}

	pub fn set_value(&mut self, value: u64) {
		let value = value.min(self.maximum);
		if value > self.value {
			self.value = value;
			self.sink.set_value(value);
		}
	}

	pub fn value(&self) -> u64 {
		self.value
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn values_are_monotonic_and_clamped() {
		let sink = AtomicProgress::default();
		let mut progress = Progress::new(&sink);
		progress.set_maximum(10);
		progress.set_value(4);
		progress.set_value(2);
		assert_eq!(sink.value.load(Ordering::Relaxed), 4);
		progress.set_value(50);
		assert_eq!(progress.value(), 10);
		assert_eq!(sink.maximum.load(Ordering::Relaxed), 10);
	}
}
