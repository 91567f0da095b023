use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// The progress reported to the `update_progress` callback passed to `Regressor::train`.
#[derive(Clone, Debug)]
pub enum TrainProgress {
	/// Sent once before the first round. The counter advances by one after every trained round, up to its total.
	Training(ProgressCounter),
}

/// A counter that can be cheaply cloned into a progress callback and observed from elsewhere while training advances it.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
}

#[test]
fn test_progress_counter_is_shared_between_clones() {
	let counter = ProgressCounter::new(3);
	let clone = counter.clone();
	counter.inc(1);
	counter.inc(1);
	assert_eq!(clone.get(), 2);
	assert_eq!(clone.total(), 3);
}
