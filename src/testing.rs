//! Stub adapters shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::data_sources::SourceAdapter;
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, Location};

/// Adapter that counts calls and returns `batch` events per call, with ids
/// `<call>-<n>` so replacement is observable.
pub struct StubAdapter {
    hazard_type: HazardType,
    batch: usize,
    delay: Duration,
    calls: AtomicUsize,
    failing: AtomicBool,
    magnitude: Mutex<Option<f64>>,
}

impl StubAdapter {
    pub fn new(hazard_type: HazardType, batch: usize) -> Self {
        Self {
            hazard_type,
            batch,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            magnitude: Mutex::new(Some(5.2)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_magnitude(&self, magnitude: Option<f64>) {
        *self.magnitude.lock().unwrap() = magnitude;
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    fn hazard_type(&self) -> HazardType {
        self.hazard_type
    }

    async fn fetch(&self, _timeout: Duration) -> Result<Vec<HazardEvent>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("connection refused".to_string()));
        }

        let magnitude = *self.magnitude.lock().unwrap();
        Ok((0..self.batch)
            .map(|n| {
                HazardEvent::new(self.hazard_type, format!("{}-{}", call, n))
                    .with_location(Location::new(34.0, -118.2))
                    .with_magnitude(magnitude)
                    .with_attribute("category", "Category 5")
            })
            .collect())
    }
}
