//! Scripted in-memory sources
//!
//! Responses can be changed while the source is shared, which lets tests
//! simulate outages and recoveries across scan cycles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use arb_core::{FetchError, FetchResult, Instrument, Ticker, YieldOffer};

use crate::feeds::{TickerSource, YieldSource};

/// Ticker source answering from a fixed table. Instruments without an entry
/// are reported as unsupported.
pub struct FixedTickerSource {
    id: String,
    responses: Mutex<HashMap<Instrument, FetchResult<Ticker>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedTickerSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            responses: Mutex::new(HashMap::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_ticker(self, instrument: Instrument, ticker: Ticker) -> Self {
        self.set(instrument, Ok(ticker));
        self
    }

    pub fn with_error(self, instrument: Instrument, error: FetchError) -> Self {
        self.set(instrument, Err(error));
        self
    }

    /// Every request sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, instrument: Instrument, response: FetchResult<Ticker>) {
        self.responses.lock().insert(instrument, response);
    }

    /// Make every configured instrument fail with `error`
    pub fn fail_all(&self, error: FetchError) {
        for response in self.responses.lock().values_mut() {
            *response = Err(error.clone());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TickerSource for FixedTickerSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_ticker(&self, instrument: &Instrument) -> FetchResult<Ticker> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .get(instrument)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Unsupported(instrument.to_string())))
    }
}

/// Yield source answering with a fixed offer list or error
pub struct FixedYieldSource {
    protocol: String,
    response: Mutex<FetchResult<Vec<YieldOffer>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedYieldSource {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            response: Mutex::new(Ok(Vec::new())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_offers(self, offers: Vec<YieldOffer>) -> Self {
        self.set(Ok(offers));
        self
    }

    pub fn with_error(self, error: FetchError) -> Self {
        self.set(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, response: FetchResult<Vec<YieldOffer>>) {
        *self.response.lock() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl YieldSource for FixedYieldSource {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    async fn fetch_offers(&self) -> FetchResult<Vec<YieldOffer>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response.lock().clone()
    }
}
