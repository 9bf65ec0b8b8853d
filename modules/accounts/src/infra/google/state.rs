use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::domain::ports::LoginStateStore;
use crate::domain::secrets::random_url_token;

const STATE_BYTES: usize = 24;

/// Process-local store of pending login `state` values.
pub struct InMemoryStateStore {
    ttl: Duration,
    pending: Mutex<HashMap<String, Instant>>,
}

impl InMemoryStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl LoginStateStore for InMemoryStateStore {
    fn issue(&self) -> String {
        let state = random_url_token(STATE_BYTES);
        let now = Instant::now();
        let mut pending = self.pending.lock();
        pending.retain(|_, deadline| *deadline > now);
        pending.insert(state.clone(), now + self.ttl);
        state
    }

    fn take(&self, state: &str) -> bool {
        self.pending
            .lock()
            .remove(state)
            .is_some_and(|deadline| deadline > Instant::now())
    }
}
