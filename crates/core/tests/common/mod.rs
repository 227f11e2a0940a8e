#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use turn_relay_core::{SideEffectError, SideEffectPort};

/// A side effect seen by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Speak { text: String, blocking: bool },
    Alert,
}

/// Records every side effect together with the (possibly paused) clock.
#[derive(Default, Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(Recorded, Instant)>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<(Recorded, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|(call, _)| *call == Recorded::Alert)
            .map(|(_, at)| at)
            .collect()
    }

    fn push(&self, call: Recorded) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }
}

#[async_trait]
impl SideEffectPort for Recorder {
    async fn speak(&self, text: &str, blocking: bool) -> Result<(), SideEffectError> {
        self.push(Recorded::Speak {
            text: text.to_string(),
            blocking,
        });
        Ok(())
    }

    async fn play_alert(&self) -> Result<(), SideEffectError> {
        self.push(Recorded::Alert);
        Ok(())
    }
}
