//! Fire-and-forget signal bus for cross-entity notification.
//!
//! Signals emitted during a tick are delivered at the start of the next one.
//! Delayed signals count down with the tick clock, including while the game
//! is paused.

use serde::{Deserialize, Serialize};

/// Named signals exchanged without direct coupling between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    /// The title screen was dismissed and the play scene is shown.
    StartPlay,
    /// The player cast the light spell.
    Cast,
    /// The light spell faded.
    CastEnd,
}

#[derive(Debug, Clone, PartialEq)]
struct Scheduled {
    remaining: f32,
    signal: Signal,
}

/// Queue of ready and scheduled signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBus {
    ready: Vec<Signal>,
    scheduled: Vec<Scheduled>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a signal for the next delivery.
    pub fn emit(&mut self, signal: Signal) {
        self.ready.push(signal);
    }

    /// Queues a signal once `delay` seconds have elapsed.
    pub fn emit_after(&mut self, signal: Signal, delay: f32) {
        if delay <= 0.0 {
            self.emit(signal);
        } else {
            self.scheduled.push(Scheduled {
                remaining: delay,
                signal,
            });
        }
    }

    /// Advances scheduled signals; matured ones become ready in the order
    /// they were scheduled.
    pub fn advance(&mut self, dt: f32) {
        let mut matured = Vec::new();
        self.scheduled.retain_mut(|entry| {
            entry.remaining -= dt;
            if entry.remaining <= 0.0 {
                matured.push(entry.signal);
                false
            } else {
                true
            }
        });
        self.ready.extend(matured);
    }

    /// Removes and returns every ready signal.
    pub fn drain(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.ready)
    }

    /// Returns the number of ready plus scheduled signals.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.ready.len() + self.scheduled.len()
    }

    /// Returns `true` if nothing is ready or scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_signals_drain_in_order() {
        let mut bus = EventBus::new();
        bus.emit(Signal::StartPlay);
        bus.emit(Signal::Cast);

        assert_eq!(bus.drain(), vec![Signal::StartPlay, Signal::Cast]);
        assert!(bus.is_empty());
    }

    #[test]
    fn scheduled_signal_matures_after_delay() {
        let mut bus = EventBus::new();
        bus.emit_after(Signal::CastEnd, 1.0);

        bus.advance(0.5);
        assert!(bus.drain().is_empty());
        assert_eq!(bus.pending(), 1);

        bus.advance(0.5);
        assert_eq!(bus.drain(), vec![Signal::CastEnd]);
        assert!(bus.is_empty());
    }

    #[test]
    fn zero_delay_is_immediate() {
        let mut bus = EventBus::new();
        bus.emit_after(Signal::Cast, 0.0);
        assert_eq!(bus.drain(), vec![Signal::Cast]);
    }

    #[test]
    fn signal_names_serialize_kebab_case() {
        let json = serde_json::to_string(&Signal::StartPlay).unwrap();
        assert_eq!(json, "\"start-play\"");
    }
}
