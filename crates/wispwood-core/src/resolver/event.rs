//! Record of combat outcomes for telemetry and presentation.
//!
//! The log does not affect the simulation. Hosts drain it after each tick
//! with [`CombatLog::take_events`] to drive sounds, HUD updates or replays.

use serde::{Deserialize, Serialize};

use crate::entity::{Archetype, EntityId};

/// Something that happened during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombatEvent {
    /// A player swing landed on an enemy.
    EnemyHit {
        /// The enemy that was hit.
        enemy: EntityId,
        /// Damage dealt.
        damage: i32,
        /// Enemy health after the hit.
        health: i32,
    },
    /// An enemy's health ran out.
    EnemyKilled {
        /// The enemy.
        enemy: EntityId,
        /// Its archetype.
        archetype: Archetype,
    },
    /// A dead enemy finished its death clip and left the scene.
    EnemyRemoved {
        /// The enemy.
        enemy: EntityId,
        /// Its archetype.
        archetype: Archetype,
    },
    /// The shared health pool dropped.
    PlayerHurt {
        /// Pool after the drop.
        health: i32,
    },
    /// The shared health pool ran out.
    PlayerKilled,
    /// The boss died.
    GameWon,
    /// The player's death clip finished.
    GameOver,
}

/// A logged event and the tick it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Tick number.
    pub tick: u64,
    /// What happened.
    pub event: CombatEvent,
}

/// Append-only event log, drained by the host.
#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    records: Vec<Record>,
}

impl CombatLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&mut self, tick: u64, event: CombatEvent) {
        self.records.push(Record { tick, event });
    }

    /// Drains and returns every record in the order it was logged.
    pub fn take_events(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    /// Returns the number of undrained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is waiting to be drained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every undrained record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_events_drains_in_order() {
        let mut log = CombatLog::new();
        log.record(1, CombatEvent::PlayerHurt { health: 90 });
        log.record(2, CombatEvent::PlayerKilled);
        assert_eq!(log.len(), 2);

        let records = log.take_events();
        assert_eq!(records[0].event, CombatEvent::PlayerHurt { health: 90 });
        assert_eq!(records[1].tick, 2);
        assert!(log.is_empty());
    }

    #[test]
    fn clear_discards_records() {
        let mut log = CombatLog::new();
        log.record(1, CombatEvent::GameWon);
        log.clear();
        assert!(log.take_events().is_empty());
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = CombatEvent::EnemyKilled {
            enemy: EntityId::new(4),
            archetype: Archetype::Boss,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "enemy_killed");
        assert_eq!(json["archetype"], "boss");
        assert_eq!(json["enemy"], 4);
    }
}
