use std::collections::HashMap;

/// Remaining-turn counters keyed by `(actorId, actionId)`.
///
/// The host ticks this exactly once per completed turn; the engine never
/// ticks on its own.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: HashMap<(String, String), u32>,
}

impl CooldownTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the remaining turns for this actor/action pair.
    pub fn set(&mut self, actor_id: &str, action_id: &str, turns: u32) {
        self.entries
            .insert((actor_id.to_owned(), action_id.to_owned()), turns);
    }

    /// Ready iff the entry is absent or has reached zero.
    #[must_use]
    pub fn is_ready(&self, actor_id: &str, action_id: &str) -> bool {
        self.entries
            .get(&(actor_id.to_owned(), action_id.to_owned()))
            .map_or(true, |&turns| turns == 0)
    }

    /// Decrement every non-zero entry by one, flooring at zero.
    pub fn tick_all(&mut self) {
        for turns in self.entries.values_mut() {
            *turns = turns.saturating_sub(1);
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entry_is_ready() {
        let tracker = CooldownTracker::new();
        assert!(tracker.is_ready("pawn_e2", "place_mine"));
    }

    #[test]
    fn set_blocks_until_ticked_down() {
        let mut tracker = CooldownTracker::new();
        tracker.set("pawn_e2", "place_mine", 2);
        assert!(!tracker.is_ready("pawn_e2", "place_mine"));
        tracker.tick_all();
        assert!(!tracker.is_ready("pawn_e2", "place_mine"));
        tracker.tick_all();
        assert!(tracker.is_ready("pawn_e2", "place_mine"));
        // floor at zero
        tracker.tick_all();
        assert!(tracker.is_ready("pawn_e2", "place_mine"));
    }

    #[test]
    fn set_overwrites_remaining_turns() {
        let mut tracker = CooldownTracker::new();
        tracker.set("a", "x", 5);
        tracker.set("a", "x", 1);
        tracker.tick_all();
        assert!(tracker.is_ready("a", "x"));
    }

    #[test]
    fn entries_are_keyed_per_actor() {
        let mut tracker = CooldownTracker::new();
        tracker.set("a", "x", 3);
        assert!(tracker.is_ready("b", "x"));
        assert!(tracker.is_ready("a", "y"));
    }

    #[test]
    fn reset_clears_all() {
        let mut tracker = CooldownTracker::new();
        tracker.set("a", "x", 3);
        tracker.reset();
        assert!(tracker.is_ready("a", "x"));
    }
}
