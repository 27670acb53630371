//! Generated keys for `push`.
//!
//! A key is 20 characters: 8 encode the creation time in milliseconds, 12
//! are random. The alphabet is in ASCII order, so keys sort by creation
//! time. Keys generated within the same millisecond reuse the previous
//! random part incremented by one, so they stay unique and ordered.

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Length of every generated key.
pub const PUSH_ID_LEN: usize = TIME_CHARS + RANDOM_CHARS;

/// Stateful key generator. One per store.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for the current wall-clock time.
    pub fn next_id(&mut self) -> String {
        self.next_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generate a key for the given time.
    ///
    /// A time at or before the previous one (same millisecond, or a clock
    /// that stepped backwards) is treated as the previous time, so ordering
    /// holds regardless.
    pub fn next_at(&mut self, millis: i64) -> String {
        if millis > self.last_millis {
            self.last_millis = millis;
            let mut rng = rand::thread_rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        } else {
            self.increment_random();
        }

        let mut key = String::with_capacity(PUSH_ID_LEN);

        let mut time_chars = [0u8; TIME_CHARS];
        let mut remaining = self.last_millis.max(0) as u64;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        key.extend(time_chars.iter().map(|&c| c as char));
        key.extend(
            self.last_random
                .iter()
                .map(|&i| PUSH_CHARS[i as usize] as char),
        );

        key
    }

    fn increment_random(&mut self) {
        for slot in self.last_random.iter_mut().rev() {
            if *slot == 63 {
                *slot = 0;
            } else {
                *slot += 1;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_have_fixed_length_and_alphabet() {
        let mut ids = PushIdGenerator::new();
        let key = ids.next_id();
        assert_eq!(key.len(), PUSH_ID_LEN);
        assert!(key.bytes().all(|b| PUSH_CHARS.contains(&b)));
        assert!(clinicdb_core::Path::parse(&key).is_ok());
    }

    #[test]
    fn keys_sort_by_time() {
        let mut ids = PushIdGenerator::new();
        let early = ids.next_at(1_700_000_000_000);
        let late = ids.next_at(1_700_000_000_001);
        let later = ids.next_at(1_800_000_000_000);
        assert!(early < late);
        assert!(late < later);
    }

    #[test]
    fn same_millisecond_keys_are_unique_and_ordered() {
        let mut ids = PushIdGenerator::new();
        let keys: Vec<String> = (0..500).map(|_| ids.next_at(1_700_000_000_000)).collect();

        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, keys);
    }

    #[test]
    fn clock_going_backwards_keeps_order() {
        let mut ids = PushIdGenerator::new();
        let first = ids.next_at(1_700_000_000_500);
        let second = ids.next_at(1_700_000_000_000);
        assert!(first < second);
        assert_eq!(first[..TIME_CHARS], second[..TIME_CHARS]);
    }

    #[test]
    fn increment_carries() {
        let mut ids = PushIdGenerator::new();
        ids.last_random = [63; RANDOM_CHARS];
        ids.last_random[0] = 5;
        ids.increment_random();
        assert_eq!(ids.last_random[0], 6);
        assert!(ids.last_random[1..].iter().all(|&v| v == 0));
    }
}
