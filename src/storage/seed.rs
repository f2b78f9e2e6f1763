//! Synthetic dataset generation
//!
//! Produces a year of plausible e-commerce traffic so the dashboard has
//! something to show. Generation is deterministic for a fixed seed.

use crate::storage::types::{
    day_start, millis_to_datetime, NewEvent, CATEGORIES, REGIONS, SOURCES,
};
use crate::storage::{EventStore, StorageResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Events inserted per transaction while seeding
pub const SEED_BATCH_SIZE: usize = 1000;

/// Default number of events for a fresh database
pub const DEFAULT_SEED_COUNT: usize = 10_000;

/// Epoch-ms bounds of the seeded year (2024, UTC), both inclusive
fn seed_window() -> (i64, i64) {
    let start = day_start(2024, 1, 1)
        .map(|d| d.timestamp_millis())
        .unwrap_or(1_704_067_200_000);
    let end = day_start(2025, 1, 1)
        .map(|d| d.timestamp_millis() - 1000)
        .unwrap_or(1_735_689_599_000);
    (start, end)
}

fn pick<'a, R: Rng>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

/// Generate `count` random events
pub fn generate_events<R: Rng>(count: usize, rng: &mut R) -> Vec<NewEvent> {
    let (start, end) = seed_window();

    (0..count)
        .map(|_| {
            let timestamp = millis_to_datetime(rng.gen_range(start..=end));
            let mut event = NewEvent::new(
                timestamp,
                pick(rng, REGIONS),
                pick(rng, CATEGORIES),
                pick(rng, SOURCES),
            )
            .traffic(rng.gen_range(10..=5000), rng.gen_range(15..=8000))
            .rates(
                rng.gen_range(200..=850u32) as f64 / 10.0,
                rng.gen_range(50..=1500u32) as f64 / 100.0,
            );
            event.revenue_cents = rng.gen_range(10_000..=5_000_000);
            event
        })
        .collect()
}

/// Insert `count` generated events into the store in batches
///
/// Returns the number of events inserted.
pub fn seed_store(store: &EventStore, count: usize, seed: u64) -> StorageResult<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inserted = 0;

    tracing::info!(count, seed, "Seeding analytics events");

    while inserted < count {
        let batch = SEED_BATCH_SIZE.min(count - inserted);
        let events = generate_events(batch, &mut rng);
        inserted += store.insert_batch(events)?.len();

        tracing::debug!(inserted, "Seed batch committed");
    }

    tracing::info!(inserted, "Seeding completed");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::EventPredicate;

    #[test]
    fn test_generated_values_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let events = generate_events(500, &mut rng);
        let (start, end) = seed_window();

        assert_eq!(events.len(), 500);
        for e in &events {
            let ts = e.timestamp.timestamp_millis();
            assert!(ts >= start && ts <= end);
            assert!((10_000..=5_000_000).contains(&e.revenue_cents));
            assert!((10..=5000).contains(&e.users));
            assert!((15..=8000).contains(&e.sessions));
            assert!((20.0..=85.0).contains(&e.bounce_rate));
            assert!((0.5..=15.0).contains(&e.conversion));
            assert!(REGIONS.contains(&e.region.as_str()));
            assert!(CATEGORIES.contains(&e.category.as_str()));
            assert!(SOURCES.contains(&e.source.as_str()));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_events(50, &mut StdRng::seed_from_u64(42));
        let b = generate_events(50, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_store_batches() {
        let store = EventStore::open_in_memory().unwrap();
        let inserted = seed_store(&store, 2500, 1).unwrap();

        assert_eq!(inserted, 2500);
        assert_eq!(store.count(&EventPredicate::default()).unwrap(), 2500);
    }
}
