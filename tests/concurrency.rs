//! Concurrent delivery and registry churn tests.

use herald::{
    FanOut, Publisher, PublisherConfig, StoreSubscriber, Subscriber, UpdateEvent, Value, Version,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// --- Racing Publishers ---

#[test]
fn test_racing_publishers_converge_to_highest() {
    init_tracing();

    const PUBLISHERS: u64 = 8;
    const PER_PUBLISHER: u64 = 50;

    let shared = Arc::new(StoreSubscriber::new("shared"));
    let publishers: Vec<Arc<Publisher>> = (0..PUBLISHERS)
        .map(|i| Arc::new(Publisher::new(format!("P{}", i))))
        .collect();
    for p in &publishers {
        shared.subscribe_to(p);
    }

    let barrier = Arc::new(Barrier::new(PUBLISHERS as usize));
    let handles: Vec<_> = publishers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let p = Arc::clone(p);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Interleave versions across publishers: P0 gets 0, 8, 16...
                for n in 0..PER_PUBLISHER {
                    let version = n * PUBLISHERS + i as u64;
                    p.publish("AMZN", version as f64, version, "INR").unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let top = PUBLISHERS * PER_PUBLISHER - 1;
    let value = shared.value("AMZN").unwrap();
    assert_eq!(value.version(), Version(top));
    assert_eq!(value.magnitude(), top as f64);

    let stats = shared.stats();
    assert_eq!(stats.accepted + stats.rejected, PUBLISHERS * PER_PUBLISHER);
}

#[test]
fn test_parallel_fan_out_to_many_subscribers() {
    let config = PublisherConfig::default().with_fan_out(FanOut::Parallel);
    let publisher = Arc::new(Publisher::with_config("NSE", config));
    let subs: Vec<Arc<StoreSubscriber>> = (0..16)
        .map(|i| Arc::new(StoreSubscriber::new(format!("S{}", i))))
        .collect();
    for s in &subs {
        s.subscribe_to(&publisher);
    }

    for v in 1..=20u64 {
        let manifest = publisher.publish("TSLA", v as f64 * 10.0, v, "USD").unwrap();
        assert_eq!(manifest.accepted(), subs.len());
    }

    for s in &subs {
        assert_eq!(s.value("TSLA").unwrap().version(), Version(20));
    }
}

// --- Registry Churn ---

#[test]
fn test_subscribe_churn_during_broadcasts() {
    let publisher = Arc::new(Publisher::new("BSE"));
    let steady = Arc::new(StoreSubscriber::new("steady"));
    steady.subscribe_to(&publisher);

    let stop = Arc::new(AtomicBool::new(false));
    let churners: Vec<_> = (0..4)
        .map(|i| {
            let publisher = Arc::clone(&publisher);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let sub = Arc::new(StoreSubscriber::new(format!("churn-{}", i)));
                while !stop.load(Ordering::Relaxed) {
                    sub.subscribe_to(&publisher);
                    sub.unsubscribe_from(&publisher);
                }
                sub
            })
        })
        .collect();

    for v in 1..=500u64 {
        let manifest = publisher.publish("GOOG", v as f64, v, "USD").unwrap();
        // Never more than one report per subscriber
        let mut ids = manifest.subscribers();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), manifest.len());
        assert!(manifest.is_clean());
    }

    stop.store(true, Ordering::Relaxed);
    for h in churners {
        let sub = h.join().unwrap();
        assert!(!publisher.is_subscribed(sub.id()));
        if let Some(value) = sub.value("GOOG") {
            assert!(value.version() <= Version(500));
        }
    }

    assert_eq!(steady.value("GOOG").unwrap().version(), Version(500));
    assert_eq!(publisher.subscribers(), vec![steady.id()]);
}

// --- Properties ---

proptest! {
    #[test]
    fn prop_stored_version_never_decreases(versions in prop::collection::vec(0u64..50, 1..100)) {
        let sub = StoreSubscriber::new("prop");
        let mut highest: Option<u64> = None;

        for (i, v) in versions.iter().enumerate() {
            let value = Value::new(Version(*v), i as f64, "INR").unwrap();
            sub.on_update(&UpdateEvent::new("AMZN", value)).unwrap();

            let stored = sub.value("AMZN").unwrap().version().0;
            if let Some(h) = highest {
                prop_assert!(stored >= h);
            }
            highest = Some(stored);
        }

        prop_assert_eq!(highest, versions.iter().copied().max());
    }

    #[test]
    fn prop_first_arrival_wins_ties(versions in prop::collection::vec(0u64..10, 1..60)) {
        let sub = StoreSubscriber::new("prop");

        for (i, v) in versions.iter().enumerate() {
            let value = Value::new(Version(*v), i as f64, "INR").unwrap();
            sub.on_update(&UpdateEvent::new("AMZN", value)).unwrap();
        }

        let max = versions.iter().copied().max().unwrap();
        let first_max = versions.iter().position(|v| *v == max).unwrap();
        let held = sub.value("AMZN").unwrap();
        prop_assert_eq!(held.version(), Version(max));
        prop_assert_eq!(held.magnitude(), first_max as f64);
    }

    #[test]
    fn prop_concurrent_delivery_converges(mut versions in prop::collection::vec(0u64..1000, 2..32)) {
        versions.sort();
        versions.dedup();
        let sub = Arc::new(StoreSubscriber::new("prop"));

        let handles: Vec<_> = versions
            .iter()
            .rev()
            .map(|v| {
                let sub = Arc::clone(&sub);
                let v = *v;
                thread::spawn(move || {
                    let value = Value::new(Version(v), v as f64, "INR").unwrap();
                    sub.on_update(&UpdateEvent::new("AMZN", value)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let max = *versions.last().unwrap();
        let held = sub.value("AMZN").unwrap();
        prop_assert_eq!(held.version(), Version(max));
        prop_assert_eq!(held.magnitude(), max as f64);
    }
}
