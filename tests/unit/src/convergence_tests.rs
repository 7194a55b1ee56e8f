//! Strong eventual consistency: replicas bound to convergent rules end up
//! identical once every update has reached every replica, regardless of
//! the exchange schedule.

use conflux_merge::{
    FieldDescriptor, MaxDouble, MergeEngine, Mergeable, OrBoolean, SetUnion, VectorClock,
};
use std::collections::BTreeSet;

/// Replicated sensor aggregate where every field is bound to a
/// convergent rule, so any gossip schedule reaches a single fixpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorGrid {
    pub clock: VectorClock,
    pub max_reading: f64,
    pub alarm: bool,
    pub zones: BTreeSet<String>,
}

impl Mergeable for SensorGrid {
    fn clock(&self) -> &VectorClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut VectorClock {
        &mut self.clock
    }

    fn descriptor() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::with_rule(
                "max_reading",
                |s| &s.max_reading,
                |s, v| s.max_reading = v,
                MaxDouble,
            ),
            FieldDescriptor::with_rule("alarm", |s| &s.alarm, |s, v| s.alarm = v, OrBoolean),
            FieldDescriptor::with_rule("zones", |s| &s.zones, |s, v| s.zones = v, SetUnion),
        ]
    }
}

#[cfg(test)]
mod convergence {
    use super::*;
    use crate::fixtures::clock_of;
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use uuid::Uuid;

    fn assert_all_equal(replicas: &[SensorGrid]) {
        let reference = &replicas[0];
        for replica in &replicas[1..] {
            assert_eq!(replica.clock, reference.clock);
            assert_eq!(replica.max_reading, reference.max_reading);
            assert_eq!(replica.alarm, reference.alarm);
            assert_eq!(replica.zones, reference.zones);
        }
    }

    /// One full forward-and-backward sweep delivers every replica's state
    /// to every other replica.
    fn sweep(engine: &MergeEngine<SensorGrid>, replicas: &mut [SensorGrid]) {
        for i in 0..replicas.len() - 1 {
            let merged = engine.merge(&replicas[i], &replicas[i + 1]);
            replicas[i] = merged.clone();
            replicas[i + 1] = merged;
        }
        for i in (1..replicas.len()).rev() {
            let merged = engine.merge(&replicas[i], &replicas[i - 1]);
            replicas[i] = merged.clone();
            replicas[i - 1] = merged;
        }
    }

    #[test]
    fn test_late_joiner_round_trip() {
        let engine = MergeEngine::<SensorGrid>::new();
        let mut a = SensorGrid::default();
        let mut b = SensorGrid::default();

        // A and B exchange many updates
        for round in 0..4u32 {
            a.update("A", |s| {
                s.max_reading += 2.0;
                s.zones.insert(format!("a{round}"));
            });
            b.update("B", |s| {
                s.alarm = true;
                s.zones.insert(format!("b{round}"));
            });
            let merged = engine.merge(&a, &b);
            a = merged.clone();
            b = merged;
        }

        // A brand-new replica C announces itself
        let mut c = SensorGrid::default();
        c.update("C", |s| {
            s.zones.insert("c0".to_string());
        });
        assert_eq!(c.clock, clock_of(&[("C", 1)]));

        // C catches up from A then B; A and B merge C back
        c = engine.merge(&c, &a);
        c = engine.merge(&c, &b);
        a = engine.merge(&a, &c);
        b = engine.merge(&b, &c);

        let replicas = [a, b, c];
        assert_all_equal(&replicas);
        for node in ["A", "B", "C"] {
            assert!(replicas[0].clock.contains(node));
        }
        assert_eq!(replicas[0].max_reading, 8.0);
        assert!(replicas[0].alarm);
        assert_eq!(replicas[0].zones.len(), 9);
    }

    #[test]
    fn test_random_gossip_converges() {
        let engine = MergeEngine::<SensorGrid>::new();
        let mut rng = rand::thread_rng();

        let node_ids: Vec<String> = (0..5).map(|_| Uuid::new_v4().to_string()).collect();
        let mut replicas: Vec<SensorGrid> = node_ids
            .iter()
            .map(|node| {
                let mut replica = SensorGrid::default();
                for step in 0..rng.gen_range(1..6) {
                    replica.update(node.as_str(), |s| {
                        s.max_reading = s.max_reading.max(rng.gen_range(0.0..100.0));
                        s.zones.insert(format!("{node}-{step}"));
                    });
                }
                replica
            })
            .collect();

        // Random pairwise gossip
        for _ in 0..40 {
            let i = rng.gen_range(0..replicas.len());
            let j = rng.gen_range(0..replicas.len());
            if i == j {
                continue;
            }
            let merged = engine.merge(&replicas[i], &replicas[j]);
            replicas[i] = merged.clone();
            replicas[j] = merged;
        }

        // Deliver everything everywhere, in a shuffled order
        replicas.shuffle(&mut rng);
        sweep(&engine, &mut replicas);

        assert_all_equal(&replicas);
        let total_zones: usize = replicas[0].zones.len();
        assert!(total_zones >= node_ids.len());
    }

    #[test]
    fn test_merge_order_is_irrelevant() {
        let engine = MergeEngine::<SensorGrid>::new();

        let mut replicas: Vec<SensorGrid> = (0..4)
            .map(|i| {
                let node = format!("n{i}");
                let mut replica = SensorGrid::default();
                replica.update(node.as_str(), |s| {
                    s.max_reading = i as f64 * 10.0;
                    s.zones.insert(node.clone());
                });
                replica
            })
            .collect();

        let forward = engine.merge_all(&replicas).unwrap();
        replicas.reverse();
        let backward = engine.merge_all(&replicas).unwrap();

        assert_eq!(forward.clock, backward.clock);
        assert_eq!(forward.max_reading, backward.max_reading);
        assert_eq!(forward.zones, backward.zones);
    }
}
