// tests/property/registry_test.rs

//! Property-based tests for connection membership and broadcast delivery.

use hostwatch::core::registry::{Connection, ConnectionRegistry, OutboundReceiver};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(u64),
    Remove(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..32).prop_map(Op::Add),
        (0u64..32).prop_map(Op::Remove),
    ]
}

fn addr() -> SocketAddr {
    "127.0.0.1:9".parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    /// Membership equals the net effect of each worker's own operations,
    /// regardless of how the workers interleave.
    #[test]
    fn test_membership_matches_net_operations(
        workers in prop::collection::vec(prop::collection::vec(op_strategy(), 0..40), 1..=6)
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .build()
            .unwrap();

        // Each worker owns a disjoint id range, so its ops fully determine those ids.
        let mut expected = BTreeSet::new();
        for (w, ops) in workers.iter().enumerate() {
            let mut present = BTreeSet::new();
            for op in ops {
                match *op {
                    Op::Add(i) => { present.insert(w as u64 * 1000 + i); }
                    Op::Remove(i) => { present.remove(&(w as u64 * 1000 + i)); }
                }
            }
            expected.extend(present);
        }

        let registry = Arc::new(ConnectionRegistry::new());
        rt.block_on(async {
            let mut handles = Vec::new();
            for (w, ops) in workers.into_iter().enumerate() {
                let registry = registry.clone();
                handles.push(tokio::spawn(async move {
                    let mut receivers: HashMap<u64, OutboundReceiver> = HashMap::new();
                    for op in ops {
                        match op {
                            Op::Add(i) => {
                                let id = w as u64 * 1000 + i;
                                let (conn, rx) = Connection::new(id, addr());
                                registry.add(conn);
                                receivers.insert(id, rx);
                            }
                            Op::Remove(i) => {
                                registry.remove(w as u64 * 1000 + i);
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                    receivers
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
        });

        let actual: BTreeSet<u64> = registry.connection_ids().into_iter().collect();
        prop_assert_eq!(actual, expected.clone());
        prop_assert_eq!(registry.len(), expected.len());
    }

    /// Every member receives each broadcast exactly once, in broadcast order.
    #[test]
    fn test_broadcasts_arrive_once_and_in_order(
        members in 0usize..16,
        payloads in prop::collection::vec("[a-z0-9 ]{0,24}\n?", 0..20)
    ) {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for id in 0..members as u64 {
            let (conn, rx) = Connection::new(id, addr());
            registry.add(conn);
            receivers.push(rx);
        }

        for payload in &payloads {
            let report = registry.broadcast(payload);
            prop_assert_eq!(report.delivered, members);
            prop_assert!(report.failed.is_empty());
        }

        for rx in receivers.iter_mut() {
            let mut seen = Vec::new();
            while let Ok(msg) = rx.try_recv() {
                seen.push(msg.to_string());
            }
            prop_assert_eq!(&seen, &payloads);
        }
    }
}
