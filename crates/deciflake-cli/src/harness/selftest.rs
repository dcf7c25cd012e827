use core::time::Duration;
use std::collections::HashSet;
use std::time::Instant;

use anyhow::{anyhow, bail};
use deciflake::{BasicNode, DeciflakeId, MonotonicClock};

use crate::harness::config::SelftestConfig;

type Node = BasicNode<DeciflakeId, MonotonicClock>;

/// Runs the load scenario and fails if any identifier was issued twice.
pub fn run(config: &SelftestConfig, epoch: Duration) -> anyhow::Result<()> {
    let clock = MonotonicClock::with_epoch(epoch)?;
    let nodes = config
        .identities
        .iter()
        .map(|identity| Node::new(*identity, clock.clone(), None))
        .collect::<Result<Vec<_>, _>>()?;

    let start = Instant::now();
    let ids = if config.threaded {
        threaded(nodes, config.ids)?
    } else {
        round_robin(&nodes, config.ids)
    };
    let elapsed = start.elapsed();

    let total = ids.len();
    let duplicates = count_duplicates(ids);

    tracing::info!(
        nodes = config.nodes,
        ids = total,
        duplicates,
        threaded = config.threaded,
        elapsed_ms = elapsed_millis(elapsed),
        "selftest finished"
    );

    if duplicates > 0 {
        bail!("found {duplicates} duplicate identifiers among {total}");
    }

    println!("ok: {total} unique identifiers from {} nodes", config.nodes);
    Ok(())
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Draws one identifier from each node in turn until every node issued
/// `per_node`.
fn round_robin(nodes: &[Node], per_node: usize) -> Vec<DeciflakeId> {
    let mut ids = Vec::with_capacity(nodes.len() * per_node);
    for _ in 0..per_node {
        for node in nodes {
            ids.push(node.next_id());
        }
    }
    ids
}

/// Moves every node onto its own thread.
fn threaded(nodes: Vec<Node>, per_node: usize) -> anyhow::Result<Vec<DeciflakeId>> {
    let total = nodes.len() * per_node;

    std::thread::scope(|s| {
        let handles: Vec<_> = nodes
            .into_iter()
            .map(|node| s.spawn(move || (0..per_node).map(|_| node.next_id()).collect::<Vec<_>>()))
            .collect();

        let mut ids = Vec::with_capacity(total);
        for handle in handles {
            let batch = handle
                .join()
                .map_err(|_| anyhow!("selftest worker panicked"))?;
            ids.extend(batch);
        }
        Ok(ids)
    })
}

fn count_duplicates(ids: impl IntoIterator<Item = DeciflakeId>) -> usize {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| !seen.insert(*id)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::config::IdentityChoice;
    use deciflake::FixedIdentity;

    fn nodes(count: u64) -> Vec<Node> {
        let clock = MonotonicClock::default();
        (0..count)
            .map(|identity| Node::new(FixedIdentity(identity), clock.clone(), None).unwrap())
            .collect()
    }

    #[test]
    fn counts_duplicates() {
        let a = DeciflakeId::from(1, 2, 3);
        let b = DeciflakeId::from(1, 2, 4);
        assert_eq!(count_duplicates([a, b]), 0);
        assert_eq!(count_duplicates([a, b, a, a]), 2);
    }

    #[test]
    fn round_robin_interleaves_nodes() {
        let ids = round_robin(&nodes(3), 100);
        assert_eq!(ids.len(), 300);
        let identities: Vec<_> = ids.iter().take(3).map(DeciflakeId::identity).collect();
        assert_eq!(identities, vec![0, 1, 2]);
        assert_eq!(count_duplicates(ids), 0);
    }

    #[test]
    fn threaded_nodes_stay_unique() {
        let ids = threaded(nodes(4), 20_000).unwrap();
        assert_eq!(ids.len(), 80_000);
        assert_eq!(count_duplicates(ids), 0);
    }

    #[test]
    fn elapsed_millis_saturates() {
        assert_eq!(elapsed_millis(Duration::from_millis(1_234)), 1_234);
        assert_eq!(elapsed_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn run_passes_with_distinct_identities() {
        let config = SelftestConfig {
            nodes: 2,
            ids: 1_000,
            threaded: false,
            identities: vec![
                IdentityChoice::Fixed(FixedIdentity(0)),
                IdentityChoice::Fixed(FixedIdentity(1)),
            ],
        };
        run(&config, Duration::ZERO).unwrap();
    }
}
