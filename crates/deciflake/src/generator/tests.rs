use crate::{
    AtomicNode, BasicNode, DecimalGenerator, DecimalId, DeciflakeId, Error, FixedIdentity,
    LockNode, MonotonicClock, Poll, RandomIdentity, TimeSource,
};
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Mutex;
use std::thread::scope;

const M: u64 = 10_000;

crate::define_decimal_id!(NarrowId, u64, time: 11, identity: 3, sequence: 4);

struct MockTime {
    ticks: u64,
}

impl TimeSource for MockTime {
    fn current_ticks(&self) -> u64 {
        self.ticks
    }
}

#[derive(Clone)]
struct SharedMockStepTime {
    clock: Rc<MockStepTime>,
}

impl TimeSource for SharedMockStepTime {
    fn current_ticks(&self) -> u64 {
        self.clock.values[self.clock.index.get()]
    }
}

struct MockStepTime {
    values: Vec<u64>,
    index: Cell<usize>,
}

impl SharedMockStepTime {
    fn new(values: Vec<u64>) -> Self {
        Self {
            clock: Rc::new(MockStepTime {
                values,
                index: Cell::new(0),
            }),
        }
    }

    fn step_to(&self, index: usize) {
        self.clock.index.set(index);
    }
}

#[derive(Clone, Copy)]
struct FixedTime;
impl TimeSource for FixedTime {
    fn current_ticks(&self) -> u64 {
        42
    }
}

trait PollExt<T> {
    fn unwrap_ready(self) -> T;
    fn unwrap_pending(self) -> u64;
}

impl<T: core::fmt::Display> PollExt<T> for Poll<T> {
    fn unwrap_ready(self) -> T {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn poll<G, ID, T>(node: &G) -> Poll<ID>
where
    G: DecimalGenerator<ID, T>,
    ID: DecimalId,
    T: TimeSource,
{
    node.try_poll_id().unwrap()
}

fn run_reference_scenario<G>()
where
    G: DecimalGenerator<DeciflakeId, MockTime>,
{
    let node = G::new(FixedIdentity(7), MockTime { ticks: 1000 }, None).unwrap();

    let first = poll(&node).unwrap_ready();
    let second = poll(&node).unwrap_ready();

    assert_eq!(first.to_raw(), 100_000_071_000);
    assert_eq!(second.to_raw(), 100_000_071_001);
    assert_eq!(first.decompose(), (1000, 7, 1000));
    assert_eq!(node.last_suffix(), Some(1001));
}

fn run_warm_start_continues_after_hint<G>()
where
    G: DecimalGenerator<DeciflakeId, MockTime>,
{
    let node = G::new(FixedIdentity(7), MockTime { ticks: 1000 }, Some(41)).unwrap();
    assert_eq!(poll(&node).unwrap_ready().sequence(), 42);

    let node = G::new(FixedIdentity(7), MockTime { ticks: 1000 }, Some(M - 1)).unwrap();
    let id = poll(&node).unwrap_ready();
    assert_eq!(id.sequence(), 0);
    assert_eq!(id.to_raw(), 100_000_070_000);
}

fn run_cold_start_seeds_from_time<G>()
where
    G: DecimalGenerator<DeciflakeId, MockTime>,
{
    let node = G::new(FixedIdentity(0), MockTime { ticks: 179_912_345_678 }, None).unwrap();
    let id = poll(&node).unwrap_ready();
    assert_eq!(id.time(), 179_912_345_678);
    assert_eq!(id.sequence(), 5678);
    assert_eq!(node.last_suffix(), Some(5678));
}

fn construction_error<G>(result: Result<G, Error>) -> Error {
    match result {
        Ok(_) => panic!("unexpected successful construction"),
        Err(e) => e,
    }
}

fn run_rejects_invalid_configuration<G>()
where
    G: DecimalGenerator<DeciflakeId, MockTime>,
{
    let err = construction_error(G::new(FixedIdentity(M), MockTime { ticks: 1 }, None));
    assert_eq!(
        err,
        Error::IdentityOutOfRange {
            identity: M,
            max: M - 1
        }
    );

    let err = construction_error(G::new(FixedIdentity(1), MockTime { ticks: 1 }, Some(M)));
    assert_eq!(
        err,
        Error::RecoveryHintOutOfRange {
            hint: M,
            modulus: M
        }
    );
}

fn run_rejects_clock_beyond_time_field<G>()
where
    G: DecimalGenerator<NarrowId, MockTime>,
{
    let max = NarrowId::max_time();

    let err = construction_error(G::new(FixedIdentity(7), MockTime { ticks: max + 1 }, None));
    assert_eq!(err, Error::TimeOutOfRange { ticks: max + 1, max });

    let err = construction_error(G::new(
        FixedIdentity(7),
        MockTime {
            ticks: 179_203_342_759,
        },
        Some(41),
    ));
    assert_eq!(
        err,
        Error::TimeOutOfRange {
            ticks: 179_203_342_759,
            max
        }
    );

    let node = G::new(FixedIdentity(7), MockTime { ticks: max }, None).unwrap();
    let id = poll(&node).unwrap_ready();
    assert_eq!(id.time(), max);
    assert_eq!(id.identity(), 7);
}

fn run_unique_within_one_tick<G>(node: &G)
where
    G: DecimalGenerator<DeciflakeId, FixedTime>,
{
    let mut seen = HashSet::with_capacity(M as usize);
    let mut last = None;
    for _ in 0..M {
        let id = poll(node).unwrap_ready();
        assert_eq!(id.time(), 42);
        assert!(seen.insert(id), "duplicate {id}");
        last = Some(id);
    }
    assert_eq!(seen.len(), M as usize);
    // Suffix wrapped from 9999 back to 0 along the way
    assert_eq!(last.map(|id| id.sequence()), Some(4_999));
}

fn run_exhausted_tick_is_pending<G>(node: &G, time: &SharedMockStepTime)
where
    G: DecimalGenerator<DeciflakeId, SharedMockStepTime>,
{
    for i in 0..M {
        let id = poll(node).unwrap_ready();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.time(), 42);
    }

    assert_eq!(poll(node).unwrap_pending(), 1);
    assert_eq!(poll(node).unwrap_pending(), 1);

    time.step_to(1);

    let id = poll(node).unwrap_ready();
    assert_eq!(id.time(), 43);
    assert_eq!(id.sequence(), 0);
}

fn run_backward_clock_is_pending<G>(node: &G, time: &SharedMockStepTime)
where
    G: DecimalGenerator<DeciflakeId, SharedMockStepTime>,
{
    let first = poll(node).unwrap_ready();
    assert_eq!(first.time(), 100);

    time.step_to(1);
    assert_eq!(poll(node).unwrap_pending(), 3);

    time.step_to(2);
    let second = poll(node).unwrap_ready();
    assert_eq!(second.time(), 100);
    assert!(second > first);

    time.step_to(3);
    let third = poll(node).unwrap_ready();
    assert_eq!(third.time(), 101);
    assert_eq!(third.sequence(), second.sequence() + 1);
}

fn run_warm_restart_in_same_tick<G>()
where
    G: DecimalGenerator<DeciflakeId, FixedTime>,
{
    let crashed = G::new(FixedIdentity(3), FixedTime, None).unwrap();
    let mut seen: HashSet<DeciflakeId> = (0..5).map(|_| poll(&crashed).unwrap_ready()).collect();
    let hint = crashed.last_suffix();
    assert_eq!(hint, Some(46));

    let restarted = G::new(FixedIdentity(3), FixedTime, hint).unwrap();
    for _ in 0..5 {
        let id = poll(&restarted).unwrap_ready();
        assert!(seen.insert(id), "restart reissued {id}");
    }
}

fn run_cold_restart_in_same_tick_repeats<G>()
where
    G: DecimalGenerator<DeciflakeId, FixedTime>,
{
    let crashed = G::new(FixedIdentity(3), FixedTime, None).unwrap();
    let restarted = G::new(FixedIdentity(3), FixedTime, None).unwrap();
    assert_eq!(poll(&crashed).unwrap_ready(), poll(&restarted).unwrap_ready());
}

fn run_cold_restart_next_tick_is_unique<G>()
where
    G: DecimalGenerator<DeciflakeId, SharedMockStepTime>,
{
    let time = SharedMockStepTime::new(vec![500, 501]);

    let crashed = G::new(FixedIdentity(3), time.clone(), None).unwrap();
    let mut seen: HashSet<DeciflakeId> = (0..10).map(|_| poll(&crashed).unwrap_ready()).collect();
    assert_eq!(crashed.last_suffix(), Some(509));

    time.step_to(1);

    // The restarted suffixes overlap the crashed ones; only the time differs
    let restarted = G::new(FixedIdentity(3), time.clone(), None).unwrap();
    for expected in 501..511 {
        let id = poll(&restarted).unwrap_ready();
        assert_eq!(id.time(), 501);
        assert_eq!(id.sequence(), expected);
        assert!(seen.insert(id), "restart reissued {id}");
    }
    assert_eq!(seen.len(), 20);
}

fn run_distinct_identities_never_collide<G>()
where
    G: DecimalGenerator<DeciflakeId, FixedTime>,
{
    let nodes: Vec<G> = (0..10)
        .map(|identity| G::new(FixedIdentity(identity), FixedTime, None).unwrap())
        .collect();

    let mut seen = HashSet::new();
    for _ in 0..1_000 {
        for node in &nodes {
            assert!(seen.insert(poll(node).unwrap_ready()));
        }
    }
    assert_eq!(seen.len(), 10_000);
}

fn run_monotonic_clock_ids_increase<G>()
where
    G: DecimalGenerator<DeciflakeId, MonotonicClock>,
{
    let node = G::new(RandomIdentity::default(), MonotonicClock::default(), None).unwrap();
    let mut last = node.try_next_id().unwrap();
    for _ in 0..50_000 {
        let id = node.try_next_id().unwrap();
        assert_eq!(id.identity(), node.identity());
        assert!(id.time() >= last.time());
        if id.time() == last.time() {
            assert_eq!(id.sequence(), (last.sequence() + 1) % M);
        }
        last = id;
    }
}

fn run_threaded_unique<G>(node: &G)
where
    G: DecimalGenerator<DeciflakeId, MonotonicClock> + Sync,
{
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 25_000;

    let seen = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    local.push(node.try_next_id().unwrap());
                }
                let mut seen = seen.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id), "duplicate {id}");
                }
            });
        }
    });

    assert_eq!(seen.into_inner().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn basic_node_reference_scenario() {
    run_reference_scenario::<BasicNode<DeciflakeId, MockTime>>();
}

#[test]
fn lock_node_reference_scenario() {
    run_reference_scenario::<LockNode<DeciflakeId, MockTime>>();
}

#[test]
fn atomic_node_reference_scenario() {
    run_reference_scenario::<AtomicNode<DeciflakeId, MockTime>>();
}

#[test]
fn basic_node_warm_start() {
    run_warm_start_continues_after_hint::<BasicNode<DeciflakeId, MockTime>>();
}

#[test]
fn lock_node_warm_start() {
    run_warm_start_continues_after_hint::<LockNode<DeciflakeId, MockTime>>();
}

#[test]
fn atomic_node_warm_start() {
    run_warm_start_continues_after_hint::<AtomicNode<DeciflakeId, MockTime>>();
}

#[test]
fn basic_node_cold_start() {
    run_cold_start_seeds_from_time::<BasicNode<DeciflakeId, MockTime>>();
}

#[test]
fn lock_node_cold_start() {
    run_cold_start_seeds_from_time::<LockNode<DeciflakeId, MockTime>>();
}

#[test]
fn atomic_node_cold_start() {
    run_cold_start_seeds_from_time::<AtomicNode<DeciflakeId, MockTime>>();
}

#[test]
fn basic_node_rejects_invalid_configuration() {
    run_rejects_invalid_configuration::<BasicNode<DeciflakeId, MockTime>>();
}

#[test]
fn lock_node_rejects_invalid_configuration() {
    run_rejects_invalid_configuration::<LockNode<DeciflakeId, MockTime>>();
}

#[test]
fn atomic_node_rejects_invalid_configuration() {
    run_rejects_invalid_configuration::<AtomicNode<DeciflakeId, MockTime>>();
}

#[test]
fn basic_node_rejects_clock_beyond_time_field() {
    run_rejects_clock_beyond_time_field::<BasicNode<NarrowId, MockTime>>();
}

#[test]
fn lock_node_rejects_clock_beyond_time_field() {
    run_rejects_clock_beyond_time_field::<LockNode<NarrowId, MockTime>>();
}

#[test]
fn atomic_node_rejects_clock_beyond_time_field() {
    run_rejects_clock_beyond_time_field::<AtomicNode<NarrowId, MockTime>>();
}

#[test]
fn basic_node_unique_within_tick() {
    let node = BasicNode::<DeciflakeId, _>::from_components(1, 5_000, FixedTime);
    run_unique_within_one_tick(&node);
}

#[test]
fn lock_node_unique_within_tick() {
    let node = LockNode::<DeciflakeId, _>::from_components(1, 5_000, FixedTime);
    run_unique_within_one_tick(&node);
}

#[test]
fn atomic_node_unique_within_tick() {
    let node = AtomicNode::<DeciflakeId, _>::from_components(1, 5_000, FixedTime);
    run_unique_within_one_tick(&node);
}

#[test]
fn basic_node_exhausted_tick() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let node = BasicNode::<DeciflakeId, _>::from_components(1, 0, time.clone());
    run_exhausted_tick_is_pending(&node, &time);
}

#[test]
fn lock_node_exhausted_tick() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let node = LockNode::<DeciflakeId, _>::from_components(1, 0, time.clone());
    run_exhausted_tick_is_pending(&node, &time);
}

#[test]
fn atomic_node_exhausted_tick() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let node = AtomicNode::<DeciflakeId, _>::from_components(1, 0, time.clone());
    run_exhausted_tick_is_pending(&node, &time);
}

#[test]
fn basic_node_backward_clock() {
    let time = SharedMockStepTime::new(vec![100, 97, 100, 101]);
    let node = BasicNode::<DeciflakeId, _>::from_components(2, 10, time.clone());
    run_backward_clock_is_pending(&node, &time);
}

#[test]
fn lock_node_backward_clock() {
    let time = SharedMockStepTime::new(vec![100, 97, 100, 101]);
    let node = LockNode::<DeciflakeId, _>::from_components(2, 10, time.clone());
    run_backward_clock_is_pending(&node, &time);
}

#[test]
fn atomic_node_backward_clock() {
    let time = SharedMockStepTime::new(vec![100, 97, 100, 101]);
    let node = AtomicNode::<DeciflakeId, _>::from_components(2, 10, time.clone());
    run_backward_clock_is_pending(&node, &time);
}

#[test]
fn basic_node_warm_restart() {
    run_warm_restart_in_same_tick::<BasicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn lock_node_warm_restart() {
    run_warm_restart_in_same_tick::<LockNode<DeciflakeId, FixedTime>>();
}

#[test]
fn atomic_node_warm_restart() {
    run_warm_restart_in_same_tick::<AtomicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn basic_node_cold_restart_repeats() {
    run_cold_restart_in_same_tick_repeats::<BasicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn lock_node_cold_restart_repeats() {
    run_cold_restart_in_same_tick_repeats::<LockNode<DeciflakeId, FixedTime>>();
}

#[test]
fn atomic_node_cold_restart_repeats() {
    run_cold_restart_in_same_tick_repeats::<AtomicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn basic_node_cold_restart_next_tick() {
    run_cold_restart_next_tick_is_unique::<BasicNode<DeciflakeId, SharedMockStepTime>>();
}

#[test]
fn lock_node_cold_restart_next_tick() {
    run_cold_restart_next_tick_is_unique::<LockNode<DeciflakeId, SharedMockStepTime>>();
}

#[test]
fn atomic_node_cold_restart_next_tick() {
    run_cold_restart_next_tick_is_unique::<AtomicNode<DeciflakeId, SharedMockStepTime>>();
}

#[test]
fn basic_nodes_distinct_identities() {
    run_distinct_identities_never_collide::<BasicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn lock_nodes_distinct_identities() {
    run_distinct_identities_never_collide::<LockNode<DeciflakeId, FixedTime>>();
}

#[test]
fn atomic_nodes_distinct_identities() {
    run_distinct_identities_never_collide::<AtomicNode<DeciflakeId, FixedTime>>();
}

#[test]
fn basic_node_monotonic_clock() {
    run_monotonic_clock_ids_increase::<BasicNode<DeciflakeId, MonotonicClock>>();
}

#[test]
fn lock_node_monotonic_clock() {
    run_monotonic_clock_ids_increase::<LockNode<DeciflakeId, MonotonicClock>>();
}

#[test]
fn atomic_node_monotonic_clock() {
    run_monotonic_clock_ids_increase::<AtomicNode<DeciflakeId, MonotonicClock>>();
}

#[test]
fn lock_node_threaded_unique() {
    let node = LockNode::<DeciflakeId, _>::new(FixedIdentity(1), MonotonicClock::default(), None)
        .unwrap();
    run_threaded_unique(&node);
}

#[test]
fn atomic_node_threaded_unique() {
    let node =
        AtomicNode::<DeciflakeId, _>::new(FixedIdentity(1), MonotonicClock::default(), None)
            .unwrap();
    run_threaded_unique(&node);
}

#[test]
fn lock_node_clones_share_state() {
    let node = LockNode::<DeciflakeId, _>::from_components(1, 0, MonotonicClock::default());
    let clone = node.clone();
    let a = node.try_next_id().unwrap();
    let b = clone.try_next_id().unwrap();
    assert_ne!(a, b);
    assert_eq!(node.last_suffix(), clone.last_suffix());
}

#[test]
fn ten_nodes_round_robin_load() {
    const NODES: u64 = 10;
    const IDS_PER_NODE: usize = 100_000;

    let clock = MonotonicClock::default();
    let nodes: Vec<_> = (0..NODES)
        .map(|identity| {
            BasicNode::<DeciflakeId, _>::new(FixedIdentity(identity), clock.clone(), None)
                .unwrap()
        })
        .collect();

    let mut seen = HashSet::with_capacity(NODES as usize * IDS_PER_NODE);
    for _ in 0..IDS_PER_NODE {
        for node in &nodes {
            let id = node.next_id();
            assert!(seen.insert(id), "duplicate {id}");
        }
    }
    assert_eq!(seen.len(), NODES as usize * IDS_PER_NODE);
}

#[test]
fn lock_node_reports_last_suffix() {
    let node = LockNode::<DeciflakeId, _>::from_components(4, 9, FixedTime);
    let id = node.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.sequence(), 9);
    assert_eq!(node.last_suffix(), Some(9));
}

#[test]
fn default_backoff_returns_for_short_waits() {
    crate::default_backoff(0);
    crate::default_backoff(1);
    crate::default_backoff(2);
}

#[test]
fn next_id_with_reports_backoff() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let node = BasicNode::<DeciflakeId, _>::from_components(1, 0, time.clone());
    for _ in 0..M {
        node.next_id();
    }

    let mut waits = Vec::new();
    let id = node.next_id_with(|yield_for| {
        waits.push(yield_for);
        time.step_to(1);
    });
    assert_eq!(waits, vec![1]);
    assert_eq!(id.time(), 43);
}
