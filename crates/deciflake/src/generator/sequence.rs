use core::cmp::Ordering;

use crate::{DecimalId, Error, IdentitySource, Result, TimeSource};

/// The per-node sequence state machine.
///
/// The state holds the next suffix to hand out together with the tick of the
/// last issued identifier and how many suffixes were issued during that tick.
/// It is a plain `Copy` value; node flavors differ only in how they store it
/// (a `Cell`, a `Mutex`, or a packed atomic).
///
/// ## Seeding
///
/// - **Cold start**: `next = now mod SEQUENCE_MODULUS`. Nodes started at
///   different ticks are unlikely to begin on the same suffix.
/// - **Warm start**: `next = (last_suffix + 1) mod SEQUENCE_MODULUS`, where
///   `last_suffix` is the last suffix the previous incarnation of the node
///   issued. The new incarnation therefore never reissues the suffix the
///   crashed one used at the instant of the crash, even when the restart
///   lands in the same tick.
///
/// ## Uniqueness across a restart
///
/// The guarantee is conditional, not absolute. Identifiers of one node stay
/// unique across a crash and restart if either
///
/// 1. the restart took at least one tick, so the time field differs, or
/// 2. the number of identifiers the node issued so far, modulo
///    `SEQUENCE_MODULUS`, differs from the ticks it had been running, modulo
///    `SEQUENCE_MODULUS`, so its suffix stream has drifted out of lockstep
///    with the time-derived seed of a cold start.
///
/// A cold restart within the same tick can still repeat identifiers. A warm
/// start covers that case outright.
///
/// ## Advancing
///
/// Each request returns the stored suffix and stores the following one,
/// reduced modulo `SEQUENCE_MODULUS`. The returned stream is identical to an
/// unbounded counter read modulo `SEQUENCE_MODULUS`, but the stored value can
/// never overflow. Once `SEQUENCE_MODULUS` suffixes were issued within one
/// tick the state refuses to wrap and asks the caller to wait for the next
/// tick; a clock that moved backward makes it wait until time catches up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SequenceState {
    tick: u64,
    issued: u32,
    next: u32,
}

/// Outcome of [`SequenceState::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStep {
    /// A suffix was handed out at `tick`; `state` must be stored.
    Ready {
        state: SequenceState,
        tick: u64,
        suffix: u64,
    },
    /// No suffix is available before `yield_for` more ticks pass.
    Pending { yield_for: u64 },
}

impl SequenceState {
    /// A state that hands out `next mod modulus` first.
    pub const fn seeded(next: u64, modulus: u64) -> Self {
        Self {
            tick: 0,
            issued: 0,
            next: (next % modulus) as u32,
        }
    }

    /// Cold start: the first suffix is derived from the current tick.
    pub const fn cold(now: u64, modulus: u64) -> Self {
        Self::seeded(now % modulus, modulus)
    }

    /// Warm start from the last suffix a previous incarnation issued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecoveryHintOutOfRange`] if `last_suffix` is not a
    /// suffix the layout could have produced.
    pub const fn warm(last_suffix: u64, modulus: u64) -> Result<Self, Error> {
        if last_suffix >= modulus {
            return Err(Error::RecoveryHintOutOfRange {
                hint: last_suffix,
                modulus,
            });
        }
        Ok(Self::seeded(last_suffix + 1, modulus))
    }

    /// The suffix the next successful request returns.
    pub const fn next_suffix(&self) -> u64 {
        self.next as u64
    }

    /// Tick of the last issued identifier (zero before the first).
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of suffixes issued during [`Self::tick`].
    pub const fn issued_in_tick(&self) -> u64 {
        self.issued as u64
    }

    /// The last suffix handed out, or `None` if nothing was issued yet.
    ///
    /// This is the value to checkpoint and feed back as a recovery hint.
    pub const fn last_suffix(&self, modulus: u64) -> Option<u64> {
        if self.issued == 0 {
            return None;
        }
        Some((self.next as u64 + modulus - 1) % modulus)
    }

    /// Attempts to hand out one suffix at tick `now`.
    pub fn advance(self, now: u64, modulus: u64) -> SequenceStep {
        let bump = |next: u32| ((u64::from(next) + 1) % modulus) as u32;

        match now.cmp(&self.tick) {
            Ordering::Greater => SequenceStep::Ready {
                state: Self {
                    tick: now,
                    issued: 1,
                    next: bump(self.next),
                },
                tick: now,
                suffix: u64::from(self.next),
            },
            Ordering::Equal => {
                if u64::from(self.issued) < modulus {
                    SequenceStep::Ready {
                        state: Self {
                            tick: now,
                            issued: self.issued + 1,
                            next: bump(self.next),
                        },
                        tick: now,
                        suffix: u64::from(self.next),
                    }
                } else {
                    SequenceStep::Pending { yield_for: 1 }
                }
            }
            Ordering::Less => Self::cold_clock_behind(now, self.tick),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last_tick: u64) -> SequenceStep {
        let yield_for = last_tick - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last_tick, yield_for, "clock moved backward, stalling");
        SequenceStep::Pending { yield_for }
    }

    /// Packs the state into one word for atomic storage.
    pub(crate) const fn to_bits(self) -> u128 {
        ((self.tick as u128) << 64) | ((self.issued as u128) << 32) | self.next as u128
    }

    pub(crate) const fn from_bits(bits: u128) -> Self {
        Self {
            tick: (bits >> 64) as u64,
            issued: (bits >> 32) as u32,
            next: bits as u32,
        }
    }
}

/// Resolves a node's identity and initial sequence state.
///
/// Validation happens here so that a misconfigured node fails at
/// construction, never while generating.
pub(crate) fn bootstrap<ID, I, T>(
    identity: &I,
    time: &T,
    recovery_hint: Option<u64>,
) -> Result<(u64, SequenceState), Error>
where
    ID: DecimalId,
    I: IdentitySource + ?Sized,
    T: TimeSource,
{
    let max = ID::max_identity();
    let identity = identity.assign(max);
    if identity > max {
        return Err(Error::IdentityOutOfRange { identity, max });
    }

    let now = time.current_ticks();
    let max_time = ID::max_time();
    if now > max_time {
        return Err(Error::TimeOutOfRange {
            ticks: now,
            max: max_time,
        });
    }

    let modulus = ID::sequence_modulus();
    let state = match recovery_hint {
        Some(last_suffix) => SequenceState::warm(last_suffix, modulus)?,
        None => SequenceState::cold(now, modulus),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        identity,
        next_suffix = state.next_suffix(),
        warm = recovery_hint.is_some(),
        "node seeded"
    );

    Ok((identity, state))
}
