//! Priority-Ordered Notifier Chains
//!
//! ## Overview
//!
//! A notifier chain is a broadcast list of callbacks kept in descending
//! priority order. Calling the chain walks it from the highest priority
//! down, handing every callback the same `(action, data)` pair, until the
//! chain runs out, a call budget is spent, or a callback asks to stop.
//!
//! ```text
//! head → [prio 10] → [prio 5] → [prio 5] → [prio 0] → end
//!           │           │          │
//!           OK          OK        STOP ──→ walk ends, STOP returned
//! ```
//!
//! ## Ordering
//!
//! A new block is inserted *after* every block whose priority is greater
//! than or equal to its own. Equal priorities therefore run in the order
//! they were registered.
//!
//! ## Result Convention
//!
//! Callbacks answer with a [`Notify`], which maps onto the 16-bit
//! convention used by drivers on the hub:
//!
//! | Variant           | Bits                              | Walk      |
//! |-------------------|-----------------------------------|-----------|
//! | `Continue(v)`     | `v` (high bit clear)              | continues |
//! | `Stop(v)`         | `NOTIFY_STOP_MASK \| v`           | halts     |
//! | `Reject(v)`       | `NOTIFY_STOP_MASK \| 0x0002 \| v` | halts     |
//!
//! `Continue` carries 15 payload bits. `Stop` and `Reject` carry the
//! 14 bits left over once the stop and bad bits are taken, so
//! `Notify::from_bits(n.bits()) == n` for every in-range payload.
//!
//! `Notify::DONE` (0x0000) and `Notify::OK` (0x0001) are the usual
//! non-stopping answers; `Notify::BAD` (0x8002) is the usual rejection.
//!
//! ## Self-Removal
//!
//! A callback may unregister *itself* mid-walk through
//! [`NotifierCtx::unregister_self`]. The chain drops the block right after
//! the callback returns and continues with the block that followed it.
//! Other blocks cannot be touched during a walk: the chain is mutably
//! borrowed for its whole duration.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::errors::{RegistryError, RegistryResult};

/// Callback has no interest in the event
pub const NOTIFY_DONE: u16 = 0x0000;
/// Callback handled the event
pub const NOTIFY_OK: u16 = 0x0001;
/// High bit: stop walking the chain
pub const NOTIFY_STOP_MASK: u16 = 0x8000;
/// Low bit marking a rejection
pub const NOTIFY_BAD_BIT: u16 = 0x0002;
/// Rejection: stop, and report failure
pub const NOTIFY_BAD: u16 = NOTIFY_STOP_MASK | NOTIFY_BAD_BIT;

// payload bits of a stopping answer
const STOP_PAYLOAD: u16 = !NOTIFY_BAD;

/// Answer from a notifier callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// Keep walking; payload is the 15-bit result value
    Continue(u16),
    /// Halt the walk and propagate the payload
    Stop(u16),
    /// Halt the walk and report rejection
    Reject(u16),
}

impl Notify {
    /// Not interested
    pub const DONE: Notify = Notify::Continue(NOTIFY_DONE);
    /// Handled, keep going
    pub const OK: Notify = Notify::Continue(NOTIFY_OK);
    /// Handled, nobody else should see it
    pub const STOP: Notify = Notify::Stop(NOTIFY_OK);
    /// Vetoed
    pub const BAD: Notify = Notify::Reject(0);

    /// Encode in the 16-bit convention
    ///
    /// Payload bits that collide with the stop or bad bits are dropped.
    pub const fn bits(&self) -> u16 {
        match *self {
            Notify::Continue(v) => v & !NOTIFY_STOP_MASK,
            Notify::Stop(v) => NOTIFY_STOP_MASK | (v & STOP_PAYLOAD),
            Notify::Reject(v) => NOTIFY_BAD | (v & STOP_PAYLOAD),
        }
    }

    /// Decode from the 16-bit convention
    pub const fn from_bits(bits: u16) -> Notify {
        if bits & NOTIFY_STOP_MASK == 0 {
            Notify::Continue(bits)
        } else if bits & NOTIFY_BAD_BIT != 0 {
            Notify::Reject(bits & STOP_PAYLOAD)
        } else {
            Notify::Stop(bits & !NOTIFY_STOP_MASK)
        }
    }

    /// Whether this answer halts the walk
    pub const fn is_stop(&self) -> bool {
        self.bits() & NOTIFY_STOP_MASK == NOTIFY_STOP_MASK
    }

    /// Whether this answer is a rejection
    pub const fn is_reject(&self) -> bool {
        matches!(self, Notify::Reject(_))
    }
}

/// Identity of a block inside one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifierId(u32);

/// Boxed notifier callback
pub type NotifierFn<D> = Box<dyn FnMut(&mut NotifierCtx, u64, &mut D) -> Notify + Send + Sync>;

/// A callback with its priority
pub struct NotifierBlock<D: ?Sized> {
    priority: i32,
    callback: NotifierFn<D>,
}

impl<D: ?Sized> NotifierBlock<D> {
    /// Wrap `callback` with `priority` (higher runs first)
    pub fn new<F>(priority: i32, callback: F) -> Self
    where
        F: FnMut(&mut NotifierCtx, u64, &mut D) -> Notify + Send + Sync + 'static,
    {
        Self {
            priority,
            callback: Box::new(callback),
        }
    }

    /// Priority of this block
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl<D: ?Sized> fmt::Debug for NotifierBlock<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierBlock")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Per-call context handed to a callback
#[derive(Debug)]
pub struct NotifierCtx {
    id: NotifierId,
    priority: i32,
    unregister: bool,
}

impl NotifierCtx {
    /// Identity of the block being called
    pub fn id(&self) -> NotifierId {
        self.id
    }

    /// Priority of the block being called
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Remove the calling block from the chain once it returns
    pub fn unregister_self(&mut self) {
        self.unregister = true;
    }
}

/// Upper bound on callbacks invoked by one walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLimit {
    /// Walk the whole chain
    Unlimited,
    /// Stop after this many calls
    AtMost(usize),
}

impl From<i32> for CallLimit {
    /// Zero or negative means no limit
    fn from(n: i32) -> Self {
        if n <= 0 {
            CallLimit::Unlimited
        } else {
            CallLimit::AtMost(n as usize)
        }
    }
}

/// Result of walking a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOutcome {
    /// Answer of the last callback invoked (`Notify::DONE` if none ran)
    pub result: Notify,
    /// Number of callbacks invoked
    pub calls: usize,
}

/// Priority-descending broadcast list
pub struct NotifierChain<D: ?Sized> {
    blocks: Vec<(NotifierId, NotifierBlock<D>)>,
    next_id: u32,
}

impl<D: ?Sized> Default for NotifierChain<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ?Sized> NotifierChain<D> {
    /// Empty chain
    pub const fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 0,
        }
    }

    /// Insert `block` after every block of greater or equal priority
    pub fn register(&mut self, block: NotifierBlock<D>) -> NotifierId {
        let id = NotifierId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let pos = self
            .blocks
            .iter()
            .position(|(_, existing)| block.priority > existing.priority)
            .unwrap_or(self.blocks.len());
        self.blocks.insert(pos, (id, block));
        id
    }

    /// Remove a block by identity, handing it back
    pub fn unregister(&mut self, id: NotifierId) -> RegistryResult<NotifierBlock<D>> {
        let pos = self
            .blocks
            .iter()
            .position(|(existing, _)| *existing == id)
            .ok_or(RegistryError::NotifierNotFound)?;
        Ok(self.blocks.remove(pos).1)
    }

    /// Invoke callbacks in priority order
    ///
    /// Stops when the chain is exhausted, `limit` calls have been made, or
    /// a callback answers with the stop bit set; that answer is returned.
    ///
    /// ```rust
    /// use sensorhub_core::{Notify, NotifierBlock, NotifierChain, CallLimit};
    ///
    /// let mut chain: NotifierChain<u32> = NotifierChain::new();
    /// chain.register(NotifierBlock::new(1, |_, _, hits: &mut u32| { *hits += 1; Notify::OK }));
    /// chain.register(NotifierBlock::new(5, |_, _, _: &mut u32| Notify::STOP));
    ///
    /// let mut hits = 0;
    /// let outcome = chain.call_chain(0, &mut hits, CallLimit::Unlimited);
    /// assert_eq!(outcome.result, Notify::STOP);
    /// assert_eq!(outcome.calls, 1);
    /// assert_eq!(hits, 0);
    /// ```
    pub fn call_chain(
        &mut self,
        action: u64,
        data: &mut D,
        limit: impl Into<CallLimit>,
    ) -> CallOutcome {
        let budget = match limit.into() {
            CallLimit::Unlimited => usize::MAX,
            CallLimit::AtMost(n) => n,
        };
        let mut outcome = CallOutcome {
            result: Notify::DONE,
            calls: 0,
        };

        let mut i = 0;
        while i < self.blocks.len() && outcome.calls < budget {
            let (id, block) = &mut self.blocks[i];
            let mut ctx = NotifierCtx {
                id: *id,
                priority: block.priority,
                unregister: false,
            };

            outcome.result = (block.callback)(&mut ctx, action, &mut *data);
            outcome.calls += 1;

            if ctx.unregister {
                self.blocks.remove(i);
            } else {
                i += 1;
            }

            if outcome.result.is_stop() {
                break;
            }
        }

        outcome
    }

    /// Whether `id` is currently in the chain
    pub fn contains(&self, id: NotifierId) -> bool {
        self.blocks.iter().any(|(existing, _)| *existing == id)
    }

    /// Priorities in walk order
    pub fn priorities(&self) -> impl Iterator<Item = i32> + '_ {
        self.blocks.iter().map(|(_, block)| block.priority)
    }

    /// Identities in walk order
    pub fn ids(&self) -> impl Iterator<Item = NotifierId> + '_ {
        self.blocks.iter().map(|(id, _)| *id)
    }

    /// Number of registered blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<D: ?Sized> fmt::Debug for NotifierChain<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.blocks.iter().map(|(id, block)| (id, block.priority)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    type Trace = Vec<i32>;

    /// Block that records its tag and answers `answer`
    fn tagged(priority: i32, tag: i32, answer: Notify) -> NotifierBlock<Trace> {
        NotifierBlock::new(priority, move |_, _, trace: &mut Trace| {
            trace.push(tag);
            answer
        })
    }

    #[test]
    fn register_orders_by_priority() {
        let mut chain = NotifierChain::new();
        chain.register(tagged(0, 0, Notify::OK));
        chain.register(tagged(10, 1, Notify::OK));
        chain.register(tagged(5, 2, Notify::OK));
        chain.register(tagged(-3, 3, Notify::OK));

        assert_eq!(chain.priorities().collect::<Vec<_>>(), vec![10, 5, 0, -3]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut chain = NotifierChain::new();
        chain.register(tagged(5, 1, Notify::OK));
        chain.register(tagged(5, 2, Notify::OK));
        chain.register(tagged(7, 0, Notify::OK));
        chain.register(tagged(5, 3, Notify::OK));

        let mut trace = Trace::new();
        let outcome = chain.call_chain(0, &mut trace, CallLimit::Unlimited);
        assert_eq!(trace, vec![0, 1, 2, 3]);
        assert_eq!(outcome.calls, 4);
        assert_eq!(outcome.result, Notify::OK);
    }

    #[test]
    fn stop_bit_halts_walk() {
        let mut chain = NotifierChain::new();
        chain.register(tagged(3, 1, Notify::OK));
        chain.register(tagged(2, 2, Notify::BAD));
        chain.register(tagged(1, 3, Notify::OK));

        let mut trace = Trace::new();
        let outcome = chain.call_chain(7, &mut trace, -1);
        assert_eq!(trace, vec![1, 2]);
        assert_eq!(outcome, CallOutcome { result: Notify::BAD, calls: 2 });
        assert!(outcome.result.is_reject());
    }

    #[test]
    fn call_limit_caps_invocations() {
        let mut chain = NotifierChain::new();
        for tag in 0..5 {
            chain.register(tagged(0, tag, Notify::OK));
        }

        let mut trace = Trace::new();
        let outcome = chain.call_chain(0, &mut trace, 2);
        assert_eq!(trace, vec![0, 1]);
        assert_eq!(outcome.calls, 2);

        let mut trace = Trace::new();
        chain.call_chain(0, &mut trace, 0);
        assert_eq!(trace.len(), 5, "zero means no limit");
    }

    #[test]
    fn empty_chain_is_done() {
        let mut chain: NotifierChain<Trace> = NotifierChain::new();
        let outcome = chain.call_chain(0, &mut Trace::new(), CallLimit::Unlimited);
        assert_eq!(outcome, CallOutcome { result: Notify::DONE, calls: 0 });
    }

    #[test]
    fn action_is_forwarded() {
        let mut chain: NotifierChain<u64> = NotifierChain::new();
        chain.register(NotifierBlock::new(0, |_, action, seen: &mut u64| {
            *seen = action;
            Notify::OK
        }));

        let mut seen = 0;
        chain.call_chain(0xabcd, &mut seen, CallLimit::Unlimited);
        assert_eq!(seen, 0xabcd);
    }

    #[test]
    fn unregister_by_identity() {
        let mut chain = NotifierChain::new();
        let a = chain.register(tagged(1, 1, Notify::OK));
        let b = chain.register(tagged(1, 2, Notify::OK));

        let block = chain.unregister(a).unwrap();
        assert_eq!(block.priority(), 1);
        assert!(!chain.contains(a));
        assert!(chain.contains(b));

        assert_eq!(chain.unregister(a).unwrap_err(), RegistryError::NotifierNotFound);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn callback_can_unregister_itself() {
        let mut chain = NotifierChain::new();
        chain.register(tagged(3, 1, Notify::OK));
        chain.register(NotifierBlock::new(2, |ctx: &mut NotifierCtx, _, trace: &mut Trace| {
            trace.push(2);
            ctx.unregister_self();
            Notify::OK
        }));
        chain.register(tagged(1, 3, Notify::OK));

        let mut trace = Trace::new();
        chain.call_chain(0, &mut trace, CallLimit::Unlimited);
        assert_eq!(trace, vec![1, 2, 3]);
        assert_eq!(chain.priorities().collect::<Vec<_>>(), vec![3, 1]);

        let mut trace = Trace::new();
        chain.call_chain(0, &mut trace, CallLimit::Unlimited);
        assert_eq!(trace, vec![1, 3]);
    }

    #[test]
    fn self_removal_with_stop() {
        let mut chain = NotifierChain::new();
        chain.register(NotifierBlock::new(0, |ctx: &mut NotifierCtx, _, trace: &mut Trace| {
            trace.push(ctx.priority());
            ctx.unregister_self();
            Notify::STOP
        }));
        chain.register(tagged(-1, 9, Notify::OK));

        let mut trace = Trace::new();
        let outcome = chain.call_chain(0, &mut trace, CallLimit::Unlimited);
        assert_eq!(outcome.result, Notify::STOP);
        assert_eq!(trace, vec![0]);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn bit_convention() {
        assert_eq!(Notify::DONE.bits(), 0x0000);
        assert_eq!(Notify::OK.bits(), 0x0001);
        assert_eq!(Notify::STOP.bits(), 0x8001);
        assert_eq!(Notify::BAD.bits(), NOTIFY_BAD);

        assert_eq!(Notify::from_bits(0x8002), Notify::BAD);
        assert_eq!(Notify::from_bits(0x8001), Notify::STOP);
        assert_eq!(Notify::from_bits(0x0001), Notify::OK);
        assert_eq!(Notify::from_bits(0x0004), Notify::Continue(4));

        assert!(!Notify::OK.is_stop());
        assert!(Notify::STOP.is_stop());
        assert!(Notify::BAD.is_stop());
        assert!(Notify::Stop(0).is_stop());
    }

    #[test]
    fn bits_round_trip() {
        for v in 0..=0x7fff {
            let n = Notify::Continue(v);
            assert_eq!(Notify::from_bits(n.bits()), n);
        }
        for v in (0..=0x7fffu16).filter(|v| v & NOTIFY_BAD_BIT == 0) {
            for n in [Notify::Stop(v), Notify::Reject(v)] {
                assert_eq!(Notify::from_bits(n.bits()), n, "{:#06x}", n.bits());
            }
        }
        for bits in 0..=u16::MAX {
            assert_eq!(Notify::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn colliding_payload_keeps_variant() {
        // 2 is the bad bit; a stop must not decode as a rejection
        let stop = Notify::from_bits(Notify::Stop(2).bits());
        assert!(matches!(stop, Notify::Stop(_)));
        assert!(!stop.is_reject());

        assert_eq!(Notify::Reject(0).bits(), NOTIFY_BAD);
        assert_eq!(Notify::from_bits(NOTIFY_BAD), Notify::Reject(0));
        assert_eq!(Notify::BAD, Notify::Reject(0));
    }
}
