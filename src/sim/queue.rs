//! Strict FIFO effect queue
//!
//! At most one effect is in flight. The engine pulls the head with
//! `begin_next`, resolves it, and reports back through `finish`; nothing else
//! is dequeued in between. Failures are reported and never stall the queue.

use std::collections::VecDeque;

use super::effect::{Effect, EffectKind, EffectReport, OnComplete};
use super::event::CascadeEvent;
use crate::error::{AnimationError, EffectError};

#[derive(Debug, Default)]
pub struct EffectQueue {
    pending: VecDeque<Effect>,
    in_flight: Option<EffectKind>,
    events: Vec<CascadeEvent>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail
    pub fn enqueue(&mut self, effect: Effect) {
        log::debug!("Queued {:?} ({} pending)", effect.kind(), self.pending.len() + 1);
        self.pending.push_back(effect);
    }

    /// Record a malformed effect that was never queued
    pub fn reject(&mut self, error: EffectError) {
        log::warn!("Rejected effect: {}", error);
        self.events.push(CascadeEvent::EffectRejected { error });
    }

    /// Dequeue the head and mark it in flight. None if empty or busy.
    pub fn begin_next(&mut self) -> Option<Effect> {
        if self.in_flight.is_some() {
            return None;
        }
        let effect = self.pending.pop_front()?;
        self.in_flight = Some(effect.kind());
        self.events.push(CascadeEvent::EffectStarted { kind: effect.kind() });
        Some(effect)
    }

    /// Close the in-flight effect. The callback only runs on success.
    pub fn finish(
        &mut self,
        report: EffectReport,
        result: Result<(), AnimationError>,
        on_complete: Option<OnComplete>,
    ) {
        let kind = report.kind;
        match result {
            Ok(()) => {
                self.events.push(CascadeEvent::EffectCompleted { kind });
                if let Some(callback) = on_complete {
                    callback(&report);
                }
            }
            Err(error) => {
                log::warn!("{:?} effect failed: {}", kind, error);
                self.events.push(CascadeEvent::EffectErrored { kind, error });
            }
        }
        self.in_flight = None;
        if self.pending.is_empty() {
            self.events.push(CascadeEvent::QueueIdle);
        }
    }

    /// Drop every pending effect. The in-flight one is unaffected.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            log::debug!("Cleared {} pending effects", dropped);
        }
        dropped
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_empty()
    }

    pub fn in_flight(&self) -> Option<EffectKind> {
        self.in_flight
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True if any pending effect is of one of `kinds`
    pub fn has_pending(&self, kinds: &[EffectKind]) -> bool {
        self.pending.iter().any(|e| kinds.contains(&e.kind()))
    }

    pub fn push_event(&mut self, event: CascadeEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<CascadeEvent> {
        std::mem::take(&mut self.events)
    }
}
