use std::collections::BTreeMap;
use std::time::Duration;

use crate::dom::document::Document;
use crate::form::error::FormError;
use crate::form::form_model::QuestionType;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

/// Source of waiting between deferred steps.
pub trait Clock {
    /// Block (or pretend to) for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Really sleeps, giving a live page's own scripts time to react.
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Advances virtual time without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    pub elapsed: Duration,
}

impl Clock for ManualClock {
    fn sleep(&mut self, duration: Duration) {
        self.elapsed += duration;
    }
}

pub type TaskFn = Box<dyn FnOnce(&mut Document, &mut Scheduler) -> Result<(), FormError>>;

/// Which control a deferred step belongs to, for logging.
#[derive(Debug, Clone)]
pub struct TaskLabel {
    pub question_id: usize,
    pub question_type: QuestionType,
    pub step: &'static str,
}

struct Pending {
    label: TaskLabel,
    run: TaskFn,
}

/// Timer queue for replay's deferred steps.
///
/// Steps run in due-time order (ties in scheduling order). A step may schedule
/// follow-up steps relative to the moment it runs. Each step is its own failure
/// boundary: an error is logged and the queue carries on.
pub struct Scheduler {
    now: Duration,
    seq: u64,
    queue: BTreeMap<(Duration, u64), Pending>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn schedule(&mut self, delay: Duration, label: TaskLabel, run: TaskFn) {
        let due = self.now + delay;
        self.seq += 1;
        self.queue.insert((due, self.seq), Pending { label, run });
    }

    /// Drain the queue, waiting on `clock` between steps.
    pub fn run(&mut self, doc: &mut Document, clock: &mut dyn Clock, tracer: &TraceLogger) {
        while let Some(((due, _), pending)) = self.queue.pop_first() {
            if due > self.now {
                clock.sleep(due - self.now);
                self.now = due;
            }

            let Pending { label, run } = pending;
            let event = match run(doc, self) {
                Ok(()) => TraceEvent::now(Phase::Replay, label.step, Outcome::Applied),
                Err(e) => {
                    TraceEvent::now(Phase::Replay, label.step, Outcome::Failed).with_detail(e)
                }
            };
            tracer.log(
                event
                    .with_question(label.question_id)
                    .with_type(label.question_type),
            );
        }
    }
}
