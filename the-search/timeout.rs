//! Time source and deadline tracking for the typing timeout.

use std::{
  cell::Cell,
  rc::Rc,
  time::{
    Duration,
    Instant,
  },
};

/// Monotonic time source.
pub trait Clock {
  fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
  now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new()
  }
}

impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: Rc::new(Cell::new(Instant::now())),
    }
  }

  pub fn advance(&self, by: Duration) {
    self.now.set(self.now.get() + by);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Instant {
    self.now.get()
  }
}

/// A restartable single-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
  duration: Duration,
  deadline: Option<Instant>,
}

impl Timeout {
  pub fn new(duration: Duration) -> Self {
    Self {
      duration,
      deadline: None,
    }
  }

  pub fn duration(&self) -> Duration {
    self.duration
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn restart(&mut self, now: Instant) {
    self.deadline = Some(now + self.duration);
  }

  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  /// Whether a running deadline has been reached at `now`.
  pub fn is_expired(&self, now: Instant) -> bool {
    self.deadline.is_some_and(|deadline| now >= deadline)
  }
}
