use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::mpsc;
use std::time::Duration;

use crate::app::Input;
use crate::camera::{AcquireTicket, CameraError, MediaStream};

pub enum Event {
    Input(Input),
    Timer(TimerHandle, Timer),
    Camera(AcquireTicket, Result<Box<dyn MediaStream>, CameraError>),
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Input(input) => write!(f, "Input({:?})", input),
            Event::Timer(handle, timer) => write!(f, "Timer({:?}, {:?})", handle, timer),
            Event::Camera(ticket, Ok(_)) => write!(f, "Camera({:?}, Ok(..))", ticket),
            Event::Camera(ticket, Err(e)) => write!(f, "Camera({:?}, Err({:?}))", ticket, e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    SheetEnter,
    CarouselSettle,
    CarouselDebounce,
}

pub trait Scheduler {
    fn now(&self) -> Duration;
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

pub struct Dispatcher {
    rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, TimerHandle), Timer>,
    deadlines: HashMap<TimerHandle, Duration>,
}

impl Default for Dispatcher {
    fn default() -> Dispatcher {
        Dispatcher::new()
    }
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        let (tx, rx) = mpsc::channel();
        Dispatcher {
            rx,
            tx,
            now: Duration::from_millis(0),
            next_id: 0,
            timers: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn next(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    pub fn event_sink(&self) -> &mpsc::Sender<Event> {
        &self.tx
    }

    pub fn post(&self, event: Event) {
        // The receiver lives as long as `self`.
        let _ = self.tx.send(event);
    }

    /// Removes the earliest timer due at or before `until` and moves the
    /// clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<Event> {
        let (&(due, handle), _) = self.timers.iter().next()?;
        if due > until {
            return None;
        }

        let timer = self.timers.remove(&(due, handle))?;
        self.deadlines.remove(&handle);
        self.now = self.now.max(due);
        Some(Event::Timer(handle, timer))
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for Dispatcher {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let due = self.now + delay;
        self.timers.insert((due, handle), timer);
        self.deadlines.insert(handle, due);
        log::trace!("scheduled {:?} as {:?} at {:?}", timer, handle, due);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        if let Some(due) = self.deadlines.remove(&handle) {
            self.timers.remove(&(due, handle));
            true
        } else {
            false
        }
    }
}
