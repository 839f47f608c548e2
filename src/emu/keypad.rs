use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
};
use std::time::Duration;

use crate::u4;

/// Executor-side view of the 16-key hex keypad.
///
/// Key state is written by any number of [`KeypadHandle`]s and read here.
/// Press notifications arrive on a channel and are consumed by Fx0A.
#[derive(Debug)]
pub struct Keypad {
    keys: Arc<[AtomicBool; 16]>,
    sender: Sender<u4>,
    presses: Receiver<u4>,
    /// A press already pulled off the channel by `wait_for_press`.
    pending: Option<u4>,
}

impl Keypad {
    pub fn new() -> Self {
        let (sender, presses) = mpsc::channel();
        Self {
            keys: Arc::new(std::array::from_fn(|_| AtomicBool::new(false))),
            sender,
            presses,
            pending: None,
        }
    }

    /// A handle an input source can use from another thread.
    pub fn handle(&self) -> KeypadHandle {
        KeypadHandle {
            keys: Arc::clone(&self.keys),
            sender: self.sender.clone(),
        }
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[key].load(Ordering::Acquire)
    }

    /// Takes the next newly-pressed key without blocking.
    pub fn take_press(&mut self) -> Option<u4> {
        if let Some(key) = self.pending.take() {
            return Some(key);
        }

        match self.presses.try_recv() {
            Ok(key) => Some(key),
            // Disconnected cannot happen while we hold `sender` ourselves.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drops every notification delivered so far.
    pub fn discard_presses(&mut self) {
        self.pending = None;
        while self.presses.try_recv().is_ok() {}
    }

    /// Blocks for at most `timeout` until a press notification is available.
    ///
    /// The notification is kept for the next `take_press`, so waiting never
    /// consumes a key by itself.
    pub fn wait_for_press(&mut self, timeout: Duration) -> bool {
        if self.pending.is_some() {
            return true;
        }

        match self.presses.recv_timeout(timeout) {
            Ok(key) => {
                self.pending = Some(key);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

/// Input-source side of the keypad. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct KeypadHandle {
    keys: Arc<[AtomicBool; 16]>,
    sender: Sender<u4>,
}

impl KeypadHandle {
    /// Set the state of a key on the keypad.
    ///
    /// Only a released -> pressed transition raises a press notification, so
    /// auto-repeat of a held key is ignored.
    pub fn set_key(&self, key: u4, pressed: bool) {
        let was_pressed = self.keys[key].swap(pressed, Ordering::AcqRel);

        if pressed && !was_pressed {
            // The machine may already be gone; a lost notification is harmless then.
            let _ = self.sender.send(key);
        }
    }

    pub fn press(&self, key: u4) {
        self.set_key(key, true);
    }

    pub fn release(&self, key: u4) {
        self.set_key(key, false);
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[key].load(Ordering::Acquire)
    }
}
