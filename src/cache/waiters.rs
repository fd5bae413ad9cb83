//! Wait Registry Module
//!
//! Tracks, per key, the callers suspended until a value for that key is
//! stored. The first caller to register on a key becomes its producer and is
//! not queued; everyone after it gets a oneshot receiver.

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

// == Waiter ==
/// A single suspended caller.
#[derive(Debug)]
pub struct Waiter<V> {
    /// Registry-unique id, used to withdraw the waiter on timeout
    pub id: u64,
    sender: oneshot::Sender<V>,
}

impl<V> Waiter<V> {
    // == Wake ==
    /// Delivers `value`, returning false if the caller is no longer listening.
    pub fn wake(self, value: V) -> bool {
        self.sender.send(value).is_ok()
    }
}

// == Registration ==
/// Outcome of registering interest in an absent key.
#[derive(Debug)]
pub enum Registration<V> {
    /// No computation was in flight: the caller must produce the value
    Producer,
    /// Another caller is producing: await the receiver
    Waiting {
        id: u64,
        receiver: oneshot::Receiver<V>,
    },
}

// == Wait Registry ==
/// Per-key FIFO queues of suspended callers.
///
/// A key present here is in flight, even with an empty queue.
#[derive(Debug)]
pub struct WaitRegistry<V> {
    /// Pending waiters by key, in registration order
    queues: HashMap<String, VecDeque<Waiter<V>>>,
    next_id: u64,
}

impl<V> Default for WaitRegistry<V> {
    fn default() -> Self {
        Self {
            queues: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<V> WaitRegistry<V> {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers a caller for `key`.
    ///
    /// The first registration creates an empty queue and designates the
    /// caller as producer. Later ones are appended to the queue.
    pub fn register(&mut self, key: &str) -> Registration<V> {
        match self.queues.get_mut(key) {
            None => {
                self.queues.insert(key.to_string(), VecDeque::new());
                Registration::Producer
            }
            Some(queue) => {
                let (sender, receiver) = oneshot::channel();
                let id = self.next_id;
                self.next_id += 1;
                queue.push_back(Waiter { id, sender });
                Registration::Waiting { id, receiver }
            }
        }
    }

    // == Take ==
    /// Removes the registration for `key`, returning its waiters in FIFO order.
    pub fn take(&mut self, key: &str) -> Option<VecDeque<Waiter<V>>> {
        self.queues.remove(key)
    }

    // == Withdraw ==
    /// Removes a single waiter from `key`'s queue, leaving the others and the
    /// registration itself in place. Returns whether the waiter was found.
    pub fn withdraw(&mut self, key: &str, id: u64) -> bool {
        let Some(queue) = self.queues.get_mut(key) else {
            return false;
        };
        match queue.iter().position(|waiter| waiter.id == id) {
            Some(index) => {
                queue.remove(index);
                true
            }
            None => false,
        }
    }

    // == Queries ==
    /// Returns true while a computation for `key` is in flight.
    pub fn is_held(&self, key: &str) -> bool {
        self.queues.contains_key(key)
    }

    /// Number of callers queued on `key`, the producer excluded.
    pub fn waiter_count(&self, key: &str) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    /// Number of keys with a registration.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Returns true if no key is in flight.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
