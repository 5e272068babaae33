//! In-process federation harness. Federates talk over a [`LoopRouter`]
//! that queues every broadcast; tests (and the claim-window sleep) decide
//! when the queue is flushed, which makes race interleavings controllable
//! from the test body.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fedsim_federate::{Connection, Federate};
use fedsim_shared::{Callback, Envelope, FederateHandle};

/// Shared broadcast queue for a federation of in-process federates.
///
/// `flush` delivers queued envelopes to every member, including any
/// follow-up broadcasts a delivery provokes, until the queue is empty.
/// Delivery never happens while the flushing federate holds its own state
/// lock: ordinary broadcasts only enqueue, and the window flush in
/// [`LoopConnection::broadcast_and_sleep`] runs between the two locked
/// phases of a claim.
#[derive(Default)]
pub struct LoopRouter {
    members: Mutex<Vec<Arc<Federate<LoopConnection>>>>,
    queue: Mutex<VecDeque<Envelope>>,
    held: AtomicBool,
}

impl LoopRouter {
    fn register(&self, federate: Arc<Federate<LoopConnection>>) {
        self.members.lock().unwrap().push(federate);
    }

    fn enqueue(&self, envelope: Envelope) {
        self.queue.lock().unwrap().push_back(envelope);
    }

    /// While held, flushes are no-ops and broadcasts pile up in the queue.
    /// Lets a test line up several in-flight intents before any of them is
    /// seen by a peer.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    pub fn flush(&self) {
        if self.held.load(Ordering::SeqCst) {
            return;
        }
        loop {
            let envelope = self.queue.lock().unwrap().pop_front();
            let Some(envelope) = envelope else {
                return;
            };
            let members = self.members.lock().unwrap().clone();
            for member in members {
                member.receive(envelope.clone());
            }
        }
    }
}

/// Connection backed by the shared router. The wait window is a real
/// sleep so that two threads claiming concurrently both see the other's
/// intent before either finalizes.
pub struct LoopConnection {
    router: Arc<LoopRouter>,
    window: Duration,
}

impl Connection for LoopConnection {
    fn broadcast(&self, envelope: Envelope) {
        self.router.enqueue(envelope);
    }

    fn broadcast_and_sleep(&self, envelope: Envelope) {
        self.router.enqueue(envelope);
        self.router.flush();
        if !self.window.is_zero() {
            std::thread::sleep(self.window);
            self.router.flush();
        }
    }
}

/// A federation of in-process federates with a shared router.
pub struct TestFederation {
    router: Arc<LoopRouter>,
    federates: Vec<Arc<Federate<LoopConnection>>>,
}

impl TestFederation {
    /// Spins up one federate per handle, each aware of all the others.
    pub fn new(handles: &[FederateHandle], window: Duration) -> Self {
        let router = Arc::new(LoopRouter::default());
        let mut federates = Vec::new();
        for &handle in handles {
            let connection = LoopConnection {
                router: router.clone(),
                window,
            };
            let federate = Arc::new(Federate::new(handle, connection));
            router.register(federate.clone());
            federates.push(federate);
        }
        for federate in &federates {
            for &peer in handles {
                if peer != federate.handle() {
                    federate.federate_joined(peer);
                }
            }
        }
        TestFederation { router, federates }
    }

    pub fn federate(&self, handle: FederateHandle) -> Arc<Federate<LoopConnection>> {
        self.federates
            .iter()
            .find(|federate| federate.handle() == handle)
            .cloned()
            .unwrap_or_else(|| panic!("no federate with handle [{handle}]"))
    }

    /// Delivers everything still queued on the router.
    pub fn pump(&self) {
        self.router.flush();
    }

    pub fn router(&self) -> &LoopRouter {
        &self.router
    }
}

/// Drains a federate's callbacks and asserts one of them satisfies the
/// predicate, returning the full drain for further checks.
pub fn expect_callback(
    federate: &Federate<LoopConnection>,
    description: &str,
    predicate: impl Fn(&Callback) -> bool,
) -> Vec<Callback> {
    let callbacks = federate.drain_callbacks();
    assert!(
        callbacks.iter().any(&predicate),
        "[{}] expected callback {description}, got {callbacks:?}",
        federate.handle()
    );
    callbacks
}
