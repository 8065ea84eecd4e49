use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    fmt,
    time::Duration,
};

use serde_json::Value;
use tokio::{sync::oneshot, time::Instant};

use super::deadline_after;
use crate::ws::{
    client::{call::CallResult, CallError, CallRequest, Callback, Deferred},
    message::CallFrame,
};

pub(crate) struct PendingRequest {
    id: u64,
    tx: oneshot::Sender<CallResult>,
    callback: Option<Callback>,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn resolve(self, result: Value) {
        let deferred = Deferred::new(self.id, self.tx);
        match self.callback {
            Some(callback) => {
                log::trace!("Call {} settled by its callback", self.id);
                callback(result, deferred)
            }
            None => deferred.resolve(result),
        }
    }

    pub fn reject(self, err: CallError) {
        Deferred::new(self.id, self.tx).settle(Err(err));
    }
}

/// In-flight calls by id, with their timeout deadlines.
///
/// Removing an entry is what settles it, so a response and a timeout can
/// never both settle the same call.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    last_id: u64,
    requests: HashMap<u64, PendingRequest>,
    deadlines: BinaryHeap<Reverse<(Instant, u64)>>,
}

impl PendingTable {
    /// ids start at 1 and are never reused
    fn allocate(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn register(&mut self, request: CallRequest, default_timeout: Duration) -> CallFrame {
        let id = self.allocate();
        let timeout = request.timeout.unwrap_or(default_timeout);
        let deadline = deadline_after(Instant::now(), timeout);

        log::trace!("Register call {} {}, deadline {:?}", id, request.name, deadline);

        self.requests.insert(
            id,
            PendingRequest {
                id,
                tx: request.tx,
                callback: request.callback,
            },
        );
        self.deadlines.push(Reverse((deadline, id)));

        CallFrame {
            name: request.name,
            id,
            data: request.data,
        }
    }

    /// Consume an id for a call that can't be sent and reject it.
    pub fn refuse(&mut self, request: CallRequest) {
        let id = self.allocate();
        log::debug!("Call {} {} refused, websocket is not open", id, request.name);

        Deferred::new(id, request.tx).settle(Err(CallError::NotConnected { id }));
    }

    pub fn take(&mut self, id: u64) -> Option<PendingRequest> {
        self.requests.remove(&id)
    }

    pub fn next_deadline(&mut self) -> Option<Instant> {
        loop {
            let Reverse((deadline, id)) = *self.deadlines.peek()?;
            if self.requests.contains_key(&id) {
                return Some(deadline);
            }
            // settled already
            self.deadlines.pop();
        }
    }

    /// Reject every call whose deadline is not after `now`, returns the count.
    pub fn expire(&mut self, now: Instant) -> usize {
        let mut count = 0;

        while let Some(&Reverse((deadline, id))) = self.deadlines.peek() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();

            if let Some(request) = self.requests.remove(&id) {
                log::debug!("Call {} timed out", id);
                request.reject(CallError::Timeout { id });
                count += 1;
            }
        }

        count
    }

    /// Reject all in-flight calls, their connection is gone.
    pub fn reject_all(&mut self) {
        if !self.requests.is_empty() {
            log::debug!("Reject {} pending calls, connection lost", self.requests.len());
        }

        for (id, request) in self.requests.drain() {
            request.reject(CallError::ConnectionLost { id });
        }
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}
