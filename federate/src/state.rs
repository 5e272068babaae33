use std::collections::{HashSet, VecDeque};

use fedsim_shared::{
    Callback, FederateHandle, InterestTable, NameTable, ObjectHandle, OwnershipStore, Repository,
    SyncPointStore,
};

/// Everything a federate instance mutates: the repository mirror, the
/// three claim stores, the roster of live federates and the callback
/// queue. One coarse lock guards the whole of it; the caller's thread and
/// the connection's delivery thread(s) both run handler chains under it.
pub struct LocalState {
    pub federate: FederateHandle,
    pub joined: bool,
    pub repository: Repository,
    pub interests: InterestTable,
    pub ownership: OwnershipStore,
    pub sync_points: SyncPointStore,
    pub names: NameTable,
    /// Live federates, the local one included.
    pub roster: HashSet<FederateHandle>,
    pub callbacks: VecDeque<Callback>,
    next_object: u16,
}

impl LocalState {
    pub fn new(federate: FederateHandle) -> Self {
        let mut roster = HashSet::new();
        roster.insert(federate);
        Self {
            federate,
            joined: true,
            repository: Repository::new(),
            interests: InterestTable::new(),
            ownership: OwnershipStore::new(),
            sync_points: SyncPointStore::new(),
            names: NameTable::new(),
            roster,
            callbacks: VecDeque::new(),
            next_object: 0,
        }
    }

    pub fn queue_callback(&mut self, callback: Callback) {
        self.callbacks.push_back(callback);
    }

    /// Mints an object handle namespaced by the local federate handle, so
    /// two federates can register concurrently without a handle service.
    pub fn next_object_handle(&mut self) -> ObjectHandle {
        self.next_object += 1;
        (ObjectHandle::from(self.federate) << 16) | ObjectHandle::from(self.next_object)
    }
}
