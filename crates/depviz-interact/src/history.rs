//! Bounded undo/redo over whole snapshots

use depviz_core::Snapshot;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
    depth: usize,
    last_hash: Option<String>,
}

impl History {
    pub fn new(depth: usize) -> Self {
        History {
            entries: Vec::new(),
            index: 0,
            depth: depth.max(1),
            last_hash: None,
        }
    }

    /// Record `snapshot` unless its content hash matches the last pushed
    /// one. Drops any redo branch. Returns the new hash when recorded.
    pub fn push(&mut self, snapshot: Snapshot) -> Option<String> {
        let hash = snapshot.content_hash();
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            return None;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.depth {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
        self.last_hash = Some(hash.clone());
        Some(hash)
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.sync_hash();
        self.entries.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.sync_hash();
        self.entries.get(self.index)
    }

    /// The dedup hash always names the entry the canvas is showing.
    fn sync_hash(&mut self) {
        self.last_hash = self.entries.get(self.index).map(Snapshot::content_hash);
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.last_hash = None;
    }
}
