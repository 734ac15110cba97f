use crate::common::config::{PageId, NO_PAGE, PAGE_SIZE};

/// One slot of the buffer pool. Holds at most one resident page plus the
/// bookkeeping the pool needs to decide when it is safe to evict.
///
/// Invariants: `page_id == NO_PAGE` implies `dirty == false` and
/// `pin_count == 0`. A frame with `pin_count > 0` is never a victim
/// candidate. `dirty == true` means a write to `page_id` is owed to disk.
#[derive(Debug)]
pub struct Frame {
    page_id: PageId,
    data: [u8; PAGE_SIZE],
    dirty: bool,
    pin_count: u32,
}

impl Frame {
    pub fn empty() -> Frame {
        Frame {
            page_id: NO_PAGE,
            data: [0; PAGE_SIZE],
            dirty: false,
            pin_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page_id == NO_PAGE
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn pin(&mut self) {
        self.pin_count += 1;
    }

    /// Decrements the pin count. Returns `false` if the frame was already
    /// unpinned (a caller bug the pool surfaces as `ReadNonExistingPage`).
    pub fn unpin(&mut self) -> bool {
        if self.pin_count == 0 {
            return false;
        }
        self.pin_count -= 1;
        true
    }

    /// Loads `page_id` into this frame, replacing whatever was here. The
    /// frame must not be pinned when this is called.
    pub fn load(&mut self, page_id: PageId, bytes: [u8; PAGE_SIZE]) {
        self.page_id = page_id;
        self.data = bytes;
        self.dirty = false;
        self.pin_count = 0;
    }

    /// Resets the frame to empty. Caller must have already written back any
    /// dirty contents.
    pub fn evict(&mut self) {
        self.page_id = NO_PAGE;
        self.data = [0; PAGE_SIZE];
        self.dirty = false;
        self.pin_count = 0;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
