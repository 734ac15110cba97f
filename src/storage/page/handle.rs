use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::common::config::{PageId, PAGE_SIZE};
use crate::storage::page::Frame;

/// An owned, clonable-independent view into a pinned frame's payload.
///
/// Holds its own `Rc<RefCell<Frame>>` rather than borrowing out of
/// `BufferPool`, so the handle's lifetime is tied to the pool object, not to
/// the `pin` call that produced it: two pages can be pinned and held live at
/// once, and a second `pin`/`unpin` call on the pool does not have to wait
/// for this handle to drop first. `data`/`data_mut` return mapped
/// `Ref`/`RefMut` guards (the single-threaded analogue of a mapped
/// `RwLockReadGuard`/`RwLockWriteGuard`) so callers see exactly the page
/// bytes, not the whole `Frame`. The pin/unpin accounting itself is tracked
/// by page id on the pool, not by this handle — dropping a `PageHandle`
/// releases the borrow but not the pin; callers still call `unpin`
/// explicitly.
#[derive(Debug)]
pub struct PageHandle {
    page_id: PageId,
    frame: Rc<RefCell<Frame>>,
}

impl PageHandle {
    pub(crate) fn new(page_id: PageId, frame: Rc<RefCell<Frame>>) -> Self {
        PageHandle { page_id, frame }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> Ref<'_, [u8; PAGE_SIZE]> {
        Ref::map(self.frame.borrow(), Frame::data)
    }

    pub fn data_mut(&mut self) -> RefMut<'_, [u8; PAGE_SIZE]> {
        RefMut::map(self.frame.borrow_mut(), Frame::data_mut)
    }
}
