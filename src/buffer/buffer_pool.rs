use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::buffer::replacer::{FifoReplacer, LruReplacer, Replacer, ReplacementStrategy};
use crate::common::config::{FrameId, PageId, NO_PAGE, PAGE_SIZE};
use crate::common::error::BufferError;
use crate::storage::disk::PageFile;
use crate::storage::page::{Frame, PageHandle};

/// `BufferPool` caches a fixed number of pages from one open `PageFile` in
/// memory, choosing victims by FIFO or LRU and guaranteeing that dirty data
/// is written back before being overwritten or at flush/shutdown.
///
/// Specified as a single-threaded component (see the crate's concurrency
/// notes): every operation here takes `&mut self` and completes with a
/// bounded number of synchronous I/O calls. A caller that needs to share one
/// pool across threads wraps the whole pool in a mutex; this type performs
/// no internal locking of its own. Frames are held behind `Rc<RefCell<_>>`
/// so a `PageHandle` returned by `pin` owns its frame independently of any
/// later call into the pool — two pages can be pinned and held live at once.
#[derive(Debug)]
pub struct BufferPool {
    file: PageFile,
    frames: Vec<Rc<RefCell<Frame>>>,
    page_table: HashMap<PageId, FrameId>,
    replacer: Replacer,
    num_read_io: u64,
    num_write_io: u64,
}

impl BufferPool {
    /// Opens `file_name` and allocates `capacity` empty frames plus the
    /// replacement bookkeeping for `strategy`. `capacity` must be at least 1.
    pub fn init(
        file_name: &str,
        capacity: usize,
        strategy: ReplacementStrategy,
    ) -> Result<BufferPool, BufferError> {
        if capacity < 1 {
            return Err(BufferError::InvalidCapacity(capacity));
        }
        let file = PageFile::open(file_name)?;
        let replacer = match strategy {
            ReplacementStrategy::Fifo => Replacer::Fifo(FifoReplacer::new()),
            ReplacementStrategy::Lru => Replacer::Lru(LruReplacer::new()),
            ReplacementStrategy::LruK => {
                return Err(BufferError::NotImplemented("LruK"));
            }
            ReplacementStrategy::Clock => {
                return Err(BufferError::NotImplemented("Clock"));
            }
            ReplacementStrategy::Lfu => {
                return Err(BufferError::NotImplemented("Lfu"));
            }
        };
        debug!(capacity, ?strategy, "buffer pool initialized");
        Ok(BufferPool {
            file,
            frames: (0..capacity)
                .map(|_| Rc::new(RefCell::new(Frame::empty())))
                .collect(),
            page_table: HashMap::new(),
            replacer,
            num_read_io: 0,
            num_write_io: 0,
        })
    }

    /// Flushes every frame that is dirty and unpinned, closes the backing
    /// file, and releases all frame memory. Pinned-dirty frames (a client
    /// bug) are left unflushed rather than silently dropped; see the crate's
    /// design notes for the rationale.
    pub fn shutdown(mut self) -> Result<(), BufferError> {
        self.force_flush()?;
        debug!("buffer pool shutdown complete");
        Ok(())
    }

    /// Writes back every dirty, unpinned frame and clears `dirty` on each.
    pub fn force_flush(&mut self) -> Result<(), BufferError> {
        for idx in 0..self.frames.len() {
            let (is_empty, is_dirty, pin_count) = {
                let frame = self.frames[idx].borrow();
                (frame.is_empty(), frame.is_dirty(), frame.pin_count())
            };
            if is_empty {
                continue;
            }
            if is_dirty && pin_count == 0 {
                self.write_back(idx)?;
            }
        }
        Ok(())
    }

    /// Makes `page_id` resident and increments its pin count. See the
    /// module-level contract for the hit/free-slot/victim algorithm.
    pub fn pin(&mut self, page_id: PageId) -> Result<PageHandle, BufferError> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.frames[frame_id].borrow_mut().pin();
            self.replacer.touch_on_hit(frame_id);
            trace!(page_id, frame_id, "pin hit");
            return Ok(PageHandle::new(page_id, Rc::clone(&self.frames[frame_id])));
        }

        let frame_id = self.frame_for_load(page_id)?;

        if page_id as u64 >= self.file.total_pages() {
            self.file.ensure_capacity(page_id as u64 + 1)?;
        }
        let mut bytes = [0u8; PAGE_SIZE];
        self.file.read(page_id, &mut bytes)?;
        self.num_read_io += 1;

        {
            let mut frame = self.frames[frame_id].borrow_mut();
            frame.load(page_id, bytes);
            frame.pin();
        }
        self.page_table.insert(page_id, frame_id);
        self.replacer.touch_on_load(frame_id);
        trace!(page_id, frame_id, "pin miss, loaded from disk");

        Ok(PageHandle::new(page_id, Rc::clone(&self.frames[frame_id])))
    }

    /// Finds a frame to hold a newly-loaded page: the lowest-index empty
    /// slot first, otherwise a victim from the replacer. Writes back the
    /// victim if it was dirty.
    fn frame_for_load(&mut self, requested: PageId) -> Result<FrameId, BufferError> {
        if let Some(frame_id) = self
            .frames
            .iter()
            .position(|f| f.borrow().is_empty())
        {
            return Ok(frame_id);
        }

        let pin_counts: Vec<u32> = self
            .frames
            .iter()
            .map(|f| f.borrow().pin_count())
            .collect();
        let frame_id = self
            .replacer
            .victim(|id| pin_counts[id] > 0)
            .ok_or(BufferError::ReadNonExistingPage(requested))?;

        let is_dirty = self.frames[frame_id].borrow().is_dirty();
        if is_dirty {
            self.write_back(frame_id)?;
        }
        let victim_page_id = self.frames[frame_id].borrow().page_id();
        self.page_table.remove(&victim_page_id);
        self.frames[frame_id].borrow_mut().evict();
        Ok(frame_id)
    }

    fn write_back(&mut self, frame_id: FrameId) -> Result<(), BufferError> {
        let page_id = self.frames[frame_id].borrow().page_id();
        {
            let frame = self.frames[frame_id].borrow();
            self.file.write(page_id, frame.data())?;
        }
        self.num_write_io += 1;
        self.frames[frame_id].borrow_mut().clear_dirty();
        Ok(())
    }

    fn frame_of(&self, page_id: PageId) -> Result<FrameId, BufferError> {
        self.page_table
            .get(&page_id)
            .copied()
            .ok_or(BufferError::ReadNonExistingPage(page_id))
    }

    /// Decrements the pin count of `page_id`. Fails with
    /// `ReadNonExistingPage` if the page is not resident or is already
    /// unpinned.
    pub fn unpin(&mut self, page_id: PageId) -> Result<(), BufferError> {
        let frame_id = self.frame_of(page_id)?;
        if !self.frames[frame_id].borrow_mut().unpin() {
            return Err(BufferError::ReadNonExistingPage(page_id));
        }
        Ok(())
    }

    /// Marks `page_id`'s frame dirty. Fails if the page is not resident.
    pub fn mark_dirty(&mut self, page_id: PageId) -> Result<(), BufferError> {
        let frame_id = self.frame_of(page_id)?;
        self.frames[frame_id].borrow_mut().mark_dirty();
        Ok(())
    }

    /// Writes `page_id`'s frame to disk regardless of its dirty flag, and
    /// clears the flag. Fails if the page is not resident.
    pub fn force_page(&mut self, page_id: PageId) -> Result<(), BufferError> {
        let frame_id = self.frame_of(page_id)?;
        self.write_back(frame_id)
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn num_read_io(&self) -> u64 {
        self.num_read_io
    }

    pub fn num_write_io(&self) -> u64 {
        self.num_write_io
    }

    /// Frame contents in frame-index order; empty slots report `NO_PAGE`.
    pub fn frame_contents(&self) -> Vec<PageId> {
        self.frames
            .iter()
            .map(|f| {
                let f = f.borrow();
                if f.is_empty() {
                    NO_PAGE
                } else {
                    f.page_id()
                }
            })
            .collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.borrow().is_dirty()).collect()
    }

    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.borrow().pin_count()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn fixture(pages: u64) -> (TempDir, String) {
        let dir = TempDir::new("bufferpool").unwrap();
        let path = dir.path().join("test.db");
        let name = path.to_str().unwrap().to_string();
        let mut pf = PageFile::create(&name).unwrap();
        if pages > 1 {
            pf.ensure_capacity(pages).unwrap();
        }
        (dir, name)
    }

    /// S1 — FIFO victim order.
    #[test]
    fn fifo_victim_order() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 3, ReplacementStrategy::Fifo).unwrap();

        bp.pin(0).unwrap();
        bp.unpin(0).unwrap();
        bp.pin(1).unwrap();
        bp.unpin(1).unwrap();
        bp.pin(2).unwrap();
        bp.unpin(2).unwrap();
        bp.pin(3).unwrap();

        assert_eq!(bp.frame_contents(), vec![3, 1, 2]);
    }

    /// S2 — LRU touches on hit.
    #[test]
    fn lru_touch_on_hit() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 3, ReplacementStrategy::Lru).unwrap();

        bp.pin(0).unwrap();
        bp.unpin(0).unwrap();
        bp.pin(1).unwrap();
        bp.unpin(1).unwrap();
        bp.pin(2).unwrap();
        bp.unpin(2).unwrap();
        bp.pin(0).unwrap(); // hit, touches 0
        bp.unpin(0).unwrap();
        bp.pin(3).unwrap();

        let contents = bp.frame_contents();
        assert!(contents.contains(&0));
        assert!(contents.contains(&2));
        assert!(contents.contains(&3));
        assert!(!contents.contains(&1));
    }

    /// S3 — Dirty write-back counting.
    #[test]
    fn dirty_write_back_counting() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 1, ReplacementStrategy::Fifo).unwrap();

        {
            let mut h = bp.pin(0).unwrap();
            h.data_mut()[0..4].copy_from_slice(b"xyzw");
        }
        bp.mark_dirty(0).unwrap();
        bp.unpin(0).unwrap();

        bp.pin(1).unwrap();

        assert_eq!(bp.num_write_io(), 1);
        assert_eq!(bp.num_read_io(), 2);

        let mut pf = PageFile::open(&name).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        pf.read(0, &mut buf).unwrap();
        assert_eq!(&buf[0..4], b"xyzw");
    }

    /// S4 — Pin of out-of-range page grows file.
    #[test]
    fn pin_out_of_range_grows_file() {
        let (_dir, name) = fixture(1);
        let mut bp = BufferPool::init(&name, 3, ReplacementStrategy::Fifo).unwrap();

        bp.pin(5).unwrap();

        assert_eq!(bp.num_read_io(), 1);
        assert_eq!(bp.num_write_io(), 0);
    }

    /// S5 — All pinned.
    #[test]
    fn all_pinned_pin_fails() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();

        bp.pin(0).unwrap();
        bp.pin(1).unwrap();

        let before = bp.frame_contents();
        assert!(matches!(
            bp.pin(2),
            Err(BufferError::ReadNonExistingPage(2))
        ));
        assert_eq!(bp.frame_contents(), before);
    }

    /// S6 — Force flush clears dirty.
    #[test]
    fn force_flush_clears_dirty() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 3, ReplacementStrategy::Fifo).unwrap();

        bp.pin(0).unwrap();
        bp.mark_dirty(0).unwrap();
        bp.unpin(0).unwrap();

        bp.force_flush().unwrap();

        assert!(bp.dirty_flags().iter().all(|&d| !d));
        assert_eq!(bp.num_write_io(), 1);

        bp.shutdown().unwrap();
    }

    #[test]
    fn unpin_nonresident_page_fails() {
        let (_dir, name) = fixture(1);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();
        assert!(matches!(
            bp.unpin(9),
            Err(BufferError::ReadNonExistingPage(9))
        ));
    }

    #[test]
    fn unpin_already_zero_fails() {
        let (_dir, name) = fixture(1);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();
        bp.pin(0).unwrap();
        bp.unpin(0).unwrap();
        assert!(matches!(
            bp.unpin(0),
            Err(BufferError::ReadNonExistingPage(0))
        ));
    }

    #[test]
    fn round_trip_after_unpin_without_mutation() {
        let (_dir, name) = fixture(2);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Lru).unwrap();

        {
            let mut h = bp.pin(0).unwrap();
            h.data_mut()[0] = 7;
        }
        bp.mark_dirty(0).unwrap();
        bp.unpin(0).unwrap();

        let h = bp.pin(0).unwrap();
        assert_eq!(h.data()[0], 7);
    }

    #[test]
    fn random_binary_data_survives_eviction_round_trip() {
        use rand::distributions::{Distribution, Uniform};

        let (_dir, name) = fixture(1);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Lru).unwrap();

        let mut rng = rand::thread_rng();
        let uniform = Uniform::from(u8::MIN..=u8::MAX);
        let mut pattern: Vec<u8> = (0..PAGE_SIZE).map(|_| uniform.sample(&mut rng)).collect();
        pattern[PAGE_SIZE / 2] = 0;
        pattern[PAGE_SIZE - 1] = 0;

        {
            let mut h = bp.pin(0).unwrap();
            h.data_mut().copy_from_slice(&pattern);
        }
        bp.mark_dirty(0).unwrap();
        bp.unpin(0).unwrap();

        // Evict page 0 by filling the pool with other pages.
        bp.pin(1).unwrap();
        bp.unpin(1).unwrap();
        bp.pin(2).unwrap();
        bp.unpin(2).unwrap();

        let h = bp.pin(0).unwrap();
        assert_eq!(h.data().as_slice(), pattern.as_slice());
    }

    #[test]
    fn reserved_strategy_rejected() {
        let (_dir, name) = fixture(1);
        assert!(matches!(
            BufferPool::init(&name, 2, ReplacementStrategy::LruK),
            Err(BufferError::NotImplemented("LruK"))
        ));
    }

    /// Shutdown durability: a dirty-and-unpinned page survives shutdown and
    /// reopen with its last written contents.
    #[test]
    fn shutdown_durability() {
        let (_dir, name) = fixture(2);
        let mut bp = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();
        {
            let mut h = bp.pin(1).unwrap();
            h.data_mut()[0..3].copy_from_slice(b"abc");
        }
        bp.mark_dirty(1).unwrap();
        bp.unpin(1).unwrap();
        bp.shutdown().unwrap();

        let mut bp2 = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();
        let h = bp2.pin(1).unwrap();
        assert_eq!(&h.data()[0..3], b"abc");
    }

    /// Two pages can be pinned and held live at the same time — the case the
    /// previous lifetime-bound `PageHandle` design could not express.
    #[test]
    fn two_pins_held_live_simultaneously() {
        let (_dir, name) = fixture(4);
        let mut bp = BufferPool::init(&name, 3, ReplacementStrategy::Fifo).unwrap();

        let mut h0 = bp.pin(0).unwrap();
        let mut h1 = bp.pin(1).unwrap();
        h0.data_mut()[0] = 1;
        h1.data_mut()[0] = 2;

        assert_eq!(h0.data()[0], 1);
        assert_eq!(h1.data()[0], 2);
        assert_eq!(h0.page_id(), 0);
        assert_eq!(h1.page_id(), 1);
    }
}
