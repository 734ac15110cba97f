use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use log::debug;

use crate::common::config::{PageId, NO_PAGE, PAGE_SIZE};
use crate::common::error::BufferError;

/// `PageFile` exposes one backing file as a sequence of fixed-size pages. It
/// performs the reading and writing of whole pages to and from disk, giving
/// the buffer pool a logical page layer below it.
///
/// Invariant: the file's byte length is always an exact multiple of
/// `PAGE_SIZE`; `total_pages` equals that multiple at rest.
#[derive(Debug)]
pub struct PageFile {
    file_name: String,
    handle: File,
    total_pages: u64,
    cur_page_pos: PageId,
}

impl PageFile {
    /// Creates or truncates `name` to exactly one zero-filled page.
    pub fn create(name: &str) -> Result<PageFile, BufferError> {
        let mut handle = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(name)?;
        handle.write_all(&[0u8; PAGE_SIZE])?;
        handle.flush()?;
        Ok(PageFile {
            file_name: name.to_string(),
            handle,
            total_pages: 1,
            cur_page_pos: NO_PAGE,
        })
    }

    /// Opens an existing page file. Fails with `FileNotFound` if `name` does
    /// not exist. The file's length must already be a multiple of
    /// `PAGE_SIZE`.
    pub fn open(name: &str) -> Result<PageFile, BufferError> {
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    BufferError::FileNotFound(format!("{}: {}", name, e))
                }
                _ => BufferError::WriteFailed(e.to_string()),
            })?;
        let len = handle.metadata()?.len();
        let total_pages = len / PAGE_SIZE as u64;
        debug!("opened page file {} with {} pages", name, total_pages);
        Ok(PageFile {
            file_name: name.to_string(),
            handle,
            total_pages,
            cur_page_pos: NO_PAGE,
        })
    }

    /// Removes this page file from disk. Consumes `self`, so the handle is
    /// closed before the unlink is attempted — some platforms forbid
    /// removing a file that is still open.
    pub fn destroy(self) -> Result<(), BufferError> {
        let name = self.file_name.clone();
        drop(self.handle);
        fs::remove_file(&name).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BufferError::FileNotFound(name),
            _ => BufferError::WriteFailed(e.to_string()),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Returns the cursor used by the `read_{first,prev,cur,next,last}`
    /// sequential helpers. `NO_PAGE` before any such call has been made.
    pub fn block_pos(&self) -> PageId {
        self.cur_page_pos
    }

    fn offset_of(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_SIZE as u64
    }

    /// Copies page `page_id` into `buf`. Requires `0 <= page_id < total_pages`.
    pub fn read(&mut self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if page_id < 0 || page_id as u64 >= self.total_pages {
            return Err(BufferError::ReadNonExistingPage(page_id));
        }
        self.handle.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        let read = self.handle.read(buf)?;
        if read < PAGE_SIZE {
            return Err(BufferError::WriteFailed(format!(
                "short read of page {}: got {} of {} bytes",
                page_id, read, PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Writes `buf` into page `page_id`, growing the file first if
    /// `page_id >= total_pages`. Flushes to the OS before returning.
    pub fn write(&mut self, page_id: PageId, buf: &[u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if page_id < 0 {
            return Err(BufferError::WriteFailed(format!(
                "negative page id {}",
                page_id
            )));
        }
        if page_id as u64 >= self.total_pages {
            self.ensure_capacity(page_id as u64 + 1)?;
        }
        self.handle.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        self.handle.write_all(buf)?;
        self.handle.flush()?;
        Ok(())
    }

    /// Appends one zero-filled page. `total_pages += 1`; cursor becomes the
    /// new last page.
    pub fn append_empty(&mut self) -> Result<PageId, BufferError> {
        let new_id = self.total_pages as PageId;
        self.handle.seek(SeekFrom::End(0))?;
        self.handle.write_all(&[0u8; PAGE_SIZE])?;
        self.handle.flush()?;
        self.total_pages += 1;
        self.cur_page_pos = new_id;
        Ok(new_id)
    }

    /// Appends zero pages until `total_pages >= n`.
    pub fn ensure_capacity(&mut self, n: u64) -> Result<(), BufferError> {
        while self.total_pages < n {
            self.append_empty()?;
        }
        Ok(())
    }

    pub fn read_first(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if self.total_pages == 0 {
            return Err(BufferError::ReadNonExistingPage(NO_PAGE));
        }
        self.cur_page_pos = 0;
        self.read(0, buf)
    }

    pub fn read_last(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if self.total_pages == 0 {
            return Err(BufferError::ReadNonExistingPage(NO_PAGE));
        }
        let last = self.total_pages as PageId - 1;
        self.cur_page_pos = last;
        self.read(last, buf)
    }

    pub fn read_cur(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if self.cur_page_pos == NO_PAGE {
            return Err(BufferError::ReadNonExistingPage(NO_PAGE));
        }
        let cur = self.cur_page_pos;
        self.read(cur, buf)
    }

    pub fn read_next(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        let next = self.cur_page_pos + 1;
        if self.cur_page_pos == NO_PAGE || next as u64 >= self.total_pages {
            return Err(BufferError::ReadNonExistingPage(next));
        }
        self.cur_page_pos = next;
        self.read(next, buf)
    }

    pub fn read_prev(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<(), BufferError> {
        if self.cur_page_pos <= 0 {
            return Err(BufferError::ReadNonExistingPage(self.cur_page_pos - 1));
        }
        let prev = self.cur_page_pos - 1;
        self.cur_page_pos = prev;
        self.read(prev, buf)
    }
}
