/// Size in bytes of a single page. All storage and buffer I/O is page-aligned
/// and page-sized.
pub const PAGE_SIZE: usize = 4096;

/// Identifies a page within a page file. Non-negative when resident/valid.
pub type PageId = i32;

/// Sentinel `PageId` denoting "no page" / an empty frame.
pub const NO_PAGE: PageId = -1;

/// Identifies a frame (buffer pool slot) by index.
pub type FrameId = usize;
