pub mod frame;
pub mod handle;

pub use frame::Frame;
pub use handle::PageHandle;
