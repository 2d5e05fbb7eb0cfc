use spin::Mutex;

use crate::memory::boot_frame_allocator::BootIntoFrameAllocator;

/// Frame allocator backing page table growth. `None` until `memory::init`.
pub static FRAME_ALLOCATOR: Mutex<Option<BootIntoFrameAllocator>> = Mutex::new(None);
