//! Boot Frame Allocator
//!
//! - Provides frames for page tables before any other allocator exists
//! - Hands out frames from regions Limine reports as usable, in order

use limine::{memory_map::EntryType, request::MemoryMapRequest, response::MemoryMapResponse};
use x86_64::{
    structures::paging::{FrameAllocator, PhysFrame, Size4KiB},
    PhysAddr,
};

const FRAME_SIZE: u64 = 4096;

#[used]
#[link_section = ".requests"]
static MEMORY_MAP_REQUEST: MemoryMapRequest = MemoryMapRequest::new();

/// Boot frame allocator, never frees
///
/// * `memory_map`: Limine memory map response
/// * `next`: index of the next usable frame to hand out
pub struct BootIntoFrameAllocator {
    memory_map: &'static MemoryMapResponse,
    next: usize,
}

impl BootIntoFrameAllocator {
    /// # Safety
    /// Frames listed as usable must not be in use elsewhere. Only one allocator
    /// may be created from the memory map.
    pub unsafe fn init() -> Self {
        let memory_map: &MemoryMapResponse = MEMORY_MAP_REQUEST
            .get_response()
            .expect("Memory map request failed");

        BootIntoFrameAllocator {
            memory_map,
            next: 0,
        }
    }

    /// Usable frames in memory map order. The kernel image and bootloader data are
    /// reported under other entry types and never appear here.
    fn usable_frames(&self) -> impl Iterator<Item = PhysFrame> + '_ {
        self.memory_map
            .entries()
            .iter()
            .filter(|r| r.entry_type == EntryType::USABLE)
            .flat_map(|r| (r.base..(r.base + r.length)).step_by(FRAME_SIZE as usize))
            .map(|addr| PhysFrame::containing_address(PhysAddr::new(addr)))
    }
}

unsafe impl FrameAllocator<Size4KiB> for BootIntoFrameAllocator {
    fn allocate_frame(&mut self) -> Option<PhysFrame> {
        let frame = self.usable_frames().nth(self.next)?;
        self.next += 1;
        Some(frame)
    }
}
