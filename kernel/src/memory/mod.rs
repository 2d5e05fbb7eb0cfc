pub mod boot_frame_allocator;
pub mod frame_allocator;
pub mod mmio;
pub mod paging;

use boot_frame_allocator::BootIntoFrameAllocator;
use frame_allocator::FRAME_ALLOCATOR;
use lazy_static::lazy_static;
use limine::request::HhdmRequest;
use spin::Mutex;
use x86_64::{structures::paging::OffsetPageTable, VirtAddr};

#[used]
#[link_section = ".requests"]
pub static HHDM_REQUEST: HhdmRequest = HhdmRequest::new();

lazy_static! {
    pub static ref MAPPER: Mutex<OffsetPageTable<'static>> = Mutex::new(unsafe { paging::init() });
    pub static ref HHDM_OFFSET: VirtAddr = VirtAddr::new(
        HHDM_REQUEST
            .get_response()
            .expect("HHDM request failed")
            .offset()
    );
}

/// Installs the boot frame allocator so page tables can grow.
pub fn init() {
    unsafe {
        *FRAME_ALLOCATOR.lock() = Some(BootIntoFrameAllocator::init());
    }
}
