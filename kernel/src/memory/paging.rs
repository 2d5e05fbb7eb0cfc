use x86_64::{
    structures::paging::{OffsetPageTable, PageTable},
    VirtAddr,
};

use crate::memory::HHDM_OFFSET;

/// Wraps the active level 4 table, reached through the higher-half direct map.
///
/// # Safety
///
/// Must only be called once; the returned table aliases the live page tables.
pub unsafe fn init() -> OffsetPageTable<'static> {
    OffsetPageTable::new(active_level_4_table(*HHDM_OFFSET), *HHDM_OFFSET)
}

/// Returns the level 4 table CR3 points at.
///
/// # Safety
///
/// `physical_memory_offset` must map all physical memory.
pub unsafe fn active_level_4_table(physical_memory_offset: VirtAddr) -> &'static mut PageTable {
    use x86_64::registers::control::Cr3;

    let (level_4_table_frame, _) = Cr3::read();

    let phys = level_4_table_frame.start_address();
    let virt = physical_memory_offset + phys.as_u64();
    let page_table_ptr: *mut PageTable = virt.as_mut_ptr();

    &mut *page_table_ptr
}
