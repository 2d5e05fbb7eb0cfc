use x86_64::{
    structures::paging::{
        mapper::{MapToError, TranslateResult},
        FrameAllocator, Mapper, Page, PageTableFlags, PhysFrame, Size4KiB, Translate,
    },
    PhysAddr, VirtAddr,
};

use crate::apic::ApicError;

/// Establishes single-page virtual to physical translations.
pub trait PageMap {
    fn map(
        &mut self,
        phys: PhysAddr,
        virt: VirtAddr,
        flags: PageTableFlags,
    ) -> Result<(), ApicError>;
}

/// [`PageMap`] over the kernel page tables.
pub struct KernelMapper<'a, M, A> {
    mapper: &'a mut M,
    allocator: &'a mut A,
}

impl<'a, M, A> KernelMapper<'a, M, A>
where
    M: Mapper<Size4KiB> + Translate,
    A: FrameAllocator<Size4KiB>,
{
    pub fn new(mapper: &'a mut M, allocator: &'a mut A) -> Self {
        KernelMapper { mapper, allocator }
    }
}

impl<M, A> PageMap for KernelMapper<'_, M, A>
where
    M: Mapper<Size4KiB> + Translate,
    A: FrameAllocator<Size4KiB>,
{
    /// Maps `virt` to `phys`. If the page is already mapped to the same frame, for
    /// instance by the bootloader, only its flags are replaced.
    fn map(
        &mut self,
        phys: PhysAddr,
        virt: VirtAddr,
        flags: PageTableFlags,
    ) -> Result<(), ApicError> {
        let page: Page<Size4KiB> = Page::containing_address(virt);
        let frame: PhysFrame<Size4KiB> = PhysFrame::containing_address(phys);

        let result = unsafe { self.mapper.map_to(page, frame, flags, &mut *self.allocator) };
        match result {
            Ok(flush) => {
                flush.flush();
                Ok(())
            }
            Err(MapToError::PageAlreadyMapped(existing)) if existing == frame => {
                unsafe {
                    self.mapper
                        .update_flags(page, flags)
                        .map_err(|_| ApicError::MapFailed)?
                        .flush();
                }
                Ok(())
            }
            Err(MapToError::ParentEntryHugePage) => self.remap_huge(page, frame, flags),
            Err(_) => Err(ApicError::MapFailed),
        }
    }
}

impl<M, A> KernelMapper<'_, M, A>
where
    M: Mapper<Size4KiB> + Translate,
    A: FrameAllocator<Size4KiB>,
{
    /// The page sits inside a huge mapping. Accept it only if that mapping already
    /// points at the right frame; splitting huge pages is not supported here.
    fn remap_huge(
        &mut self,
        page: Page<Size4KiB>,
        frame: PhysFrame<Size4KiB>,
        flags: PageTableFlags,
    ) -> Result<(), ApicError> {
        match self.mapper.translate(page.start_address()) {
            TranslateResult::Mapped {
                frame: mapped,
                offset,
                flags: existing,
            } if mapped.start_address() + offset == frame.start_address()
                && existing.contains(flags - PageTableFlags::PRESENT) =>
            {
                Ok(())
            }
            _ => Err(ApicError::MapFailed),
        }
    }
}
