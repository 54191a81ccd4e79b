use crate::{PageSize, PhysicalAddress};
use core::fmt;
use core::marker::PhantomData;

/// Physical page base for size `S`.
///
/// ### Invariants
/// - The low `S::SHIFT` bits of the base are always zero.
///
/// ```rust
/// # use kernel_memory_addresses::*;
/// let page = PhysicalPage::<Size4K>::from_aligned(PhysicalAddress::new(0x8000_2000)).unwrap();
/// assert_eq!(page.number(), 0x8_0002);
/// assert_eq!(page.checked_next().unwrap().base().as_u64(), 0x8000_3000);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage<S: PageSize> {
    base: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> PhysicalPage<S> {
    /// The page starting at `pa`, or `None` if `pa` is not page aligned.
    #[inline]
    #[must_use]
    pub const fn from_aligned(pa: PhysicalAddress) -> Option<Self> {
        if pa.is_aligned::<S>() {
            Some(Self {
                base: pa.as_u64(),
                _phantom: PhantomData,
            })
        } else {
            None
        }
    }

    /// The page that contains `pa` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(pa: PhysicalAddress) -> Self {
        Self {
            base: pa.align_down::<S>().as_u64(),
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.base)
    }

    /// Page frame number (`base >> S::SHIFT`).
    #[inline]
    #[must_use]
    pub const fn number(self) -> u64 {
        self.base >> S::SHIFT
    }

    /// The page directly after this one, or `None` at the top of the address space.
    #[inline]
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.base.checked_add(S::SIZE) {
            Some(base) => Some(Self {
                base,
                _phantom: PhantomData,
            }),
            None => None,
        }
    }
}

impl<S: PageSize> fmt::Display for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/{}", self.base, S::as_str())
    }
}

impl<S: PageSize> fmt::Debug for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage<{}>({:#018X})", S::as_str(), self.base)
    }
}
