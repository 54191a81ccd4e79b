use crate::{PageSize, PhysicalPage, align_down, align_up};
use core::fmt;

/// Physical memory address.
///
/// Carries physical-address intent so it cannot be confused with a pointer in
/// the current address space; turning it into something dereferenceable is the
/// job of a physical mapper.
///
/// ```rust
/// # use kernel_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x8000_3000);
/// assert!(pa.is_aligned::<Size4K>());
/// assert_eq!(pa.page::<Size4K>().base(), pa);
/// assert_eq!(pa.checked_add(0x10).unwrap().align_down::<Size4K>(), pa);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether the address is a multiple of `S::SIZE`.
    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.0 & (S::SIZE - 1) == 0
    }

    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(align_down(self.0, S::SIZE))
    }

    /// Round up to the next `S` boundary; `None` if that would wrap.
    #[inline]
    #[must_use]
    pub const fn align_up<S: PageSize>(self) -> Option<Self> {
        match align_up(self.0, S::SIZE) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The page of size `S` containing this address.
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> PhysicalPage<S> {
        PhysicalPage::containing(self)
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size4K;

    #[test]
    fn align_up_saturates_to_none() {
        let top = PhysicalAddress::new(u64::MAX - 10);
        assert_eq!(top.align_up::<Size4K>(), None);
        assert_eq!(top.checked_add(11), None);
        assert_eq!(top.checked_add(10), Some(PhysicalAddress::new(u64::MAX)));
    }

    #[test]
    fn formatting_is_fixed_width_hex() {
        let pa = PhysicalAddress::new(0x8000_1000);
        assert_eq!(format!("{pa}"), "0x0000000080001000");
        assert_eq!(format!("{pa:?}"), "PA(0x0000000080001000)");
    }
}
