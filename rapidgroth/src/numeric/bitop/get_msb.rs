/// Index of the most significant set bit. Zero maps to zero, like the
/// de Bruijn lookup this replaced.
pub(crate) trait Msb {
    fn get_msb(self) -> Self;
}

impl Msb for u32 {
    #[inline]
    fn get_msb(self) -> Self {
        if self == 0 {
            return 0;
        }
        31 - self.leading_zeros()
    }
}

impl Msb for u64 {
    #[inline]
    fn get_msb(self) -> Self {
        if self == 0 {
            return 0;
        }
        63 - self.leading_zeros() as u64
    }
}

impl Msb for usize {
    #[inline]
    fn get_msb(self) -> Self {
        (self as u64).get_msb() as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_msb_u64_0_value() {
        let a: u64 = 0b00000000000000000000000000000000;
        assert_eq!(a.get_msb(), 0u64);
    }

    #[test]
    fn get_msb_u32_0_value() {
        let a: u32 = 0b00000000000000000000000000000001;
        assert_eq!(a.get_msb(), 0u32);
    }

    #[test]
    fn get_msb_uint32_31() {
        let a: u32 = 0b10000000000000000000000000000001;
        assert_eq!(a.get_msb(), 31u32);
    }

    #[test]
    fn get_msb_u64_63() {
        let a: u64 = 0b1000000000000000000000000000000100000000000000000000000000000000;
        assert_eq!(a.get_msb(), 63u64);
    }

    #[test]
    fn get_msb_size_t_7() {
        let a: usize = 0x80;
        assert_eq!(a.get_msb(), 7usize);
    }

    #[test]
    fn get_msb_matches_log2_of_powers_of_two() {
        for k in 0..48usize {
            assert_eq!((1usize << k).get_msb(), k);
        }
    }
}
