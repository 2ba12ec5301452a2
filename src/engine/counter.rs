/// Big-endian counter that grows by one byte instead of wrapping.
///
/// After `ff ff` comes `01 00 00`: the widened field continues numerically, so
/// no value of the previous width is produced twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideCounter {
    bytes: Vec<u8>,
}

impl WideCounter {
    /// Start at zero with `width` bytes.
    pub fn new(width: usize) -> Self {
        Self {
            bytes: vec![0u8; width.max(1)],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> usize {
        self.bytes.len()
    }

    /// Advance by one. Returns `true` when the field had to widen.
    pub fn increment(&mut self) -> bool {
        for byte in self.bytes.iter_mut().rev() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                return false;
            }
        }
        self.bytes.insert(0, 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn increments_big_endian() {
        let mut counter = WideCounter::new(2);
        assert_eq!(counter.as_bytes(), &[0, 0]);
        assert!(!counter.increment());
        assert_eq!(counter.as_bytes(), &[0, 1]);
        for _ in 0..255 {
            counter.increment();
        }
        assert_eq!(counter.as_bytes(), &[1, 0]);
    }

    #[test]
    fn widens_on_overflow() {
        let mut counter = WideCounter::new(2);
        for _ in 0..0xffff {
            assert!(!counter.increment());
        }
        assert_eq!(counter.as_bytes(), &[0xff, 0xff]);
        assert!(counter.increment());
        assert_eq!(counter.as_bytes(), &[0x01, 0x00, 0x00]);
        assert_eq!(counter.width(), 3);
    }

    #[test]
    fn never_repeats_across_widening() {
        let mut counter = WideCounter::new(1);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(counter.as_bytes().to_vec()));
            counter.increment();
        }
        assert_eq!(counter.width(), 2);
    }

    #[test]
    fn zero_width_is_bumped_to_one() {
        assert_eq!(WideCounter::new(0).width(), 1);
    }
}
