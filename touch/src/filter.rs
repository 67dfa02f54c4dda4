//! IIR smoothing of raw touch counts.
//!
//! Counts are kept scaled by 2^SHIFT so the integer division in each step does
//! not eat the low bits of a slowly moving signal. The first sample seen on a pad
//! seeds its state directly.

/// Weight of the previous output: `out = (in + (k - 1) * out) / k`
pub const FILTER_FACTOR: u32 = 4;

const SHIFT: u32 = 4;
const SHIFT_ROUND: u32 = 1 << (SHIFT - 1);

pub struct IirFilter<const N: usize> {
    state: [Option<u32>; N],
    factor: u32,
}

impl<const N: usize> IirFilter<N> {
    /// Create a filter for N pads. A factor of 0 passes raw counts through.
    pub const fn new(factor: u32) -> Self {
        Self {
            state: [None; N],
            factor,
        }
    }

    /// Feed a new raw count for the pad at `index`. Out of range indices are ignored.
    pub fn push(&mut self, index: usize, raw: u32) {
        let scaled = raw << SHIFT;
        if let Some(slot) = self.state.get_mut(index) {
            *slot = Some(match *slot {
                Some(last) if self.factor != 0 => {
                    ((scaled as u64 + (self.factor as u64 - 1) * last as u64) / self.factor as u64) as u32
                }
                _ => scaled,
            });
        }
    }

    /// The latest filtered count, or None if the pad has not been sampled yet
    pub fn value(&self, index: usize) -> Option<u32> {
        self.state
            .get(index)
            .copied()
            .flatten()
            .map(|state| (state + SHIFT_ROUND) >> SHIFT)
    }

    pub fn reset(&mut self) {
        self.state = [None; N];
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_first_sample_seeds() {
        let mut f: IirFilter<2> = IirFilter::new(FILTER_FACTOR);
        assert!(f.value(0).is_none());

        f.push(0, 1234);
        assert_eq!(f.value(0), Some(1234));
        assert!(f.value(1).is_none(), "Untouched pad should have no value");
    }

    #[test]
    fn test_step_response() {
        let mut f: IirFilter<1> = IirFilter::new(FILTER_FACTOR);
        f.push(0, 100);
        f.push(0, 200);
        // (3200 + 3 * 1600) / 4 = 2000, rounded back down to 125
        assert_eq!(f.value(0), Some(125));

        for _ in 0..50 {
            f.push(0, 200);
        }
        assert_eq!(f.value(0), Some(200));
    }

    #[test]
    fn test_passthrough() {
        let mut f: IirFilter<1> = IirFilter::new(0);
        f.push(0, 100);
        f.push(0, 700);
        assert_eq!(f.value(0), Some(700));
    }

    #[test]
    fn test_out_of_range_and_reset() {
        let mut f: IirFilter<2> = IirFilter::new(FILTER_FACTOR);
        f.push(5, 100);
        assert!(f.value(5).is_none());

        f.push(1, 100);
        f.reset();
        assert!(f.value(1).is_none());
    }
}
