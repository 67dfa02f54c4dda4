//! Touch channel identifiers and the fixed tables of pads sampled each sweep.

use core::fmt;

/// A physical touch channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PadId(pub u8);

impl PadId {
    pub const NUM0: PadId = PadId(0);
    pub const NUM1: PadId = PadId(1);
    pub const NUM2: PadId = PadId(2);
    pub const NUM3: PadId = PadId(3);
    pub const NUM4: PadId = PadId(4);
    pub const NUM5: PadId = PadId(5);
    pub const NUM6: PadId = PadId(6);
    pub const NUM7: PadId = PadId(7);
    pub const NUM8: PadId = PadId(8);
    pub const NUM9: PadId = PadId(9);
    pub const NUM10: PadId = PadId(10);
    pub const NUM11: PadId = PadId(11);
    pub const NUM12: PadId = PadId(12);
    pub const NUM13: PadId = PadId(13);
    pub const NUM14: PadId = PadId(14);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of touch channels on the classic ESP32 controller
pub const TOUCH_PAD_MAX: usize = 10;

/// Number of pads sampled on the denoise-capable controller
pub const DENOISE_PAD_COUNT: usize = 14;

/// Every pad from 0 to N - 1, in ascending order
pub const fn all_pads<const N: usize>() -> [PadId; N] {
    let mut pads = [PadId(0); N];
    let mut i = 0;
    while i < N {
        pads[i] = PadId(i as u8);
        i += 1;
    }
    pads
}

pub const CLASSIC_PADS: [PadId; TOUCH_PAD_MAX] = all_pads();

/// Channel 0 is reserved for the denoise channel, so sampling starts at 1
pub const DENOISE_PADS: [PadId; DENOISE_PAD_COUNT] = [
    PadId::NUM1,
    PadId::NUM2,
    PadId::NUM3,
    PadId::NUM4,
    PadId::NUM5,
    PadId::NUM6,
    PadId::NUM7,
    PadId::NUM8,
    PadId::NUM9,
    PadId::NUM10,
    PadId::NUM11,
    PadId::NUM12,
    PadId::NUM13,
    PadId::NUM14,
];
