use strum::VariantArray;

/// Position of a line within the 9-line interleaved block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, VariantArray)]
pub(crate) enum CyclePosition {
    Header,
    Read1Sequence,
    Read1Quality,
    Read2Sequence,
    Read2Quality,
    Barcode,
    Unused7,
    Unused8,
    Terminator,
}

impl CyclePosition {
    pub(crate) const LEN: usize = Self::VARIANTS.len();

    pub(crate) fn first() -> Self {
        CyclePosition::Header
    }

    /// 1-based position within the block.
    pub(crate) fn index(&self) -> usize {
        *self as usize + 1
    }

    /// The terminator wraps back around to the header.
    pub(crate) fn next(&self) -> Self {
        Self::VARIANTS[self.index() % Self::LEN]
    }
}
