use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize)]
pub struct PageSize(pub u16);

impl PageSize {
    pub const DEFAULT: PageSize = PageSize(50);
    pub const MAX: PageSize = PageSize(100);

    /// Clamps into `1..=MAX`.
    pub fn clamped(self) -> PageSize {
        PageSize(self.0.clamp(1, Self::MAX.0))
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_bounds() {
        assert_eq!(PageSize(0).clamped(), PageSize(1));
        assert_eq!(PageSize(20).clamped(), PageSize(20));
        assert_eq!(PageSize(5000).clamped(), PageSize::MAX);
    }
}
