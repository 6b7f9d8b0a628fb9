//! Value kinds carried on node results.

use std::fmt;

/// The kind of value produced at one result port of a [`Node`](crate::Node).
///
/// Integer and float kinds carry their bit width. `Chain` and `Glue` are tokens:
/// they carry no data and only order or bind nodes together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// An integer of the given width (1, 8, 16, 32 or 64 bits).
    Int(u16),
    /// An IEEE float of the given width (32 or 64 bits).
    Float(u16),
    /// The control-chain token that serializes side-effecting nodes.
    Chain,
    /// Binds a producer to the single node that must immediately consume it
    /// (register copies feeding a return marker, carries between add halves).
    Glue,
}

impl ValueKind {
    pub const I1: ValueKind = ValueKind::Int(1);
    pub const I8: ValueKind = ValueKind::Int(8);
    pub const I16: ValueKind = ValueKind::Int(16);
    pub const I32: ValueKind = ValueKind::Int(32);
    pub const I64: ValueKind = ValueKind::Int(64);
    pub const F32: ValueKind = ValueKind::Float(32);
    pub const F64: ValueKind = ValueKind::Float(64);

    /// Width in bits for data kinds, `None` for tokens.
    pub fn bits(self) -> Option<u16> {
        match self {
            ValueKind::Int(bits) | ValueKind::Float(bits) => Some(bits),
            ValueKind::Chain | ValueKind::Glue => None,
        }
    }

    /// Size in bytes when the value is stored in memory (`Int(1)` occupies a byte).
    pub fn store_size(self) -> Option<u32> {
        self.bits().map(|bits| u32::from(bits).div_ceil(8))
    }

    /// True for `Chain` and `Glue`.
    pub fn is_token(self) -> bool {
        matches!(self, ValueKind::Chain | ValueKind::Glue)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int(bits) => write!(f, "i{}", bits),
            ValueKind::Float(bits) => write!(f, "f{}", bits),
            ValueKind::Chain => write!(f, "ch"),
            ValueKind::Glue => write!(f, "glue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_sizes() {
        assert_eq!(ValueKind::I1.store_size(), Some(1));
        assert_eq!(ValueKind::I16.store_size(), Some(2));
        assert_eq!(ValueKind::I64.store_size(), Some(8));
        assert_eq!(ValueKind::Chain.store_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueKind::I32.to_string(), "i32");
        assert_eq!(ValueKind::F64.to_string(), "f64");
        assert_eq!(ValueKind::Glue.to_string(), "glue");
    }
}
