//! Device kinds and their output functions.

use std::fmt;

use super::types::Signal;

/// The fixed set of device kinds a circuit can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Not,
    Switch,
    Clock,
    DType,
}

impl DeviceKind {
    /// Parse a device kind from its keyword. `D-TYPE` arrives here as the
    /// already-joined `DTYPE`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "NAND" => Some(Self::Nand),
            "OR" => Some(Self::Or),
            "NOR" => Some(Self::Nor),
            "XOR" => Some(Self::Xor),
            "NOT" => Some(Self::Not),
            "SWITCH" => Some(Self::Switch),
            "CLOCK" => Some(Self::Clock),
            "DTYPE" => Some(Self::DType),
            _ => None,
        }
    }

    /// Gates whose input count is chosen with `has N inputs`.
    pub fn has_variable_inputs(&self) -> bool {
        matches!(self, Self::And | Self::Nand | Self::Or | Self::Nor)
    }

    /// Source devices take no inputs at all.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Switch | Self::Clock)
    }

    /// Number of inputs a fixed-arity device is created with.
    pub fn fixed_input_count(&self) -> Option<usize> {
        match self {
            Self::Xor => Some(2),
            Self::Not => Some(1),
            Self::DType => Some(4),
            Self::Switch | Self::Clock => Some(0),
            _ => None,
        }
    }

    /// Output of a combinational device for the given input levels.
    /// Returns `None` for stateful and source devices.
    pub fn evaluate<I>(&self, inputs: I) -> Option<Signal>
    where
        I: IntoIterator<Item = Signal>,
    {
        let mut inputs = inputs.into_iter();
        let out = match self {
            Self::And => inputs.all(|s| s.is_high()),
            Self::Nand => !inputs.all(|s| s.is_high()),
            Self::Or => inputs.any(|s| s.is_high()),
            Self::Nor => !inputs.any(|s| s.is_high()),
            Self::Xor => inputs.filter(|s| s.is_high()).count() % 2 == 1,
            Self::Not => !inputs.next().unwrap_or_default().is_high(),
            Self::Switch | Self::Clock | Self::DType => return None,
        };
        Some(Signal::from(out))
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::And => "AND",
            Self::Nand => "NAND",
            Self::Or => "OR",
            Self::Nor => "NOR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Switch => "SWITCH",
            Self::Clock => "CLOCK",
            Self::DType => "DTYPE",
        };
        f.write_str(keyword)
    }
}
