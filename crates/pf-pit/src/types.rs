//! Type tags stored in the pits.

/// Hydraulic node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Not specified yet (internal placeholder).
    None,
    /// Pressure slack.
    P,
    /// Load node, pressure is solved for.
    L,
    /// Pressure held by a pressure control branch.
    Pc,
}

/// Thermal node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeT {
    /// Temperature slack.
    T,
    /// Temperature is solved for.
    L,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Normal,
    /// Pressure control.
    Pc,
    /// Circulation pump connecting return and flow junction.
    Circ,
}

/// Solve mode of a connectivity view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Hydraulics,
    HeatTransfer,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Hydraulics => "hydraulics",
            Mode::HeatTransfer => "heat_transfer",
        }
    }
}

macro_rules! code_conversions {
    ($ty:ty { $($variant:ident => $code:expr),+ $(,)? }) => {
        impl $ty {
            /// Numeric code stored in the pit.
            pub fn code(self) -> f64 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Decode a pit value; unknown codes (and NaN) yield `None`.
            pub fn from_code(v: f64) -> Option<Self> {
                $(if v == $code {
                    return Some(Self::$variant);
                })+
                None
            }
        }
    };
}

code_conversions!(NodeType { None => 0.0, P => 1.0, L => 2.0, Pc => 3.0 });
code_conversions!(NodeTypeT { T => 1.0, L => 2.0 });
code_conversions!(BranchType { Normal => 0.0, Pc => 1.0, Circ => 2.0 });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for t in [NodeType::None, NodeType::P, NodeType::L, NodeType::Pc] {
            assert_eq!(NodeType::from_code(t.code()), Some(t));
        }
        assert_eq!(BranchType::from_code(2.0), Some(BranchType::Circ));
        assert_eq!(NodeTypeT::from_code(f64::NAN), None);
    }
}
