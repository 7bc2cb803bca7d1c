/*!

  Gates, the identifiers that name them, and their boolean semantics.

*/

use crate::attribute::{Attribute, AttributeKey, AttributeValue};
use crate::error::{CircuitError, Result};
use std::collections::BTreeMap;

/// The stable handle of a gate within a [Netlist](crate::netlist::Netlist).
/// Ids are handed out in increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(transparent)
)]
pub struct GateId(usize);

impl GateId {
    /// The largest index a loaded circuit may use, leaving room for every
    /// gate placed afterwards
    pub const MAX_INDEX: usize = u32::MAX as usize;

    /// Wraps a raw index as a gate id
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The name of a gate, such as `door1` or `and_3`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(transparent)
)]
pub struct Identifier {
    name: String,
}

impl Identifier {
    /// Creates a new identifier with the given name
    pub fn new(name: String) -> Self {
        Self { name }
    }

    /// Returns the name of the identifier
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the name can't be used as a plain Verilog identifier
    pub fn is_escaped(&self) -> bool {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            }
            _ => true,
        }
    }

    /// Returns `true` if the name can be printed in Verilog at all: non-empty
    /// printable ASCII with no whitespace, since an escaped identifier ends at
    /// the first space.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_graphic())
    }

    /// Emit the name as suitable for Verilog, escaping it when needed
    pub fn emit_name(&self) -> String {
        if self.is_escaped() {
            format!("\\{} ", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// The closed set of gate kinds that can be placed in the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum GateKind {
    /// True iff both inputs are true
    And,
    /// True iff either input is true
    Or,
    /// Negation of the single input
    Not,
    /// True iff the inputs differ
    Xor,
    /// Negated AND
    Nand,
    /// Negated OR
    Nor,
    /// A user-toggled source with no inputs
    Switch,
    /// A pass-through sink marking an observable result
    Output,
}

impl GateKind {
    /// Every gate kind, in declaration order
    pub const ALL: [GateKind; 8] = [
        GateKind::And,
        GateKind::Or,
        GateKind::Not,
        GateKind::Xor,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Switch,
        GateKind::Output,
    ];

    /// Returns the number of input ports for this kind
    pub const fn arity(self) -> usize {
        match self {
            GateKind::And | GateKind::Or | GateKind::Xor | GateKind::Nand | GateKind::Nor => 2,
            GateKind::Not | GateKind::Output => 1,
            GateKind::Switch => 0,
        }
    }

    /// Returns `true` for kinds that compute a boolean function of their inputs
    pub const fn is_logic(self) -> bool {
        !matches!(self, GateKind::Switch | GateKind::Output)
    }

    /// Returns the Verilog gate primitive for logic kinds
    pub const fn primitive(self) -> Option<&'static str> {
        match self {
            GateKind::And => Some("and"),
            GateKind::Or => Some("or"),
            GateKind::Not => Some("not"),
            GateKind::Xor => Some("xor"),
            GateKind::Nand => Some("nand"),
            GateKind::Nor => Some("nor"),
            GateKind::Switch | GateKind::Output => None,
        }
    }

    /// Returns the lower-case prefix used for generated gate names
    pub(crate) const fn prefix(self) -> &'static str {
        match self {
            GateKind::And => "and",
            GateKind::Or => "or",
            GateKind::Not => "not",
            GateKind::Xor => "xor",
            GateKind::Nand => "nand",
            GateKind::Nor => "nor",
            GateKind::Switch => "sw",
            GateKind::Output => "out",
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
            GateKind::Xor => "XOR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Switch => "SWITCH",
            GateKind::Output => "OUTPUT",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for GateKind {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self> {
        GateKind::ALL
            .into_iter()
            .find(|k| k.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CircuitError::Parse {
                position: 0,
                message: format!("'{s}' is not a gate kind"),
            })
    }
}

/// A gate placed in a circuit.
///
/// The gate owns its input slots: each slot names at most one driving gate,
/// which is how fan-in is kept at one per port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    id: GateId,
    kind: GateKind,
    name: Identifier,
    /// Driver of each input port, order matters
    inputs: Vec<Option<GateId>>,
    /// Toggle state for switches, last evaluated output otherwise
    value: bool,
    attributes: BTreeMap<AttributeKey, AttributeValue>,
}

impl Gate {
    /// Creates an unconnected gate
    pub(crate) fn new(id: GateId, kind: GateKind, name: Identifier) -> Self {
        Self {
            id,
            kind,
            name,
            inputs: vec![None; kind.arity()],
            value: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Returns the id of the gate
    pub fn id(&self) -> GateId {
        self.id
    }

    /// Returns the kind of the gate
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Returns the name of the gate
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Returns the current output value
    pub fn value(&self) -> bool {
        self.value
    }

    /// Returns the driver of every input port
    pub fn inputs(&self) -> &[Option<GateId>] {
        &self.inputs
    }

    /// Returns the gate driving port `port`, if any
    pub fn driver(&self, port: usize) -> Option<GateId> {
        self.inputs.get(port).copied().flatten()
    }

    /// Returns an iterator over the connected drivers
    pub fn drivers(&self) -> impl Iterator<Item = GateId> + '_ {
        self.inputs.iter().flatten().copied()
    }

    /// Returns `true` if every input port has a driver
    pub fn is_fully_connected(&self) -> bool {
        self.inputs.iter().all(Option::is_some)
    }

    /// Returns `true` if this gate is a switch
    pub fn is_switch(&self) -> bool {
        self.kind == GateKind::Switch
    }

    /// Returns `true` if this gate is an output
    pub fn is_output(&self) -> bool {
        self.kind == GateKind::Output
    }

    /// Computes the output of this gate from the values on its input ports.
    /// Switches ignore the (empty) input slice and return their stored state.
    pub fn evaluate(&self, inputs: &[bool]) -> Result<bool> {
        let expected = self.kind.arity();
        if inputs.len() != expected {
            return Err(CircuitError::InvalidArity {
                kind: self.kind,
                expected,
                got: inputs.len(),
            });
        }
        let out = match self.kind {
            GateKind::And => inputs.iter().all(|b| *b),
            GateKind::Or => inputs.iter().any(|b| *b),
            GateKind::Not => !inputs[0],
            GateKind::Xor => inputs[0] != inputs[1],
            GateKind::Nand => !inputs.iter().all(|b| *b),
            GateKind::Nor => !inputs.iter().any(|b| *b),
            GateKind::Switch => self.value,
            GateKind::Output => inputs[0],
        };
        Ok(out)
    }

    /// Returns the value of attribute `k`, if it is set
    pub fn get_attribute(&self, k: &str) -> Option<&AttributeValue> {
        self.attributes.get(k)
    }

    /// Returns an iterator to the attributes of this gate
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        Attribute::from_pairs(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    pub(crate) fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    pub(crate) fn set_name(&mut self, name: Identifier) {
        self.name = name;
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut [Option<GateId>] {
        &mut self.inputs
    }

    pub(crate) fn insert_attribute(
        &mut self,
        k: AttributeKey,
        v: AttributeValue,
    ) -> Option<AttributeValue> {
        self.attributes.insert(k, v)
    }

    pub(crate) fn clear_attribute(&mut self, k: &str) -> Option<AttributeValue> {
        self.attributes.remove(k)
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.name, self.id)
    }
}
