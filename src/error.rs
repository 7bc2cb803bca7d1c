/*!

  Errors raised while editing, evaluating or checking a circuit.

*/

use crate::circuit::{GateId, GateKind, Identifier};
use thiserror::Error;

/// Result type alias for circuit operations
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Everything that can go wrong with a circuit. None of these are fatal:
/// structural errors leave the netlist untouched, and evaluation errors
/// abort the pass without committing any values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum CircuitError {
    /// A gate was evaluated with the wrong number of input values
    #[error("{kind} gate expects {expected} inputs, got {got}")]
    InvalidArity {
        /// The gate kind being evaluated
        kind: GateKind,
        /// Number of input ports for this kind
        expected: usize,
        /// Number of values supplied
        got: usize,
    },

    /// The input port already has a driver
    #[error("port {port} of gate {gate} is already driven")]
    PortOccupied {
        /// The target gate
        gate: GateId,
        /// The occupied port
        port: usize,
    },

    /// The port index is out of range for the gate kind
    #[error("gate {gate} has no input port {port}")]
    InvalidPort {
        /// The target gate
        gate: GateId,
        /// The requested port
        port: usize,
    },

    /// No gate with this id exists
    #[error("unknown gate {0}")]
    UnknownGate(GateId),

    /// Two gates share the same id in a snapshot
    #[error("gate id {0} appears more than once")]
    DuplicateGate(GateId),

    /// A snapshot carries an id above [GateId::MAX_INDEX]
    #[error("gate id {0} is out of range")]
    InvalidId(GateId),

    /// The name is empty or contains whitespace, so it can't be printed as a Verilog identifier
    #[error("'{0}' is not a valid gate name")]
    InvalidName(Identifier),

    /// Two gates share the same name
    #[error("a gate named '{0}' already exists")]
    DuplicateName(Identifier),

    /// Wiring `driver` into `target` would close a loop
    #[error("connecting {driver} to {target} would create a cycle")]
    WouldCreateCycle {
        /// The driving gate
        driver: GateId,
        /// The driven gate
        target: GateId,
    },

    /// The gate is not a switch and can't be toggled
    #[error("gate {0} is not a switch")]
    NotASwitch(GateId),

    /// Evaluation found a combinational loop
    #[error("circuit contains a cycle through gate {0}")]
    CyclicCircuit(GateId),

    /// More than one output is reachable from the puzzle inputs
    #[error("expected exactly one output, found {}", .0.len())]
    AmbiguousOutput(Vec<GateId>),

    /// No output is reachable from the puzzle inputs
    #[error("no output gate is connected to the puzzle inputs")]
    NoOutput,

    /// A puzzle input does not name any gate in the circuit
    #[error("no switch named '{0}'")]
    UnknownInput(Identifier),

    /// No built-in puzzle has this id
    #[error("no puzzle named '{0}'")]
    UnknownPuzzle(String),

    /// A target function has too many inputs to enumerate
    #[error("{0} inputs is more than the supported {max}", max = crate::puzzle::MAX_INPUTS)]
    TooManyInputs(usize),

    /// An expression mentions a variable that is not a puzzle input
    #[error("expression uses '{0}', which is not one of the inputs")]
    UnknownVariable(Identifier),

    /// An expression failed to parse
    #[error("parse error at {position}: {message}")]
    Parse {
        /// Byte offset into the source text
        position: usize,
        /// What was expected
        message: String,
    },
}
