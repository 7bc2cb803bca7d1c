/*!

  Editor actions as plain values, and the workbench that applies them.

  Every action a player takes in the sandbox arrives as a [Command]. The
  [Workbench] owns the netlist, applies each command, and re-evaluates the
  whole circuit after every successful edit.

*/

use crate::attribute::{AttributeKey, AttributeValue};
use crate::circuit::{Gate, GateId, GateKind, Identifier};
use crate::error::{CircuitError, Result};
use crate::eval::Evaluation;
use crate::graph::CombDepth;
use crate::netlist::{Connection, Netlist};
use crate::puzzle::{self, PuzzleSpec, VerificationResult};
use crate::snapshot::{Report, Snapshot};
use std::collections::BTreeMap;

/// One edit to a circuit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(tag = "op", rename_all = "snake_case")
)]
pub enum Command {
    /// Place a gate, optionally with a chosen name
    AddGate {
        /// The kind of gate
        kind: GateKind,
        /// A name to use instead of a generated one
        #[cfg_attr(feature = "serde", serde(default))]
        name: Option<Identifier>,
    },
    /// Delete a gate and its wires
    RemoveGate {
        /// The gate to delete
        id: GateId,
    },
    /// Draw a wire
    Connect {
        /// The driving gate
        source: GateId,
        /// The driven gate
        target: GateId,
        /// The input port on the driven gate
        port: usize,
    },
    /// Remove the wire into a port
    Disconnect {
        /// The driven gate
        target: GateId,
        /// The input port on the driven gate
        port: usize,
    },
    /// Flip a switch
    ToggleSwitch {
        /// The switch
        id: GateId,
    },
    /// Attach presentation metadata to a gate
    SetAttribute {
        /// The gate
        id: GateId,
        /// Attribute key
        key: AttributeKey,
        /// Attribute value
        #[cfg_attr(feature = "serde", serde(default))]
        value: AttributeValue,
    },
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A gate was placed
    Added(GateId),
    /// A gate was deleted
    Removed(Gate),
    /// A wire was drawn
    Connected(Connection),
    /// A port was freed, and this was its driver
    Disconnected(Option<GateId>),
    /// A switch now has this state
    Toggled(bool),
    /// An attribute was set, replacing this value
    AttributeSet(Option<AttributeValue>),
}

impl Command {
    /// Applies the command to a netlist. A failed command leaves the netlist unchanged.
    pub fn apply(self, netlist: &mut Netlist) -> Result<Applied> {
        match self {
            Command::AddGate { kind, name: None } => Ok(Applied::Added(netlist.add_gate(kind))),
            Command::AddGate {
                kind,
                name: Some(name),
            } => netlist.add_named_gate(kind, name).map(Applied::Added),
            Command::RemoveGate { id } => netlist.remove_gate(id).map(Applied::Removed),
            Command::Connect {
                source,
                target,
                port,
            } => netlist.connect(source, target, port).map(Applied::Connected),
            Command::Disconnect { target, port } => {
                netlist.disconnect(target, port).map(Applied::Disconnected)
            }
            Command::ToggleSwitch { id } => netlist.toggle_switch(id).map(Applied::Toggled),
            Command::SetAttribute { id, key, value } => netlist
                .set_attribute(id, key, value)
                .map(Applied::AttributeSet),
        }
    }
}

/// An owned circuit under edit, kept evaluated after every change
#[derive(Debug, Clone)]
pub struct Workbench {
    netlist: Netlist,
    puzzle: Option<PuzzleSpec>,
    evaluation: Result<Evaluation>,
}

impl Workbench {
    /// Takes ownership of a netlist and evaluates it
    pub fn new(mut netlist: Netlist) -> Self {
        let evaluation = netlist.evaluate();
        Self {
            netlist,
            puzzle: None,
            evaluation,
        }
    }

    /// Loads a workbench from a snapshot sent by the editor
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        Ok(Self::new(Netlist::from_snapshot(snapshot)?))
    }

    /// Attaches the puzzle the circuit is checked against
    pub fn with_puzzle(mut self, puzzle: PuzzleSpec) -> Self {
        self.puzzle = Some(puzzle);
        self
    }

    /// Attaches a built-in puzzle by id
    pub fn with_catalog_puzzle(self, id: &str) -> Result<Self> {
        let spec = puzzle::find(id).ok_or_else(|| CircuitError::UnknownPuzzle(id.to_string()))??;
        Ok(self.with_puzzle(spec))
    }

    /// Returns the circuit
    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Gives the circuit back
    pub fn into_netlist(self) -> Netlist {
        self.netlist
    }

    /// Returns the attached puzzle
    pub fn puzzle(&self) -> Option<&PuzzleSpec> {
        self.puzzle.as_ref()
    }

    /// Applies one command, then re-evaluates the circuit if it changed
    pub fn apply(&mut self, command: Command) -> Result<Applied> {
        let applied = command.apply(&mut self.netlist)?;
        self.evaluation = self.netlist.evaluate();
        Ok(applied)
    }

    /// Applies commands in order, stopping at the first failure
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = Command>) -> Result<Vec<Applied>> {
        commands.into_iter().map(|c| self.apply(c)).collect()
    }

    /// Returns the result of the latest evaluation
    pub fn evaluation(&self) -> &Result<Evaluation> {
        &self.evaluation
    }

    /// Returns the value of every gate, or why the circuit can't be evaluated
    pub fn values(&self) -> Result<&BTreeMap<GateId, bool>> {
        self.evaluation
            .as_ref()
            .map(Evaluation::values)
            .map_err(Clone::clone)
    }

    /// Checks the circuit against the attached puzzle, if there is one
    pub fn verify(&mut self) -> Option<VerificationResult> {
        let spec = self.puzzle.as_ref()?;
        Some(puzzle::check(&mut self.netlist, spec).into())
    }

    /// Gathers everything the editor needs to redraw: values, depth and puzzle state
    pub fn report(&mut self) -> Report {
        let result = self.verify();
        let (values, evaluation_error) = match &self.evaluation {
            Ok(e) => (e.values().clone(), None),
            Err(e) => (BTreeMap::new(), Some(e.clone())),
        };
        let depth = self
            .netlist
            .get_analysis::<CombDepth>()
            .ok()
            .map(|d| d.get_max_depth());
        Report {
            name: self.netlist.get_name().to_string(),
            values,
            evaluation_error,
            depth,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_command_keeps_evaluation() {
        let mut bench = Workbench::new(Netlist::new("bench".to_string()));
        let Applied::Added(and) = bench
            .apply(Command::AddGate {
                kind: GateKind::And,
                name: None,
            })
            .unwrap()
        else {
            panic!("expected a new gate");
        };
        let before = bench.netlist().clone();
        let res = bench.apply(Command::ToggleSwitch { id: and });
        assert_eq!(res, Err(CircuitError::NotASwitch(and)));
        assert_eq!(bench.netlist(), &before);
        assert_eq!(bench.values().unwrap().get(&and), Some(&false));
    }

    #[test]
    fn toggle_reevaluates() {
        let mut bench = Workbench::new(Netlist::new("bench".to_string()));
        let applied = bench
            .apply_all([
                Command::AddGate {
                    kind: GateKind::Switch,
                    name: Some("a".into()),
                },
                Command::AddGate {
                    kind: GateKind::Output,
                    name: None,
                },
                Command::Connect {
                    source: GateId::new(0),
                    target: GateId::new(1),
                    port: 0,
                },
            ])
            .unwrap();
        assert_eq!(applied.len(), 3);
        assert!(!bench.values().unwrap()[&GateId::new(1)]);
        bench
            .apply(Command::ToggleSwitch { id: GateId::new(0) })
            .unwrap();
        assert!(bench.values().unwrap()[&GateId::new(1)]);
    }

    #[test]
    fn unknown_catalog_puzzle() {
        let bench = Workbench::new(Netlist::new("bench".to_string()));
        assert_eq!(
            bench.with_catalog_puzzle("nope").err(),
            Some(CircuitError::UnknownPuzzle("nope".to_string()))
        );
    }
}
