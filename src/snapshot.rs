/*!

  The plain-data shapes exchanged with the editor: snapshots of a circuit
  coming in, reports of its values and puzzle state going out.

*/

use crate::attribute::{AttributeKey, AttributeValue};
use crate::circuit::{Gate, GateId, GateKind, Identifier};
use crate::error::{CircuitError, Result};
use crate::netlist::{Connection, Netlist};
use crate::puzzle::VerificationResult;
use std::collections::BTreeMap;

/// One gate as the editor sees it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct GateRecord {
    /// Stable id of the gate
    pub id: GateId,
    /// Gate kind
    pub kind: GateKind,
    /// Gate name
    pub name: Identifier,
    /// Switch state. Ignored for other kinds, which are recomputed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: bool,
    /// Presentation metadata such as canvas position
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: BTreeMap<AttributeKey, AttributeValue>,
}

/// A full description of a circuit at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Snapshot {
    /// Name of the circuit
    pub name: String,
    /// Every gate
    pub gates: Vec<GateRecord>,
    /// Every wire
    #[cfg_attr(feature = "serde", serde(default))]
    pub connections: Vec<Connection>,
}

/// What the editor needs to redraw after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Report {
    /// Name of the circuit
    pub name: String,
    /// Output of each gate. Empty if evaluation failed.
    pub values: BTreeMap<GateId, bool>,
    /// Why evaluation failed, if it did
    pub evaluation_error: Option<CircuitError>,
    /// The deepest logic level, if the circuit is acyclic
    pub depth: Option<usize>,
    /// Puzzle state, if a puzzle is attached
    pub result: Option<VerificationResult>,
}

impl Netlist {
    /// Captures the circuit as plain data
    pub fn snapshot(&self) -> Snapshot {
        let gates = self
            .gates()
            .map(|g| GateRecord {
                id: g.id(),
                kind: g.kind(),
                name: g.name().clone(),
                value: g.value(),
                attributes: g
                    .attributes()
                    .map(|a| (a.key().clone(), a.value().clone()))
                    .collect(),
            })
            .collect();
        Snapshot {
            name: self.get_name().to_string(),
            gates,
            connections: self.connections().collect(),
        }
    }

    /// Rebuilds a circuit from a snapshot.
    ///
    /// Ids, names and ports are checked as they would be for live edits, but
    /// cycles are accepted: evaluating such a circuit reports
    /// [CircuitError::CyclicCircuit] instead. An acyclic circuit comes back
    /// evaluated. A cyclic one keeps `false` on every non-switch gate.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut netlist = Netlist::new(snapshot.name);
        for record in snapshot.gates {
            let mut gate = Gate::new(record.id, record.kind, record.name);
            if gate.is_switch() {
                gate.set_value(record.value);
            }
            for (k, v) in record.attributes {
                gate.insert_attribute(k, v);
            }
            netlist.insert_gate(gate)?;
        }
        for connection in snapshot.connections {
            netlist.attach(connection)?;
        }
        log::debug!(
            "loaded {} with {} gates",
            netlist.get_name(),
            netlist.len()
        );
        if let Err(e) = netlist.evaluate() {
            log::debug!("{} loaded unevaluated: {e}", netlist.get_name());
        }
        Ok(netlist)
    }

    /// Serializes the netlist as JSON to a writer.
    #[cfg(feature = "serde")]
    pub fn serialize(&self, writer: impl std::io::Write) -> std::result::Result<(), serde_json::Error> {
        to_writer(&self.snapshot(), writer)
    }
}

/// Reads a snapshot from JSON
#[cfg(feature = "serde")]
pub fn from_reader(reader: impl std::io::Read) -> std::result::Result<Snapshot, serde_json::Error> {
    serde_json::from_reader(reader)
}

/// Writes a snapshot as pretty-printed JSON
#[cfg(feature = "serde")]
pub fn to_writer(
    snapshot: &Snapshot,
    writer: impl std::io::Write,
) -> std::result::Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, snapshot)
}
