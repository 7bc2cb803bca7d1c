/*!

  The circuit graph: gates, the wires between them, and the edits a player can make.

*/

use crate::{
    attribute::{AttributeKey, AttributeValue},
    circuit::{Gate, GateId, GateKind, Identifier},
    error::{CircuitError, Result},
    graph::Analysis,
};
use std::collections::{BTreeMap, HashSet};

/// A wire from the output of `source` into input `port` of `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Connection {
    source: GateId,
    target: GateId,
    port: usize,
}

impl Connection {
    /// Creates a connection record. This does not wire anything.
    pub fn new(source: GateId, target: GateId, port: usize) -> Self {
        Self {
            source,
            target,
            port,
        }
    }

    /// Return the driver of the connection
    pub fn src(&self) -> GateId {
        self.source
    }

    /// Return the driven gate of the connection
    pub fn target(&self) -> GateId {
        self.target
    }

    /// Return the input port on the driven gate
    pub fn port(&self) -> usize {
        self.port
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}.{}", self.source, self.target, self.port)
    }
}

/// A circuit of gates wired output-to-input.
///
/// Every input port of a gate holds at most one driver. The netlist is
/// owned by a single editing session, so all edits take `&mut self` and
/// either fully apply or return an error without touching the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Netlist {
    /// The name of the circuit
    name: String,
    /// Gates in id order
    gates: BTreeMap<GateId, Gate>,
    /// The id handed to the next gate
    next_id: usize,
}

impl Netlist {
    /// Creates a new, empty netlist with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            gates: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Returns the name of the circuit
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the number of gates
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` if the circuit has no gates
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    fn fresh_id(&mut self) -> GateId {
        let id = GateId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns a name built from the kind and id that nothing else uses yet
    fn fresh_name(&self, kind: GateKind, id: GateId) -> Identifier {
        let base = format!("{}_{}", kind.prefix(), id.index());
        let mut name: Identifier = base.clone().into();
        let mut suffix = 0;
        while self.find(name.get_name()).is_some() {
            suffix += 1;
            name = format!("{base}_{suffix}").into();
        }
        name
    }

    /// Places a new, unconnected gate with a generated name
    pub fn add_gate(&mut self, kind: GateKind) -> GateId {
        let id = self.fresh_id();
        let name = self.fresh_name(kind, id);
        log::debug!("add {kind} gate {name} as {id}");
        self.gates.insert(id, Gate::new(id, kind, name));
        id
    }

    /// Places a new, unconnected gate with the given name.
    /// Fails if another gate already uses the name, or if the name is empty
    /// or holds whitespace.
    pub fn add_named_gate(&mut self, kind: GateKind, name: Identifier) -> Result<GateId> {
        self.check_name(&name, None)?;
        let id = self.fresh_id();
        log::debug!("add {kind} gate {name} as {id}");
        self.gates.insert(id, Gate::new(id, kind, name));
        Ok(id)
    }

    /// Inserts a gate carrying its own id and wiring. Used when loading snapshots.
    pub(crate) fn insert_gate(&mut self, gate: Gate) -> Result<()> {
        let id = gate.id();
        if self.gates.contains_key(&id) {
            return Err(CircuitError::DuplicateGate(id));
        }
        self.check_name(gate.name(), None)?;
        if id.index() > GateId::MAX_INDEX {
            return Err(CircuitError::InvalidId(id));
        }
        self.next_id = self.next_id.max(id.index() + 1);
        self.gates.insert(id, gate);
        Ok(())
    }

    /// Deletes a gate along with every wire into or out of it, returning the gate.
    pub fn remove_gate(&mut self, id: GateId) -> Result<Gate> {
        let gate = self
            .gates
            .remove(&id)
            .ok_or(CircuitError::UnknownGate(id))?;
        let mut dropped = 0;
        for other in self.gates.values_mut() {
            for slot in other.inputs_mut() {
                if *slot == Some(id) {
                    *slot = None;
                    dropped += 1;
                }
            }
        }
        log::debug!("remove {gate}, dropping {dropped} fan-out wires");
        Ok(gate)
    }

    /// Wires the output of `source` into input `port` of `target`.
    ///
    /// Fails without changing the circuit if either gate is missing, the port
    /// doesn't exist or is already driven, or the wire would close a loop.
    pub fn connect(&mut self, source: GateId, target: GateId, port: usize) -> Result<Connection> {
        self.check_free_port(source, target, port)?;
        if self.reaches(source, target) {
            return Err(CircuitError::WouldCreateCycle {
                driver: source,
                target,
            });
        }
        let connection = Connection::new(source, target, port);
        self.req_mut(target)?.inputs_mut()[port] = Some(source);
        log::debug!("connect {connection}");
        Ok(connection)
    }

    /// Wires a connection without the cycle check, so a loaded circuit can
    /// hold a loop for the evaluator to report.
    pub(crate) fn attach(&mut self, connection: Connection) -> Result<()> {
        let (source, target, port) = (connection.src(), connection.target(), connection.port());
        self.check_free_port(source, target, port)?;
        self.req_mut(target)?.inputs_mut()[port] = Some(source);
        Ok(())
    }

    fn check_free_port(&self, source: GateId, target: GateId, port: usize) -> Result<()> {
        self.req(source)?;
        let tgt = self.req(target)?;
        if port >= tgt.inputs().len() {
            return Err(CircuitError::InvalidPort { gate: target, port });
        }
        if tgt.driver(port).is_some() {
            return Err(CircuitError::PortOccupied { gate: target, port });
        }
        Ok(())
    }

    /// Removes the wire feeding input `port` of `target`, returning its old driver.
    /// Disconnecting a free port does nothing.
    pub fn disconnect(&mut self, target: GateId, port: usize) -> Result<Option<GateId>> {
        let gate = self.req_mut(target)?;
        let slot = gate
            .inputs_mut()
            .get_mut(port)
            .ok_or(CircuitError::InvalidPort { gate: target, port })?;
        let old = slot.take();
        if let Some(source) = old {
            log::debug!("disconnect {}", Connection::new(source, target, port));
        }
        Ok(old)
    }

    /// Flips a switch, returning its new state
    pub fn toggle_switch(&mut self, id: GateId) -> Result<bool> {
        let gate = self.req_mut(id)?;
        if !gate.is_switch() {
            return Err(CircuitError::NotASwitch(id));
        }
        let value = !gate.value();
        gate.set_value(value);
        log::debug!("toggle {} to {}", gate.name(), value);
        Ok(value)
    }

    /// Drives a switch to `value`, toggling only if it differs. Returns the previous state.
    pub fn set_switch(&mut self, id: GateId, value: bool) -> Result<bool> {
        let gate = self.req(id)?;
        if !gate.is_switch() {
            return Err(CircuitError::NotASwitch(id));
        }
        let old = gate.value();
        if old != value {
            self.toggle_switch(id)?;
        }
        Ok(old)
    }

    /// Sets an attribute on a gate, returning the previous value if one was set
    pub fn set_attribute(
        &mut self,
        id: GateId,
        k: AttributeKey,
        v: AttributeValue,
    ) -> Result<Option<AttributeValue>> {
        Ok(self.req_mut(id)?.insert_attribute(k, v))
    }

    /// Clears the attribute with the given key on a gate
    pub fn clear_attribute(&mut self, id: GateId, k: &str) -> Result<Option<AttributeValue>> {
        Ok(self.req_mut(id)?.clear_attribute(k))
    }

    /// Renames a gate. Fails if another gate already uses the name or the name is invalid.
    pub fn rename(&mut self, id: GateId, name: Identifier) -> Result<()> {
        self.req(id)?;
        self.check_name(&name, Some(id))?;
        self.req_mut(id)?.set_name(name);
        Ok(())
    }

    /// Rejects names that can't be printed or that a gate other than `owner` already uses
    fn check_name(&self, name: &Identifier, owner: Option<GateId>) -> Result<()> {
        if !name.is_valid() {
            return Err(CircuitError::InvalidName(name.clone()));
        }
        match self.find(name.get_name()) {
            Some(other) if Some(other.id()) != owner => {
                Err(CircuitError::DuplicateName(name.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl Netlist {
    /// Returns the gate with id `id`
    pub fn get(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(&id)
    }

    /// Returns the gate with id `id`, or an [CircuitError::UnknownGate] error
    pub fn req(&self, id: GateId) -> Result<&Gate> {
        self.gates.get(&id).ok_or(CircuitError::UnknownGate(id))
    }

    fn req_mut(&mut self, id: GateId) -> Result<&mut Gate> {
        self.gates.get_mut(&id).ok_or(CircuitError::UnknownGate(id))
    }

    pub(crate) fn gates_mut(&mut self) -> impl Iterator<Item = &mut Gate> {
        self.gates.values_mut()
    }

    /// Returns `true` if a gate with id `id` exists
    pub fn contains(&self, id: GateId) -> bool {
        self.gates.contains_key(&id)
    }

    /// Finds the gate with the given name. Names are unique within a netlist.
    pub fn find(&self, name: &str) -> Option<&Gate> {
        self.gates.values().find(|g| g.name().get_name() == name)
    }

    /// Returns an iterator over the gates in id order
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// Returns an iterator over the gates whose kind satisfies `filter`
    pub fn matches<F>(&self, filter: F) -> impl Iterator<Item = &Gate>
    where
        F: Fn(&GateKind) -> bool,
    {
        self.gates().filter(move |g| filter(&g.kind()))
    }

    /// Returns an iterator over the switches
    pub fn switches(&self) -> impl Iterator<Item = &Gate> {
        self.gates().filter(|g| g.is_switch())
    }

    /// Returns an iterator over the output gates
    pub fn outputs(&self) -> impl Iterator<Item = &Gate> {
        self.gates().filter(|g| g.is_output())
    }

    /// Returns the gate driving input `port` of `target`
    pub fn driver(&self, target: GateId, port: usize) -> Option<GateId> {
        self.gates.get(&target)?.driver(port)
    }

    /// Returns an iterator over every wire in the circuit, ordered by target then port
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        iter::ConnectionIterator::new(self)
    }

    /// Returns the wires leaving `id`. This operation is O(n).
    pub fn users(&self, id: GateId) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.src() == id)
    }

    /// Returns a depth-first iterator over `from` and everything that drives it
    pub fn dfs(&self, from: GateId) -> iter::DFSIterator<'_> {
        iter::DFSIterator::new(self, from)
    }

    /// Returns `true` if `ancestor` is `from` or drives it through some path
    pub fn reaches(&self, from: GateId, ancestor: GateId) -> bool {
        self.dfs(from).any(|id| id == ancestor)
    }

    /// Constructs an analysis of the netlist.
    pub fn get_analysis<'a, A: Analysis<'a>>(&'a self) -> Result<A> {
        A::build(self)
    }

    /// Verifies that a netlist is well-formed: unique names, one slot per
    /// input port, and no wire from a gate that doesn't exist.
    pub fn verify(&self) -> Result<()> {
        let mut names = HashSet::new();
        for gate in self.gates() {
            if !names.insert(gate.name()) {
                return Err(CircuitError::DuplicateName(gate.name().clone()));
            }
            let expected = gate.kind().arity();
            if gate.inputs().len() != expected {
                return Err(CircuitError::InvalidArity {
                    kind: gate.kind(),
                    expected,
                    got: gate.inputs().len(),
                });
            }
            if let Some(missing) = gate.drivers().find(|d| !self.contains(*d)) {
                return Err(CircuitError::UnknownGate(missing));
            }
        }
        Ok(())
    }

    /// Deletes logic gates whose output drives nothing, returning `true` if the netlist changed.
    /// Switches and outputs are never removed.
    pub fn clean_once(&mut self) -> bool {
        let used: HashSet<GateId> = self.connections().map(|c| c.src()).collect();
        let dead: Vec<GateId> = self
            .gates()
            .filter(|g| g.kind().is_logic() && !used.contains(&g.id()))
            .map(|g| g.id())
            .collect();
        for id in &dead {
            self.gates.remove(id);
        }
        !dead.is_empty()
    }

    /// Greedily removes dead logic until the netlist stops changing.
    /// Returns `true` if anything was removed.
    pub fn clean(&mut self) -> bool {
        let mut changed = false;
        while self.clean_once() {
            changed = true;
        }
        changed
    }
}

/// Filter gates by kind in a netlist. Use it like you would `matches!`.
/// Example: ```filter_gates!(netlist, GateKind::And | GateKind::Nand);```
#[macro_export]
macro_rules! filter_gates {
    ($netlist:ident, $pattern:pat $(if $guard:expr)? $(,)?) => {
        $netlist.matches(|f| match f {
            $pattern $(if $guard)? => true,
            _ => false
        })
    };
}

/// A collection of iterators for the netlist
pub mod iter {

    use super::{Connection, Netlist};
    use crate::circuit::{Gate, GateId};
    use std::collections::{HashSet, btree_map::Values};

    /// An iterator over the wires in a netlist
    pub struct ConnectionIterator<'a> {
        gates: Values<'a, GateId, Gate>,
        current: Option<&'a Gate>,
        port: usize,
    }

    impl<'a> ConnectionIterator<'a> {
        /// Create a new connection iterator for the netlist
        pub fn new(netlist: &'a Netlist) -> Self {
            Self {
                gates: netlist.gates.values(),
                current: None,
                port: 0,
            }
        }
    }

    impl Iterator for ConnectionIterator<'_> {
        type Item = Connection;

        fn next(&mut self) -> Option<Self::Item> {
            loop {
                if let Some(gate) = self.current {
                    while self.port < gate.inputs().len() {
                        let port = self.port;
                        self.port += 1;
                        if let Some(source) = gate.driver(port) {
                            return Some(Connection::new(source, gate.id(), port));
                        }
                    }
                }
                self.current = Some(self.gates.next()?);
                self.port = 0;
            }
        }
    }

    /// A depth-first iterator from a gate towards the gates that drive it.
    /// Each gate is yielded once, starting with the root.
    /// # Examples
    ///
    /// ```
    /// use obelisk_logic::circuit::GateKind;
    /// use obelisk_logic::netlist::Netlist;
    ///
    /// let mut netlist = Netlist::new("example".to_string());
    /// let a = netlist.add_gate(GateKind::Switch);
    /// let not = netlist.add_gate(GateKind::Not);
    /// netlist.connect(a, not, 0).unwrap();
    /// let order: Vec<_> = netlist.dfs(not).collect();
    /// assert_eq!(order, vec![not, a]);
    /// ```
    pub struct DFSIterator<'a> {
        netlist: &'a Netlist,
        stack: Vec<GateId>,
        visited: HashSet<GateId>,
    }

    impl<'a> DFSIterator<'a> {
        /// Create a new DFS iterator for the netlist starting at `from`.
        pub fn new(netlist: &'a Netlist, from: GateId) -> Self {
            Self {
                netlist,
                stack: vec![from],
                visited: HashSet::new(),
            }
        }
    }

    impl Iterator for DFSIterator<'_> {
        type Item = GateId;

        fn next(&mut self) -> Option<Self::Item> {
            while let Some(id) = self.stack.pop() {
                if !self.visited.insert(id) {
                    continue;
                }
                if let Some(gate) = self.netlist.get(id) {
                    self.stack.extend(gate.inputs().iter().rev().flatten());
                }
                return Some(id);
            }
            None
        }
    }
}

impl std::fmt::Display for Netlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let net = |id: Option<GateId>| match id.and_then(|id| self.get(id)) {
            Some(g) => g.name().emit_name(),
            None => "1'b0".to_string(),
        };

        writeln!(f, "module {} (", self.name)?;

        // Ports: switches drive the inputs, outputs are the sinks
        let level = 2;
        let indent = " ".repeat(level);
        let ports: Vec<&Gate> = self
            .gates()
            .filter(|g| g.is_switch() || g.is_output())
            .collect();
        for (i, gate) in ports.iter().enumerate() {
            if i == ports.len() - 1 {
                writeln!(f, "{}{}", indent, gate.name().emit_name())?;
            } else {
                writeln!(f, "{}{},", indent, gate.name().emit_name())?;
            }
        }
        writeln!(f, ");")?;

        for gate in self.switches() {
            writeln!(f, "{}input {};", indent, gate.name().emit_name())?;
        }
        for gate in self.outputs() {
            writeln!(f, "{}output {};", indent, gate.name().emit_name())?;
        }
        for gate in self.gates().filter(|g| g.kind().is_logic()) {
            writeln!(f, "{}wire {};", indent, gate.name().emit_name())?;
        }

        for gate in self.gates() {
            let Some(primitive) = gate.kind().primitive() else {
                continue;
            };
            for attr in gate.attributes() {
                writeln!(f, "{indent}{attr}")?;
            }
            let name = gate.name().emit_name();
            let operands: Vec<String> = gate.inputs().iter().map(|d| net(*d)).collect();
            writeln!(
                f,
                "{}{} {} ({}, {});",
                indent,
                primitive,
                name,
                name,
                operands.join(", ")
            )?;
        }

        for gate in self.outputs() {
            writeln!(
                f,
                "{}assign {} = {};",
                indent,
                gate.name().emit_name(),
                net(gate.driver(0))
            )?;
        }

        writeln!(f, "endmodule")
    }
}
