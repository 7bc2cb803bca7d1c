/*!

  Analyses over the structure of a netlist.

*/

use crate::circuit::GateId;
#[cfg(feature = "graph")]
use crate::circuit::Gate;
use crate::error::{CircuitError, Result};
use crate::netlist::{Connection, Netlist};
#[cfg(feature = "graph")]
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

/// A common trait of analyses than can be performed on a netlist.
/// An analysis becomes stale when the netlist is modified.
pub trait Analysis<'a>
where
    Self: Sized + 'a,
{
    /// Construct the analysis to the current state of the netlist.
    fn build(netlist: &'a Netlist) -> Result<Self>;
}

/// A table that maps gates to the wires leaving them
pub struct FanOutTable<'a> {
    // A reference to the underlying netlist
    _netlist: &'a Netlist,
    // Maps a gate to the wires it drives
    fan_out: HashMap<GateId, Vec<Connection>>,
}

impl FanOutTable<'_> {
    /// Returns an iterator to the wires leaving `id`.
    pub fn get_users(&self, id: GateId) -> impl Iterator<Item = Connection> + '_ {
        self.fan_out
            .get(&id)
            .into_iter()
            .flat_map(|users| users.iter().copied())
    }

    /// Returns `true` if the output of `id` is wired to anything
    pub fn has_uses(&self, id: GateId) -> bool {
        self.fan_out.get(&id).is_some_and(|users| !users.is_empty())
    }

    /// Returns every gate reachable downstream of `starts`, including the starts themselves.
    pub fn reachable_from(&self, starts: impl IntoIterator<Item = GateId>) -> BTreeSet<GateId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<GateId> = starts.into_iter().collect();
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.get_users(id).map(|c| c.target()));
            }
        }
        seen
    }
}

impl<'a> Analysis<'a> for FanOutTable<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self> {
        let mut fan_out: HashMap<GateId, Vec<Connection>> = HashMap::new();
        for c in netlist.connections() {
            fan_out.entry(c.src()).or_default().push(c);
        }
        Ok(FanOutTable {
            _netlist: netlist,
            fan_out,
        })
    }
}

/// Visit state for the three-colour depth-first search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path
    Visiting,
    /// Finished, with all drivers ordered before it
    Done,
}

/// An order over all gates in which every gate comes after the gates driving it.
/// Building it fails with [CircuitError::CyclicCircuit] if the netlist has a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoOrder {
    order: Vec<GateId>,
}

impl TopoOrder {
    /// Returns the gates in dependency order
    pub fn order(&self) -> &[GateId] {
        &self.order
    }

    /// Consumes the analysis, returning the ordered gates
    pub fn into_order(self) -> Vec<GateId> {
        self.order
    }
}

impl<'a> Analysis<'a> for TopoOrder {
    fn build(netlist: &'a Netlist) -> Result<Self> {
        let mut marks: HashMap<GateId, Mark> = HashMap::with_capacity(netlist.len());
        let mut order = Vec::with_capacity(netlist.len());

        for root in netlist.gates() {
            if marks.contains_key(&root.id()) {
                continue;
            }
            // Each frame is a gate and the next input port to explore
            let mut stack: Vec<(GateId, usize)> = vec![(root.id(), 0)];
            marks.insert(root.id(), Mark::Visiting);

            while let Some(&(id, port)) = stack.last() {
                let gate = netlist.req(id)?;
                match gate.inputs().get(port) {
                    Some(slot) => {
                        let top = stack.len() - 1;
                        stack[top].1 += 1;
                        let Some(driver) = *slot else {
                            continue;
                        };
                        match marks.get(&driver) {
                            Some(Mark::Visiting) => {
                                log::warn!("cycle through {driver} in {}", netlist.get_name());
                                return Err(CircuitError::CyclicCircuit(driver));
                            }
                            Some(Mark::Done) => (),
                            None => {
                                marks.insert(driver, Mark::Visiting);
                                stack.push((driver, 0));
                            }
                        }
                    }
                    None => {
                        marks.insert(id, Mark::Done);
                        order.push(id);
                        stack.pop();
                    }
                }
            }
        }

        log::trace!("evaluation order: {order:?}");
        Ok(TopoOrder { order })
    }
}

/// The logic level of every gate: switches and undriven gates sit at 0,
/// everything else one past its deepest driver.
pub struct CombDepth<'a> {
    // A reference to the underlying netlist
    _netlist: &'a Netlist,
    // Maps a gate to its logic level
    comb_depth: HashMap<GateId, usize>,
    /// The maximum depth of the circuit
    max_depth: usize,
}

impl CombDepth<'_> {
    /// Returns the logic level of a gate in the circuit.
    pub fn get_comb_depth(&self, id: GateId) -> Option<usize> {
        self.comb_depth.get(&id).cloned()
    }

    /// Returns the maximum logic level of the circuit.
    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<'a> Analysis<'a> for CombDepth<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self> {
        let order = TopoOrder::build(netlist)?;
        let mut comb_depth: HashMap<GateId, usize> = HashMap::with_capacity(order.order.len());

        for id in order.into_order() {
            let gate = netlist.req(id)?;
            let depth = gate
                .drivers()
                .filter_map(|d| comb_depth.get(&d))
                .max()
                .map_or(0, |d| d + 1);
            comb_depth.insert(id, depth);
        }

        let max_depth = comb_depth.values().max().cloned().unwrap_or(0);

        Ok(CombDepth {
            _netlist: netlist,
            comb_depth,
            max_depth,
        })
    }
}

/// A petgraph view of the netlist as a directed graph with type [DiGraph<Gate, Connection>].
#[cfg(feature = "graph")]
pub struct MultiDiGraph<'a> {
    _netlist: &'a Netlist,
    graph: DiGraph<Gate, Connection>,
    mapping: HashMap<GateId, NodeIndex>,
}

#[cfg(feature = "graph")]
impl MultiDiGraph<'_> {
    /// Return a reference to the graph constructed by this analysis
    pub fn get_graph(&self) -> &DiGraph<Gate, Connection> {
        &self.graph
    }

    /// Return the graph node standing for gate `id`
    pub fn node_index(&self, id: GateId) -> Option<NodeIndex> {
        self.mapping.get(&id).copied()
    }
}

#[cfg(feature = "graph")]
impl<'a> Analysis<'a> for MultiDiGraph<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self> {
        netlist.verify()?;
        let mut mapping = HashMap::new();
        let mut graph = DiGraph::new();

        for gate in netlist.gates() {
            let id = graph.add_node(gate.clone());
            mapping.insert(gate.id(), id);
        }

        for connection in netlist.connections() {
            let s_id = mapping[&connection.src()];
            let t_id = mapping[&connection.target()];
            graph.add_edge(s_id, t_id, connection);
        }

        Ok(Self {
            _netlist: netlist,
            graph,
            mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;

    fn chain() -> (Netlist, [GateId; 4]) {
        let mut netlist = Netlist::new("chain".to_string());
        let a = netlist.add_gate(GateKind::Switch);
        let b = netlist.add_gate(GateKind::Not);
        let c = netlist.add_gate(GateKind::Not);
        let o = netlist.add_gate(GateKind::Output);
        netlist.connect(c, o, 0).unwrap();
        netlist.connect(b, c, 0).unwrap();
        netlist.connect(a, b, 0).unwrap();
        (netlist, [a, b, c, o])
    }

    #[test]
    fn topo_order_puts_drivers_first() {
        let (netlist, ids) = chain();
        let order = netlist.get_analysis::<TopoOrder>().unwrap();
        let pos = |id| order.order().iter().position(|x| *x == id).unwrap();
        assert_eq!(order.order().len(), 4);
        assert!(pos(ids[0]) < pos(ids[1]));
        assert!(pos(ids[1]) < pos(ids[2]));
        assert!(pos(ids[2]) < pos(ids[3]));
    }

    #[test]
    fn fanout_table() {
        let mut netlist = Netlist::new("fanout".to_string());
        let a = netlist.add_gate(GateKind::Switch);
        let x = netlist.add_gate(GateKind::And);
        let y = netlist.add_gate(GateKind::Or);
        netlist.connect(a, x, 0).unwrap();
        netlist.connect(a, x, 1).unwrap();
        netlist.connect(a, y, 1).unwrap();

        let analysis = netlist.get_analysis::<FanOutTable>().unwrap();
        assert_eq!(analysis.get_users(a).count(), 3);
        assert!(!analysis.has_uses(x));
        assert_eq!(
            analysis.reachable_from([a]),
            BTreeSet::from([a, x, y])
        );
    }

    #[test]
    fn comb_depth() {
        let (netlist, ids) = chain();
        let depth = netlist.get_analysis::<CombDepth>().unwrap();
        assert_eq!(depth.get_comb_depth(ids[0]), Some(0));
        assert_eq!(depth.get_comb_depth(ids[3]), Some(3));
        assert_eq!(depth.get_max_depth(), 3);
    }
}
