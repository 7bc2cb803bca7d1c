/*!

  Computes the output of every gate for the current wiring and switch settings.

*/

use crate::circuit::GateId;
use crate::error::Result;
use crate::graph::{Analysis, TopoOrder};
use crate::netlist::Netlist;
use std::collections::BTreeMap;

/// A consistent assignment of boolean values to every gate output.
///
/// Gates are evaluated in dependency order, and an input port with no wire
/// reads as `false`. Evaluation is a pure function of the netlist: the same
/// wiring and switch states always produce the same values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    order: Vec<GateId>,
    values: BTreeMap<GateId, bool>,
}

impl Evaluation {
    /// Returns the output of gate `id`
    pub fn value(&self, id: GateId) -> Option<bool> {
        self.values.get(&id).copied()
    }

    /// Returns the output of every gate, keyed by id
    pub fn values(&self) -> &BTreeMap<GateId, bool> {
        &self.values
    }

    /// Returns the order the gates were evaluated in
    pub fn order(&self) -> &[GateId] {
        &self.order
    }
}

impl<'a> Analysis<'a> for Evaluation {
    fn build(netlist: &'a Netlist) -> Result<Self> {
        let order = TopoOrder::build(netlist)?.into_order();
        let mut values: BTreeMap<GateId, bool> = BTreeMap::new();
        let mut inputs: Vec<bool> = Vec::with_capacity(2);
        for &id in &order {
            let gate = netlist.req(id)?;
            inputs.clear();
            inputs.extend(
                gate.inputs()
                    .iter()
                    .map(|&d| d.and_then(|d| values.get(&d).copied()).unwrap_or(false)),
            );
            values.insert(id, gate.evaluate(&inputs)?);
        }
        Ok(Evaluation { order, values })
    }
}

impl Netlist {
    /// Evaluates the whole circuit from scratch and stores each result as the gate's value.
    /// If the circuit has a cycle, nothing is stored and the error is returned.
    pub fn evaluate(&mut self) -> Result<Evaluation> {
        let evaluation = self.get_analysis::<Evaluation>()?;
        for gate in self.gates_mut() {
            if let Some(v) = evaluation.value(gate.id()) {
                gate.set_value(v);
            }
        }
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;

    #[test]
    fn unconnected_inputs_read_low() {
        let mut netlist = Netlist::new("floating".to_string());
        let nand = netlist.add_gate(GateKind::Nand);
        let or = netlist.add_gate(GateKind::Or);
        let out = netlist.add_gate(GateKind::Output);
        let eval = netlist.evaluate().unwrap();
        assert_eq!(eval.value(nand), Some(true));
        assert_eq!(eval.value(or), Some(false));
        assert_eq!(eval.value(out), Some(false));
    }

    #[test]
    fn values_are_committed() {
        let mut netlist = Netlist::new("commit".to_string());
        let sw = netlist.add_gate(GateKind::Switch);
        let not = netlist.add_gate(GateKind::Not);
        netlist.connect(sw, not, 0).unwrap();
        netlist.evaluate().unwrap();
        assert!(netlist.req(not).unwrap().value());
        netlist.toggle_switch(sw).unwrap();
        netlist.evaluate().unwrap();
        assert!(!netlist.req(not).unwrap().value());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut netlist = Netlist::new("same".to_string());
        let a = netlist.add_gate(GateKind::Switch);
        let b = netlist.add_gate(GateKind::Switch);
        let x = netlist.add_gate(GateKind::Xor);
        netlist.connect(a, x, 0).unwrap();
        netlist.connect(b, x, 1).unwrap();
        netlist.toggle_switch(b).unwrap();
        let first = netlist.evaluate().unwrap();
        let second = netlist.evaluate().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.value(x), Some(true));
    }
}
