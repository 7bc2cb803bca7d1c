//! Property tests over randomly wired circuits.

use obelisk_logic::circuit::{GateId, GateKind, Identifier};
use obelisk_logic::netlist::Netlist;
use obelisk_logic::puzzle::{self, TruthTable};
use proptest::prelude::*;
use std::collections::HashMap;

/// One random edit: place a gate, or try to draw a wire between two existing ones
#[derive(Debug, Clone)]
enum Edit {
    Place(GateKind),
    Wire(usize, usize, usize),
    Toggle(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        prop::sample::select(GateKind::ALL.to_vec()).prop_map(Edit::Place),
        (0..16usize, 0..16usize, 0..2usize).prop_map(|(s, t, p)| Edit::Wire(s, t, p)),
        (0..16usize).prop_map(Edit::Toggle),
    ]
}

/// Three named switches followed by whatever the edits build. Returns the
/// netlist and whether every rejected edit left it unchanged.
fn build(edits: &[Edit]) -> (Netlist, bool) {
    let mut netlist = Netlist::new("random".to_string());
    for name in ["a", "b", "c"] {
        netlist.add_named_gate(GateKind::Switch, name.into()).unwrap();
    }
    let mut untouched_on_error = true;
    for edit in edits {
        let ids: Vec<GateId> = netlist.gates().map(|g| g.id()).collect();
        let before = netlist.clone();
        let res = match *edit {
            Edit::Place(kind) => {
                netlist.add_gate(kind);
                Ok(())
            }
            Edit::Wire(s, t, p) => netlist
                .connect(ids[s % ids.len()], ids[t % ids.len()], p)
                .map(|_| ()),
            Edit::Toggle(i) => netlist.toggle_switch(ids[i % ids.len()]).map(|_| ()),
        };
        if res.is_err() && netlist != before {
            untouched_on_error = false;
        }
    }
    (netlist, untouched_on_error)
}

/// Output of `id` computed by recursion over its drivers
fn reference_value(netlist: &Netlist, id: GateId, memo: &mut HashMap<GateId, bool>) -> bool {
    if let Some(v) = memo.get(&id) {
        return *v;
    }
    let gate = netlist.req(id).unwrap();
    let inputs: Vec<bool> = gate
        .inputs()
        .iter()
        .map(|&d| d.is_some_and(|d| reference_value(netlist, d, memo)))
        .collect();
    let v = gate.evaluate(&inputs).unwrap();
    memo.insert(id, v);
    v
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rejected_edits_change_nothing(edits in prop::collection::vec(edit(), 0..40)) {
        let (netlist, untouched) = build(&edits);
        prop_assert!(untouched);
        prop_assert!(netlist.verify().is_ok());
    }

    #[test]
    fn evaluation_matches_recursion(edits in prop::collection::vec(edit(), 0..40)) {
        let (mut netlist, _) = build(&edits);
        let first = netlist.evaluate().unwrap();
        let mut memo = HashMap::new();
        for gate in netlist.gates() {
            let expected = reference_value(&netlist, gate.id(), &mut memo);
            prop_assert_eq!(first.value(gate.id()), Some(expected));
            prop_assert_eq!(gate.value(), expected);
        }
        let second = netlist.evaluate().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn check_restores_the_netlist(edits in prop::collection::vec(edit(), 0..40)) {
        let (mut netlist, _) = build(&edits);
        netlist.evaluate().unwrap();
        let before = netlist.clone();
        for entry in puzzle::CATALOG {
            let spec = entry.spec().unwrap();
            let _ = puzzle::check(&mut netlist, &spec);
            prop_assert_eq!(&netlist, &before);
        }
    }

    #[test]
    fn expressions_reprint_to_the_same_table(
        bits in prop::collection::vec(any::<bool>(), 8),
    ) {
        // Sum of minterms for an arbitrary 3-input function
        let inputs: Vec<Identifier> = vec!["a".into(), "b".into(), "c".into()];
        let terms: Vec<String> = bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(row, _)| {
                let lits: Vec<String> = inputs
                    .iter()
                    .zip(puzzle::row_assignment(3, row))
                    .map(|(n, v)| if v { n.to_string() } else { format!("NOT {n}") })
                    .collect();
                format!("({})", lits.join(" AND "))
            })
            .collect();
        let src = if terms.is_empty() { "0".to_string() } else { terms.join(" OR ") };

        let expr: obelisk_logic::expr::Expr = src.parse().unwrap();
        let table = TruthTable::from_expr(&inputs, &expr).unwrap();
        let expected = TruthTable::from_fn(3, |x| {
            let row = x.iter().fold(0, |acc, &b| (acc << 1) | usize::from(b));
            bits[row]
        })
        .unwrap();
        prop_assert_eq!(&table, &expected);

        let reparsed: obelisk_logic::expr::Expr = expr.to_string().parse().unwrap();
        prop_assert_eq!(TruthTable::from_expr(&inputs, &reparsed).unwrap(), expected);
    }
}
