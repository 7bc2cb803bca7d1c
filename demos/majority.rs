use obelisk_logic::circuit::GateKind;
use obelisk_logic::format_id;
use obelisk_logic::netlist::Netlist;
use obelisk_logic::puzzle::{self, Verdict};

fn majority() -> Netlist {
    let mut netlist = Netlist::new("majority_vote".to_string());
    let inputs: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|n| netlist.add_named_gate(GateKind::Switch, n.into()).unwrap())
        .collect();

    // One AND per pair of voters
    let mut pairs = Vec::new();
    for (i, j) in [(0, 1), (1, 2), (0, 2)] {
        let and = netlist
            .add_named_gate(GateKind::And, format_id!("pair_{i}{j}"))
            .unwrap();
        netlist.connect(inputs[i], and, 0).unwrap();
        netlist.connect(inputs[j], and, 1).unwrap();
        pairs.push(and);
    }

    let first = netlist.add_gate(GateKind::Or);
    netlist.connect(pairs[0], first, 0).unwrap();
    netlist.connect(pairs[1], first, 1).unwrap();
    let any = netlist.add_gate(GateKind::Or);
    netlist.connect(first, any, 0).unwrap();
    netlist.connect(pairs[2], any, 1).unwrap();

    let out = netlist.add_named_gate(GateKind::Output, "y".into()).unwrap();
    netlist.connect(any, out, 0).unwrap();
    netlist
}

fn main() {
    let mut netlist = majority();
    let spec = puzzle::find("majority_vote").unwrap().unwrap();
    println!("target {}", spec.target());

    match puzzle::check(&mut netlist, &spec).unwrap() {
        Verdict::Satisfied => println!("{} solved", spec.title()),
        Verdict::Unsatisfied(rows) => {
            for row in rows {
                println!("{row}");
            }
        }
    }

    // Break one pair and look at what goes wrong
    let pair = netlist.find("pair_12").unwrap().id();
    netlist.disconnect(pair, 1).unwrap();
    if let Verdict::Unsatisfied(rows) = puzzle::check(&mut netlist, &spec).unwrap() {
        for row in rows {
            println!("{row}");
        }
    }
}
