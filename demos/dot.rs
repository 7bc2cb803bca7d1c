use obelisk_logic::circuit::GateKind;
use obelisk_logic::graph::MultiDiGraph;
use obelisk_logic::netlist::Netlist;

fn main() {
    let mut netlist = Netlist::new("half_adder".to_string());
    let a = netlist.add_named_gate(GateKind::Switch, "a".into()).unwrap();
    let b = netlist.add_named_gate(GateKind::Switch, "b".into()).unwrap();
    let sum = netlist.add_gate(GateKind::Xor);
    let carry = netlist.add_gate(GateKind::And);
    for gate in [sum, carry] {
        netlist.connect(a, gate, 0).unwrap();
        netlist.connect(b, gate, 1).unwrap();
    }
    let s = netlist.add_named_gate(GateKind::Output, "s".into()).unwrap();
    let c = netlist.add_named_gate(GateKind::Output, "c".into()).unwrap();
    netlist.connect(sum, s, 0).unwrap();
    netlist.connect(carry, c, 0).unwrap();

    let analysis = netlist.get_analysis::<MultiDiGraph>().unwrap();
    let graph = analysis.get_graph();
    println!("{}", petgraph::dot::Dot::with_config(graph, &[]));
}
