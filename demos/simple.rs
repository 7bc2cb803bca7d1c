use obelisk_logic::circuit::GateKind;
use obelisk_logic::netlist::Netlist;
use obelisk_logic::puzzle;

fn main() {
    let mut netlist = Netlist::new("security_alarm".to_string());

    // Add the three switches
    let door1 = netlist.add_named_gate(GateKind::Switch, "door1".into()).unwrap();
    let door2 = netlist.add_named_gate(GateKind::Switch, "door2".into()).unwrap();
    let armed = netlist.add_named_gate(GateKind::Switch, "armed".into()).unwrap();

    // Either door, but only while armed
    let either = netlist.add_gate(GateKind::Or);
    netlist.connect(door1, either, 0).unwrap();
    netlist.connect(door2, either, 1).unwrap();
    let alarm = netlist.add_gate(GateKind::And);
    netlist.connect(either, alarm, 0).unwrap();
    netlist.connect(armed, alarm, 1).unwrap();

    // Ring the bell
    let bell = netlist.add_named_gate(GateKind::Output, "bell".into()).unwrap();
    netlist.connect(alarm, bell, 0).unwrap();

    // Print the netlist
    println!("{netlist}");

    let spec = puzzle::find("security_alarm").unwrap().unwrap();
    let verdict = puzzle::check(&mut netlist, &spec).unwrap();
    assert!(verdict.is_satisfied());
}
