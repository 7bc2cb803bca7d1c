use obelisk_logic::assert_verilog_eq;
use obelisk_logic::circuit::GateKind;
use obelisk_logic::netlist::Netlist;

#[test]
fn min_module() {
    let mut netlist = Netlist::new("min_module".to_string());
    let a = netlist.add_named_gate(GateKind::Switch, "a".into()).unwrap();
    let y = netlist.add_named_gate(GateKind::Output, "y".into()).unwrap();
    netlist.connect(a, y, 0).unwrap();
    assert!(netlist.verify().is_ok());
    assert_verilog_eq!(
        netlist.to_string(),
        "module min_module (
           a,
           y
         );
           input a;
           output y;
           assign y = a;
         endmodule\n"
    );
}

#[test]
fn gates_and_floating_ports() {
    let mut netlist = Netlist::new("example".to_string());
    let a = netlist.add_named_gate(GateKind::Switch, "a".into()).unwrap();
    let and = netlist.add_named_gate(GateKind::And, "inst_0".into()).unwrap();
    let not = netlist.add_gate(GateKind::Not);
    let y = netlist.add_named_gate(GateKind::Output, "y".into()).unwrap();
    netlist.connect(a, and, 0).unwrap();
    netlist.connect(and, not, 0).unwrap();
    netlist.connect(not, y, 0).unwrap();
    netlist
        .set_attribute(and, "x".to_string(), Some("10".to_string()))
        .unwrap();
    assert_verilog_eq!(
        netlist.to_string(),
        "module example (
           a,
           y
         );
           input a;
           output y;
           wire inst_0;
           wire not_2;
           (* x = \"10\" *)
           and inst_0 (inst_0, a, 1'b0);
           not not_2 (not_2, inst_0);
           assign y = not_2;
         endmodule\n"
    );
}

#[test]
fn escaped_names() {
    let mut netlist = Netlist::new("escaped".to_string());
    // Escaped identifiers end at whitespace, so such names never reach the printer
    assert!(netlist.add_named_gate(GateKind::Switch, "door 1".into()).is_err());
    let a = netlist.add_named_gate(GateKind::Switch, "door-1".into()).unwrap();
    let y = netlist.add_named_gate(GateKind::Output, "y".into()).unwrap();
    netlist.connect(a, y, 0).unwrap();
    assert_verilog_eq!(
        netlist.to_string(),
        "module escaped (
           \\door-1 ,
           y
         );
           input \\door-1 ;
           output y;
           assign y = \\door-1 ;
         endmodule\n"
    );
}
