use obelisk_logic::circuit::{GateId, GateKind};
use obelisk_logic::error::CircuitError;
use obelisk_logic::format_id;
use obelisk_logic::netlist::{Connection, Netlist};

fn get_simple_example() -> Netlist {
    let mut netlist = Netlist::new("example".to_string());

    let a = netlist.add_named_gate(GateKind::Switch, "a".into()).unwrap();
    let b = netlist.add_named_gate(GateKind::Switch, "b".into()).unwrap();

    let instance = netlist.add_named_gate(GateKind::And, "inst_0".into()).unwrap();
    netlist.connect(a, instance, 0).unwrap();
    netlist.connect(b, instance, 1).unwrap();

    let y = netlist.add_named_gate(GateKind::Output, "y".into()).unwrap();
    netlist.connect(instance, y, 0).unwrap();

    netlist
}

#[test]
fn test_io() {
    let netlist = get_simple_example();
    assert_eq!(netlist.switches().count(), 2);
    assert_eq!(netlist.outputs().count(), 1);
    assert_eq!(netlist.len(), 4);
    let y = netlist.outputs().next().unwrap();
    assert_eq!(y.name().get_name(), "y");
    assert_eq!(netlist.driver(y.id(), 0), Some(GateId::new(2)));
    assert!(y.is_fully_connected());
}

#[test]
fn test_connections() {
    let netlist = get_simple_example();
    let wires: Vec<Connection> = netlist.connections().collect();
    assert_eq!(
        wires,
        vec![
            Connection::new(GateId::new(0), GateId::new(2), 0),
            Connection::new(GateId::new(1), GateId::new(2), 1),
            Connection::new(GateId::new(2), GateId::new(3), 0),
        ]
    );
    assert_eq!(wires[0].to_string(), "#0 -> #2.0");
}

#[test]
fn test_port_occupied_leaves_netlist_unchanged() {
    let mut netlist = get_simple_example();
    let c = netlist.add_named_gate(GateKind::Switch, "c".into()).unwrap();
    let before = netlist.clone();
    assert_eq!(
        netlist.connect(c, GateId::new(2), 0),
        Err(CircuitError::PortOccupied {
            gate: GateId::new(2),
            port: 0
        })
    );
    assert_eq!(netlist, before);
}

#[test]
fn test_bad_ports_and_gates() {
    let mut netlist = get_simple_example();
    let before = netlist.clone();
    assert_eq!(
        netlist.connect(GateId::new(0), GateId::new(3), 1),
        Err(CircuitError::InvalidPort {
            gate: GateId::new(3),
            port: 1
        })
    );
    // Switches have no input ports at all
    assert_eq!(
        netlist.connect(GateId::new(1), GateId::new(0), 0),
        Err(CircuitError::InvalidPort {
            gate: GateId::new(0),
            port: 0
        })
    );
    assert_eq!(
        netlist.connect(GateId::new(42), GateId::new(3), 0),
        Err(CircuitError::UnknownGate(GateId::new(42)))
    );
    assert_eq!(
        netlist.disconnect(GateId::new(2), 5),
        Err(CircuitError::InvalidPort {
            gate: GateId::new(2),
            port: 5
        })
    );
    assert_eq!(netlist, before);
}

#[test]
fn test_cycles_are_rejected() {
    let mut netlist = Netlist::new("loop".to_string());
    let chain: Vec<_> = (0..3)
        .map(|i| {
            netlist
                .add_named_gate(GateKind::Not, format_id!("inv_{i}"))
                .unwrap()
        })
        .collect();
    netlist.connect(chain[0], chain[1], 0).unwrap();
    netlist.connect(chain[1], chain[2], 0).unwrap();
    let before = netlist.clone();
    assert_eq!(
        netlist.connect(chain[2], chain[0], 0),
        Err(CircuitError::WouldCreateCycle {
            driver: chain[2],
            target: chain[0]
        })
    );
    // A gate can't feed itself either
    let and = netlist.add_gate(GateKind::And);
    assert!(matches!(
        netlist.connect(and, and, 1),
        Err(CircuitError::WouldCreateCycle { .. })
    ));
    netlist.remove_gate(and).unwrap();
    assert_eq!(netlist.connections().count(), before.connections().count());
}

#[test]
fn test_remove_cascades() {
    let mut netlist = get_simple_example();
    let removed = netlist.remove_gate(GateId::new(2)).unwrap();
    assert_eq!(removed.kind(), GateKind::And);
    assert_eq!(netlist.connections().count(), 0);
    assert_eq!(netlist.driver(GateId::new(3), 0), None);
    assert_eq!(
        netlist.remove_gate(GateId::new(2)).err(),
        Some(CircuitError::UnknownGate(GateId::new(2)))
    );
    // Ids are never reused
    assert_eq!(netlist.add_gate(GateKind::Or), GateId::new(4));
}

#[test]
fn test_disconnect() {
    let mut netlist = get_simple_example();
    assert_eq!(netlist.disconnect(GateId::new(2), 1), Ok(Some(GateId::new(1))));
    assert_eq!(netlist.disconnect(GateId::new(2), 1), Ok(None));
    netlist.connect(GateId::new(0), GateId::new(2), 1).unwrap();
    let eval = netlist.evaluate().unwrap();
    assert_eq!(eval.value(GateId::new(3)), Some(false));
}

#[test]
fn test_switches() {
    let mut netlist = get_simple_example();
    assert_eq!(netlist.toggle_switch(GateId::new(0)), Ok(true));
    assert_eq!(netlist.set_switch(GateId::new(1), true), Ok(false));
    assert_eq!(netlist.set_switch(GateId::new(1), true), Ok(true));
    assert_eq!(
        netlist.toggle_switch(GateId::new(2)),
        Err(CircuitError::NotASwitch(GateId::new(2)))
    );
    let eval = netlist.evaluate().unwrap();
    assert_eq!(eval.value(GateId::new(3)), Some(true));
    assert!(netlist.find("y").unwrap().value());
}

#[test]
fn test_names() {
    let mut netlist = get_simple_example();
    assert_eq!(
        netlist.add_named_gate(GateKind::Or, "a".into()),
        Err(CircuitError::DuplicateName("a".into()))
    );
    assert_eq!(
        netlist.rename(GateId::new(2), "y".into()),
        Err(CircuitError::DuplicateName("y".into()))
    );
    netlist.rename(GateId::new(2), "gate".into()).unwrap();
    assert_eq!(netlist.find("gate").map(|g| g.id()), Some(GateId::new(2)));
    assert!(netlist.find("inst_0").is_none());
}

#[test]
fn test_arity() {
    let netlist = get_simple_example();
    let and = netlist.req(GateId::new(2)).unwrap();
    assert_eq!(
        and.evaluate(&[true]),
        Err(CircuitError::InvalidArity {
            kind: GateKind::And,
            expected: 2,
            got: 1
        })
    );
}
