use obelisk_logic::circuit::{GateId, GateKind};
use obelisk_logic::command::{Applied, Command, Workbench};
use obelisk_logic::netlist::Netlist;
use obelisk_logic::puzzle::VerificationResult;
use std::error::Error;

/// Places a named gate through the command interface and returns its id
fn place(bench: &mut Workbench, kind: GateKind, name: &str) -> Result<GateId, Box<dyn Error>> {
    let applied = bench.apply(Command::AddGate {
        kind,
        name: Some(name.into()),
    })?;
    let Applied::Added(id) = &applied else {
        return Err(format!("placing {name} gave {applied:?} instead of a new gate").into());
    };
    Ok(*id)
}

/// Builds the security alarm one command at a time, the way the editor would
fn security_alarm() -> Result<Workbench, Box<dyn Error>> {
    let mut bench = Workbench::new(Netlist::new("security_alarm".to_string()))
        .with_catalog_puzzle("security_alarm")?;

    let door1 = place(&mut bench, GateKind::Switch, "door1")?;
    let door2 = place(&mut bench, GateKind::Switch, "door2")?;
    let armed = place(&mut bench, GateKind::Switch, "armed")?;
    let either = place(&mut bench, GateKind::Or, "either")?;
    let alarm = place(&mut bench, GateKind::And, "alarm")?;
    let bell = place(&mut bench, GateKind::Output, "bell")?;

    let wires = [
        (door1, either, 0),
        (door2, either, 1),
        (either, alarm, 0),
        (armed, alarm, 1),
        (alarm, bell, 0),
    ];
    for (source, target, port) in wires {
        bench.apply(Command::Connect {
            source,
            target,
            port,
        })?;
    }
    bench.apply(Command::ToggleSwitch { id: door2 })?;
    Ok(bench)
}

fn demo() -> Result<(), Box<dyn Error>> {
    let mut bench = security_alarm()?;
    print!("{}", bench.netlist());

    for gate in bench.netlist().gates() {
        let value = bench.values()?.get(&gate.id()).copied().unwrap_or(false);
        println!("{}: {}", gate.name(), u8::from(value));
    }

    match bench.verify() {
        Some(VerificationResult::Satisfied) => println!("Puzzle solved"),
        Some(other) => println!("Puzzle not solved: {other:?}"),
        None => println!("No puzzle attached"),
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn check_file(path: &str, puzzle: Option<&str>) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    let snapshot = obelisk_logic::snapshot::from_reader(std::io::BufReader::new(file))?;
    let mut bench = Workbench::from_snapshot(snapshot)?;
    if let Some(id) = puzzle {
        bench = bench.with_catalog_puzzle(id)?;
    }
    print!("{}", bench.netlist());
    let report = bench.report();
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let res: Result<(), Box<dyn Error>> = match args.as_slice() {
        [] => demo(),
        #[cfg(feature = "serde")]
        [path] => check_file(path, None),
        #[cfg(feature = "serde")]
        [path, puzzle] => check_file(path, Some(puzzle.as_str())),
        _ => Err("usage: obelisk [snapshot.json [puzzle-id]]".into()),
    };
    if let Err(e) = res {
        eprintln!("obelisk: {e}");
        std::process::exit(1);
    }
}

#[test]
fn test_security_alarm() {
    let mut bench = security_alarm().unwrap();
    assert_eq!(bench.netlist().len(), 6);
    assert_eq!(bench.verify(), Some(VerificationResult::Satisfied));
    let err = place(&mut bench, GateKind::Or, "either").unwrap_err();
    assert_eq!(err.to_string(), "a gate named 'either' already exists");
}
