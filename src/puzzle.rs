/*!

  Checking a circuit against a puzzle's target boolean function.

  A puzzle names its input switches and gives the expected output for every
  combination of them. [check] drives the switches through all `2^n` rows,
  evaluates the circuit each time and compares the single output reachable
  from those switches against the target.

  Row `i` of a table assigns input `j` the bit `n - 1 - j` of `i`, so the
  first-named input is the most significant bit.

*/

use crate::circuit::{GateId, Identifier};
use crate::error::{CircuitError, Result};
use crate::expr::Expr;
use crate::graph::{FanOutTable, TopoOrder};
use crate::netlist::Netlist;
use bitvec::vec::BitVec;
use std::collections::{BTreeSet, HashSet};
use std::ops::{Deref, DerefMut};

/// The most inputs a target function may have
pub const MAX_INPUTS: usize = 16;

/// Returns the value of each input in row `row` of a table with `inputs` inputs
pub fn row_assignment(inputs: usize, row: usize) -> Vec<bool> {
    (0..inputs)
        .map(|j| (row >> (inputs - 1 - j)) & 1 == 1)
        .collect()
}

/// A boolean function of `n` inputs stored as one bit per row
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct TruthTable {
    inputs: usize,
    bits: BitVec,
}

impl TruthTable {
    /// Tabulates `f` over every assignment of `inputs` inputs
    pub fn from_fn(inputs: usize, f: impl Fn(&[bool]) -> bool) -> Result<Self> {
        if inputs > MAX_INPUTS {
            return Err(CircuitError::TooManyInputs(inputs));
        }
        let bits: BitVec = (0..1usize << inputs)
            .map(|row| f(&row_assignment(inputs, row)))
            .collect();
        Ok(Self { inputs, bits })
    }

    /// Tabulates an expression over the given inputs, in order.
    /// Fails if the expression uses a name that isn't an input.
    pub fn from_expr(inputs: &[Identifier], expr: &Expr) -> Result<Self> {
        if let Some(unknown) = expr.variables().into_iter().find(|v| !inputs.contains(*v)) {
            return Err(CircuitError::UnknownVariable(unknown.clone()));
        }
        if inputs.len() > MAX_INPUTS {
            return Err(CircuitError::TooManyInputs(inputs.len()));
        }
        let mut bits: BitVec = BitVec::with_capacity(1 << inputs.len());
        for row in 0..1usize << inputs.len() {
            let assignment = row_assignment(inputs.len(), row);
            let env = |name: &Identifier| {
                inputs
                    .iter()
                    .position(|i| i == name)
                    .map(|j| assignment[j])
            };
            bits.push(expr.eval(&env)?);
        }
        Ok(Self {
            inputs: inputs.len(),
            bits,
        })
    }

    /// Returns the number of inputs
    pub fn num_inputs(&self) -> usize {
        self.inputs
    }

    /// Returns the number of rows, `2^n`
    pub fn rows(&self) -> usize {
        self.bits.len()
    }

    /// Returns the output for row `row`
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn get(&self, row: usize) -> bool {
        self.bits[row]
    }

    /// Returns the rows whose output is true
    pub fn minterms(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

impl std::fmt::Display for TruthTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}'b{}",
            self.bits.len(),
            self.bits
                .iter()
                .rev()
                .map(|b| if *b { '1' } else { '0' })
                .collect::<String>()
        )
    }
}

/// The target a circuit must implement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleSpec {
    id: String,
    title: String,
    inputs: Vec<Identifier>,
    target: TruthTable,
    expr: Option<Expr>,
}

impl PuzzleSpec {
    fn check_inputs(inputs: &[Identifier]) -> Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = inputs.iter().find(|i| !seen.insert(*i)) {
            return Err(CircuitError::DuplicateName(dup.clone()));
        }
        Ok(())
    }

    /// Creates a puzzle whose target is the function `f` over `inputs`
    pub fn from_fn(
        id: &str,
        inputs: Vec<Identifier>,
        f: impl Fn(&[bool]) -> bool,
    ) -> Result<Self> {
        Self::check_inputs(&inputs)?;
        let target = TruthTable::from_fn(inputs.len(), f)?;
        Ok(Self {
            id: id.to_string(),
            title: id.to_string(),
            inputs,
            target,
            expr: None,
        })
    }

    /// Creates a puzzle whose target is a closed-form expression over `inputs`
    pub fn from_expr(id: &str, inputs: Vec<Identifier>, expr: &str) -> Result<Self> {
        Self::check_inputs(&inputs)?;
        let expr: Expr = expr.parse()?;
        let target = TruthTable::from_expr(&inputs, &expr)?;
        Ok(Self {
            id: id.to_string(),
            title: id.to_string(),
            inputs,
            target,
            expr: Some(expr),
        })
    }

    /// Sets a human-readable title
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Returns the puzzle id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the puzzle title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the names of the input switches, most significant first
    pub fn inputs(&self) -> &[Identifier] {
        &self.inputs
    }

    /// Returns the target truth table
    pub fn target(&self) -> &TruthTable {
        &self.target
    }

    /// Returns the closed-form target, if the puzzle was stated as one
    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }
}

/// One input combination on which a circuit disagrees with the target
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Counterexample {
    /// The switch settings for this row
    pub assignment: Vec<(Identifier, bool)>,
    /// What the target function gives
    pub expected: bool,
    /// What the circuit gives
    pub actual: bool,
}

impl std::fmt::Display for Counterexample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.assignment {
            write!(f, "{}={} ", name, u8::from(*value))?;
        }
        write!(
            f,
            "-> expected {}, got {}",
            u8::from(self.expected),
            u8::from(self.actual)
        )
    }
}

/// The outcome of a completed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The circuit matches the target on every row
    Satisfied,
    /// The circuit disagrees on the listed rows
    Unsatisfied(Vec<Counterexample>),
}

impl Verdict {
    /// Returns `true` if the circuit implements the target
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }
}

/// Holds the netlist while switches are being driven, and puts every gate
/// value back the way it was when dropped.
pub struct SwitchGuard<'a> {
    netlist: &'a mut Netlist,
    saved: Vec<(GateId, bool)>,
}

impl<'a> SwitchGuard<'a> {
    /// Records the current value of every gate
    pub fn new(netlist: &'a mut Netlist) -> Self {
        let saved = netlist.gates().map(|g| (g.id(), g.value())).collect();
        Self { netlist, saved }
    }
}

impl Deref for SwitchGuard<'_> {
    type Target = Netlist;

    fn deref(&self) -> &Self::Target {
        &*self.netlist
    }
}

impl DerefMut for SwitchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.netlist
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        let saved: std::collections::HashMap<GateId, bool> = self.saved.drain(..).collect();
        for gate in self.netlist.gates_mut() {
            if let Some(v) = saved.get(&gate.id()) {
                gate.set_value(*v);
            }
        }
    }
}

/// Looks up the switch for each named input
fn resolve_inputs(netlist: &Netlist, inputs: &[Identifier]) -> Result<Vec<GateId>> {
    inputs
        .iter()
        .map(|name| {
            let gate = netlist
                .find(name.get_name())
                .ok_or_else(|| CircuitError::UnknownInput(name.clone()))?;
            if !gate.is_switch() {
                return Err(CircuitError::NotASwitch(gate.id()));
            }
            Ok(gate.id())
        })
        .collect()
}

/// Returns the one output gate reachable from `switches`
pub fn designated_output(netlist: &Netlist, switches: &[GateId]) -> Result<GateId> {
    let fan_out = netlist.get_analysis::<FanOutTable>()?;
    let reachable: BTreeSet<GateId> = fan_out.reachable_from(switches.iter().copied());
    let outputs: Vec<GateId> = netlist
        .outputs()
        .map(|g| g.id())
        .filter(|id| reachable.contains(id))
        .collect();
    match outputs.as_slice() {
        [] => Err(CircuitError::NoOutput),
        [only] => Ok(*only),
        _ => Err(CircuitError::AmbiguousOutput(outputs)),
    }
}

/// Reads the truth table the circuit actually implements over the named
/// switches. Every switch and gate value is restored before returning.
pub fn tabulate(netlist: &mut Netlist, inputs: &[Identifier]) -> Result<TruthTable> {
    if inputs.len() > MAX_INPUTS {
        return Err(CircuitError::TooManyInputs(inputs.len()));
    }
    let switches = resolve_inputs(netlist, inputs)?;
    // A loop anywhere makes the circuit unevaluable, whichever output is picked
    netlist.get_analysis::<TopoOrder>()?;
    let output = designated_output(netlist, &switches)?;

    let mut guard = SwitchGuard::new(netlist);
    let mut bits: BitVec = BitVec::with_capacity(1 << switches.len());
    for row in 0..1usize << switches.len() {
        for (&id, value) in switches.iter().zip(row_assignment(switches.len(), row)) {
            guard.set_switch(id, value)?;
        }
        let evaluation = guard.evaluate()?;
        bits.push(evaluation.value(output).unwrap_or(false));
    }
    Ok(TruthTable {
        inputs: switches.len(),
        bits,
    })
}

/// Decides whether the circuit implements the puzzle's target function.
///
/// Fails with [CircuitError::CyclicCircuit] if the circuit can't be evaluated,
/// otherwise with [CircuitError::NoOutput] or [CircuitError::AmbiguousOutput]
/// unless exactly one output is reachable from the inputs. The netlist
/// is left exactly as it was, whatever the outcome.
pub fn check(netlist: &mut Netlist, spec: &PuzzleSpec) -> Result<Verdict> {
    let observed = tabulate(netlist, spec.inputs())?;
    let target = spec.target();
    let failures: Vec<Counterexample> = (0..target.rows())
        .filter(|&row| observed.get(row) != target.get(row))
        .map(|row| Counterexample {
            assignment: spec
                .inputs()
                .iter()
                .cloned()
                .zip(row_assignment(target.num_inputs(), row))
                .collect(),
            expected: target.get(row),
            actual: observed.get(row),
        })
        .collect();

    log::info!(
        "{} against {}: {} of {} rows wrong",
        netlist.get_name(),
        spec.id(),
        failures.len(),
        target.rows()
    );
    if failures.is_empty() {
        Ok(Verdict::Satisfied)
    } else {
        Ok(Verdict::Unsatisfied(failures))
    }
}

/// The pass/fail state reported to the caller after a check.
/// Unlike [Verdict], this also covers the checks that could not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(tag = "status", content = "detail", rename_all = "snake_case")
)]
pub enum VerificationResult {
    /// The circuit implements the target
    Satisfied,
    /// The circuit is wrong on these rows
    Unsatisfied(Vec<Counterexample>),
    /// More than one output is wired to the inputs
    AmbiguousOutput(Vec<GateId>),
    /// No output is wired to the inputs
    NoOutput,
    /// The circuit has a loop through this gate
    CyclicCircuit(GateId),
    /// The check was rejected for another reason, such as a missing switch
    Invalid(String),
}

impl From<Result<Verdict>> for VerificationResult {
    fn from(res: Result<Verdict>) -> Self {
        match res {
            Ok(Verdict::Satisfied) => VerificationResult::Satisfied,
            Ok(Verdict::Unsatisfied(rows)) => VerificationResult::Unsatisfied(rows),
            Err(CircuitError::AmbiguousOutput(ids)) => VerificationResult::AmbiguousOutput(ids),
            Err(CircuitError::NoOutput) => VerificationResult::NoOutput,
            Err(CircuitError::CyclicCircuit(id)) => VerificationResult::CyclicCircuit(id),
            Err(e) => VerificationResult::Invalid(e.to_string()),
        }
    }
}

/// A puzzle shipped with the sandbox
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Stable id used to look the puzzle up
    pub id: &'static str,
    /// Shown to the player
    pub title: &'static str,
    /// Input switch names, most significant first
    pub inputs: &'static [&'static str],
    /// Target as a closed-form expression
    pub expr: &'static str,
}

impl CatalogEntry {
    /// Builds the puzzle specification for this entry
    pub fn spec(&self) -> Result<PuzzleSpec> {
        let inputs = self.inputs.iter().map(|&i| Identifier::from(i)).collect();
        Ok(PuzzleSpec::from_expr(self.id, inputs, self.expr)?.with_title(self.title))
    }
}

/// The built-in puzzles
pub const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        id: "wiring_gates",
        title: "Wiring Gates",
        inputs: &["a", "b"],
        expr: "a AND b",
    },
    CatalogEntry {
        id: "security_alarm",
        title: "Security Alarm",
        inputs: &["door1", "door2", "armed"],
        expr: "(door1 OR door2) AND armed",
    },
    CatalogEntry {
        id: "majority_vote",
        title: "Majority Vote",
        inputs: &["a", "b", "c"],
        expr: "(a AND b) OR (b AND c) OR (a AND c)",
    },
    CatalogEntry {
        id: "smart_lock",
        title: "Smart Lock",
        inputs: &["key", "code", "override"],
        expr: "(key AND code) OR override",
    },
];

/// Looks up a built-in puzzle by id
pub fn find(id: &str) -> Option<Result<PuzzleSpec>> {
    CATALOG.iter().find(|e| e.id == id).map(CatalogEntry::spec)
}
