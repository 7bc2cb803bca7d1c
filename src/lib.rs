#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub)]
/*!

`obelisk-logic`

A combinational logic sandbox. Players place gates, draw wires and flip
switches; the [netlist::Netlist] keeps the circuit acyclic and every port
driven by at most one wire, [eval] computes every gate output, and [puzzle]
checks the circuit against a target truth table.

Circuits print as structural Verilog, load and store as JSON snapshots
(feature `serde`, on by default), and convert to a `petgraph` graph
(feature `graph`).

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("../demos/simple.rs")]
#![doc = "\n```"]

pub mod attribute;
pub mod circuit;
pub mod command;
pub mod error;
pub mod eval;
pub mod expr;
pub mod graph;
pub mod netlist;
pub mod puzzle;
pub mod snapshot;
pub mod util;
