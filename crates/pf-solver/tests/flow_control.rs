//! Flow controls next to a pipe, with and without unreachable parts.

use std::sync::Arc;

use pf_core::units::{bar, k, kgps, km, m};
use pf_fluids::Fluid;
use pf_net::*;
use pf_pit::columns::node;
use pf_solver::{OptionsOverride, PipeflowContext};

/// j0 feeds j1 through a pipe and a flow control at 2 kg/s; j1 draws 5 kg/s.
/// A second flow control is out of service.
fn network() -> Net {
    let mut net = Net::new("flow control").with_fluid(Arc::new(Fluid::water()));
    let j0 = net.junction.push(Junction::new(bar(5.0), k(293.15)));
    let j1 = net.junction.push(Junction::new(bar(5.0), k(293.15)));
    net.pipe.push(Pipe::new(j0, j1, km(0.2), m(0.1)));
    net.flow_control
        .push(FlowControl::new(j0, j1, kgps(2.0), m(0.05)));
    net.flow_control
        .push(FlowControl::new(j0, j1, kgps(1.0), m(0.05)).out_of_service());
    net.ext_grid
        .push(ExtGrid::new(j0, bar(5.0), k(293.15), ExtGridType::Pt));
    net.sink.push(Sink::new(j1, kgps(5.0)));
    net
}

/// Two junctions and a pipe plus a flow control between them, none of it
/// reachable from the grid.
fn add_unreachable(net: &mut Net) -> (usize, usize) {
    let j2 = net.junction.push(Junction::new(bar(5.0), k(293.15)));
    let j3 = net.junction.push(Junction::new(bar(5.0), k(293.15)));
    net.pipe.push(Pipe::new(j2, j3, km(0.1), m(0.1)));
    net.flow_control
        .push(FlowControl::new(j3, j2, kgps(1.0), m(0.05)));
    (j2, j3)
}

fn solve(net: &Net) -> PipeflowContext {
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(net, &OptionsOverride::default().iter(30)).unwrap();
    ctx
}

#[test]
fn controlled_flow_is_imposed() {
    let net = network();
    let ctx = solve(&net);
    let fc = ctx.result(&net, "flow_control").unwrap();
    let pipe = ctx.result(&net, "pipe").unwrap();
    assert!((fc.get("mdot_from_kg_per_s", 0).unwrap() - 2.0).abs() < 1e-8);
    assert!((pipe.get("mdot_from_kg_per_s", 0).unwrap() - 3.0).abs() < 1e-6);
    assert!(fc.get("mdot_from_kg_per_s", 1).unwrap().is_nan());
}

#[test]
fn unreachable_elements_are_nan_and_the_rest_is_unchanged() {
    let net = network();
    let reference = solve(&net);

    let mut extended = network();
    let (j2, j3) = add_unreachable(&mut extended);
    let ctx = solve(&extended);

    let junction = ctx.result(&extended, "junction").unwrap();
    assert!(junction.get("p_bar", j2).unwrap().is_nan());
    assert!(junction.get("p_bar", j3).unwrap().is_nan());
    assert!(ctx.result(&extended, "pipe").unwrap().get("mdot_from_kg_per_s", 1).unwrap().is_nan());
    assert!(ctx
        .result(&extended, "flow_control")
        .unwrap()
        .get("mdot_from_kg_per_s", 2)
        .unwrap()
        .is_nan());

    for (table, column, elements) in [
        ("junction", "p_bar", vec![0, 1]),
        ("pipe", "mdot_from_kg_per_s", vec![0]),
        ("flow_control", "mdot_from_kg_per_s", vec![0]),
        ("ext_grid", "mdot_kg_per_s", vec![0]),
    ] {
        let before = reference.result(&net, table).unwrap();
        let after = ctx.result(&extended, table).unwrap();
        for e in elements {
            let a = before.get(column, e).unwrap();
            let b = after.get(column, e).unwrap();
            assert!((a - b).abs() < 1e-10, "{table}.{column}[{e}]: {a} vs {b}");
        }
    }
}

#[test]
fn unreachable_rows_keep_their_initial_values() {
    let mut net = network();
    let (j2, _) = add_unreachable(&mut net);
    let ctx = solve(&net);
    let state = ctx.state().unwrap();
    let conn = state.hydraulics.as_ref().unwrap();
    assert_eq!(conn.n_nodes(), 2);
    let row = state.lookups.node.row_of("junction", j2).unwrap();
    assert!(!conn.nodes[row]);
    assert_eq!(state.node.get(row, node::PINIT), 5.0);
    assert_eq!(state.node.get(row, node::MDOTSLACKINIT), 0.0);
}
