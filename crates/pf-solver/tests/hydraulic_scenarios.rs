//! Hydraulic scenarios on small networks.

use std::sync::Arc;

use pf_core::units::{bar, k, kgps, km, m};
use pf_fluids::Fluid;
use pf_net::*;
use pf_solver::{FrictionModel, LinearSolverKind, OptionsOverride, PipeflowContext, SolverError};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn options() -> OptionsOverride {
    OptionsOverride::default().iter(30)
}

/// Slack at j0 (5 bar, 360 K), one pipe, 1 kg/s drawn at j1.
fn two_junctions() -> Net {
    let mut net = Net::new("two junctions").with_fluid(Arc::new(Fluid::water()));
    let j0 = net.junction.push(Junction::new(bar(5.0), k(360.0)));
    let j1 = net.junction.push(Junction::new(bar(5.0), k(360.0)));
    net.pipe.push(Pipe::new(j0, j1, km(0.1), m(0.05)));
    net.ext_grid
        .push(ExtGrid::new(j0, bar(5.0), k(360.0), ExtGridType::Pt));
    net.sink.push(Sink::new(j1, kgps(1.0)));
    net
}

#[test]
fn sink_draws_its_demand() {
    init_logging();
    let net = two_junctions();
    let mut ctx = PipeflowContext::new();
    let report = ctx.pipeflow(&net, &options()).unwrap();
    assert!(report.converged);
    assert!(report.hydraulics.is_some_and(|h| h.converged));
    assert!(report.heat.is_none());

    let pipe = ctx.result(&net, "pipe").unwrap();
    let mdot = pipe.get("mdot_from_kg_per_s", 0).unwrap();
    assert!((mdot - 1.0).abs() <= 1e-5, "pipe mass flow {mdot}");
    assert!((pipe.get("mdot_to_kg_per_s", 0).unwrap() + mdot).abs() < 1e-12);

    let junction = ctx.result(&net, "junction").unwrap();
    assert!((junction.get("p_bar", 0).unwrap() - 5.0).abs() < 1e-12);
    assert!(junction.get("p_bar", 1).unwrap() < 5.0);
    // No thermal calculation: temperatures stay at their initial values.
    assert_eq!(junction.get("t_k", 1), Some(360.0));
}

#[test]
fn slack_supplies_the_sink() {
    let net = two_junctions();
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &options()).unwrap();
    let ext_grid = ctx.result(&net, "ext_grid").unwrap();
    let sink = ctx.result(&net, "sink").unwrap();
    let supplied = ext_grid.get("mdot_kg_per_s", 0).unwrap();
    let drawn = sink.get("mdot_kg_per_s", 0).unwrap();
    assert!((supplied + drawn).abs() < 1e-8, "{supplied} vs {drawn}");
}

#[test]
fn two_grids_share_the_slack_flow() {
    let mut net = two_junctions();
    net.ext_grid
        .push(ExtGrid::new(0, bar(5.0), k(360.0), ExtGridType::P));
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &options()).unwrap();
    let ext_grid = ctx.result(&net, "ext_grid").unwrap();
    let a = ext_grid.get("mdot_kg_per_s", 0).unwrap();
    let b = ext_grid.get("mdot_kg_per_s", 1).unwrap();
    assert!((a - b).abs() < 1e-12);
    assert!((a + b + 1.0).abs() < 1e-8);
}

#[test]
fn temperature_grid_reports_no_slack_flow() {
    let mut net = two_junctions();
    net.ext_grid
        .push(ExtGrid::new(1, bar(5.0), k(350.0), ExtGridType::T));
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &options()).unwrap();
    let ext_grid = ctx.result(&net, "ext_grid").unwrap();
    assert!((ext_grid.get("mdot_kg_per_s", 0).unwrap() + 1.0).abs() < 1e-8);
    assert!(ext_grid.get("mdot_kg_per_s", 1).unwrap().is_nan());
}

#[test]
fn friction_models_agree_roughly() {
    let net = two_junctions();
    let mut drops = Vec::new();
    for model in [
        FrictionModel::Nikuradse,
        FrictionModel::SwameeJain,
        FrictionModel::Colebrook,
    ] {
        let mut ctx = PipeflowContext::new();
        ctx.pipeflow(&net, &options().friction_model(model)).unwrap();
        let p1 = ctx.result(&net, "junction").unwrap().get("p_bar", 1).unwrap();
        drops.push(5.0 - p1);
    }
    assert!(drops.iter().all(|&d| d > 0.0));
    // Swamee-Jain approximates colebrook within a few percent.
    assert!((drops[1] - drops[2]).abs() / drops[2] < 0.05, "{drops:?}");
}

#[test]
fn sparse_and_dense_solvers_agree() {
    // Meshed: j0 feeds j1 and j2, which are also connected to each other.
    let mut net = Net::new("mesh").with_fluid(Arc::new(Fluid::water()));
    let j: Vec<usize> = (0..4)
        .map(|_| net.junction.push(Junction::new(bar(4.0), k(330.0))))
        .collect();
    net.pipe.push(Pipe::new(j[0], j[1], km(0.3), m(0.1)));
    net.pipe.push(Pipe::new(j[0], j[2], km(0.5), m(0.08)));
    net.pipe.push(Pipe::new(j[1], j[2], km(0.2), m(0.05)));
    net.pipe.push(Pipe::new(j[2], j[3], km(0.4), m(0.1)).with_sections(3));
    net.ext_grid
        .push(ExtGrid::new(j[0], bar(4.0), k(330.0), ExtGridType::Pt));
    net.sink.push(Sink::new(j[1], kgps(2.0)));
    net.sink.push(Sink::new(j[3], kgps(3.0)));

    let mut results = Vec::new();
    for kind in [LinearSolverKind::SparseLu, LinearSolverKind::DenseLu] {
        let over = OptionsOverride {
            linear_solver: Some(kind),
            ..options().friction_model(FrictionModel::Colebrook)
        };
        let mut ctx = PipeflowContext::new();
        ctx.pipeflow(&net, &over).unwrap();
        results.push(ctx.result(&net, "junction").unwrap());
    }
    let sparse = results[0].column("p_bar").unwrap();
    let dense = results[1].column("p_bar").unwrap();
    for (a, b) in sparse.iter().zip(dense) {
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }
}

#[test]
fn parallel_kernel_reproduces_serial_results() {
    let net = two_junctions();
    let mut pressures = Vec::new();
    for parallel in [false, true] {
        let over = OptionsOverride {
            use_parallel_kernels: Some(parallel),
            ..options()
        };
        let mut ctx = PipeflowContext::new();
        ctx.pipeflow(&net, &over).unwrap();
        pressures.push(ctx.result(&net, "junction").unwrap().get("p_bar", 1).unwrap());
    }
    assert_eq!(pressures[0], pressures[1]);
}

#[test]
fn missing_ext_grid_is_not_converged() {
    init_logging();
    let mut net = two_junctions();
    net.ext_grid = Table::new("ext_grid");
    let mut ctx = PipeflowContext::new();
    let err = ctx.pipeflow(&net, &options()).unwrap_err();
    assert!(err.is_not_converged());
    assert!(err.to_string().contains("external grid"));
    assert!(ctx.state().is_none());
}

#[test]
fn iteration_cap_fails_without_results() {
    let net = two_junctions();
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &options()).unwrap();
    let err = ctx
        .pipeflow(&net, &OptionsOverride::default().iter(1))
        .unwrap_err();
    assert!(err.is_not_converged());
    assert!(matches!(
        ctx.result(&net, "junction"),
        Err(SolverError::InvalidState { .. })
    ));
}

#[test]
fn empty_network_is_a_setup_error() {
    let net = Net::new("empty").with_fluid(Arc::new(Fluid::water()));
    let mut ctx = PipeflowContext::new();
    assert!(matches!(
        ctx.pipeflow(&net, &options()),
        Err(SolverError::ProblemSetup { .. })
    ));
}
