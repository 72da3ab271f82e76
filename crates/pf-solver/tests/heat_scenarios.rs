//! Thermal calculations after (or together with) the hydraulics.

use std::f64::consts::PI;
use std::sync::Arc;

use pf_core::units::{bar, k, kgps, km, m, watt};
use pf_fluids::{Fluid, FluidProperty, Phase};
use pf_net::*;
use pf_solver::{OptionsOverride, PipeflowContext, SolveMode, SolverError};

const T_FEED: f64 = 360.0;
const T_AMB: f64 = 280.0;
const CP: f64 = 4180.0;
const ALPHA: f64 = 10.0;
const LENGTH: f64 = 1000.0;
const D: f64 = 0.1;

fn constant_water() -> Fluid {
    Fluid::new(
        "constant water",
        Phase::Liquid,
        FluidProperty::constant(1000.0),
        FluidProperty::constant(1e-3),
        FluidProperty::constant(CP),
        None,
    )
    .unwrap()
}

fn insulated_line(fluid: Fluid) -> Net {
    let mut net = Net::new("heat loss").with_fluid(Arc::new(fluid));
    let j0 = net.junction.push(Junction::new(bar(5.0), k(T_FEED)));
    let j1 = net.junction.push(Junction::new(bar(5.0), k(T_FEED)));
    net.pipe.push(
        Pipe::new(j0, j1, km(LENGTH / 1000.0), m(D)).with_heat_transfer(ALPHA, Some(k(T_AMB))),
    );
    net.ext_grid
        .push(ExtGrid::new(j0, bar(5.0), k(T_FEED), ExtGridType::Pt));
    net.sink.push(Sink::new(j1, kgps(1.0)));
    net
}

/// Outlet temperature of the energy balance with the mean of inlet and
/// outlet as pipe temperature.
fn expected_outlet(mdot: f64) -> f64 {
    let kl = ALPHA * PI * D * LENGTH;
    let mcp = mdot * CP;
    (T_FEED * (mcp - 0.5 * kl) + kl * T_AMB) / (mcp + 0.5 * kl)
}

fn sequential() -> OptionsOverride {
    OptionsOverride::default().mode(SolveMode::Sequential).iter(30)
}

#[test]
fn heat_loss_along_a_pipe() {
    let net = insulated_line(constant_water());
    let mut ctx = PipeflowContext::new();
    let report = ctx.pipeflow(&net, &sequential()).unwrap();
    assert!(report.hydraulics.is_some());
    assert!(report.heat.is_some_and(|h| h.converged));

    let expected = expected_outlet(1.0);
    let junction = ctx.result(&net, "junction").unwrap();
    let t1 = junction.get("t_k", 1).unwrap();
    assert!((t1 - expected).abs() < 1e-4, "{t1} vs {expected}");
    assert!((junction.get("t_k", 0).unwrap() - T_FEED).abs() < 1e-12);

    let pipe = ctx.result(&net, "pipe").unwrap();
    assert!((pipe.get("t_to_k", 0).unwrap() - expected).abs() < 1e-4);
    assert_eq!(pipe.get("t_from_k", 0), Some(T_FEED));
}

#[test]
fn sections_refine_the_temperature_profile() {
    let mut net = insulated_line(constant_water());
    net.pipe.get_mut(0).unwrap().sections = 5;
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &sequential()).unwrap();
    let t1 = ctx.result(&net, "junction").unwrap().get("t_k", 1).unwrap();
    // Close to the exponential profile, and still between feed and ambient.
    let kl = ALPHA * PI * D * LENGTH;
    let exact = T_AMB + (T_FEED - T_AMB) * (-kl / CP).exp();
    assert!(t1 > T_AMB && t1 < T_FEED);
    assert!((t1 - exact).abs() < (expected_outlet(1.0) - exact).abs());
}

#[test]
fn heat_mode_reuses_the_previous_hydraulics() {
    let net = insulated_line(constant_water());
    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &OptionsOverride::default().iter(30)).unwrap();
    let p_hydraulic = ctx.result(&net, "junction").unwrap().get("p_bar", 1).unwrap();

    let report = ctx
        .pipeflow(&net, &OptionsOverride::default().mode(SolveMode::Heat))
        .unwrap();
    assert!(report.hydraulics.is_none());
    assert!(report.heat.is_some());

    let junction = ctx.result(&net, "junction").unwrap();
    assert_eq!(junction.get("p_bar", 1), Some(p_hydraulic));
    assert!((junction.get("t_k", 1).unwrap() - expected_outlet(1.0)).abs() < 1e-4);
}

#[test]
fn heat_mode_without_hydraulics_is_rejected() {
    let net = insulated_line(constant_water());
    let mut ctx = PipeflowContext::new();
    let err = ctx
        .pipeflow(&net, &OptionsOverride::default().mode(SolveMode::Heat))
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidState { .. }));
}

#[test]
fn heat_exchanger_extracts_heat() {
    let fluid = constant_water();
    let mut net = Net::new("heat exchanger").with_fluid(Arc::new(fluid));
    let j0 = net.junction.push(Junction::new(bar(5.0), k(T_FEED)));
    let j1 = net.junction.push(Junction::new(bar(5.0), k(T_FEED)));
    net.heat_exchanger
        .push(HeatExchanger::new(j0, j1, m(0.1), watt(41_800.0)));
    net.ext_grid
        .push(ExtGrid::new(j0, bar(5.0), k(T_FEED), ExtGridType::Pt));
    net.sink.push(Sink::new(j1, kgps(1.0)));

    let mut ctx = PipeflowContext::new();
    ctx.pipeflow(&net, &sequential()).unwrap();
    // 41.8 kW out of 1 kg/s at cp 4180 J/(kg K) cools by 10 K.
    let t1 = ctx.result(&net, "junction").unwrap().get("t_k", 1).unwrap();
    assert!((t1 - (T_FEED - 10.0)).abs() < 1e-4, "{t1}");
}

#[test]
fn bidirectional_converges_on_temperature_dependent_water() {
    let net = insulated_line(Fluid::water());
    let mut ctx = PipeflowContext::new();
    let over = OptionsOverride::default()
        .mode(SolveMode::Bidirectional)
        .iter(30);
    let report = ctx.pipeflow(&net, &over).unwrap().clone();
    assert!(report.converged);
    assert!(report.bidirectional_iterations >= 1);
    assert!(report.bidirectional_iterations <= 30);

    let t_bi = ctx.result(&net, "junction").unwrap().get("t_k", 1).unwrap();
    ctx.pipeflow(&net, &sequential()).unwrap();
    let t_seq = ctx.result(&net, "junction").unwrap().get("t_k", 1).unwrap();
    assert!((t_bi - t_seq).abs() < 1e-2, "{t_bi} vs {t_seq}");
}
