//! Solver options and their layering.
//!
//! [`PipeflowOptions`] holds every named parameter with its default.
//! [`OptionsOverride`] is the sparse form used for stored user options and
//! per-call overrides; it is what YAML/JSON option files deserialize into.
//! Later layers win: defaults < user options < call overrides.

use std::collections::BTreeMap;

use pf_components::ComponentSettings;
use pf_pit::ConnectivityOptions;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{SolverError, SolverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrictionModel {
    /// Laminar part plus rough-pipe limit; needs no inner iteration.
    #[default]
    Nikuradse,
    SwameeJain,
    /// Implicit formula solved by fixed-point iteration.
    Colebrook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonlinearMethod {
    #[default]
    Constant,
    /// Adapt the damping factor to the progress of the iteration.
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConvergenceCriterion {
    Change,
    RelativeChange,
    Residual,
    #[default]
    Combined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveMode {
    #[default]
    Hydraulics,
    Heat,
    Sequential,
    Bidirectional,
    /// Deprecated spelling of `sequential`.
    All,
}

impl SolveMode {
    /// `All` maps to `Sequential`.
    pub fn normalized(self) -> Self {
        match self {
            SolveMode::All => SolveMode::Sequential,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolveMode::Hydraulics => "hydraulics",
            SolveMode::Heat => "heat",
            SolveMode::Sequential => "sequential",
            SolveMode::Bidirectional => "bidirectional",
            SolveMode::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinearSolverKind {
    #[default]
    SparseLu,
    DenseLu,
}

/// All solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeflowOptions {
    pub friction_model: FrictionModel,
    /// Pressure change tolerance [bar].
    pub tol_p: f64,
    /// Mass flow change tolerance [kg/s].
    pub tol_m: f64,
    /// Temperature change tolerance [K].
    pub tol_t: f64,
    pub tol_res: f64,
    pub max_iter_hyd: usize,
    pub max_iter_therm: usize,
    pub max_iter_bidirect: usize,
    pub max_iter_colebrook: usize,
    /// Damping factor of the Newton update.
    pub alpha: f64,
    pub nonlinear_method: NonlinearMethod,
    pub convergence_criterion: ConvergenceCriterion,
    pub mode: SolveMode,
    /// Default ambient temperature of pipes [K].
    pub ambient_temperature: f64,
    pub check_connectivity: bool,
    pub quit_on_inconsistency_connectivity: bool,
    pub use_parallel_kernels: bool,
    pub linear_solver: LinearSolverKind,
    pub thermal_flow_count_threshold: f64,
    /// Velocity of the initial mass flow guess [m/s].
    pub initial_velocity: f64,
}

impl Default for PipeflowOptions {
    fn default() -> Self {
        Self {
            friction_model: FrictionModel::Nikuradse,
            tol_p: 1e-5,
            tol_m: 1e-5,
            tol_t: 1e-3,
            tol_res: 1e-3,
            max_iter_hyd: 10,
            max_iter_therm: 10,
            max_iter_bidirect: 10,
            max_iter_colebrook: 100,
            alpha: 1.0,
            nonlinear_method: NonlinearMethod::Constant,
            convergence_criterion: ConvergenceCriterion::Combined,
            mode: SolveMode::Hydraulics,
            ambient_temperature: 293.15,
            check_connectivity: true,
            quit_on_inconsistency_connectivity: false,
            use_parallel_kernels: false,
            linear_solver: LinearSolverKind::SparseLu,
            thermal_flow_count_threshold: 0.1,
            initial_velocity: 0.1,
        }
    }
}

/// Sparse set of option values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsOverride {
    pub friction_model: Option<FrictionModel>,
    pub tol_p: Option<f64>,
    pub tol_m: Option<f64>,
    pub tol_t: Option<f64>,
    pub tol_res: Option<f64>,
    /// Shorthand for all three outer iteration caps.
    pub iter: Option<usize>,
    pub max_iter_hyd: Option<usize>,
    pub max_iter_therm: Option<usize>,
    pub max_iter_bidirect: Option<usize>,
    pub max_iter_colebrook: Option<usize>,
    pub alpha: Option<f64>,
    pub nonlinear_method: Option<NonlinearMethod>,
    pub convergence_criterion: Option<ConvergenceCriterion>,
    pub mode: Option<SolveMode>,
    pub ambient_temperature: Option<f64>,
    pub check_connectivity: Option<bool>,
    pub quit_on_inconsistency_connectivity: Option<bool>,
    pub use_parallel_kernels: Option<bool>,
    pub linear_solver: Option<LinearSolverKind>,
    pub thermal_flow_count_threshold: Option<f64>,
    pub initial_velocity: Option<f64>,
    /// Keys that are not solver options; logged and otherwise ignored.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl OptionsOverride {
    pub fn from_yaml_str(text: &str) -> SolverResult<Self> {
        serde_yaml::from_str(text).map_err(|e| SolverError::ProblemSetup {
            what: format!("invalid options: {e}"),
        })
    }

    pub fn from_json_str(text: &str) -> SolverResult<Self> {
        serde_json::from_str(text).map_err(|e| SolverError::ProblemSetup {
            what: format!("invalid options: {e}"),
        })
    }

    pub fn mode(mut self, mode: SolveMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn friction_model(mut self, model: FrictionModel) -> Self {
        self.friction_model = Some(model);
        self
    }

    pub fn iter(mut self, iter: usize) -> Self {
        self.iter = Some(iter);
        self
    }

    /// Combine two layers; values of `later` win.
    pub fn merged(&self, later: &OptionsOverride) -> OptionsOverride {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                OptionsOverride {
                    $($field: later.$field.or(self.$field),)*
                    unknown: self
                        .unknown
                        .iter()
                        .chain(&later.unknown)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                }
            };
        }
        pick!(
            friction_model,
            tol_p,
            tol_m,
            tol_t,
            tol_res,
            iter,
            max_iter_hyd,
            max_iter_therm,
            max_iter_bidirect,
            max_iter_colebrook,
            alpha,
            nonlinear_method,
            convergence_criterion,
            mode,
            ambient_temperature,
            check_connectivity,
            quit_on_inconsistency_connectivity,
            use_parallel_kernels,
            linear_solver,
            thermal_flow_count_threshold,
            initial_velocity,
        )
    }
}

impl PipeflowOptions {
    /// Apply `over` on top of these options.
    pub fn layered(&self, over: &OptionsOverride) -> PipeflowOptions {
        let mut out = self.clone();
        for key in over.unknown.keys() {
            info!(option = %key, "ignoring unknown pipeflow option");
        }

        if let Some(iter) = over.iter {
            for (specific, target, name) in [
                (over.max_iter_hyd, &mut out.max_iter_hyd, "max_iter_hyd"),
                (over.max_iter_therm, &mut out.max_iter_therm, "max_iter_therm"),
                (over.max_iter_bidirect, &mut out.max_iter_bidirect, "max_iter_bidirect"),
            ] {
                match specific {
                    Some(v) => {
                        info!(iter, option = name, value = v, "specific iteration cap overrides 'iter'");
                        *target = v;
                    }
                    None => *target = iter,
                }
            }
        } else {
            set(&mut out.max_iter_hyd, over.max_iter_hyd);
            set(&mut out.max_iter_therm, over.max_iter_therm);
            set(&mut out.max_iter_bidirect, over.max_iter_bidirect);
        }

        set(&mut out.friction_model, over.friction_model);
        set(&mut out.tol_p, over.tol_p);
        set(&mut out.tol_m, over.tol_m);
        set(&mut out.tol_t, over.tol_t);
        set(&mut out.tol_res, over.tol_res);
        set(&mut out.max_iter_colebrook, over.max_iter_colebrook);
        set(&mut out.alpha, over.alpha);
        set(&mut out.nonlinear_method, over.nonlinear_method);
        set(&mut out.convergence_criterion, over.convergence_criterion);
        set(&mut out.mode, over.mode);
        set(&mut out.ambient_temperature, over.ambient_temperature);
        set(&mut out.check_connectivity, over.check_connectivity);
        set(
            &mut out.quit_on_inconsistency_connectivity,
            over.quit_on_inconsistency_connectivity,
        );
        set(&mut out.use_parallel_kernels, over.use_parallel_kernels);
        set(&mut out.linear_solver, over.linear_solver);
        set(
            &mut out.thermal_flow_count_threshold,
            over.thermal_flow_count_threshold,
        );
        set(&mut out.initial_velocity, over.initial_velocity);

        if out.mode == SolveMode::All {
            warn!("mode 'all' is deprecated, use 'sequential'");
            out.mode = SolveMode::Sequential;
        }
        out
    }

    /// Reject values the solver cannot work with.
    pub fn validate(&self) -> SolverResult<()> {
        let positive = [
            ("tol_p", self.tol_p),
            ("tol_m", self.tol_m),
            ("tol_t", self.tol_t),
            ("tol_res", self.tol_res),
            ("initial_velocity", self.initial_velocity),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(SolverError::ProblemSetup {
                    what: format!("option {name} must be positive, got {v}"),
                });
            }
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("option alpha must be in (0, 1], got {}", self.alpha),
            });
        }
        if self.max_iter_hyd == 0 || self.max_iter_therm == 0 || self.max_iter_bidirect == 0 {
            return Err(SolverError::ProblemSetup {
                what: "iteration caps must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn connectivity_options(&self) -> ConnectivityOptions {
        ConnectivityOptions {
            check_connectivity: self.check_connectivity,
            quit_on_inconsistency: self.quit_on_inconsistency_connectivity,
            thermal_flow_count_threshold: self.thermal_flow_count_threshold,
        }
    }

    pub fn component_settings(&self) -> ComponentSettings {
        ComponentSettings {
            ambient_temperature: self.ambient_temperature,
            initial_velocity: self.initial_velocity,
        }
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}
