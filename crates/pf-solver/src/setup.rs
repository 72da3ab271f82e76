//! Construction of the lookups and the full internal tables.

use pf_components::{BuildContext, ComponentKind, ComponentRegistry, ComponentSettings};
use pf_fluids::FluidProvider;
use pf_net::Net;
use pf_pit::columns::{branch, node};
use pf_pit::{Lookups, Pit};
use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};

/// Allot the pit rows of every component.
///
/// Tables are registered in registry order, which lays out node tables
/// before branch tables. Branch tables with internal nodes (sectioned pipes)
/// also get a node table under their own name.
pub fn create_lookups(net: &Net, registry: &ComponentRegistry) -> SolverResult<Lookups> {
    let mut lookups = Lookups::default();
    for c in registry.iter() {
        match c.kind() {
            ComponentKind::Node => {
                lookups.node.add_table(c.table_name(), c.node_pit_rows(net))?;
            }
            ComponentKind::Branch => {
                let internal = c.node_pit_rows(net);
                if internal > 0 {
                    lookups.node.add_table(c.table_name(), internal)?;
                }
                lookups.branch.add_table(c.table_name(), c.branch_pit_rows(net))?;
            }
            ComponentKind::NodeElement => {}
        }
    }
    for c in registry.iter() {
        c.create_lookups(net, &mut lookups)?;
    }
    debug!(
        nodes = lookups.node.len(),
        branches = lookups.branch.len(),
        "created pit lookups"
    );
    Ok(lookups)
}

/// Allocate NaN filled pits and let every component write its rows.
///
/// All node entries are written before the first branch entry, so branch
/// rows see the final node temperatures and pressures.
pub fn initialize_pit(
    net: &Net,
    fluid: &dyn FluidProvider,
    registry: &ComponentRegistry,
    settings: &ComponentSettings,
    lookups: &Lookups,
) -> SolverResult<(Pit, Pit)> {
    let mut node_pit = Pit::nan(lookups.node.len(), node::COUNT);
    let mut branch_pit = Pit::nan(lookups.branch.len(), branch::COUNT);
    let mut ctx = BuildContext {
        net,
        fluid,
        settings,
        lookups,
        node: &mut node_pit,
        branch: &mut branch_pit,
    };
    for c in registry.iter() {
        c.create_pit_node_entries(&mut ctx)?;
    }
    for c in registry.iter() {
        c.create_pit_branch_entries(&mut ctx)?;
    }
    Ok((node_pit, branch_pit))
}

/// Stop early for networks without any node.
pub fn ensure_nodes(lookups: &Lookups) -> SolverResult<()> {
    if lookups.node.is_empty() {
        warn!("the network does not contain any nodes, nothing to calculate");
        return Err(SolverError::ProblemSetup {
            what: "the network does not contain any nodes".into(),
        });
    }
    Ok(())
}

/// Warn about element indices far beyond the table size.
///
/// Lookups map indices directly; very sparse indices hint at a
/// misconfiguration.
pub fn warn_high_index(table: &str, len: usize, max_index: Option<usize>) -> bool {
    let Some(max) = max_index else {
        return false;
    };
    let suspicious = if len > 100 {
        max > 1000 * len
    } else {
        max > 50_000
    };
    if suspicious {
        warn!(
            table,
            len, max_index = max, "element indices are very high compared to the table size"
        );
    }
    suspicious
}

/// Run [`warn_high_index`] on every input table.
pub fn check_indices(net: &Net) {
    let tables = [
        (net.junction.name(), net.junction.len(), net.junction.max_index()),
        (net.ext_grid.name(), net.ext_grid.len(), net.ext_grid.max_index()),
        (net.sink.name(), net.sink.len(), net.sink.max_index()),
        (net.source.name(), net.source.len(), net.source.max_index()),
        (net.pipe.name(), net.pipe.len(), net.pipe.max_index()),
        (net.valve.name(), net.valve.len(), net.valve.max_index()),
        (net.pump.name(), net.pump.len(), net.pump.max_index()),
        (
            net.flow_control.name(),
            net.flow_control.len(),
            net.flow_control.max_index(),
        ),
        (
            net.pressure_control.name(),
            net.pressure_control.len(),
            net.pressure_control.max_index(),
        ),
        (
            net.heat_exchanger.name(),
            net.heat_exchanger.len(),
            net.heat_exchanger.max_index(),
        ),
        (
            net.circ_pump_pressure.name(),
            net.circ_pump_pressure.len(),
            net.circ_pump_pressure.max_index(),
        ),
        (
            net.circ_pump_mass.name(),
            net.circ_pump_mass.len(),
            net.circ_pump_mass.max_index(),
        ),
    ];
    for (table, len, max) in tables {
        warn_high_index(table, len, max);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pf_core::units::{bar, k, kgps, m};
    use pf_fluids::Fluid;
    use pf_net::{ExtGrid, ExtGridType, Junction, Pipe, Sink};
    use pf_pit::NodeType;

    use super::*;

    fn small_net() -> Net {
        let mut net = Net::new("setup").with_fluid(Arc::new(Fluid::water()));
        let j0 = net.junction.push(Junction::new(bar(3.0), k(320.0)));
        let j1 = net.junction.push(Junction::new(bar(3.0), k(320.0)));
        net.pipe.push(Pipe::new(j0, j1, m(300.0), m(0.1)).with_sections(3));
        net.ext_grid
            .push(ExtGrid::new(j0, bar(3.0), k(330.0), ExtGridType::Pt));
        net.sink.push(Sink::new(j1, kgps(0.4)));
        net
    }

    #[test]
    fn sectioned_pipes_add_internal_nodes() {
        let net = small_net();
        let registry = ComponentRegistry::standard();
        let lookups = create_lookups(&net, &registry).unwrap();
        assert_eq!(lookups.node.range("junction"), Some(0..2));
        assert_eq!(lookups.node.range("pipe"), Some(2..4));
        assert_eq!(lookups.branch.range("pipe"), Some(0..3));
        assert_eq!(lookups.branch.range("valve"), Some(3..3));
    }

    #[test]
    fn pits_carry_slack_and_load() {
        let net = small_net();
        let registry = ComponentRegistry::standard();
        let lookups = create_lookups(&net, &registry).unwrap();
        let fluid = Fluid::water();
        let (node_pit, branch_pit) = initialize_pit(
            &net,
            &fluid,
            &registry,
            &ComponentSettings::default(),
            &lookups,
        )
        .unwrap();
        assert_eq!(
            NodeType::from_code(node_pit.get(0, node::NODE_TYPE)),
            Some(NodeType::P)
        );
        assert_eq!(node_pit.get(0, node::TINIT), 330.0);
        assert!((node_pit.get(1, node::LOAD) - 0.4).abs() < 1e-12);
        for r in 0..branch_pit.rows() {
            assert!((branch_pit.get(r, branch::LENGTH) - 100.0).abs() < 1e-9);
        }
        assert_eq!(branch_pit.get_index(0, branch::FROM_NODE), Some(0));
        assert_eq!(branch_pit.get_index(2, branch::TO_NODE), Some(1));
    }

    #[test]
    fn empty_network_is_a_setup_error() {
        let net = Net::new("empty");
        let lookups = create_lookups(&net, &ComponentRegistry::standard()).unwrap();
        assert!(matches!(
            ensure_nodes(&lookups),
            Err(SolverError::ProblemSetup { .. })
        ));
    }

    #[test]
    fn high_index_thresholds() {
        assert!(!warn_high_index("junction", 10, Some(40_000)));
        assert!(warn_high_index("junction", 10, Some(60_000)));
        assert!(warn_high_index("junction", 200, Some(300_000)));
        assert!(!warn_high_index("junction", 200, Some(150_000)));
        assert!(!warn_high_index("junction", 0, None));
    }
}
