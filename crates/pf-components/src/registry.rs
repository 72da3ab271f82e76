//! Ordered component registry.

use crate::circulation_pump::{CircPumpMassComponent, CircPumpPressureComponent};
use crate::ext_grid::ExtGridComponent;
use crate::flow_control::FlowControlComponent;
use crate::heat_exchanger::HeatExchangerComponent;
use crate::junction::JunctionComponent;
use crate::pipe::PipeComponent;
use crate::pressure_control::PressureControlComponent;
use crate::pump::PumpComponent;
use crate::sink_source::{SinkComponent, SourceComponent};
use crate::traits::{Component, ComponentKind};
use crate::valve::ValveComponent;

use tracing::debug;

/// Components in pit order: node tables, branch tables, node elements.
///
/// Registration keeps that order regardless of the call sequence; within a
/// kind the registration order is kept.
pub struct ComponentRegistry {
    components: Vec<Box<dyn Component>>,
}

impl ComponentRegistry {
    pub fn empty() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// All built-in components.
    pub fn standard() -> Self {
        let mut reg = Self::empty();
        reg.register(Box::new(JunctionComponent));
        reg.register(Box::new(PipeComponent));
        reg.register(Box::new(ValveComponent));
        reg.register(Box::new(PumpComponent));
        reg.register(Box::new(FlowControlComponent));
        reg.register(Box::new(PressureControlComponent));
        reg.register(Box::new(HeatExchangerComponent));
        reg.register(Box::new(CircPumpPressureComponent));
        reg.register(Box::new(CircPumpMassComponent));
        reg.register(Box::new(ExtGridComponent));
        reg.register(Box::new(SinkComponent));
        reg.register(Box::new(SourceComponent));
        reg
    }

    /// Add a component; a component with the same table name is replaced.
    pub fn register(&mut self, component: Box<dyn Component>) {
        if let Some(pos) = self
            .components
            .iter()
            .position(|c| c.table_name() == component.table_name())
        {
            debug!(table = component.table_name(), "replacing registered component");
            self.components[pos] = component;
            return;
        }
        let rank = kind_rank(component.kind());
        let at = self
            .components
            .iter()
            .position(|c| kind_rank(c.kind()) > rank)
            .unwrap_or(self.components.len());
        self.components.insert(at, component);
    }

    pub fn get(&self, table: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.table_name() == table)
            .map(|c| c.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.components.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn kind_rank(kind: ComponentKind) -> u8 {
    match kind {
        ComponentKind::Node => 0,
        ComponentKind::Branch => 1,
        ComponentKind::NodeElement => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order() {
        let reg = ComponentRegistry::standard();
        let names: Vec<_> = reg.iter().map(|c| c.table_name()).collect();
        assert_eq!(names[0], "junction");
        assert_eq!(names[1], "pipe");
        assert_eq!(names.last(), Some(&"source"));
        let first_element = names.iter().position(|n| *n == "ext_grid").unwrap();
        assert!(
            reg.iter()
                .skip(first_element)
                .all(|c| c.kind() == ComponentKind::NodeElement)
        );
    }

    #[test]
    fn node_element_registered_first_still_goes_last() {
        let mut reg = ComponentRegistry::empty();
        reg.register(Box::new(SinkComponent));
        reg.register(Box::new(PipeComponent));
        reg.register(Box::new(JunctionComponent));
        let names: Vec<_> = reg.iter().map(|c| c.table_name()).collect();
        assert_eq!(names, vec!["junction", "pipe", "sink"]);
        reg.register(Box::new(PipeComponent));
        assert_eq!(reg.len(), 3);
    }
}
