//! Effect plugins: actions invoked on node level transitions.
//!
//! Effects observe transitions at node granularity: a jump from 2 to 5
//! fires one `on_level_up(5, 2)` and the implementation handles the
//! delta. For safety analysis, effects additionally describe their
//! hypothetical consequences on the simulation bus without mutating
//! anything.

mod apply_modifier;
mod grant_ability;
mod modify_property;

pub use apply_modifier::ApplyModifierEffect;
pub use grant_ability::GrantAbilityEffect;
pub use modify_property::ModifyPropertyEffect;

use crate::ids::NodeGuid;
use crate::ports::{HostEnv, PortError};
use crate::simulation::SimulationBus;

/// Owned snapshot of the emitting node, taken before the effect list is
/// borrowed mutably.
#[derive(Clone, Debug)]
pub struct EffectTarget {
    pub guid: NodeGuid,
    pub display_name: String,
}

/// Action plugin attached to a node.
///
/// Port failures from the host are reported upward but treated as
/// non-fatal by the node: the level transition stands, the failure is
/// logged.
pub trait Effect: Send {
    fn on_level_up(
        &mut self,
        env: &mut HostEnv<'_>,
        target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError>;

    fn on_level_down(
        &mut self,
        env: &mut HostEnv<'_>,
        target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError>;

    /// Forced reset to zero (respec, load). Defaults to a full
    /// level-down.
    fn on_node_reset(
        &mut self,
        env: &mut HostEnv<'_>,
        target: &EffectTarget,
        previous_level: i32,
    ) -> Result<(), PortError> {
        self.on_level_down(env, target, 0, previous_level)
    }

    /// Pushes payloads describing what this effect would contribute at
    /// `effective_level`, negated when `simulating_reversal`. Must not
    /// mutate host state.
    fn populate_simulation_data(
        &self,
        target: &EffectTarget,
        effective_level: i32,
        simulating_reversal: bool,
        bus: &mut SimulationBus,
    );

    fn tooltip_text(&self, target: &EffectTarget) -> String;

    fn clone_box(&self) -> Box<dyn Effect>;
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
