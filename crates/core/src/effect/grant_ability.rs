//! Ability grant keyed by node level.

use crate::ports::{AbilityGrant, HostEnv, PortError};
use crate::simulation::SimulationBus;

use super::{Effect, EffectTarget};

/// Grants an ability class while the node is assigned, re-granting at
/// the new level on level changes and revoking at level zero.
#[derive(Clone, Debug)]
pub struct GrantAbilityEffect {
    pub class: String,
    pub input_slot: Option<i32>,
    grant: Option<AbilityGrant>,
}

impl GrantAbilityEffect {
    pub fn new(class: impl Into<String>, input_slot: Option<i32>) -> Self {
        Self {
            class: class.into(),
            input_slot,
            grant: None,
        }
    }

    fn regrant(&mut self, env: &mut HostEnv<'_>, level: i32) -> Result<(), PortError> {
        let host = env.abilities()?;
        if let Some(grant) = self.grant.take() {
            host.remove_ability(grant)?;
        }
        if level > 0 {
            self.grant = Some(host.grant_ability(&self.class, level, self.input_slot)?);
        }
        Ok(())
    }
}

impl Effect for GrantAbilityEffect {
    fn on_level_up(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        _old_level: i32,
    ) -> Result<(), PortError> {
        self.regrant(env, new_level)
    }

    fn on_level_down(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        _old_level: i32,
    ) -> Result<(), PortError> {
        self.regrant(env, new_level)
    }

    // Ability grants carry no numeric payload conditions understand.
    fn populate_simulation_data(
        &self,
        _target: &EffectTarget,
        _effective_level: i32,
        _simulating_reversal: bool,
        _bus: &mut SimulationBus,
    ) {
    }

    fn tooltip_text(&self, _target: &EffectTarget) -> String {
        format!("Grants {}", self.class)
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}
