//! Scalable attribute modifier through the ability host.

use crate::ports::{ActiveModifier, HostEnv, ModifierSpec, PortError};
use crate::simulation::{AttributeDelta, SimulationBus};

use super::{Effect, EffectTarget};

/// Applies a host-managed additive modifier scaled by node level.
///
/// Create-or-update: a level change removes the previous application
/// and reapplies at the new level, keyed by the stored handle.
#[derive(Clone, Debug)]
pub struct ApplyModifierEffect {
    pub spec: ModifierSpec,
    active: Option<ActiveModifier>,
}

impl ApplyModifierEffect {
    pub fn new(spec: ModifierSpec) -> Self {
        Self { spec, active: None }
    }

    fn reapply(&mut self, env: &mut HostEnv<'_>, level: i32) -> Result<(), PortError> {
        let host = env.abilities()?;
        if let Some(active) = self.active.take() {
            host.remove_modifier(active)?;
        }
        if level > 0 {
            self.active = Some(host.apply_scalable_modifier(&self.spec, level)?);
        }
        Ok(())
    }
}

impl Effect for ApplyModifierEffect {
    fn on_level_up(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        _old_level: i32,
    ) -> Result<(), PortError> {
        self.reapply(env, new_level)
    }

    fn on_level_down(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        _old_level: i32,
    ) -> Result<(), PortError> {
        self.reapply(env, new_level)
    }

    fn populate_simulation_data(
        &self,
        _target: &EffectTarget,
        effective_level: i32,
        simulating_reversal: bool,
        bus: &mut SimulationBus,
    ) {
        let magnitude = self.spec.magnitude_per_level * f64::from(effective_level.max(0));
        bus.add(AttributeDelta {
            attribute: self.spec.attribute.clone(),
            net_change: if simulating_reversal {
                -magnitude
            } else {
                magnitude
            },
        });
    }

    fn tooltip_text(&self, _target: &EffectTarget) -> String {
        format!(
            "{:+} {} per level",
            self.spec.magnitude_per_level, self.spec.attribute
        )
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::testing::MapOwner;
    use crate::ids::{AttributeHandle, NodeGuid};
    use crate::ports::{AbilityGrant, AbilityHost};

    #[derive(Default)]
    struct RecordingHost {
        next: u64,
        applied: Vec<(u64, i32)>,
    }

    impl AbilityHost for RecordingHost {
        fn grant_ability(
            &mut self,
            _class: &str,
            _level: i32,
            _input_slot: Option<i32>,
        ) -> Result<AbilityGrant, PortError> {
            self.next += 1;
            Ok(AbilityGrant(self.next))
        }

        fn remove_ability(&mut self, _grant: AbilityGrant) -> Result<(), PortError> {
            Ok(())
        }

        fn apply_scalable_modifier(
            &mut self,
            _spec: &ModifierSpec,
            level: i32,
        ) -> Result<ActiveModifier, PortError> {
            self.next += 1;
            self.applied.push((self.next, level));
            Ok(ActiveModifier(self.next))
        }

        fn remove_modifier(&mut self, active: ActiveModifier) -> Result<(), PortError> {
            self.applied.retain(|(id, _)| *id != active.0);
            Ok(())
        }
    }

    fn spec() -> ModifierSpec {
        ModifierSpec {
            attribute: AttributeHandle::new("strength"),
            magnitude_per_level: 2.0,
        }
    }

    fn target() -> EffectTarget {
        EffectTarget {
            guid: NodeGuid::generate(),
            display_name: "Might".to_string(),
        }
    }

    #[test]
    fn level_changes_replace_the_active_modifier() {
        let mut owner = MapOwner::default();
        let mut host = RecordingHost::default();
        let mut effect = ApplyModifierEffect::new(spec());
        let t = target();

        let mut env = HostEnv::new(&mut owner).with_abilities(&mut host);
        effect.on_level_up(&mut env, &t, 1, 0).unwrap();
        let mut env = HostEnv::new(&mut owner).with_abilities(&mut host);
        effect.on_level_up(&mut env, &t, 3, 1).unwrap();
        assert_eq!(host.applied.len(), 1);
        assert_eq!(host.applied[0].1, 3);

        let mut env = HostEnv::new(&mut owner).with_abilities(&mut host);
        effect.on_level_down(&mut env, &t, 0, 3).unwrap();
        assert!(host.applied.is_empty());
    }

    #[test]
    fn simulation_payload_scales_with_level() {
        let effect = ApplyModifierEffect::new(spec());
        let mut bus = SimulationBus::new();
        effect.populate_simulation_data(&target(), 2, true, &mut bus);
        let delta = bus.get::<AttributeDelta>().unwrap();
        assert_eq!(delta.net_change, -4.0);
        assert_eq!(delta.attribute, AttributeHandle::new("strength"));
    }

    #[test]
    fn missing_ability_host_is_a_port_error() {
        let mut owner = MapOwner::default();
        let mut effect = ApplyModifierEffect::new(spec());
        let mut env = HostEnv::new(&mut owner);
        assert!(effect.on_level_up(&mut env, &target(), 1, 0).is_err());
    }
}
