//! Numeric property delta per level.

use crate::curve::LevelCurve;
use crate::ids::PropertyPath;
use crate::ports::{HostEnv, PortError};
use crate::simulation::{PropertyDelta, SimulationBus};

use super::{Effect, EffectTarget};

/// Adds `value(level)` to a scoped numeric property on the owner side.
///
/// The magnitude at a level comes from the curve when keyed there, or
/// `per_level * level` otherwise. Transitions apply only the difference
/// between the old and new magnitudes, so arbitrary jumps stay exact.
#[derive(Clone, Debug)]
pub struct ModifyPropertyEffect {
    pub path: PropertyPath,
    pub curve: Option<LevelCurve>,
    pub per_level: f64,
}

impl ModifyPropertyEffect {
    pub fn per_level(path: PropertyPath, per_level: f64) -> Self {
        Self {
            path,
            curve: None,
            per_level,
        }
    }

    pub fn from_curve(path: PropertyPath, curve: LevelCurve) -> Self {
        Self {
            path,
            curve: Some(curve),
            per_level: 0.0,
        }
    }

    fn magnitude(&self, level: i32) -> f64 {
        if level <= 0 {
            return 0.0;
        }
        self.curve
            .as_ref()
            .and_then(|curve| curve.eval(level))
            .map(f64::from)
            .unwrap_or(self.per_level * f64::from(level))
    }

    fn apply_delta(&self, env: &mut HostEnv<'_>, delta: f64) -> Result<(), PortError> {
        if delta == 0.0 {
            return Ok(());
        }
        let current = env.owner().get_number(&self.path)?;
        env.owner_mut().set_number(&self.path, current + delta)
    }
}

impl Effect for ModifyPropertyEffect {
    fn on_level_up(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError> {
        self.apply_delta(env, self.magnitude(new_level) - self.magnitude(old_level))
    }

    fn on_level_down(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError> {
        self.apply_delta(env, self.magnitude(new_level) - self.magnitude(old_level))
    }

    fn populate_simulation_data(
        &self,
        _target: &EffectTarget,
        effective_level: i32,
        simulating_reversal: bool,
        bus: &mut SimulationBus,
    ) {
        let magnitude = self.magnitude(effective_level);
        bus.add(PropertyDelta {
            path: self.path.clone(),
            net_change: if simulating_reversal {
                -magnitude
            } else {
                magnitude
            },
        });
    }

    fn tooltip_text(&self, _target: &EffectTarget) -> String {
        format!("Modifies {}", self.path)
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::testing::MapOwner;
    use crate::ids::NodeGuid;

    fn target() -> EffectTarget {
        EffectTarget {
            guid: NodeGuid::generate(),
            display_name: "Swiftness".to_string(),
        }
    }

    #[test]
    fn applies_only_the_difference_across_jumps() {
        let path = PropertyPath::owner("move_speed");
        let mut owner = MapOwner::default();
        owner.numbers.insert(path.clone(), 100.0);

        let mut effect = ModifyPropertyEffect::per_level(path.clone(), 10.0);
        let t = target();

        let mut env = HostEnv::new(&mut owner);
        effect.on_level_up(&mut env, &t, 2, 0).unwrap();
        assert_eq!(owner.numbers[&path], 120.0);

        let mut env = HostEnv::new(&mut owner);
        effect.on_level_up(&mut env, &t, 5, 2).unwrap();
        assert_eq!(owner.numbers[&path], 150.0);

        let mut env = HostEnv::new(&mut owner);
        effect.on_level_down(&mut env, &t, 0, 5).unwrap();
        assert_eq!(owner.numbers[&path], 100.0);
    }

    #[test]
    fn curve_overrides_linear_magnitude() {
        let path = PropertyPath::owner("armor");
        let mut owner = MapOwner::default();
        owner.numbers.insert(path.clone(), 0.0);

        let mut effect =
            ModifyPropertyEffect::from_curve(path.clone(), LevelCurve::new([(1, 5.0), (2, 15.0)]));
        let t = target();
        let mut env = HostEnv::new(&mut owner);
        effect.on_level_up(&mut env, &t, 2, 0).unwrap();
        assert_eq!(owner.numbers[&path], 15.0);
    }

    #[test]
    fn simulation_negates_on_reversal() {
        let effect = ModifyPropertyEffect::per_level(PropertyPath::owner("move_speed"), 10.0);
        let mut bus = SimulationBus::new();
        effect.populate_simulation_data(&target(), 3, true, &mut bus);
        assert_eq!(bus.get::<PropertyDelta>().unwrap().net_change, -30.0);
    }
}
