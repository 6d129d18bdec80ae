use crate::actions::{ActionId, ActionSpec, Element};
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleContext, EncounterLayout, Roster};
use crate::combatant::{ActionInstance, Combatant, Stats, StatusAilment};
use crate::errors::EngineResult;
use crate::field::FieldSlot;
use crate::hooks::{Catalogs, EffectEnv, HookResult, TraitId};

// A tiny shared catalog. Each entry exercises one engine path; the ids are
// arbitrary and the effects deliberately simple.
pub const STRIKE: ActionId = ActionId(1);
pub const MEND: ActionId = ActionId(2);
pub const QUICK_JAB: ActionId = ActionId(3);
pub const SKY_CHARGE: ActionId = ActionId(4);
pub const HOWL: ActionId = ActionId(5);
pub const SCORCH: ActionId = ActionId(6);

pub const STRIKE_DAMAGE: u16 = 8;
pub const QUICK_JAB_DAMAGE: u16 = 5;
pub const SKY_CHARGE_DAMAGE: u16 = 12;

fn strike_effect(env: &mut EffectEnv<'_>, user: FieldSlot, targets: &[FieldSlot]) -> HookResult {
    for target in targets {
        env.deal_damage(Some(user), *target, STRIKE_DAMAGE);
    }
    Ok(())
}

fn quick_jab_effect(env: &mut EffectEnv<'_>, user: FieldSlot, targets: &[FieldSlot]) -> HookResult {
    for target in targets {
        env.deal_damage(Some(user), *target, QUICK_JAB_DAMAGE);
    }
    Ok(())
}

fn sky_charge_effect(env: &mut EffectEnv<'_>, user: FieldSlot, targets: &[FieldSlot]) -> HookResult {
    for target in targets {
        env.deal_damage(Some(user), *target, SKY_CHARGE_DAMAGE);
    }
    Ok(())
}

fn mend_effect(env: &mut EffectEnv<'_>, user: FieldSlot, _targets: &[FieldSlot]) -> HookResult {
    env.heal(user, 10);
    Ok(())
}

/// Catalogs with the shared test actions registered. Tests that need traits
/// or items register them on top of this.
pub fn test_catalogs() -> Catalogs {
    let mut catalogs = Catalogs::default();

    let mut strike = ActionSpec::new("Strike");
    strike.element = Element(1);
    strike.effect = Some(strike_effect);
    catalogs.actions.register(STRIKE, strike);

    let mut mend = ActionSpec::new("Mend");
    mend.damaging = false;
    mend.healing = true;
    mend.effect = Some(mend_effect);
    catalogs.actions.register(MEND, mend);

    let mut quick_jab = ActionSpec::new("Quick Jab");
    quick_jab.priority = 1;
    quick_jab.effect = Some(quick_jab_effect);
    catalogs.actions.register(QUICK_JAB, quick_jab);

    let mut sky_charge = ActionSpec::new("Sky Charge");
    sky_charge.charge_up = true;
    sky_charge.effect = Some(sky_charge_effect);
    catalogs.actions.register(SKY_CHARGE, sky_charge);

    let mut howl = ActionSpec::new("Howl");
    howl.damaging = false;
    howl.sound_based = true;
    catalogs.actions.register(HOWL, howl);

    let mut scorch = ActionSpec::new("Scorch");
    scorch.weather_blocked = Some(|weather| weather == crate::battle::state::WeatherKind::HeavyRain);
    scorch.failure_message = Some("The flame fizzled out!");
    scorch.effect = Some(strike_effect);
    catalogs.actions.register(SCORCH, scorch);

    catalogs
}

/// A builder for creating test combatants with common defaults.
///
/// # Example
/// ```
/// let combatant = TestCombatantBuilder::new("Arbel")
///     .with_speed(30)
///     .with_actions(vec![(STRIKE, 10)])
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    max_hp: u16,
    speed: u16,
    actions: Vec<(ActionId, u8)>,
    status: Option<StatusAilment>,
    traits: Vec<TraitId>,
    current_hp: Option<u16>,
}

impl TestCombatantBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_hp: 40,
            speed: 20,
            actions: vec![(STRIKE, 10)],
            status: None,
            traits: Vec::new(),
            current_hp: None,
        }
    }

    pub fn with_max_hp(mut self, max_hp: u16) -> Self {
        self.max_hp = max_hp;
        self
    }

    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_actions(mut self, actions: Vec<(ActionId, u8)>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_status(mut self, status: StatusAilment) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_trait(mut self, id: TraitId) -> Self {
        self.traits.push(id);
        self
    }

    pub fn build(self) -> Combatant {
        let mut combatant = Combatant::new(
            self.name,
            self.max_hp,
            Stats {
                attack: 12,
                defense: 10,
                speed: self.speed,
            },
        );
        combatant.status = self.status;
        combatant.traits = self.traits;
        combatant.actions = self
            .actions
            .into_iter()
            .map(|(action, pp)| ActionInstance::new(action, pp))
            .collect();
        if let Some(hp) = self.current_hp {
            combatant.set_hp(hp);
        }
        combatant
    }
}

/// Creates a standard 1v1 encounter with both leads already on the field.
pub fn create_test_battle(ally: Combatant, foe: Combatant) -> BattleContext {
    let mut ctx = BattleContext::new(
        42,
        EncounterLayout::Single,
        Roster::new(vec![ally]),
        Roster::new(vec![foe]),
    );
    ctx.switch_in(FieldSlot::ALLY_LEFT, 0);
    ctx.switch_in(FieldSlot::FOE_LEFT, 0);
    ctx
}

/// A 2v2 encounter with all four leads on the field.
pub fn create_double_battle(
    allies: Vec<Combatant>,
    foes: Vec<Combatant>,
) -> BattleContext {
    let mut ctx = BattleContext::new(
        42,
        EncounterLayout::Double,
        Roster::new(allies),
        Roster::new(foes),
    );
    ctx.switch_in(FieldSlot::ALLY_LEFT, 0);
    ctx.switch_in(FieldSlot::ALLY_RIGHT, 1);
    ctx.switch_in(FieldSlot::FOE_LEFT, 0);
    ctx.switch_in(FieldSlot::FOE_RIGHT, 1);
    ctx
}

/// A `TurnRng` with a long tape of middling values, for tests where the
/// specific outcomes do not matter. Unconsumed values are harmless.
pub fn predictable_rng() -> TurnRng {
    TurnRng::scripted(vec![50; 100])
}

/// A tape whose first values are chosen by the test, padded so incidental
/// draws (the turn-order shuffle, stray checks) never exhaust it.
pub fn scripted_rng(prefix: Vec<u8>) -> TurnRng {
    let mut outcomes = prefix;
    outcomes.extend(std::iter::repeat(50).take(60));
    TurnRng::scripted(outcomes)
}

/// Asserts a Result is Ok and returns the value, with a readable message.
pub fn assert_ok<T>(result: EngineResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
