use crate::combatant::Combatant;
use crate::field::{FieldSlot, Position, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherKind {
    Sandstorm,
    Hail,
    HarshSun,
    HeavyRain,
}

impl WeatherKind {
    /// Whether exposed combatants take residual damage under this weather.
    pub fn is_damaging(self) -> bool {
        matches!(self, WeatherKind::Sandstorm | WeatherKind::Hail)
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeatherKind::Sandstorm => "sandstorm",
            WeatherKind::Hail => "hail",
            WeatherKind::HarshSun => "harsh sunlight",
            WeatherKind::HeavyRain => "heavy rain",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherState {
    pub kind: WeatherKind,
    /// None means the weather does not decay on its own.
    pub turns_remaining: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainKind {
    Grassy,
    Misty,
    Psychic,
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerrainKind::Grassy => "grassy terrain",
            TerrainKind::Misty => "misty terrain",
            TerrainKind::Psychic => "psychic terrain",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainState {
    pub kind: TerrainKind,
    pub turns_remaining: Option<u8>,
}

/// Field-wide conditions consulted by the order resolver and the cascade.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub weather: Option<WeatherState>,
    pub terrain: Option<TerrainState>,
    /// Turns of intensified gravity left; gravity-bound actions are unusable
    /// while this is set.
    pub gravity: Option<u8>,
    /// Turns of reversed priority left; flips the speed comparator.
    pub reversed_priority: Option<u8>,
}

impl FieldState {
    pub fn weather_kind(&self) -> Option<WeatherKind> {
        self.weather.map(|w| w.kind)
    }

    pub fn terrain_kind(&self) -> Option<TerrainKind> {
        self.terrain.map(|t| t.kind)
    }

    pub fn gravity_intensified(&self) -> bool {
        self.gravity.is_some()
    }

    pub fn priority_reversed(&self) -> bool {
        self.reversed_priority.is_some()
    }
}

/// How many positions each side fields.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterLayout {
    Single,
    Double,
}

impl EncounterLayout {
    pub fn positions(self) -> &'static [Position] {
        match self {
            EncounterLayout::Single => &[Position::Left],
            EncounterLayout::Double => &[Position::Left, Position::Right],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    AllyVictory,
    FoeVictory,
    Draw,
    Fled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EncounterStatus {
    InProgress,
    /// One or both sides must send in replacements before the next turn.
    AwaitingReplacements { sides: Vec<Side> },
    Ended { outcome: EncounterOutcome },
}

/// One side's combatants. Members persist off-field until the encounter
/// ends; `active` maps field positions to roster indices.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Roster {
    pub members: Vec<Combatant>,
    active: [Option<usize>; 2],
}

impl Roster {
    pub fn new(members: Vec<Combatant>) -> Roster {
        Roster {
            members,
            active: [None, None],
        }
    }

    pub fn active_index(&self, position: Position) -> Option<usize> {
        self.active[position.index()]
    }

    pub fn active_at(&self, position: Position) -> Option<&Combatant> {
        self.active_index(position).map(|i| &self.members[i])
    }

    pub fn active_at_mut(&mut self, position: Position) -> Option<&mut Combatant> {
        match self.active_index(position) {
            Some(i) => Some(&mut self.members[i]),
            None => None,
        }
    }

    /// Place a roster member into a position. The previous occupant, if any,
    /// simply stops being active; its state is the caller's business.
    pub fn set_active(&mut self, position: Position, index: Option<usize>) {
        debug_assert!(index.is_none_or(|i| i < self.members.len()));
        self.active[position.index()] = index;
    }

    pub fn is_on_field(&self, index: usize) -> bool {
        self.active.contains(&Some(index))
    }

    /// Whether anyone (active or benched) can still fight.
    pub fn has_usable(&self) -> bool {
        self.members.iter().any(|c| !c.is_fainted())
    }

    /// First benched, unfainted member, used to validate replacements.
    pub fn first_benched(&self) -> Option<usize> {
        self.members
            .iter()
            .enumerate()
            .find(|(i, c)| !c.is_fainted() && !self.is_on_field(*i))
            .map(|(i, _)| i)
    }
}

/// The whole mutable battle state, passed by reference into every task and
/// hook invocation. There is no ambient global; whoever holds the context
/// holds the battle.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleContext {
    pub encounter_seed: u64,
    pub turn_number: u32,
    pub layout: EncounterLayout,
    pub field: FieldState,
    pub allies: Roster,
    pub foes: Roster,
    /// Monotone flee-attempt counter, reset only when the encounter ends.
    pub escape_attempts: u32,
    pub status: EncounterStatus,
}

impl BattleContext {
    pub fn new(encounter_seed: u64, layout: EncounterLayout, allies: Roster, foes: Roster) -> Self {
        BattleContext {
            encounter_seed,
            turn_number: 1,
            layout,
            field: FieldState::default(),
            allies,
            foes,
            escape_attempts: 0,
            status: EncounterStatus::InProgress,
        }
    }

    pub fn roster(&self, side: Side) -> &Roster {
        match side {
            Side::Ally => &self.allies,
            Side::Foe => &self.foes,
        }
    }

    pub fn roster_mut(&mut self, side: Side) -> &mut Roster {
        match side {
            Side::Ally => &mut self.allies,
            Side::Foe => &mut self.foes,
        }
    }

    /// The live combatant at a slot, if the slot is occupied. Tasks must
    /// re-validate through here every time they run; a slot captured at
    /// scheduling time may have emptied since.
    pub fn combatant(&self, slot: FieldSlot) -> Option<&Combatant> {
        self.roster(slot.side).active_at(slot.position)
    }

    pub fn combatant_mut(&mut self, slot: FieldSlot) -> Option<&mut Combatant> {
        self.roster_mut(slot.side).active_at_mut(slot.position)
    }

    pub fn is_occupied(&self, slot: FieldSlot) -> bool {
        self.combatant(slot).is_some()
    }

    /// A slot counts as alive when occupied by an unfainted combatant.
    pub fn is_alive(&self, slot: FieldSlot) -> bool {
        self.combatant(slot).is_some_and(|c| !c.is_fainted())
    }

    /// Slots with a living occupant, in canonical field order.
    pub fn active_slots(&self) -> Vec<FieldSlot> {
        FieldSlot::all()
            .into_iter()
            .filter(|slot| {
                self.layout.positions().contains(&slot.position) && self.is_alive(*slot)
            })
            .collect()
    }

    pub fn slots_for(&self, side: Side) -> Vec<FieldSlot> {
        self.active_slots()
            .into_iter()
            .filter(|slot| slot.side == side)
            .collect()
    }

    /// Bring a roster member onto the field. Volatile state is wiped on the
    /// way in so nothing leaks from a previous stint.
    pub fn switch_in(&mut self, slot: FieldSlot, roster_index: usize) {
        let roster = self.roster_mut(slot.side);
        roster.set_active(slot.position, Some(roster_index));
        if let Some(combatant) = roster.active_at_mut(slot.position) {
            combatant.clear_volatile_state();
        }
    }

    /// Empty a slot, wiping the departing occupant's volatile state.
    pub fn vacate(&mut self, slot: FieldSlot) {
        let roster = self.roster_mut(slot.side);
        if let Some(combatant) = roster.active_at_mut(slot.position) {
            combatant.clear_volatile_state();
        }
        roster.set_active(slot.position, None);
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, EncounterStatus::Ended { .. })
    }
}
