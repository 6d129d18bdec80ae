use serde::{Deserialize, Serialize};
use std::fmt;

/// Which roster a combatant belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Ally,
    Foe,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Ally => Side::Foe,
            Side::Foe => Side::Ally,
        }
    }
}

/// Position within a side. Singles encounters only ever use `Left`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Left,
    Right,
}

impl Position {
    pub fn index(self) -> usize {
        match self {
            Position::Left => 0,
            Position::Right => 1,
        }
    }
}

/// Stable identifier for a spot on the field. Actions name combatants by
/// slot rather than holding live references; a slot stays valid for the
/// whole turn even if its occupant faints or switches out mid-resolution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSlot {
    pub side: Side,
    pub position: Position,
}

impl FieldSlot {
    pub const ALLY_LEFT: FieldSlot = FieldSlot::new(Side::Ally, Position::Left);
    pub const ALLY_RIGHT: FieldSlot = FieldSlot::new(Side::Ally, Position::Right);
    pub const FOE_LEFT: FieldSlot = FieldSlot::new(Side::Foe, Position::Left);
    pub const FOE_RIGHT: FieldSlot = FieldSlot::new(Side::Foe, Position::Right);

    pub const fn new(side: Side, position: Position) -> FieldSlot {
        FieldSlot { side, position }
    }

    /// All slots in canonical field order. Hook passes that run "in field
    /// order" iterate this sequence.
    pub fn all() -> [FieldSlot; 4] {
        [
            FieldSlot::ALLY_LEFT,
            FieldSlot::ALLY_RIGHT,
            FieldSlot::FOE_LEFT,
            FieldSlot::FOE_RIGHT,
        ]
    }

    pub fn is_opponent_of(self, other: FieldSlot) -> bool {
        self.side != other.side
    }

    pub fn partner(self) -> FieldSlot {
        let position = match self.position {
            Position::Left => Position::Right,
            Position::Right => Position::Left,
        };
        FieldSlot::new(self.side, position)
    }
}

impl fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Ally => "ally",
            Side::Foe => "foe",
        };
        let position = match self.position {
            Position::Left => "left",
            Position::Right => "right",
        };
        write!(f, "{}-{}", side, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_is_allies_then_foes() {
        let all = FieldSlot::all();
        assert_eq!(all[0], FieldSlot::ALLY_LEFT);
        assert_eq!(all[1], FieldSlot::ALLY_RIGHT);
        assert_eq!(all[2], FieldSlot::FOE_LEFT);
        assert_eq!(all[3], FieldSlot::FOE_RIGHT);
    }

    #[test]
    fn partner_stays_on_the_same_side() {
        assert_eq!(FieldSlot::ALLY_LEFT.partner(), FieldSlot::ALLY_RIGHT);
        assert_eq!(FieldSlot::FOE_RIGHT.partner(), FieldSlot::FOE_LEFT);
        assert!(FieldSlot::ALLY_LEFT.is_opponent_of(FieldSlot::FOE_LEFT));
        assert!(!FieldSlot::ALLY_LEFT.is_opponent_of(FieldSlot::ALLY_RIGHT));
    }

    #[test]
    fn display_matches_slot_names() {
        assert_eq!(FieldSlot::ALLY_LEFT.to_string(), "ally-left");
        assert_eq!(FieldSlot::FOE_RIGHT.to_string(), "foe-right");
    }
}
