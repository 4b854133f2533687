use serde::{Deserialize, Serialize};

/// The two movers of a level. Each one has its own lane and finish tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Character {
    Heavy,
    Light,
}

impl Character {
    pub const ALL: [Character; 2] = [Character::Heavy, Character::Light];

    pub fn other(self) -> Character {
        match self {
            Character::Heavy => Character::Light,
            Character::Light => Character::Heavy,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Character::Heavy => "heavy",
            Character::Light => "light",
        }
    }
}

/// One value per character, addressed by [`Character`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerCharacter<T> {
    pub heavy: T,
    pub light: T,
}

impl<T> PerCharacter<T> {
    pub fn new(heavy: T, light: T) -> Self {
        Self { heavy, light }
    }

    pub fn get(&self, who: Character) -> &T {
        match who {
            Character::Heavy => &self.heavy,
            Character::Light => &self.light,
        }
    }

    pub fn get_mut(&mut self, who: Character) -> &mut T {
        match who {
            Character::Heavy => &mut self.heavy,
            Character::Light => &mut self.light,
        }
    }

    pub fn set(&mut self, who: Character, value: T) {
        *self.get_mut(who) = value;
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerCharacter<U> {
        PerCharacter {
            heavy: f(self.heavy),
            light: f(self.light),
        }
    }
}

impl<T: Copy> PerCharacter<T> {
    pub fn both(value: T) -> Self {
        Self {
            heavy: value,
            light: value,
        }
    }
}
