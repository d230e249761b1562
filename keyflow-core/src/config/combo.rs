use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The four recognised modifiers, declared in canonical combo order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Win,
}

impl Modifier {
    pub const ORDER: [Modifier; 4] = [Self::Ctrl, Self::Alt, Self::Shift, Self::Win];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Win => "Win",
        }
    }

    /// Matches a single token, ignoring case. Left/right variants reported by
    /// hooks (`LControl`, `ShiftRight`, ...) count as the plain modifier.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let lower = token.to_ascii_lowercase();
        let bare = lower
            .strip_prefix('l')
            .or_else(|| lower.strip_prefix('r'))
            .filter(|rest| Self::from_name(rest).is_some())
            .or_else(|| lower.strip_suffix("left"))
            .or_else(|| lower.strip_suffix("right"))
            .unwrap_or(lower.as_str());
        Self::from_name(bare)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ctrl" | "control" => Some(Self::Ctrl),
            "alt" | "option" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "win" | "meta" | "super" | "cmd" | "command" => Some(Self::Win),
            _ => None,
        }
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifiers held down while a key event was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierSet {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

impl ModifierSet {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        win: false,
    };

    #[must_use]
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn insert(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Alt => self.alt = true,
            Modifier::Shift => self.shift = true,
            Modifier::Win => self.win = true,
        }
    }

    #[must_use]
    pub fn contains(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Win => self.win,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Held modifiers in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ORDER.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<T: IntoIterator<Item = Modifier>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Key text for the terminal key of a combo, as reported by the hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(pub String);

impl KeyId {
    pub fn new<T: ToString>(text: T) -> Self {
        Self(text.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key is a modifier pressed on its own.
    #[must_use]
    pub fn is_modifier(&self) -> bool {
        Modifier::from_token(self.0.trim()).is_some()
    }
}

impl From<&str> for KeyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A canonical key combination such as `Ctrl+Alt+F5`.
///
/// Built only through [`KeyCombo::normalize`] or [`KeyCombo::from_parts`], so
/// two values compare equal exactly when they name the same combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeyCombo(String);

impl KeyCombo {
    /// Canonicalises a user or hook produced combo string.
    ///
    /// Whitespace is dropped, modifiers are matched case-insensitively,
    /// deduplicated and emitted in `Ctrl`, `Alt`, `Shift`, `Win` order, and
    /// every other token is rendered as a key name (`f12` becomes `F12`).
    /// A trailing `++` names the plus key.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Self::default();
        }

        let mut modifiers = ModifierSet::NONE;
        let mut keys: Vec<String> = Vec::new();
        for token in tokens(&compact) {
            match Modifier::from_token(token) {
                Some(modifier) => modifiers.insert(modifier),
                None => keys.push(key_name(token)),
            }
        }

        let mut parts: Vec<&str> = modifiers.iter().map(Modifier::as_str).collect();
        parts.extend(keys.iter().map(String::as_str));
        Self(parts.join("+"))
    }

    /// Builds the combo for a key press from the held modifiers.
    #[must_use]
    pub fn from_parts(modifiers: ModifierSet, key: &KeyId) -> Self {
        let mut raw = String::new();
        for modifier in modifiers.iter() {
            raw.push_str(modifier.as_str());
            raw.push('+');
        }
        raw.push_str(key.as_str());
        Self::normalize(&raw)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-modifier tokens of the combo.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        tokens(&self.0)
            .into_iter()
            .filter(|token| Modifier::from_token(token).is_none())
            .collect()
    }

    /// Modifier tokens of the combo.
    #[must_use]
    pub fn modifiers(&self) -> ModifierSet {
        tokens(&self.0)
            .into_iter()
            .filter_map(Modifier::from_token)
            .collect()
    }

    /// A combo can be bound only if it names exactly one key.
    ///
    /// # Errors
    ///
    /// Returns the reason the combo can never match a key press.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyCombo);
        }
        match self.keys().len() {
            0 => Err(ValidationError::KeyNotFound(self.0.clone())),
            1 => Ok(()),
            _ => Err(ValidationError::MultipleKeys(self.0.clone())),
        }
    }
}

impl Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyCombo {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<String> for KeyCombo {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<KeyCombo> for String {
    fn from(value: KeyCombo) -> Self {
        value.0
    }
}

impl FromStr for KeyCombo {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let combo = Self::normalize(s);
        combo.validate()?;
        Ok(combo)
    }
}

/// Splits a whitespace-free combo on `+`, keeping a trailing `++` as the plus key.
pub(crate) fn tokens(compact: &str) -> Vec<&str> {
    if compact == "+" {
        return vec!["+"];
    }
    let (head, plus) = match compact.strip_suffix("++") {
        Some(head) => (head, true),
        None => (compact, false),
    };
    let mut tokens: Vec<&str> = head.split('+').filter(|t| !t.is_empty()).collect();
    if plus {
        tokens.push("+");
    }
    tokens
}

/// Upper cases the first character and lower cases the rest.
///
/// A first character whose upper case is more than one character (`ß`, `ﬀ`)
/// is kept as is, so that rendering an already rendered name is a no-op.
fn key_name(token: &str) -> String {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut upper = first.to_uppercase();
    let mut name = String::with_capacity(token.len());
    match (upper.next(), upper.next()) {
        (Some(single), None) => name.push(single),
        _ => name.push(first),
    }
    name.extend(chars.flat_map(char::to_lowercase));
    name
}
