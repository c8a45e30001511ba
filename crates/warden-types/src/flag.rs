//! Flag definitions and flag values.
//!
//! A [`Flag`] is a named rule with a typed value domain. Regions store
//! [`FlagValue`]s keyed by flag name; the resolution engine turns the set of
//! values visible at a point into one effective value.
//!
//! Every flag may carry a companion *region-group* flag (stored under
//! `<name>-group`) restricting which membership class a value applies to.
//! When a region does not set the companion explicitly, the flag's
//! [`Flag::default_group`] is used, falling back to [`RegionGroup::All`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::enums::{GameMode, RegionGroup, State};
use crate::error::FlagError;

/// Suffix appended to a flag's name to form its companion group flag.
pub const GROUP_FLAG_SUFFIX: &str = "-group";

/// The value domain of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Tri-state ALLOW / DENY / unset. Ties resolve DENY.
    State,
    /// Plain boolean.
    Boolean,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Double,
    /// Free text (messages).
    Text,
    /// A [`GameMode`].
    GameMode,
}

impl core::fmt::Display for FlagKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::State => "state",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Text => "text",
            Self::GameMode => "game mode",
        };
        f.write_str(name)
    }
}

/// A concrete value stored on a region for some flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FlagValue {
    /// Value of a state flag.
    State(State),
    /// Value of a boolean flag.
    Boolean(bool),
    /// Value of an integer flag.
    Integer(i64),
    /// Value of a double flag.
    Double(f64),
    /// Value of a text flag.
    Text(String),
    /// Value of a game mode flag.
    GameMode(GameMode),
    /// Value of a companion region-group flag.
    Group(RegionGroup),
}

impl FlagValue {
    /// The state, if this is a state value.
    pub const fn as_state(&self) -> Option<State> {
        match self {
            Self::State(s) => Some(*s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is an integer value.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The number as a double; integer values are widened.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// The game mode, if this is a game mode value.
    pub const fn as_game_mode(&self) -> Option<GameMode> {
        match self {
            Self::GameMode(m) => Some(*m),
            _ => None,
        }
    }

    /// The region group, if this is a group value.
    pub const fn as_group(&self) -> Option<RegionGroup> {
        match self {
            Self::Group(g) => Some(*g),
            _ => None,
        }
    }

    /// Whether this value belongs to the given flag kind.
    pub const fn matches_kind(&self, kind: FlagKind) -> bool {
        matches!(
            (self, kind),
            (Self::State(_), FlagKind::State)
                | (Self::Boolean(_), FlagKind::Boolean)
                | (Self::Integer(_), FlagKind::Integer)
                | (Self::Double(_) | Self::Integer(_), FlagKind::Double)
                | (Self::Text(_), FlagKind::Text)
                | (Self::GameMode(_), FlagKind::GameMode)
        )
    }
}

impl core::fmt::Display for FlagValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::State(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Text(t) => write!(f, "{t}"),
            Self::GameMode(m) => write!(f, "{m}"),
            Self::Group(g) => write!(f, "{g:?}"),
        }
    }
}

/// A flag value as written in a configuration file, before it is checked
/// against the flag's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagLiteral {
    /// `true` / `false`.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Number with a fractional part.
    Double(f64),
    /// Anything else, including `allow`, `deny` and game mode names.
    Text(String),
}

/// A named rule with a typed value domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    name: Cow<'static, str>,
    kind: FlagKind,
    default: Option<FlagValue>,
    default_group: Option<RegionGroup>,
}

impl Flag {
    /// Define a built-in flag with no default and no group restriction.
    pub const fn new(name: &'static str, kind: FlagKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            default: None,
            default_group: None,
        }
    }

    /// Define a state flag with a default state.
    pub const fn state(name: &'static str, default: Option<State>) -> Self {
        let default = match default {
            Some(s) => Some(FlagValue::State(s)),
            None => None,
        };
        Self {
            name: Cow::Borrowed(name),
            kind: FlagKind::State,
            default,
            default_group: None,
        }
    }

    /// Define a flag at runtime (e.g. a plugin-provided custom flag).
    ///
    /// The name is normalized to lowercase.
    pub fn custom(name: &str, kind: FlagKind) -> Self {
        Self {
            name: Cow::Owned(name.to_ascii_lowercase()),
            kind,
            default: None,
            default_group: None,
        }
    }

    /// Restrict values of this flag to a membership class unless a region
    /// overrides the companion group flag.
    #[must_use]
    pub const fn with_default_group(mut self, group: RegionGroup) -> Self {
        self.default_group = Some(group);
        self
    }

    /// The flag's lowercase name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flag's value domain.
    pub const fn kind(&self) -> FlagKind {
        self.kind
    }

    /// The value used when no region sets the flag.
    pub const fn default_value(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// The membership class used when a region does not set the companion
    /// group flag.
    pub const fn default_group(&self) -> Option<RegionGroup> {
        self.default_group
    }

    /// The storage key of the companion region-group flag.
    pub fn group_flag_name(&self) -> String {
        format!("{}{GROUP_FLAG_SUFFIX}", self.name)
    }

    /// Whether this is a state flag (DENY/ALLOW tie-break semantics).
    pub const fn is_state(&self) -> bool {
        matches!(self.kind, FlagKind::State)
    }

    /// Convert a configuration literal into a value of this flag's kind.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::TypeMismatch`] if the literal cannot represent a
    /// value of this flag's kind.
    pub fn parse_literal(&self, literal: &FlagLiteral) -> Result<FlagValue, FlagError> {
        let parsed = match (self.kind, literal) {
            (FlagKind::State, FlagLiteral::Text(t)) => State::parse(t).map(FlagValue::State),
            (FlagKind::State, FlagLiteral::Bool(b)) => Some(FlagValue::State(if *b {
                State::Allow
            } else {
                State::Deny
            })),
            (FlagKind::Boolean, FlagLiteral::Bool(b)) => Some(FlagValue::Boolean(*b)),
            (FlagKind::Boolean, FlagLiteral::Text(t)) => match t.trim().to_ascii_lowercase().as_str()
            {
                "true" | "yes" | "on" => Some(FlagValue::Boolean(true)),
                "false" | "no" | "off" => Some(FlagValue::Boolean(false)),
                _ => None,
            },
            (FlagKind::Integer, FlagLiteral::Integer(i)) => Some(FlagValue::Integer(*i)),
            (FlagKind::Double, FlagLiteral::Double(d)) => Some(FlagValue::Double(*d)),
            #[allow(clippy::cast_precision_loss)]
            (FlagKind::Double, FlagLiteral::Integer(i)) => Some(FlagValue::Double(*i as f64)),
            (FlagKind::Text, FlagLiteral::Text(t)) => Some(FlagValue::Text(t.clone())),
            (FlagKind::GameMode, FlagLiteral::Text(t)) => {
                GameMode::parse(t).map(FlagValue::GameMode)
            }
            _ => None,
        };

        parsed.ok_or_else(|| FlagError::TypeMismatch {
            flag: self.name.to_string(),
            expected: self.kind,
            found: literal_to_string(literal),
        })
    }

    /// Convert a configuration literal into a value for this flag's
    /// companion group flag.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::InvalidGroup`] if the literal is not a known
    /// group name.
    pub fn parse_group_literal(&self, literal: &FlagLiteral) -> Result<FlagValue, FlagError> {
        match literal {
            FlagLiteral::Text(t) => RegionGroup::parse(t).map(FlagValue::Group),
            _ => None,
        }
        .ok_or_else(|| FlagError::InvalidGroup {
            flag: self.name.to_string(),
            value: literal_to_string(literal),
        })
    }
}

fn literal_to_string(literal: &FlagLiteral) -> String {
    match literal {
        FlagLiteral::Bool(b) => b.to_string(),
        FlagLiteral::Integer(i) => i.to_string(),
        FlagLiteral::Double(d) => d.to_string(),
        FlagLiteral::Text(t) => t.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_flag_accepts_allow_deny_and_bools() {
        let flag = Flag::state("entry", Some(State::Allow));
        assert_eq!(
            flag.parse_literal(&FlagLiteral::Text(String::from("DENY"))).ok(),
            Some(FlagValue::State(State::Deny))
        );
        assert_eq!(
            flag.parse_literal(&FlagLiteral::Bool(true)).ok(),
            Some(FlagValue::State(State::Allow))
        );
    }

    #[test]
    fn integer_flag_rejects_text() {
        let flag = Flag::new("heal-amount", FlagKind::Integer);
        let result = flag.parse_literal(&FlagLiteral::Text(String::from("lots")));
        assert!(matches!(result, Err(FlagError::TypeMismatch { .. })));
    }

    #[test]
    fn double_flag_widens_integers() {
        let flag = Flag::new("heal-max-health", FlagKind::Double);
        let value = flag.parse_literal(&FlagLiteral::Integer(18)).ok();
        assert_eq!(value.and_then(|v| v.as_double()).map(|d| d > 17.9 && d < 18.1), Some(true));
    }

    #[test]
    fn group_flag_name_has_suffix() {
        let flag = Flag::new("greeting", FlagKind::Text);
        assert_eq!(flag.group_flag_name(), "greeting-group");
    }

    #[test]
    fn custom_flag_names_are_lowercased() {
        let flag = Flag::custom("My-Flag", FlagKind::Boolean);
        assert_eq!(flag.name(), "my-flag");
    }

    #[test]
    fn group_literal_parses_known_groups() {
        let flag = Flag::new("entry", FlagKind::State);
        let value = flag.parse_group_literal(&FlagLiteral::Text(String::from("members")));
        assert_eq!(value.ok(), Some(FlagValue::Group(RegionGroup::Members)));
        let bad = flag.parse_group_literal(&FlagLiteral::Integer(3));
        assert!(matches!(bad, Err(FlagError::InvalidGroup { .. })));
    }

    #[test]
    fn literals_deserialize_untagged() {
        let values: Vec<FlagLiteral> =
            serde_json::from_str(r#"[true, 4, 2.5, "deny"]"#).unwrap_or_default();
        assert_eq!(
            values,
            vec![
                FlagLiteral::Bool(true),
                FlagLiteral::Integer(4),
                FlagLiteral::Double(2.5),
                FlagLiteral::Text(String::from("deny")),
            ]
        );
    }
}
