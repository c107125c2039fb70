use crate::Accessibility;
use std::{
    fmt::{Debug, Formatter},
    ops::BitOr,
};

/// Member lookup filter: scope (instance/static) and visibility (public/non-public).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingFlags(u8);

impl BindingFlags {
    pub const INSTANCE: Self = Self(1);
    pub const STATIC: Self = Self(2);
    pub const PUBLIC: Self = Self(4);
    pub const NON_PUBLIC: Self = Self(8);
    pub const ALL: Self = Self(15);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn matches(self, is_static: bool, accessibility: Accessibility) -> bool {
        let scope = if is_static { Self::STATIC } else { Self::INSTANCE };
        let visibility = if accessibility.is_public() {
            Self::PUBLIC
        } else {
            Self::NON_PUBLIC
        };
        self.contains(scope) && self.contains(visibility)
    }
}

impl BitOr for BindingFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl Default for BindingFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl Debug for BindingFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = [
            (Self::INSTANCE, "Instance"),
            (Self::STATIC, "Static"),
            (Self::PUBLIC, "Public"),
            (Self::NON_PUBLIC, "NonPublic"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        if names.is_empty() {
            write!(f, "Default")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DuckKind {
    #[default]
    Property,
    Field,
}

/// Binding override attached to a member.
///
/// On a shape member it renames the lookup, narrows the binding flags, or redirects a
/// property to a field. On a target member, `name` holds the signature string of the shape
/// member it answers to (a reverse binding).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuckAttribute {
    pub name: Option<String>,
    pub binding_flags: BindingFlags,
    pub kind: DuckKind,
}

impl DuckAttribute {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_flags(flags: BindingFlags) -> Self {
        Self {
            binding_flags: flags,
            ..Self::default()
        }
    }

    pub fn field() -> Self {
        Self {
            kind: DuckKind::Field,
            ..Self::default()
        }
    }

    pub fn flags(mut self, flags: BindingFlags) -> Self {
        self.binding_flags = flags;
        self
    }

    pub fn kind(mut self, kind: DuckKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn effective_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}
