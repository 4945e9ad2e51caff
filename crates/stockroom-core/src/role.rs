//! The role hierarchy: `intruso < membro < gerente`.
//!
//! Roles are compared by ordinal only. Every function here is pure and total.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Authorization role held by a profile.
///
/// The declaration order is the hierarchy order, so the derived `Ord` agrees
/// with [`Role::rank`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  /// Authenticated but not yet admitted to the organisation.
  Intruso,
  /// Regular member; may use the application and adopt orphaned records.
  Membro,
  /// Manager; may additionally reach manager-only areas and assign roles.
  Gerente,
}

/// The role a caller requires when it does not name one.
pub const DEFAULT_REQUIRED: Role = Role::Membro;

impl Role {
  /// Ordinal of this role in the hierarchy.
  pub fn rank(self) -> u8 {
    match self {
      Self::Intruso => 0,
      Self::Membro => 1,
      Self::Gerente => 2,
    }
  }

  /// Parse a role tag leniently. Unknown or malformed tags map to the most
  /// restrictive role.
  pub fn from_tag(tag: &str) -> Self {
    tag.trim().to_ascii_lowercase().parse().unwrap_or(Self::Intruso)
  }

  /// `true` when `self` ranks at least as high as `required`.
  pub fn satisfies(self, required: Role) -> bool {
    self.rank() >= required.rank()
  }
}

/// Ordinal of a raw role tag; unknown tags rank as `intruso` (0).
pub fn rank(tag: &str) -> u8 { Role::from_tag(tag).rank() }

/// `rank(held) >= rank(required)` over raw tags.
pub fn satisfies(held: &str, required: Option<&str>) -> bool {
  let required = required.map_or(DEFAULT_REQUIRED, Role::from_tag);
  Role::from_tag(held).satisfies(required)
}

/// `satisfies` against [`DEFAULT_REQUIRED`].
pub fn satisfies_default(held: Role) -> bool { held.satisfies(DEFAULT_REQUIRED) }
