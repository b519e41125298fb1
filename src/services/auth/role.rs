/*
 * Responsibility
 * - 閉じた Role 集合 (ADMIN / PORTEUR / INVESTOR / USER)
 * - 文字列 <-> Role の変換はここだけで行う (typo を型で防ぐ)
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    /// Project owner ("porteur de projet").
    Porteur,
    #[serde(alias = "INVESTISSEUR")]
    Investor,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Porteur => "PORTEUR",
            Role::Investor => "INVESTOR",
            Role::User => "USER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Stored values may carry the framework-style "ROLE_" prefix.
        let raw = s.trim();
        let name = raw.strip_prefix("ROLE_").unwrap_or(raw);
        match name.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "PORTEUR" | "OWNER" => Ok(Role::Porteur),
            "INVESTOR" | "INVESTISSEUR" => Ok(Role::Investor),
            "USER" => Ok(Role::User),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("porteur".parse::<Role>(), Ok(Role::Porteur));
        assert_eq!("ROLE_INVESTISSEUR".parse::<Role>(), Ok(Role::Investor));
        assert_eq!(" user ".parse::<Role>(), Ok(Role::User));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("GESTIONNAIRE".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for role in [Role::Admin, Role::Porteur, Role::Investor, Role::User] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn serde_uses_upper_case_names() {
        assert_eq!(serde_json::to_string(&Role::Investor).unwrap(), "\"INVESTOR\"");
        let legacy: Role = serde_json::from_str("\"INVESTISSEUR\"").unwrap();
        assert_eq!(legacy, Role::Investor);
    }
}
