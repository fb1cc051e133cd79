//! Allow-list based roles.

use crate::config::AccessConfig;
use std::collections::HashSet;

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub checker: bool,
    pub seller: bool,
    pub vip_seller: bool,
    pub special_price: bool,
}

impl Roles {
    /// Callers with neither role never get past the greeting.
    pub fn is_staff(&self) -> bool {
        self.checker || self.seller
    }
}

/// The person behind an update, with roles already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub username: Option<String>,
    pub roles: Roles,
}

impl Caller {
    /// Name recorded as the seller of a ticket.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => format!("id:{}", self.user_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    checkers: HashSet<String>,
    sellers: HashSet<String>,
    vip_sellers: HashSet<String>,
    special_price_sellers: HashSet<String>,
}

fn normalize_username(name: &str) -> String {
    name.trim().trim_start_matches('@').to_lowercase()
}

fn to_set(names: &[String]) -> HashSet<String> {
    names
        .iter()
        .map(|n| normalize_username(n))
        .filter(|n| !n.is_empty())
        .collect()
}

impl AllowList {
    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            checkers: to_set(&config.checkers),
            sellers: to_set(&config.sellers),
            vip_sellers: to_set(&config.vip_sellers),
            special_price_sellers: to_set(&config.special_price_sellers),
        }
    }

    /// Users without a username have no roles.
    pub fn roles(&self, username: Option<&str>) -> Roles {
        let Some(name) = username.map(normalize_username) else {
            return Roles::default();
        };
        Roles {
            checker: self.checkers.contains(&name),
            seller: self.sellers.contains(&name),
            vip_seller: self.vip_sellers.contains(&name),
            special_price: self.special_price_sellers.contains(&name),
        }
    }

    pub fn caller(&self, user_id: i64, username: Option<String>) -> Caller {
        let roles = self.roles(username.as_deref());
        Caller {
            user_id,
            username,
            roles,
        }
    }
}
