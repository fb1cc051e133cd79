use core::fmt;
use std::str::FromStr;

/// Kind of wristband a ticket grants. Persisted as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketType {
    Base,
    /// VIP ticket bound to a numbered table.
    Vip(u8),
    /// Organiser pass, issued outside the bot.
    Org,
}

impl TicketType {
    pub fn is_vip(&self) -> bool {
        matches!(self, TicketType::Vip(_))
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketType::Base => write!(f, "БАЗОВЫЙ"),
            TicketType::Vip(table) => write!(f, "ВИП{}", table),
            TicketType::Org => write!(f, "ОРГ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket type: {0}")]
pub struct UnknownTicketType(pub String);

impl FromStr for TicketType {
    type Err = UnknownTicketType;

    /// Accepts the stored Cyrillic form as well as the latin aliases
    /// (`base`, `vip3`, `org`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "базовый" | "base" => return Ok(TicketType::Base),
            "орг" | "org" => return Ok(TicketType::Org),
            _ => {}
        }

        let table = lower
            .strip_prefix("вип")
            .or_else(|| lower.strip_prefix("vip"))
            .and_then(|rest| rest.trim().parse::<u8>().ok())
            .filter(|n| *n > 0);

        table
            .map(TicketType::Vip)
            .ok_or_else(|| UnknownTicketType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_stored_form() {
        assert_eq!(TicketType::Base.to_string(), "БАЗОВЫЙ");
        assert_eq!(TicketType::Vip(3).to_string(), "ВИП3");
        assert_eq!(TicketType::Org.to_string(), "ОРГ");
    }

    #[test]
    fn test_parse_stored_and_latin_forms() {
        assert_eq!("БАЗОВЫЙ".parse::<TicketType>(), Ok(TicketType::Base));
        assert_eq!("base".parse::<TicketType>(), Ok(TicketType::Base));
        assert_eq!("ВИП2".parse::<TicketType>(), Ok(TicketType::Vip(2)));
        assert_eq!("vip 4".parse::<TicketType>(), Ok(TicketType::Vip(4)));
        assert_eq!("орг".parse::<TicketType>(), Ok(TicketType::Org));
    }

    #[test]
    fn test_parse_rejects_bare_or_zero_vip() {
        assert!("вип".parse::<TicketType>().is_err());
        assert!("vip0".parse::<TicketType>().is_err());
        assert!("gold".parse::<TicketType>().is_err());
    }
}
