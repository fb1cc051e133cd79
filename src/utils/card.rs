use crate::config::LacesConfig;
use crate::db::entities::tickets;
use crate::db::types::TicketType;

const PASSED: &str = "ДА ✅✅✅";
const NOT_PASSED: &str = "НЕТ ❌❌❌";

fn lace_colour<'a>(ticket_type: &str, laces: &'a LacesConfig) -> Option<&'a str> {
    match ticket_type.parse::<TicketType>().ok()? {
        TicketType::Base => Some(&laces.base),
        TicketType::Vip(_) => Some(&laces.vip),
        TicketType::Org => Some(&laces.org),
    }
}

/// Ticket summary shown to entrance staff.
pub fn ticket_card(ticket: &tickets::Model, laces: &LacesConfig) -> String {
    let Some(lace) = lace_colour(&ticket.ticket_type, laces) else {
        return format!(
            "Номер билета: {},\nФИО: {},\nНеизвестный тип билета: {}",
            ticket.id, ticket.full_name, ticket.ticket_type
        );
    };

    let control = if ticket.passed_control_zone {
        PASSED
    } else {
        NOT_PASSED
    };

    format!(
        "Номер билета: {},\nФИО: {},\nТип браслета: {},\nЦвет браслета: {},\nПрошел контроль? - {}",
        ticket.id, ticket.full_name, ticket.ticket_type, lace, control
    )
}

/// Several cards separated by blank lines under a header.
pub fn ticket_list(header: &str, tickets: &[tickets::Model], laces: &LacesConfig) -> String {
    let mut text = String::from(header);
    for ticket in tickets {
        text.push_str("\n\n");
        text.push_str(&ticket_card(ticket, laces));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ticket(id: i64, ticket_type: &str, passed: bool) -> tickets::Model {
        tickets::Model {
            id,
            full_name: "Ivan Petrov".to_string(),
            full_name_key: "ivan petrov".to_string(),
            surname: "ivan".to_string(),
            ticket_type: ticket_type.to_string(),
            price: 20,
            repost: false,
            seller: "@anna".to_string(),
            passed_control_zone: passed,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_card_shows_lace_and_status() {
        let laces = LacesConfig::default();
        let card = ticket_card(&ticket(7, "ВИП2", true), &laces);
        assert!(card.contains("Номер билета: 7"));
        assert!(card.contains("Цвет браслета: Синий"));
        assert!(card.contains(PASSED));

        let card = ticket_card(&ticket(8, "БАЗОВЫЙ", false), &laces);
        assert!(card.contains("Цвет браслета: Желтый"));
        assert!(card.contains(NOT_PASSED));
    }

    #[test]
    fn test_unknown_type() {
        let card = ticket_card(&ticket(9, "GOLD", false), &LacesConfig::default());
        assert!(card.contains("Неизвестный тип билета"));
    }

    #[test]
    fn test_list_joins_cards() {
        let laces = LacesConfig::default();
        let list = ticket_list("Header", &[ticket(1, "ОРГ", false), ticket(2, "БАЗОВЫЙ", false)], &laces);
        assert!(list.starts_with("Header\n\n"));
        assert_eq!(list.matches("Номер билета").count(), 2);
        assert!(list.contains("Красный"));
    }
}
