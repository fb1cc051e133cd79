//! Per-chat conversation state.

use crate::db::types::TicketType;

/// Where a chat currently is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Idle,
    AwaitingSearchTerm,
    AwaitingFio,
    AwaitingTicketType,
    AwaitingVipTable,
    AwaitingPrice,
    AwaitingRepost,
}

impl State {
    /// States that belong to the sell flow and therefore carry a draft.
    pub fn is_selling(&self) -> bool {
        matches!(
            self,
            State::AwaitingFio
                | State::AwaitingTicketType
                | State::AwaitingVipTable
                | State::AwaitingPrice
                | State::AwaitingRepost
        )
    }
}

/// Sale record being assembled one prompt at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub full_name: Option<String>,
    pub ticket_type: Option<TicketType>,
    pub price: Option<u32>,
    pub repost: Option<bool>,
}

impl Draft {
    /// Returns the finished sale once every field has been collected.
    pub fn complete(&self) -> Option<Sale> {
        Some(Sale {
            full_name: self.full_name.clone()?,
            ticket_type: self.ticket_type?,
            price: self.price?,
            repost: self.repost?,
        })
    }
}

/// A fully collected sale, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub full_name: String,
    pub ticket_type: TicketType,
    pub price: u32,
    pub repost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub chat_id: i64,
    pub state: State,
    /// Present only while `state.is_selling()`.
    pub draft: Option<Draft>,
}

impl Session {
    pub fn idle(chat_id: i64) -> Self {
        Self {
            chat_id,
            state: State::Idle,
            draft: None,
        }
    }

    /// Moves to a non-selling state, discarding any draft.
    pub fn enter(self, state: State) -> Self {
        debug_assert!(!state.is_selling());
        Self {
            chat_id: self.chat_id,
            state,
            draft: None,
        }
    }

    /// Moves to a selling state with the given draft.
    pub fn selling(self, state: State, draft: Draft) -> Self {
        debug_assert!(state.is_selling());
        Self {
            chat_id: self.chat_id,
            state,
            draft: Some(draft),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && self.draft.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_complete_requires_all_fields() {
        let mut draft = Draft {
            full_name: Some("Ivan Petrov".to_string()),
            ticket_type: Some(TicketType::Base),
            price: Some(20),
            repost: None,
        };
        assert!(draft.complete().is_none());

        draft.repost = Some(false);
        let sale = draft.complete().unwrap();
        assert_eq!(sale.price, 20);
        assert!(!sale.repost);
    }

    #[test]
    fn test_enter_drops_draft() {
        let session = Session::idle(7).selling(State::AwaitingPrice, Draft::default());
        let session = session.enter(State::Idle);
        assert!(session.is_idle());
        assert_eq!(session.chat_id, 7);
    }
}
