//! Conversation state machine.
//!
//! [`step`] is a pure function: it takes the chat's current [`Session`], one
//! [`Input`] and the resolved [`Caller`], and returns the next session together with
//! the [`Effect`]s the processor has to carry out. No I/O happens here.

use super::access::Caller;
use super::session::{Draft, Sale, Session, State};
use super::texts;
use super::validate::{self, ValidationError};
use crate::config::SalesConfig;
use crate::db::types::TicketType;

/// Callback data prefix of the "mark entry" buttons under search results
pub const ENTER_CALLBACK_PREFIX: &str = "enter:";
/// Callback data of the "cancel" button
pub const CANCEL_CALLBACK: &str = "cancel";

/// One inbound update, reduced to what the machine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Callback(String),
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Reply keyboard shown instead of the regular keyboard.
    Keyboard(Vec<Vec<String>>),
    /// Buttons under the message; `(label, callback data)`.
    Inline(Vec<Vec<(String, String)>>),
    /// Hide a previously shown reply keyboard.
    RemoveKeyboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub choice: Option<Choice>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choice: None,
        }
    }

    pub fn with_choice(text: impl Into<String>, choice: Choice) -> Self {
        Self {
            text: text.into(),
            choice: Some(choice),
        }
    }
}

/// Work the processor performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Reply(Reply),
    SearchById(i64),
    /// Surname prefix search, falling back to an exact full-name match.
    SearchByName(String),
    MarkEntered(i64),
    SubmitSale(Sale),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Step {
    fn new(session: Session, effects: Vec<Effect>) -> Self {
        Self { session, effects }
    }

    fn reply(session: Session, reply: Reply) -> Self {
        Self::new(session, vec![Effect::Reply(reply)])
    }
}

/// Fixed keywords recognised in any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Start,
    Help,
    CheckIn,
    Sell,
    Cancel,
}

fn classify_keyword(text: &str) -> Option<Keyword> {
    let trimmed = text.trim();
    // `/start@SomeBot` in groups
    let word = match trimmed.strip_prefix('/') {
        Some(cmd) => format!("/{}", cmd.split('@').next().unwrap_or(cmd)),
        None => trimmed.to_string(),
    };

    match word.to_lowercase().as_str() {
        "/start" => Some(Keyword::Start),
        "/help" => Some(Keyword::Help),
        "/checkin" | "checkin" | "check-in" => Some(Keyword::CheckIn),
        "/sell" | "sell" => Some(Keyword::Sell),
        "/cancel" | "cancel" => Some(Keyword::Cancel),
        other if other == texts::BUTTON_CHECK_IN.to_lowercase() => Some(Keyword::CheckIn),
        other if other == texts::BUTTON_SELL.to_lowercase() => Some(Keyword::Sell),
        other if other == texts::BUTTON_CANCEL.to_lowercase() => Some(Keyword::Cancel),
        _ => None,
    }
}

/// Main menu keyboard, filtered by the caller's roles.
pub fn menu(caller: &Caller) -> Reply {
    menu_with_text(caller, texts::MENU)
}

fn menu_with_text(caller: &Caller, text: &str) -> Reply {
    let mut row = Vec::new();
    if caller.roles.checker {
        row.push(texts::BUTTON_CHECK_IN.to_string());
    }
    if caller.roles.seller {
        row.push(texts::BUTTON_SELL.to_string());
    }
    if row.is_empty() {
        return Reply::with_choice(text, Choice::RemoveKeyboard);
    }
    Reply::with_choice(text, Choice::Keyboard(vec![row]))
}

fn ticket_type_keyboard() -> Choice {
    Choice::Keyboard(vec![
        vec![texts::BUTTON_BASE.to_string(), texts::BUTTON_VIP.to_string()],
        vec![texts::BUTTON_CANCEL.to_string()],
    ])
}

fn price_keyboard(caller: &Caller, sales: &SalesConfig) -> Choice {
    let mut prices: Vec<u32> = sales.prices.clone();
    if caller.roles.special_price {
        if let Some(special) = sales.special_price {
            prices.push(special);
        }
    }
    prices.sort_unstable();
    prices.dedup();
    Choice::Keyboard(vec![
        prices.iter().map(|p| p.to_string()).collect(),
        vec![texts::BUTTON_CANCEL.to_string()],
    ])
}

fn vip_table_keyboard(tables: u8) -> Choice {
    let numbers: Vec<String> = (1..=tables).map(|n| n.to_string()).collect();
    let mut rows: Vec<Vec<String>> = numbers.chunks(5).map(|c| c.to_vec()).collect();
    rows.push(vec![texts::BUTTON_CANCEL.to_string()]);
    Choice::Keyboard(rows)
}

fn yes_no_keyboard() -> Choice {
    Choice::Keyboard(vec![
        vec![texts::BUTTON_YES.to_string(), texts::BUTTON_NO.to_string()],
        vec![texts::BUTTON_CANCEL.to_string()],
    ])
}

/// Advances the conversation by one input.
pub fn step(session: Session, input: &Input, caller: &Caller, sales: &SalesConfig) -> Step {
    match input {
        Input::Text(text) => match classify_keyword(text) {
            Some(keyword) => on_keyword(session, keyword, caller),
            None => on_text(session, text, caller, sales),
        },
        Input::Callback(data) => on_callback(session, data, caller),
    }
}

fn on_keyword(session: Session, keyword: Keyword, caller: &Caller) -> Step {
    let roles = caller.roles;
    match keyword {
        Keyword::Start => {
            let idle = session.enter(State::Idle);
            if !roles.is_staff() {
                return Step::reply(idle, Reply::with_choice(texts::ACCESS_DENIED, Choice::RemoveKeyboard));
            }
            Step::reply(idle, menu(caller))
        }
        Keyword::Help => {
            if !roles.is_staff() {
                return Step::reply(session, Reply::text(texts::ACCESS_DENIED));
            }
            Step::reply(session, Reply::text(texts::help(roles.checker, roles.seller)))
        }
        Keyword::CheckIn => {
            if !roles.checker {
                return Step::reply(session.enter(State::Idle), Reply::text(texts::CHECK_IN_DENIED));
            }
            Step::reply(
                session.enter(State::AwaitingSearchTerm),
                Reply::text(texts::PROMPT_SEARCH),
            )
        }
        Keyword::Sell => {
            if !roles.seller {
                return Step::reply(session.enter(State::Idle), Reply::text(texts::SELL_DENIED));
            }
            Step::reply(
                session.selling(State::AwaitingFio, Draft::default()),
                Reply::with_choice(
                    texts::PROMPT_FIO,
                    Choice::Keyboard(vec![vec![texts::BUTTON_CANCEL.to_string()]]),
                ),
            )
        }
        Keyword::Cancel => {
            let idle = session.enter(State::Idle);
            if !roles.is_staff() {
                return Step::reply(idle, Reply::text(texts::ACCESS_DENIED));
            }
            Step::reply(idle, menu_with_text(caller, texts::CANCELLED))
        }
    }
}

fn on_text(session: Session, text: &str, caller: &Caller, sales: &SalesConfig) -> Step {
    let roles = caller.roles;

    if session.state.is_selling() && !roles.seller {
        return Step::reply(session.enter(State::Idle), Reply::text(texts::SELL_DENIED));
    }

    match session.state {
        State::Idle => {
            if !roles.is_staff() {
                return Step::reply(session, Reply::text(texts::ACCESS_DENIED));
            }
            Step::reply(session, menu_with_text(caller, texts::MENU_HINT))
        }
        State::AwaitingSearchTerm => {
            if !roles.checker {
                return Step::reply(session.enter(State::Idle), Reply::text(texts::CHECK_IN_DENIED));
            }
            if let Some(id) = validate::parse_ticket_id(text) {
                return Step::new(session, vec![Effect::SearchById(id)]);
            }
            let term = text.trim();
            if term.is_empty() {
                return Step::reply(session, Reply::text(texts::SEARCH_EMPTY));
            }
            Step::new(session, vec![Effect::SearchByName(term.to_string())])
        }
        State::AwaitingFio
        | State::AwaitingTicketType
        | State::AwaitingVipTable
        | State::AwaitingPrice
        | State::AwaitingRepost => on_sale_field(session, text, caller, sales),
    }
}

fn on_sale_field(session: Session, text: &str, caller: &Caller, sales: &SalesConfig) -> Step {
    let Some(mut draft) = session.draft.clone() else {
        // Selling state without a draft cannot be produced by `step`; recover to idle.
        return Step::reply(session.enter(State::Idle), Reply::text(texts::DRAFT_LOST));
    };

    match session.state {
        State::AwaitingFio => match validate::format_full_name(text) {
            Ok(name) => {
                draft.full_name = Some(name);
                Step::reply(
                    session.selling(State::AwaitingTicketType, draft),
                    Reply::with_choice(texts::PROMPT_TICKET_TYPE, ticket_type_keyboard()),
                )
            }
            Err(ValidationError::Empty) => Step::reply(session, Reply::text(texts::FIO_EMPTY)),
            Err(_) => Step::reply(session, Reply::text(texts::FIO_INVALID)),
        },
        State::AwaitingTicketType => on_ticket_type(session, draft, text, caller, sales),
        State::AwaitingVipTable => match validate::parse_vip_table(text, sales.vip_tables_count) {
            Ok(table) => {
                draft.ticket_type = Some(TicketType::Vip(table));
                Step::reply(
                    session.selling(State::AwaitingPrice, draft),
                    Reply::with_choice(texts::PROMPT_PRICE, price_keyboard(caller, sales)),
                )
            }
            Err(_) => Step::reply(
                session,
                Reply::text(texts::prompt_vip_table(sales.vip_tables_count)),
            ),
        },
        State::AwaitingPrice => {
            match validate::parse_price(
                text,
                &sales.prices,
                sales.special_price,
                caller.roles.special_price,
            ) {
                Ok(price) => {
                    draft.price = Some(price);
                    Step::reply(
                        session.selling(State::AwaitingRepost, draft),
                        Reply::with_choice(texts::PROMPT_REPOST, yes_no_keyboard()),
                    )
                }
                Err(_) => Step::reply(session, Reply::text(texts::PRICE_INVALID)),
            }
        }
        State::AwaitingRepost => match validate::parse_yes_no(text) {
            Some(repost) => {
                draft.repost = Some(repost);
                let idle = session.enter(State::Idle);
                match draft.complete() {
                    Some(sale) => Step::new(
                        idle,
                        vec![
                            Effect::Reply(Reply::with_choice(texts::PROCESSING, Choice::RemoveKeyboard)),
                            Effect::SubmitSale(sale),
                        ],
                    ),
                    None => Step::reply(idle, Reply::text(texts::DRAFT_LOST)),
                }
            }
            None => Step::reply(session, Reply::text(texts::REPOST_INVALID)),
        },
        State::Idle | State::AwaitingSearchTerm => Step::new(session, Vec::new()),
    }
}

fn on_ticket_type(
    session: Session,
    mut draft: Draft,
    text: &str,
    caller: &Caller,
    sales: &SalesConfig,
) -> Step {
    let lower = text.trim().to_lowercase();
    let wants_vip_table_prompt = lower == "vip" || lower == texts::BUTTON_VIP.to_lowercase();

    let ticket_type = if wants_vip_table_prompt {
        None
    } else {
        match lower.parse::<TicketType>() {
            Ok(TicketType::Org) | Err(_) => {
                return Step::reply(session, Reply::text(texts::TICKET_TYPE_INVALID));
            }
            Ok(t) => Some(t),
        }
    };

    if wants_vip_table_prompt || ticket_type.is_some_and(|t| t.is_vip()) {
        if !caller.roles.vip_seller {
            return Step::reply(session, Reply::text(texts::VIP_DENIED));
        }
        if sales.vip_tables_count == 0 {
            return Step::reply(session, Reply::text(texts::VIP_UNAVAILABLE));
        }
    }

    match ticket_type {
        None => Step::reply(
            session.selling(State::AwaitingVipTable, draft),
            Reply::with_choice(
                texts::prompt_vip_table(sales.vip_tables_count),
                vip_table_keyboard(sales.vip_tables_count),
            ),
        ),
        // `ВИП<n>` past the last table: ask for the table number instead
        Some(TicketType::Vip(table)) if table > sales.vip_tables_count => Step::reply(
            session.selling(State::AwaitingVipTable, draft),
            Reply::with_choice(
                texts::prompt_vip_table(sales.vip_tables_count),
                vip_table_keyboard(sales.vip_tables_count),
            ),
        ),
        Some(t) => {
            draft.ticket_type = Some(t);
            Step::reply(
                session.selling(State::AwaitingPrice, draft),
                Reply::with_choice(texts::PROMPT_PRICE, price_keyboard(caller, sales)),
            )
        }
    }
}

fn on_callback(session: Session, data: &str, caller: &Caller) -> Step {
    if data == CANCEL_CALLBACK {
        return Step::reply(session, Reply::text(texts::LIST_CLOSED));
    }

    let Some(id) = data
        .strip_prefix(ENTER_CALLBACK_PREFIX)
        .and_then(|id| id.parse::<i64>().ok())
    else {
        return Step::new(session, Vec::new());
    };

    if !caller.roles.checker {
        return Step::reply(session, Reply::text(texts::CHECK_IN_DENIED));
    }
    Step::new(session, vec![Effect::MarkEntered(id)])
}
