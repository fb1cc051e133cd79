//! Runs one inbound update against the collaborators.

use super::dispatch::UpdateHandler;
use super::{Inbound, Payload};
use crate::bot::notifier::Notifier;
use crate::config::{LacesConfig, SalesConfig};
use crate::conversation::machine::{self, CANCEL_CALLBACK, ENTER_CALLBACK_PREFIX};
use crate::conversation::{
    step, texts, AllowList, Caller, Choice, Effect, Reply, Sale, Session, SessionStore, State,
};
use crate::db::entities::tickets;
use crate::db::{StoreError, TicketStore};
use crate::sheets::SaleSink;
use crate::ticket_image::TicketRenderer;
use crate::utils::card;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct Processor {
    sessions: Arc<SessionStore>,
    allow_list: AllowList,
    sales: SalesConfig,
    laces: LacesConfig,
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    sheet: Arc<dyn SaleSink>,
    renderer: Arc<dyn TicketRenderer>,
}

impl Processor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<SessionStore>,
        allow_list: AllowList,
        sales: SalesConfig,
        laces: LacesConfig,
        store: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        sheet: Arc<dyn SaleSink>,
        renderer: Arc<dyn TicketRenderer>,
    ) -> Self {
        Self {
            sessions,
            allow_list,
            sales,
            laces,
            store,
            notifier,
            sheet,
            renderer,
        }
    }

    /// Steps the chat's session with the update and carries out the resulting effects.
    ///
    /// The chat's session stays locked until every effect has run, so a second update
    /// from the same chat observes the fully applied result of this one.
    pub async fn process(&self, update: Inbound) {
        let chat_id = update.chat_id;

        if let Payload::Callback { id, .. } = &update.payload {
            if let Err(e) = self.notifier.answer_callback(id).await {
                warn!("Failed to answer callback in chat {}: {:#}", chat_id, e);
            }
        }

        let caller = self.allow_list.caller(update.user_id, update.username.clone());
        let input = update.payload.to_input();

        let mut guard = self.sessions.lock(chat_id).await;
        let next = step(guard.clone(), &input, &caller, &self.sales);
        if guard.state != next.session.state {
            info!(
                "Chat {} ({}): {:?} -> {:?}",
                chat_id,
                caller.display_name(),
                guard.state,
                next.session.state
            );
        }
        *guard = next.session;

        for effect in next.effects {
            self.execute(&mut guard, &caller, effect).await;
        }

        self.sessions.release(guard).await;
    }

    async fn execute(&self, session: &mut Session, caller: &Caller, effect: Effect) {
        let chat_id = session.chat_id;
        match effect {
            Effect::Reply(reply) => self.send(chat_id, &reply).await,
            Effect::SearchById(id) => match self.store.find_by_id(id).await {
                Ok(ticket) => self.show_results(chat_id, vec![ticket]).await,
                Err(StoreError::NotFound) => self.send_text(chat_id, texts::NOT_FOUND).await,
                Err(e) => self.search_failed(session, caller, e).await,
            },
            Effect::SearchByName(term) => match self.search_by_name(&term).await {
                Ok(found) if found.is_empty() => self.send_text(chat_id, texts::NOT_FOUND).await,
                Ok(found) => self.show_results(chat_id, found).await,
                Err(e) => self.search_failed(session, caller, e).await,
            },
            Effect::MarkEntered(id) => self.mark_entered(chat_id, caller, id).await,
            Effect::SubmitSale(sale) => {
                self.submit_sale(chat_id, caller, &sale).await;
                self.send(chat_id, &machine::menu(caller)).await;
            }
        }
    }

    async fn search_by_name(&self, term: &str) -> Result<Vec<tickets::Model>, StoreError> {
        let by_surname = self.store.search_by_surname(term).await?;
        if !by_surname.is_empty() {
            return Ok(by_surname);
        }
        self.store.search_by_full_name(term).await
    }

    async fn search_failed(&self, session: &mut Session, caller: &Caller, e: StoreError) {
        error!("Ticket search failed in chat {}: {}", session.chat_id, e);
        *session = session.clone().enter(State::Idle);
        self.send_text(session.chat_id, texts::SEARCH_FAILED).await;
        self.send(session.chat_id, &machine::menu(caller)).await;
    }

    async fn show_results(&self, chat_id: i64, found: Vec<tickets::Model>) {
        let list = card::ticket_list(texts::FOUND_HEADER, &found, &self.laces);

        let mut rows: Vec<Vec<(String, String)>> = found
            .iter()
            .filter(|t| !t.passed_control_zone)
            .map(|t| {
                vec![(
                    format!("{} (№{})", t.full_name, t.id),
                    format!("{}{}", ENTER_CALLBACK_PREFIX, t.id),
                )]
            })
            .collect();

        if rows.is_empty() {
            self.send_text(chat_id, &format!("{}\n\n{}", list, texts::ALL_PASSED))
                .await;
            return;
        }

        rows.push(vec![(texts::BUTTON_CANCEL.to_string(), CANCEL_CALLBACK.to_string())]);
        let reply = Reply::with_choice(
            format!("{}\n\n{}", list, texts::PICK_TICKET),
            Choice::Inline(rows),
        );
        self.send(chat_id, &reply).await;
    }

    async fn mark_entered(&self, chat_id: i64, caller: &Caller, id: i64) {
        match self.store.mark_entered(id).await {
            Ok(ticket) => {
                info!("Ticket {} passed control, marked by {}", id, caller.display_name());
                let text = format!(
                    "{}\n\n{}",
                    texts::ENTRY_MARKED,
                    card::ticket_card(&ticket, &self.laces)
                );
                self.send_text(chat_id, &text).await;
            }
            Err(StoreError::AlreadyEntered(_)) => {
                self.send_text(chat_id, texts::ALREADY_ENTERED).await
            }
            Err(StoreError::NotFound) => self.send_text(chat_id, texts::NOT_FOUND).await,
            Err(e) => {
                error!("Failed to mark ticket {} as entered: {}", id, e);
                self.send_text(chat_id, texts::ENTRY_FAILED).await;
            }
        }
    }

    async fn submit_sale(&self, chat_id: i64, caller: &Caller, sale: &Sale) {
        let seller = caller.display_name();

        let ticket_number = match self.store.sell_ticket(sale, &seller).await {
            Ok(number) => number,
            Err(StoreError::Duplicate(name)) => {
                warn!("Duplicate sale for {} rejected (seller {})", name, seller);
                self.send_text(chat_id, texts::DUPLICATE_SALE).await;
                return;
            }
            Err(e) => {
                error!("Failed to store sale for {}: {}", sale.full_name, e);
                self.send_text(chat_id, texts::SALE_FAILED).await;
                return;
            }
        };
        info!(
            "Ticket {} sold by {}: {} {} {}",
            ticket_number, seller, sale.full_name, sale.ticket_type, sale.price
        );

        if let Err(e) = self.sheet.record_sale(sale, &seller, ticket_number).await {
            error!("Failed to mirror ticket {} to the sheet: {}", ticket_number, e);
            self.send_text(chat_id, texts::SHEET_FAILED).await;
        }

        let caption = texts::sale_confirmed(
            ticket_number,
            &sale.full_name,
            &sale.ticket_type.to_string(),
            sale.price,
        );

        let renderer = self.renderer.clone();
        let ticket_type = sale.ticket_type;
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render(ticket_number, ticket_type)).await;

        let sent = match rendered {
            Ok(Ok(png)) => match self.notifier.send_image(chat_id, png, &caption).await {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to send ticket {} image: {:#}", ticket_number, e);
                    false
                }
            },
            Ok(Err(e)) => {
                error!("Failed to render ticket {}: {}", ticket_number, e);
                false
            }
            Err(e) => {
                error!("Ticket {} render task failed: {}", ticket_number, e);
                false
            }
        };

        if !sent {
            self.send_text(chat_id, &format!("{}\n\n{}", caption, texts::IMAGE_FAILED))
                .await;
        }
    }

    async fn send(&self, chat_id: i64, reply: &Reply) {
        let result = match &reply.choice {
            Some(choice) => self.notifier.send_choice(chat_id, &reply.text, choice).await,
            None => self.notifier.send_text(chat_id, &reply.text).await,
        };
        if let Err(e) = result {
            warn!("Failed to reply in chat {}: {:#}", chat_id, e);
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.notifier.send_text(chat_id, text).await {
            warn!("Failed to reply in chat {}: {:#}", chat_id, e);
        }
    }
}

#[async_trait]
impl UpdateHandler for Processor {
    async fn handle(&self, update: Inbound) {
        self.process(update).await;
    }
}
