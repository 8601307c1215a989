//! Chat Session FSM (C8) orchestration: owns the `ChatSession` row, feeds
//! each `domain::chat_fsm` parsing step its repository-backed inputs, and
//! drives the conversation into C4 (availability), C5 (booking) and C6
//! (reservation lookup) on the client's behalf.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::config::EngineConfig;
use shared::errors::DomainError;
use shared::types::{ChatState, ProfessionalId, ServiceId, SlotId};
use sqlx::PgPool;

use domain::chat_fsm::{
    cap_offers, parse_address, parse_booking_date, parse_global_command, parse_menu_choice,
    parse_service_choice, parse_time_choice, validate_email, ChatFsmError, ChatOffer, GlobalCommand,
    MenuChoice,
};
use domain::events::Dispatcher;

use crate::booking::{self, AddressInput, BookingChannel, BookingRequest, ServiceRequest};
use crate::repositories::{ClientRepository, CommuneRepository, ServiceRepository};

/// JSON-serializable mirror of `domain::chat_fsm::ChatSessionData`, the
/// shape actually persisted in `ChatSession.data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    service_id: Option<ServiceId>,
    service_name: Option<String>,
    date: Option<chrono::NaiveDate>,
    offers: Vec<StoredOffer>,
    email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredOffer {
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
    professional_id: ProfessionalId,
    slot_id: SlotId,
}

impl From<ChatOffer> for StoredOffer {
    fn from(o: ChatOffer) -> Self {
        Self {
            start: o.start,
            end: o.end,
            professional_id: o.professional_id,
            slot_id: o.slot_id,
        }
    }
}

impl From<&StoredOffer> for ChatOffer {
    fn from(o: &StoredOffer) -> Self {
        Self {
            start: o.start,
            end: o.end,
            professional_id: o.professional_id,
            slot_id: o.slot_id,
        }
    }
}

/// Handle one inbound message for `phone` and return the reply text.
/// Errors here are transport/DB failures; parsing failures are rendered
/// as a reply, never surfaced as `Err`.
pub async fn handle_message(
    pool: &PgPool,
    phone: &str,
    text: &str,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<String, DomainError> {
    let session = crate::repositories::ChatSessionRepository::get_or_create(pool, phone)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    if let Some(cmd) = parse_global_command(text) {
        return match cmd {
            GlobalCommand::Menu | GlobalCommand::Cancel => {
                crate::repositories::ChatSessionRepository::reset_to_menu(pool, phone)
                    .await
                    .map_err(|e| DomainError::Transient(e.to_string()))?;
                Ok(menu_text())
            }
            GlobalCommand::Help => Ok(help_text()),
        };
    }

    let mut data: SessionData = serde_json::from_value(session.data.0.clone()).unwrap_or_default();

    let (reply, new_state, new_data) = match session.state {
        ChatState::Menu => handle_menu(pool, text).await?,
        ChatState::SelectService => handle_select_service(pool, text, data.clone()).await?,
        ChatState::SelectDate => {
            handle_select_date(pool, text, data.clone(), config).await?
        }
        ChatState::SelectTime => handle_select_time(text, data.clone()),
        ChatState::WaitingForEmail => handle_waiting_for_email(text, data.clone()),
        ChatState::WaitingForAddress => {
            handle_waiting_for_address(pool, phone, text, data.clone(), config, dispatcher).await?
        }
    };
    data = new_data;

    crate::repositories::ChatSessionRepository::save(
        pool,
        phone,
        new_state,
        serde_json::to_value(&data).unwrap_or(serde_json::json!({})),
    )
    .await
    .map_err(|e| DomainError::Transient(e.to_string()))?;

    Ok(reply)
}

fn menu_text() -> String {
    "Hola! Elige una opcion:\n1. Agendar hora\n2. Consultar mis reservas\n3. Hablar con un ejecutivo".to_string()
}

fn help_text() -> String {
    "Puedes escribir 'menu' para volver al inicio o 'cancelar' para salir en cualquier momento.".to_string()
}

async fn handle_menu(pool: &PgPool, text: &str) -> Result<(String, ChatState, SessionData), DomainError> {
    match parse_menu_choice(text) {
        Ok(MenuChoice::Book) => {
            let services = ServiceRepository::find_active(pool)
                .await
                .map_err(|e| DomainError::Transient(e.to_string()))?;
            if services.is_empty() {
                return Ok((
                    "No hay servicios disponibles en este momento.".into(),
                    ChatState::Menu,
                    SessionData::default(),
                ));
            }
            let mut lines = vec!["Que servicio necesitas?".to_string()];
            for (i, s) in services.iter().enumerate() {
                lines.push(format!("{}. {}", i + 1, s.name));
            }
            Ok((lines.join("\n"), ChatState::SelectService, SessionData::default()))
        }
        Ok(MenuChoice::QueryReservations) => Ok((
            "Por favor contacta a un ejecutivo para consultar tus reservas existentes.".into(),
            ChatState::Menu,
            SessionData::default(),
        )),
        Ok(MenuChoice::HumanHandoff) => Ok((
            "Un ejecutivo te contactara pronto.".into(),
            ChatState::Menu,
            SessionData::default(),
        )),
        Err(_) => Ok((menu_text(), ChatState::Menu, SessionData::default())),
    }
}

async fn handle_select_service(
    pool: &PgPool,
    text: &str,
    data: SessionData,
) -> Result<(String, ChatState, SessionData), DomainError> {
    let services = ServiceRepository::find_active(pool)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    match parse_service_choice(text, services.len()) {
        Ok(idx) => {
            let service = &services[idx];
            let mut data = data;
            data.service_id = Some(service.id);
            data.service_name = Some(service.name.clone());
            Ok((
                "Para que fecha necesitas la hora? (DD/MM/AAAA)".into(),
                ChatState::SelectDate,
                data,
            ))
        }
        Err(_) => Ok(("Opcion invalida, intenta de nuevo.".into(), ChatState::SelectService, data)),
    }
}

async fn handle_select_date(
    pool: &PgPool,
    text: &str,
    data: SessionData,
    config: &EngineConfig,
) -> Result<(String, ChatState, SessionData), DomainError> {
    let Some(service_id) = data.service_id else {
        return Ok((menu_text(), ChatState::Menu, SessionData::default()));
    };
    let today = Utc::now().with_timezone(&config.business_time_zone).date_naive();
    match parse_booking_date(text, today, config.max_future_booking_days) {
        Ok(date) => {
            let offers = crate::availability::compute_offers_for_date(
                pool,
                &[service_id],
                date,
                config.business_time_zone,
            )
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
            let capped = cap_offers(&offers);
            if capped.is_empty() {
                return Ok((
                    "No hay horas disponibles ese dia. Intenta con otra fecha.".into(),
                    ChatState::SelectDate,
                    data,
                ));
            }
            let mut lines = vec!["Elige un horario:".to_string()];
            for (i, o) in capped.iter().enumerate() {
                let local = o.start.with_timezone(&config.business_time_zone);
                lines.push(format!("{}. {}", i + 1, local.format("%H:%M")));
            }
            let mut data = data;
            data.date = Some(date);
            data.offers = capped.into_iter().map(StoredOffer::from).collect();
            Ok((lines.join("\n"), ChatState::SelectTime, data))
        }
        Err(ChatFsmError::DateFormat) => {
            Ok(("Formato de fecha invalido, usa DD/MM/AAAA.".into(), ChatState::SelectDate, data))
        }
        Err(ChatFsmError::DatePast) => {
            Ok(("La fecha debe ser futura.".into(), ChatState::SelectDate, data))
        }
        Err(ChatFsmError::DateTooFar) => {
            Ok(("Esa fecha esta fuera del horizonte de reservas.".into(), ChatState::SelectDate, data))
        }
        Err(_) => Ok((menu_text(), ChatState::Menu, SessionData::default())),
    }
}

fn handle_select_time(text: &str, data: SessionData) -> (String, ChatState, SessionData) {
    let offers: Vec<ChatOffer> = data.offers.iter().map(ChatOffer::from).collect();
    match parse_time_choice(text, &offers) {
        Ok(idx) => {
            let mut data = data;
            data.offers = vec![data.offers[idx].clone()];
            ("Cual es tu correo electronico?".into(), ChatState::WaitingForEmail, data)
        }
        Err(_) => ("Opcion invalida, intenta de nuevo.".into(), ChatState::SelectTime, data),
    }
}

fn handle_waiting_for_email(text: &str, data: SessionData) -> (String, ChatState, SessionData) {
    match validate_email(text) {
        Ok(email) => {
            let mut data = data;
            data.email = Some(email);
            ("Cual es tu direccion? (calle, numero, comuna)".into(), ChatState::WaitingForAddress, data)
        }
        Err(_) => ("Correo invalido, intenta de nuevo.".into(), ChatState::WaitingForEmail, data),
    }
}

async fn handle_waiting_for_address(
    pool: &PgPool,
    phone: &str,
    text: &str,
    data: SessionData,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<(String, ChatState, SessionData), DomainError> {
    let (Some(service_id), Some(offer), Some(email)) =
        (data.service_id, data.offers.first(), data.email.clone())
    else {
        return Ok((menu_text(), ChatState::Menu, SessionData::default()));
    };

    let communes = CommuneRepository::list_all(pool)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    let commune_pairs: Vec<(shared::types::CommuneId, String)> =
        communes.into_iter().map(|c| (c.id, c.name)).collect();
    let parsed = parse_address(text, &commune_pairs);

    let existing_client = ClientRepository::find_by_phone_suffix(
        pool,
        &domain::chat_fsm::phone_identity_suffix(phone).unwrap_or_else(|| phone.to_string()),
    )
    .await
    .map_err(|e| DomainError::Transient(e.to_string()))?;
    let (first_name, last_name) = existing_client
        .first()
        .map(|c| (c.first_name.clone(), c.last_name.clone()))
        .unwrap_or_else(|| ("Cliente".to_string(), String::new()));

    let normalized_phone = domain::chat_fsm::normalize_phone_full(phone, &config.phone_country_prefix);

    let request = BookingRequest {
        client_email: email,
        client_first_name: first_name,
        client_last_name: last_name,
        client_phone: Some(normalized_phone),
        vehicle: None,
        address: Some(AddressInput {
            alias: "default".to_string(),
            street: parsed.street,
            number: parsed.number,
            complement: if parsed.complement.is_empty() { None } else { Some(parsed.complement) },
            commune_id: parsed.commune_id,
            commune_name: None,
        }),
        professional_id: offer.professional_id,
        service_requests: vec![ServiceRequest {
            service_id,
            professional_id: offer.professional_id,
        }],
        start: offer.start,
        note: None,
        channel: BookingChannel::Chat,
    };

    booking::validate_booking_rules(pool, &request, config).await?;
    let reservation = booking::create_reservation(pool, request, config, dispatcher).await?;

    let local_start = reservation
        .token_expires_at
        .map(|_| offer.start.with_timezone(&config.business_time_zone));
    let summary = local_start
        .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();

    Ok((
        format!("Listo! Tu hora quedo confirmada para el {}.", summary),
        ChatState::Menu,
        SessionData::default(),
    ))
}
