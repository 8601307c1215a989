//! Chat Session FSM (C8).
//!
//! A deterministic state machine keyed by phone number. Each function here
//! is a single parsing/transition decision; the caller (`db::chat`) owns
//! the `ChatSession` row, the repository reads that feed each decision
//! (active service list, `availability` offers, commune list, phone/email
//! lookups), and the actual invocation of C4/C5/C6. Splitting it this way
//! mirrors the source `ChatBot` class's one-method-per-step shape while
//! keeping every parsing/validation rule unit-testable without a session
//! store.
//!
//! Global commands (`menu`, `cancelar`/`cancel`, `ayuda`/`help`) are
//! recognized from any state and reset or summarize rather than feeding
//! the per-state parser.

use chrono::{Datelike, NaiveDate};
use shared::types::{CommuneId, ProfessionalId, ServiceId, SlotId};
use std::collections::HashMap;

/// A command recognized regardless of the session's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalCommand {
    Menu,
    Cancel,
    Help,
}

/// Recognize a global command from free-form chat input. Matching is
/// case-insensitive against the small set of Spanish/English synonyms the
/// source bot accepts; anything else is not a global command and falls
/// through to the per-state parser.
pub fn parse_global_command(text: &str) -> Option<GlobalCommand> {
    match text.trim().to_lowercase().as_str() {
        "reset" | "menu" | "inicio" | "volver" => Some(GlobalCommand::Menu),
        "cancelar" | "salir" | "cancel" => Some(GlobalCommand::Cancel),
        "ayuda" | "help" | "?" => Some(GlobalCommand::Help),
        _ => None,
    }
}

/// Errors raised while parsing chat input at a given state. These are
/// rendered into a polite retry message by the caller; none of them are
/// fatal to the session (`WAITING_CLIENT`-style expiry lives at the
/// reservation level, not here).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatFsmError {
    #[error("option is not one of the presented choices")]
    InvalidOption,
    #[error("date is not in DD/MM/YYYY format")]
    DateFormat,
    #[error("date must be strictly in the future")]
    DatePast,
    #[error("date is further out than the configured booking horizon")]
    DateTooFar,
    #[error("not a valid email address")]
    EmailInvalid,
    #[error("session has no pending offers to choose from")]
    NoOffersInSession,
}

/// `MENU` choices. Option 3 (human handoff) is terminal for the chat
/// session: the FSM stops driving the conversation and a human operator
/// takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Book,
    QueryReservations,
    HumanHandoff,
}

/// Parse a `MENU` selection. Accepts the numbered option or a loose
/// keyword match, matching the source bot's `text == '1' or 'agendar' in
/// text_lower` style dispatch.
pub fn parse_menu_choice(text: &str) -> Result<MenuChoice, ChatFsmError> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    if trimmed == "1" || lower.contains("agendar") || lower.contains("book") {
        Ok(MenuChoice::Book)
    } else if trimmed == "2" || lower.contains("reserva") {
        Ok(MenuChoice::QueryReservations)
    } else if trimmed == "3" || lower.contains("ejecutivo") || lower.contains("humano") {
        Ok(MenuChoice::HumanHandoff)
    } else {
        Err(ChatFsmError::InvalidOption)
    }
}

/// Parse a `SELECT_SERVICE` choice: a 1-based index into the active
/// service list presented to the client.
pub fn parse_service_choice(text: &str, active_service_count: usize) -> Result<usize, ChatFsmError> {
    let idx: usize = text
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or(ChatFsmError::InvalidOption)?;
    if idx > active_service_count {
        return Err(ChatFsmError::InvalidOption);
    }
    Ok(idx - 1)
}

/// Parse and validate a `SELECT_DATE` entry: must be `DD/MM/YYYY`,
/// strictly in the future, and no further out than
/// `max_future_booking_days`.
pub fn parse_booking_date(
    text: &str,
    today: NaiveDate,
    max_future_booking_days: i64,
) -> Result<NaiveDate, ChatFsmError> {
    let date = NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").map_err(|_| ChatFsmError::DateFormat)?;
    if date <= today {
        return Err(ChatFsmError::DatePast);
    }
    let max_date = today + chrono::Duration::days(max_future_booking_days);
    if date > max_date {
        return Err(ChatFsmError::DateTooFar);
    }
    Ok(date)
}

/// One offer as summarized for the chat transcript: the caller has
/// already invoked C4 and capped the result at 10 entries per the
/// component design. `professional_id`/`slot_id` are the chosen starting
/// slot for this offer — for the chat path we book whichever professional
/// C4 preferred first (lowest daily load), mirroring the source bot's
/// `hora["profes"][0]` / `hora["slot_ids"][0]`.
#[derive(Debug, Clone, Copy)]
pub struct ChatOffer {
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub professional_id: ProfessionalId,
    pub slot_id: SlotId,
}

/// Cap an availability result to the first 10 offers, the limit the chat
/// transcript presents as numbered choices.
pub fn cap_offers(offers: &[crate::availability::Offer]) -> Vec<ChatOffer> {
    offers
        .iter()
        .take(10)
        .filter_map(|o| {
            let professional_id = *o.professionals.first()?;
            let slot_id = *o.slot_ids.first()?;
            Some(ChatOffer {
                start: o.start,
                end: o.end,
                professional_id,
                slot_id,
            })
        })
        .collect()
}

/// Parse a `SELECT_TIME` choice: a 1-based index into the offers stored
/// in the session by the previous `SELECT_DATE` step.
pub fn parse_time_choice(text: &str, offers: &[ChatOffer]) -> Result<usize, ChatFsmError> {
    if offers.is_empty() {
        return Err(ChatFsmError::NoOffersInSession);
    }
    let idx: usize = text
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or(ChatFsmError::InvalidOption)?;
    if idx > offers.len() {
        return Err(ChatFsmError::InvalidOption);
    }
    Ok(idx - 1)
}

/// Normalize an inbound phone number to digits only, matching the source
/// bot's `''.join(filter(str.isdigit, phone_number))`.
pub fn normalize_phone_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// The suffix length the source bot matches identity on: 8 digits is a
/// Chilean local number without the `+56 9` mobile prefix.
pub const PHONE_IDENTITY_SUFFIX_LEN: usize = 8;

/// The suffix used to look up a known client by phone: the last
/// [`PHONE_IDENTITY_SUFFIX_LEN`] digits, or `None` if the normalized
/// number is shorter than that (too short to disambiguate).
pub fn phone_identity_suffix(raw: &str) -> Option<String> {
    let digits = normalize_phone_digits(raw);
    if digits.len() < PHONE_IDENTITY_SUFFIX_LEN {
        return None;
    }
    Some(digits[digits.len() - PHONE_IDENTITY_SUFFIX_LEN..].to_string())
}

/// Normalize a phone number to the full `<country_prefix><digits>` form
/// used as a fallback when an exact match (rather than a suffix match) is
/// required, e.g. persisting a newly linked phone.
pub fn normalize_phone_full(raw: &str, country_prefix: &str) -> String {
    let digits = normalize_phone_digits(raw);
    if digits.starts_with(country_prefix) {
        digits
    } else {
        format!("{}{}", country_prefix, digits)
    }
}

/// Validate an RFC-ish email address with the same permissive pattern the
/// source bot uses, implemented without a regex engine: local-part of
/// allowed characters, an `@`, a domain with at least one `.`, and a
/// TLD of at least two letters.
pub fn validate_email(text: &str) -> Result<String, ChatFsmError> {
    let email = text.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ChatFsmError::EmailInvalid);
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ChatFsmError::EmailInvalid);
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if !local_ok {
        return Err(ChatFsmError::EmailInvalid);
    }
    let Some((domain_head, tld)) = domain.rsplit_once('.') else {
        return Err(ChatFsmError::EmailInvalid);
    };
    if domain_head.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ChatFsmError::EmailInvalid);
    }
    let domain_ok = domain_head
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !domain_ok {
        return Err(ChatFsmError::EmailInvalid);
    }
    Ok(email)
}

/// A free-form address broken into structured components. `commune_id`
/// is `None` only when no candidate commune matched and the caller has no
/// fallback to offer — a first-class commune identifier on the address
/// input (per the design notes) should make this unreachable in the
/// normal chat flow, where a fallback default commune is always supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub commune_id: Option<CommuneId>,
}

/// Parse a free-form address the way the source bot does: find the
/// longest-matching known commune name as a suffix, strip it (and a
/// trailing comma) off, then split the remainder into `street`, `number`,
/// `complement` by matching the last run of digits as the house number.
/// `communes` should be supplied longest-name-first is not required here;
/// this function sorts by length itself so "San Joaquín" is preferred
/// over a shorter "San" collision.
pub fn parse_address(text: &str, communes: &[(CommuneId, String)]) -> ParsedAddress {
    let text = text.trim();
    let mut sorted_communes: Vec<&(CommuneId, String)> = communes.iter().collect();
    sorted_communes.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));

    let mut commune_id = None;
    let mut remainder = text.to_string();
    for (id, name) in sorted_communes {
        if name.is_empty() {
            continue;
        }
        let lower_text = remainder.to_lowercase();
        let lower_name = name.to_lowercase();
        if lower_text.ends_with(&lower_name) {
            let cut = remainder.len() - name.len();
            remainder = remainder[..cut].trim().trim_end_matches(',').trim().to_string();
            commune_id = Some(*id);
            break;
        }
    }

    // `^(street)\s+(\d+)(rest)$`: split on the last whitespace-preceded
    // run of digits, treating everything after it as the complement.
    let bytes = remainder.as_bytes();
    let mut digit_end = None;
    let mut digit_start = None;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        if bytes[i].is_ascii_digit() {
            if digit_end.is_none() {
                digit_end = Some(i + 1);
            }
            digit_start = Some(i);
        } else if digit_end.is_some() {
            break;
        }
    }

    match (digit_start, digit_end) {
        (Some(start), Some(end)) if start > 0 && remainder.as_bytes()[start - 1].is_ascii_whitespace() => {
            let street = remainder[..start].trim().to_string();
            let number = remainder[start..end].to_string();
            let complement = remainder[end..].trim().trim_start_matches(',').trim().to_string();
            ParsedAddress {
                street,
                number,
                complement,
                commune_id,
            }
        }
        _ => ParsedAddress {
            street: remainder,
            number: "S/N".to_string(),
            complement: String::new(),
            commune_id,
        },
    }
}

/// State held across messages for one phone number's conversation,
/// persisted as `ChatSession.data` by the caller. Pure-data only; no
/// behavior beyond what the free functions above compute from it.
#[derive(Debug, Clone, Default)]
pub struct ChatSessionData {
    pub service_id: Option<ServiceId>,
    pub date: Option<NaiveDate>,
    pub offers: Vec<ChatOfferIndexEntry>,
    pub chosen_offer: Option<usize>,
    pub email: Option<String>,
}

/// An offer as it survives a session-data round trip (e.g. through JSON),
/// keyed back to its [`ChatOffer`] fields.
#[derive(Debug, Clone, Copy)]
pub struct ChatOfferIndexEntry {
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub professional_id: ProfessionalId,
    pub slot_id: SlotId,
}

impl From<ChatOffer> for ChatOfferIndexEntry {
    fn from(o: ChatOffer) -> Self {
        Self {
            start: o.start,
            end: o.end,
            professional_id: o.professional_id,
            slot_id: o.slot_id,
        }
    }
}

/// Build the service-duration lookup the booking step needs from a set of
/// `(service_id, professional_id, effective_duration_minutes)` rows — the
/// N+1-elimination prefetch the design notes call for, reused here for the
/// single-service chat booking path.
pub fn effective_duration_lookup(
    rows: &[(ServiceId, ProfessionalId, i32)],
) -> HashMap<(ServiceId, ProfessionalId), i32> {
    rows.iter().map(|(s, p, d)| ((*s, *p), *d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn cid(n: u128) -> CommuneId {
        CommuneId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn global_commands_recognized_case_insensitively() {
        assert_eq!(parse_global_command("MENU"), Some(GlobalCommand::Menu));
        assert_eq!(parse_global_command("Cancelar"), Some(GlobalCommand::Cancel));
        assert_eq!(parse_global_command("ayuda"), Some(GlobalCommand::Help));
        assert_eq!(parse_global_command("hola"), None);
    }

    #[test]
    fn menu_choice_accepts_number_or_keyword() {
        assert_eq!(parse_menu_choice("1").unwrap(), MenuChoice::Book);
        assert_eq!(parse_menu_choice("quiero agendar").unwrap(), MenuChoice::Book);
        assert_eq!(parse_menu_choice("2").unwrap(), MenuChoice::QueryReservations);
        assert_eq!(parse_menu_choice("hablar con ejecutivo").unwrap(), MenuChoice::HumanHandoff);
        assert!(parse_menu_choice("xyz").is_err());
    }

    #[test]
    fn service_choice_is_one_based_and_bounds_checked() {
        assert_eq!(parse_service_choice("1", 3).unwrap(), 0);
        assert_eq!(parse_service_choice("3", 3).unwrap(), 2);
        assert!(parse_service_choice("4", 3).is_err());
        assert!(parse_service_choice("0", 3).is_err());
        assert!(parse_service_choice("abc", 3).is_err());
    }

    #[test]
    fn booking_date_rejects_past_and_format() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert!(parse_booking_date("27/07/2026", today, 90).is_err());
        assert!(matches!(
            parse_booking_date("26/07/2026", today, 90),
            Err(ChatFsmError::DatePast)
        ));
        assert!(matches!(
            parse_booking_date("2026-07-28", today, 90),
            Err(ChatFsmError::DateFormat)
        ));
        assert!(parse_booking_date("28/07/2026", today, 90).is_ok());
    }

    #[test]
    fn booking_date_rejects_too_far_out() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert!(matches!(
            parse_booking_date("01/12/2026", today, 90),
            Err(ChatFsmError::DateTooFar)
        ));
    }

    #[test]
    fn phone_normalization_strips_non_digits() {
        assert_eq!(normalize_phone_digits("+56 9 8614 2813"), "56986142813");
    }

    #[test]
    fn phone_identity_suffix_is_last_eight_digits() {
        assert_eq!(
            phone_identity_suffix("+56 9 8614 2813").unwrap(),
            "86142813"
        );
        assert_eq!(phone_identity_suffix("98614281").unwrap(), "98614281");
        assert!(phone_identity_suffix("1234").is_none());
    }

    #[test]
    fn phone_normalize_full_prefixes_country_code() {
        assert_eq!(normalize_phone_full("9 8614 2813", "56"), "56986142813");
        assert_eq!(normalize_phone_full("56986142813", "56"), "56986142813");
    }

    #[test]
    fn email_validation_accepts_plausible_and_rejects_garbage() {
        assert_eq!(validate_email(" Jane.Doe@Example.com ").unwrap(), "jane.doe@example.com");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@b.com").is_err());
    }

    #[test]
    fn address_parsing_matches_longest_commune_suffix() {
        let communes = vec![
            (cid(1), "San Joaquin".to_string()),
            (cid(2), "San Miguel".to_string()),
            (cid(3), "Santiago".to_string()),
        ];
        let parsed = parse_address("Av. Vicuna Mackenna 4927, Depto 3108, San Joaquin", &communes);
        assert_eq!(parsed.street, "Av. Vicuna Mackenna");
        assert_eq!(parsed.number, "4927");
        assert_eq!(parsed.complement, "Depto 3108");
        assert_eq!(parsed.commune_id, Some(cid(1)));
    }

    #[test]
    fn address_parsing_without_number_falls_back_to_s_n() {
        let communes = vec![(cid(1), "Santiago".to_string())];
        let parsed = parse_address("Calle Sin Numero, Santiago", &communes);
        assert_eq!(parsed.number, "S/N");
        assert_eq!(parsed.commune_id, Some(cid(1)));
    }

    #[test]
    fn address_parsing_without_matching_commune_leaves_it_unset() {
        let communes = vec![(cid(1), "Santiago".to_string())];
        let parsed = parse_address("Calle Falsa 123", &communes);
        assert_eq!(parsed.street, "Calle Falsa");
        assert_eq!(parsed.number, "123");
        assert_eq!(parsed.commune_id, None);
    }

    #[test]
    fn time_choice_requires_offers_present() {
        let offers: Vec<ChatOffer> = vec![];
        assert!(matches!(
            parse_time_choice("1", &offers),
            Err(ChatFsmError::NoOffersInSession)
        ));
    }

    #[test]
    fn cap_offers_limits_to_ten_and_takes_first_professional() {
        use crate::availability::Offer;
        let pid = ProfessionalId::new();
        let sid = SlotId::new();
        let offers: Vec<Offer> = (0..15)
            .map(|i| Offer {
                start: chrono::Utc::now() + chrono::Duration::hours(i),
                end: chrono::Utc::now() + chrono::Duration::hours(i + 1),
                professionals: vec![pid],
                slot_ids: vec![sid],
            })
            .collect();
        let capped = cap_offers(&offers);
        assert_eq!(capped.len(), 10);
    }
}
