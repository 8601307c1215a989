//! Masked-value heuristics.
//!
//! Inbound contact data (chat webhooks, partially-filled forms) sometimes
//! carries a masked placeholder instead of a real value — an email like
//! `j***@example.com`, a plate `AB**12`, a street with stars redacting a
//! house number the client didn't want to give over chat. The booking
//! transactor must not let a masked value clobber a previously-known real
//! one. This module is the single place that heuristic lives.

/// A value containing `*` is treated as masked/redacted.
pub fn is_masked(value: &str) -> bool {
    value.contains('*')
}

/// Blank (after trimming) or masked — the two reasons to skip an upsert
/// entirely (vehicle plate, address street).
pub fn is_blank_or_masked(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || is_masked(trimmed)
}

/// A last name ending in `.` with length <= 3 whose stem (everything but
/// the trailing dot) is a prefix of the client's current last name is
/// treated as a masked abbreviation (e.g. incoming `"P."` against a
/// current last name of `"Perez"`), not a real update.
pub fn is_masked_last_name(current_last_name: &str, incoming_last_name: &str) -> bool {
    if !incoming_last_name.ends_with('.') || incoming_last_name.len() > 3 {
        return false;
    }
    let stem = &incoming_last_name[..incoming_last_name.len() - 1];
    !stem.is_empty() && current_last_name.starts_with(stem)
}

/// Decide whether an incoming contact field (first name, last name, phone)
/// should overwrite the client's current value: non-empty, different, and
/// not a masked form of what's already on file.
pub fn should_update_contact_field(current: &str, incoming: &str) -> bool {
    let incoming_trimmed = incoming.trim();
    if incoming_trimmed.is_empty() || incoming_trimmed == current {
        return false;
    }
    if is_masked(incoming_trimmed) {
        return false;
    }
    !is_masked_last_name(current, incoming_trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_email_detected() {
        assert!(is_masked("j***@example.com"));
        assert!(!is_masked("jane@example.com"));
    }

    #[test]
    fn blank_or_masked_plate() {
        assert!(is_blank_or_masked(""));
        assert!(is_blank_or_masked("   "));
        assert!(is_blank_or_masked("AB**12"));
        assert!(!is_blank_or_masked("AB1234"));
    }

    #[test]
    fn masked_last_name_abbreviation() {
        assert!(is_masked_last_name("Perez", "P."));
        assert!(is_masked_last_name("Perez", "Pe."));
        assert!(!is_masked_last_name("Perez", "Gomez"));
        assert!(!is_masked_last_name("Perez", "Gonzalez."));
    }

    #[test]
    fn should_update_contact_field_rules() {
        assert!(!should_update_contact_field("Perez", ""));
        assert!(!should_update_contact_field("Perez", "Perez"));
        assert!(!should_update_contact_field("Perez", "P."));
        assert!(!should_update_contact_field("Perez", "***"));
        assert!(should_update_contact_field("Perez", "Gomez"));
    }
}
