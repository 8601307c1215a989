//! Pure business logic for the appointment scheduling engine.
//!
//! Every module here is I/O-free: repository reads/writes, transaction
//! scoping and row locking live in `db`, which calls into these modules
//! for the actual decisions. This split is what lets C3-C8's algorithms be
//! unit tested without a database.
//!
//! - [`slot_rules`] — C3 Slot Generator interval math.
//! - [`availability`] — C4 Availability Calculator consolidation.
//! - [`booking_rules`] — C5 Booking Transactor pre-validation and chain sizing.
//! - [`masking`] — masked-contact-value heuristics shared by C5's client/vehicle/address upserts.
//! - [`lifecycle`] — C6 Lifecycle Controller transition decisions.
//! - [`events`] — C7 Event Dispatcher trigger table and outbound ports.
//! - [`chat_fsm`] — C8 Chat Session FSM transitions.

pub mod availability;
pub mod booking_rules;
pub mod chat_fsm;
pub mod events;
pub mod lifecycle;
pub mod masking;
pub mod slot_rules;
