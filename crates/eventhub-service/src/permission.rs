//! Permission matrix for membership operations.
//!
//! Pure functions over the caller's and target's relation to an event.
//! Services load the aggregates and hand the relations in here; nothing in
//! this module performs I/O.

use eventhub_core::error::Reason;
use eventhub_core::types::UserId;
use eventhub_entity::activity::Role;
use eventhub_entity::event::Event;

/// An operation subject to the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DeleteEvent,
    CancelEvent,
    UpdateEvent,
    AddCoOrganizer,
    RemoveCoOrganizer,
    RemoveParticipant,
    BanParticipant,
    Register,
    Leave,
}

impl Operation {
    /// Operations that take someone off the event.
    fn is_removal(self) -> bool {
        matches!(
            self,
            Self::RemoveCoOrganizer | Self::RemoveParticipant | Self::BanParticipant
        )
    }
}

/// How a user relates to an event, as seen from the event aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Organizer,
    CoOrganizer,
    StandardParticipant,
    Outsider,
}

impl Relation {
    /// Derive the relation from the event's organizer field and roster.
    pub fn of(event: &Event, user_id: &UserId) -> Self {
        match event.role_of(user_id) {
            Some(Role::Organizer) => Self::Organizer,
            Some(Role::CoOrganizer) => Self::CoOrganizer,
            Some(Role::StandardParticipant) => Self::StandardParticipant,
            None => Self::Outsider,
        }
    }

    fn is_crew(self) -> bool {
        matches!(self, Self::Organizer | Self::CoOrganizer)
    }
}

/// Decide whether `actor` may perform `op` against `target`.
///
/// Checks run in a fixed order so the same inputs always produce the same
/// rejection: guards on the target first (the organizer can never be
/// removed, whoever asks), then the actor's permission, then target-state
/// rules that depend on the actor being allowed.
pub fn authorize(op: Operation, actor: Relation, target: Option<Relation>) -> Result<(), Reason> {
    if op.is_removal() && target == Some(Relation::Organizer) {
        return Err(Reason::OrganizerCannotBeRemoved);
    }
    if op == Operation::Leave && actor == Relation::Organizer {
        return Err(Reason::OrganizerCannotLeave);
    }

    let allowed = match op {
        Operation::DeleteEvent | Operation::AddCoOrganizer | Operation::RemoveCoOrganizer => {
            actor == Relation::Organizer
        }
        Operation::CancelEvent
        | Operation::UpdateEvent
        | Operation::RemoveParticipant
        | Operation::BanParticipant => actor.is_crew(),
        Operation::Register | Operation::Leave => true,
    };
    if !allowed {
        return Err(Reason::Forbidden);
    }

    match (op, target) {
        (Operation::AddCoOrganizer, Some(t)) if t.is_crew() => Err(Reason::AlreadyRegistered),
        (Operation::Register, _) if actor != Relation::Outsider => Err(Reason::AlreadyRegistered),
        _ => Ok(()),
    }
}
