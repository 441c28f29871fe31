//! Role-keyed participant roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eventhub_core::types::UserId;

use crate::activity::Role;

/// Co-organizers and standard participants of an event.
///
/// Held as a single map from user to role, so a user can never appear
/// under two roles. Serialized as two id lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RosterDocument", into = "RosterDocument")]
pub struct Roster {
    members: BTreeMap<UserId, Role>,
}

/// Stored shape of a [`Roster`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RosterDocument {
    /// Co-organizer ids.
    #[serde(default)]
    pub co_organizers: Vec<UserId>,
    /// Standard participant ids.
    #[serde(default)]
    pub standard_participants: Vec<UserId>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Role of a member, if any.
    pub fn role_of(&self, user_id: &UserId) -> Option<Role> {
        self.members.get(user_id).copied()
    }

    /// Check membership under any role.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    /// Put a user under `role`, replacing any previous role.
    ///
    /// Returns `false` and leaves the roster untouched for roles that are
    /// not stored in a roster.
    pub fn insert(&mut self, user_id: UserId, role: Role) -> bool {
        if !role.is_roster_role() {
            return false;
        }
        self.members.insert(user_id, role);
        true
    }

    /// Remove a user, returning the role they held.
    pub fn remove(&mut self, user_id: &UserId) -> Option<Role> {
        self.members.remove(user_id)
    }

    /// Co-organizer ids in ascending order.
    pub fn co_organizers(&self) -> Vec<UserId> {
        self.with_role(Role::CoOrganizer)
    }

    /// Standard participant ids in ascending order.
    pub fn standard_participants(&self) -> Vec<UserId> {
        self.with_role(Role::StandardParticipant)
    }

    /// Every member and their role.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, Role)> + '_ {
        self.members.iter().map(|(id, role)| (*id, *role))
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn with_role(&self, role: Role) -> Vec<UserId> {
        self.members
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl From<RosterDocument> for Roster {
    fn from(doc: RosterDocument) -> Self {
        let mut roster = Roster::new();
        for id in doc.standard_participants {
            roster.insert(id, Role::StandardParticipant);
        }
        // A corrupt document listing a user twice keeps the crew role.
        for id in doc.co_organizers {
            roster.insert(id, Role::CoOrganizer);
        }
        roster
    }
}

impl From<Roster> for RosterDocument {
    fn from(roster: Roster) -> Self {
        Self {
            co_organizers: roster.co_organizers(),
            standard_participants: roster.standard_participants(),
        }
    }
}
