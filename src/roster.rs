//! Participant roster management
//!
//! This module tracks the participants joined to one session: their names,
//! running score totals, and connectivity. Names are unique per session as
//! a (first, last) pair, and join order is preserved because it serves as
//! the final ranking tie-break.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::session::MAX_NAME_LENGTH;

/// A unique identifier for a participant within a session
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Creates a new random participant ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ParticipantId {
    type Err = uuid::Error;

    /// Parses a participant ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Errors that can occur when joining a roster
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Another participant in this session already uses the same name pair
    #[error("a participant with this name already exists")]
    DuplicateName,
    /// A name is blank after trimming
    #[error("first and last name must not be empty")]
    EmptyName,
    /// A name exceeds [`MAX_NAME_LENGTH`] characters
    #[error("names may be at most {MAX_NAME_LENGTH} characters long")]
    NameTooLong,
}

/// One joined player within a session
///
/// Score and response-time totals only ever grow; they are updated solely
/// through recorded responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier within the session
    pub id: ParticipantId,
    /// First name as given at join time
    pub first_name: String,
    /// Last name as given at join time
    pub last_name: String,
    /// Cumulative points across all recorded responses
    pub total_score: u64,
    /// Cumulative response time in milliseconds, correct answers only
    pub total_response_time_ms: u64,
    /// Whether the participant currently holds a live connection
    pub connected: bool,
}

impl Participant {
    /// Returns the participant's full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Serialization helper for Roster struct
#[derive(Deserialize)]
struct RosterSerde {
    ordered: Vec<Participant>,
}

/// The join-order-preserving set of participants in one session
///
/// Keeps a by-id index next to the ordered list, plus the set of taken
/// name pairs for uniqueness checks.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "RosterSerde")]
pub struct Roster {
    /// Participants in join order
    ordered: Vec<Participant>,

    /// Position of each participant in `ordered` (not serialized)
    #[serde(skip_serializing)]
    index: HashMap<ParticipantId, usize>,
    /// Name pairs already taken (not serialized)
    #[serde(skip_serializing)]
    names: HashSet<(String, String)>,
}

impl From<RosterSerde> for Roster {
    /// Reconstructs the roster's lookup structures from the ordered list
    fn from(serde: RosterSerde) -> Self {
        let RosterSerde { ordered } = serde;
        let index = ordered.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        let names = ordered
            .iter()
            .map(|p| (p.first_name.clone(), p.last_name.clone()))
            .collect();
        Self {
            ordered,
            index,
            names,
        }
    }
}

impl Roster {
    /// Adds a new participant with the given names
    ///
    /// Names are trimmed before they are stored or compared. The new
    /// participant starts with zero totals and is considered connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] or [`Error::NameTooLong`] for a
    /// malformed name, and [`Error::DuplicateName`] if the trimmed
    /// (first, last) pair is already taken in this session. Either way the
    /// roster is left unchanged.
    pub fn join(&mut self, first_name: &str, last_name: &str) -> Result<&Participant, Error> {
        let first_name = first_name.trim().to_owned();
        let last_name = last_name.trim().to_owned();

        if first_name.is_empty() || last_name.is_empty() {
            return Err(Error::EmptyName);
        }
        if first_name.chars().count() > MAX_NAME_LENGTH
            || last_name.chars().count() > MAX_NAME_LENGTH
        {
            return Err(Error::NameTooLong);
        }

        let key = (first_name.clone(), last_name.clone());
        if self.names.contains(&key) {
            return Err(Error::DuplicateName);
        }
        self.names.insert(key);

        let participant = Participant {
            id: ParticipantId::new(),
            first_name,
            last_name,
            total_score: 0,
            total_response_time_ms: 0,
            connected: true,
        };
        self.index.insert(participant.id, self.ordered.len());
        self.ordered.push(participant);

        Ok(self.ordered.last().expect("participant was just pushed"))
    }

    /// Gets a participant by identifier
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.index.get(&id).map(|i| &self.ordered[*i])
    }

    /// Gets a mutable participant by identifier
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        let i = *self.index.get(&id)?;
        Some(&mut self.ordered[i])
    }

    /// Returns the number of joined participants
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Checks whether anyone has joined yet
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterates over participants in join order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.ordered.iter()
    }
}
