//! Family members managed by a caregiver.
//!
//! The collection holds the user's own profile (id [`SELF_ID`]) and any
//! relatives they register for. At most one member is the default: the
//! person pre-selected for registration and medication actions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{timestamp_id, Named, Record};
use crate::error::{Error, Result};
use crate::validation;

/// Id of the user's own profile.
pub const SELF_ID: &str = "self";

/// How a family member is related to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The user themselves.
    #[serde(rename = "self")]
    SelfProfile,
    /// Husband or wife.
    Spouse,
    /// Mother or father.
    Parent,
    /// Son or daughter.
    Child,
    /// Brother or sister.
    Sibling,
    /// Grandson or granddaughter.
    Grandchild,
    /// Any other relative.
    Relative,
    /// Not related (e.g. a carer).
    Other,
}

impl Relation {
    /// Every relation label, in the order a form lists them.
    pub const ALL: [Relation; 8] = [
        Relation::SelfProfile,
        Relation::Spouse,
        Relation::Parent,
        Relation::Child,
        Relation::Sibling,
        Relation::Grandchild,
        Relation::Relative,
        Relation::Other,
    ];
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfProfile => write!(f, "self"),
            Self::Spouse => write!(f, "spouse"),
            Self::Parent => write!(f, "parent"),
            Self::Child => write!(f, "child"),
            Self::Sibling => write!(f, "sibling"),
            Self::Grandchild => write!(f, "grandchild"),
            Self::Relative => write!(f, "relative"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation("relation", format!("unknown relation '{s}'")))
    }
}

/// A stored family member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// `member-<millis>`, or [`SELF_ID`] for the user's own profile.
    pub id: String,

    /// Full name.
    pub name: String,

    /// Relation to the user.
    pub relation: Relation,

    /// Resident ID card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card: Option<String>,

    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Hospital medical card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_card_no: Option<String>,

    /// Whether this member is pre-selected for actions.
    #[serde(default)]
    pub is_default: bool,
}

impl FamilyMember {
    /// Whether this is the user's own profile.
    #[must_use]
    pub fn is_self(&self) -> bool {
        self.id == SELF_ID
    }
}

impl Record for FamilyMember {
    const KEY: &'static str = "familyMembers";

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        validation::id_card().check(self.id_card.as_deref())?;
        validation::phone().check(self.phone.as_deref())?;
        validation::medical_card_no().check(self.medical_card_no.as_deref())?;
        Ok(())
    }
}

impl Named for FamilyMember {
    fn display_name(&self) -> &str {
        &self.name
    }
}

/// A family member as submitted by the add/edit form.
///
/// `id` is absent for a new member. `relation` is optional here so a form
/// missing it can be rejected with a field error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyMemberForm {
    /// Id of the member being edited.
    pub id: Option<String>,
    /// Full name.
    pub name: String,
    /// Relation to the user.
    pub relation: Option<Relation>,
    /// Resident ID card number.
    pub id_card: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Hospital medical card number.
    pub medical_card_no: Option<String>,
    /// Whether to make this member the default.
    pub is_default: bool,
}

impl FamilyMemberForm {
    /// A form creating the user's own profile.
    #[must_use]
    pub fn self_profile(name: impl Into<String>) -> Self {
        Self {
            id: Some(SELF_ID.to_string()),
            name: name.into(),
            relation: Some(Relation::SelfProfile),
            ..Self::default()
        }
    }

    /// Turn the form into a record with the given id.
    fn into_member(self, id: String) -> Result<FamilyMember> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("name", "is required"));
        }
        let relation = self
            .relation
            .ok_or_else(|| Error::validation("relation", "is required"))?;

        let member = FamilyMember {
            id,
            name,
            relation,
            id_card: non_blank(self.id_card),
            phone: non_blank(self.phone),
            medical_card_no: non_blank(self.medical_card_no),
            is_default: self.is_default,
        };
        member.validate()?;
        Ok(member)
    }
}

impl From<&FamilyMember> for FamilyMemberForm {
    fn from(member: &FamilyMember) -> Self {
        Self {
            id: Some(member.id.clone()),
            name: member.name.clone(),
            relation: Some(member.relation),
            id_card: member.id_card.clone(),
            phone: member.phone.clone(),
            medical_card_no: member.medical_card_no.clone(),
            is_default: member.is_default,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Insert or update a family member from a submitted form.
///
/// A form whose id matches an existing member replaces that member's fields;
/// anything else is appended under a fresh `member-<millis>` id. Marking the
/// candidate as default clears the flag everywhere else, and the first member
/// ever added is always the default. The result is not persisted.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the form is incomplete or malformed, or
/// if it tries to change the name or relation of the user's own profile.
pub fn upsert_family_member(
    mut records: Vec<FamilyMember>,
    candidate: FamilyMemberForm,
) -> Result<Vec<FamilyMember>> {
    let existing = candidate
        .id
        .as_deref()
        .and_then(|id| records.iter().position(|m| m.id == id));

    let id = match (existing, candidate.id.as_deref()) {
        (Some(idx), _) => records[idx].id.clone(),
        (None, Some(SELF_ID)) => SELF_ID.to_string(),
        (None, _) => timestamp_id("member", chrono::Utc::now().timestamp_millis(), |id| {
            records.iter().any(|m| m.id == id)
        }),
    };

    let mut member = candidate.into_member(id)?;

    if let Some(idx) = existing {
        let current = &records[idx];
        if current.is_self() {
            if current.name != member.name {
                return Err(Error::validation(
                    "name",
                    "the name of your own profile cannot be changed",
                ));
            }
            if current.relation != member.relation {
                return Err(Error::validation(
                    "relation",
                    "the relation of your own profile cannot be changed",
                ));
            }
        }
    } else if records.is_empty() {
        member.is_default = true;
    }

    if member.is_default {
        for other in records.iter_mut().filter(|m| m.id != member.id) {
            other.is_default = false;
        }
    }

    match existing {
        Some(idx) => {
            debug!("Updated family member {}", member.id);
            records[idx] = member;
        }
        None => {
            info!("Added family member {}", member.id);
            records.push(member);
        }
    }
    Ok(records)
}

/// Remove a family member by id.
///
/// If the removed member was the default, the first remaining member takes
/// over the flag.
///
/// # Errors
///
/// Returns [`Error::Validation`] for the user's own profile or an unknown id.
pub fn delete_family_member(mut records: Vec<FamilyMember>, id: &str) -> Result<Vec<FamilyMember>> {
    if id == SELF_ID {
        return Err(Error::validation("id", "your own profile cannot be deleted"));
    }
    let idx = records
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| Error::validation("id", format!("no family member with id '{id}'")))?;

    let removed = records.remove(idx);
    if removed.is_default {
        if let Some(first) = records.first_mut() {
            first.is_default = true;
        }
    }
    info!("Deleted family member {}", removed.id);
    Ok(records)
}

/// Find a member by id, e.g. to load it into the edit form.
#[must_use]
pub fn find_member<'a>(records: &'a [FamilyMember], id: &str) -> Option<&'a FamilyMember> {
    records.iter().find(|m| m.id == id)
}

/// The default member, if any.
#[must_use]
pub fn default_member(records: &[FamilyMember]) -> Option<&FamilyMember> {
    records.iter().find(|m| m.is_default)
}
