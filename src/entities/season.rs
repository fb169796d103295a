//! Season entity type

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::entity::{
    ensure_known, ensure_unique_label, find_by_id, Change, Draft, Entity, ValidationError,
};
use crate::core::identity::{CollectionKind, EntityId};

/// A selling season (e.g. "Summer 2026")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    /// Unique identifier
    pub id: EntityId,

    /// Season name
    pub name: String,

    /// First day of the season
    pub starts_on: NaiveDate,

    /// Last day of the season
    pub ends_on: NaiveDate,

    /// Whether the storefront currently shows this season
    #[serde(default)]
    pub active: bool,
}

impl Season {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            starts_on,
            ends_on,
            active: false,
        }
    }

    /// True if `day` falls inside the season (inclusive)
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.starts_on <= day && day <= self.ends_on
    }
}

impl Entity for Season {
    const KIND: CollectionKind = CollectionKind::Season;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Fields an update may touch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonChanges {
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub active: Option<bool>,
}

impl SeasonChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.starts_on.is_none()
            && self.ends_on.is_none()
            && self.active.is_none()
    }

    pub fn apply(&self, season: &Season) -> Season {
        let mut next = season.clone();
        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(starts) = self.starts_on {
            next.starts_on = starts;
        }
        if let Some(ends) = self.ends_on {
            next.ends_on = ends;
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        next
    }
}

/// Season form input
#[derive(Debug, Clone, PartialEq)]
pub enum SeasonDraft {
    Create {
        name: String,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    },
    Update {
        id: EntityId,
        changes: SeasonChanges,
    },
    Delete {
        id: EntityId,
    },
}

fn ensure_range(starts: NaiveDate, ends: NaiveDate) -> Result<(), ValidationError> {
    if ends < starts {
        return Err(ValidationError::InvalidDateRange { starts, ends });
    }
    Ok(())
}

impl Draft<Season> for SeasonDraft {
    fn validate(&self, existing: &[Season]) -> Result<(), ValidationError> {
        match self {
            SeasonDraft::Create {
                name,
                starts_on,
                ends_on,
            } => {
                ensure_unique_label(existing, name, None)?;
                ensure_range(*starts_on, *ends_on)
            }
            SeasonDraft::Update { id, changes } => {
                let current = find_by_id(existing, id).ok_or_else(|| ValidationError::UnknownId {
                    noun: Season::KIND.noun(),
                    id: id.clone(),
                })?;
                if changes.is_empty() {
                    return Err(ValidationError::NoChanges);
                }
                if let Some(name) = &changes.name {
                    ensure_unique_label(existing, name, Some(id))?;
                }
                let merged = changes.apply(current);
                ensure_range(merged.starts_on, merged.ends_on)
            }
            SeasonDraft::Delete { id } => ensure_known(existing, id),
        }
    }

    fn into_change(self, existing: &[Season]) -> Change<Season> {
        match self {
            SeasonDraft::Create {
                name,
                starts_on,
                ends_on,
            } => Change::Create(Season::new(
                EntityId::temporary(),
                name.trim(),
                starts_on,
                ends_on,
            )),
            SeasonDraft::Update { id, changes } => match find_by_id(existing, &id) {
                Some(current) => Change::Update(changes.apply(current)),
                None => {
                    let today = chrono::Utc::now().date_naive();
                    Change::Update(changes.apply(&Season::new(id, "", today, today)))
                }
            },
            SeasonDraft::Delete { id } => Change::Delete(id),
        }
    }
}
