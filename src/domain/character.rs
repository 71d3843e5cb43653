//! Character entity and its caller-facing projection.

use serde::{Deserialize, Serialize};

/// A character record as stored locally or returned by the remote API.
///
/// `id` may be zero when the record was sourced externally and has not been
/// persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub ki: String,
    pub max_ki: String,
    pub race: String,
    pub gender: String,
    pub image: String,
    pub affiliation: String,
}

/// Output projection returned to callers of the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDto {
    pub id: i64,
    pub name: String,
    pub ki: String,
    pub max_ki: String,
    pub race: String,
    pub gender: String,
    pub image: String,
    pub affiliation: String,
}

impl From<&Character> for CharacterDto {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            ki: c.ki.clone(),
            max_ki: c.max_ki.clone(),
            race: c.race.clone(),
            gender: c.gender.clone(),
            image: c.image.clone(),
            affiliation: c.affiliation.clone(),
        }
    }
}
