use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entry of the genre catalogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    #[serde(rename = "genreId")]
    pub genre_id: i64,
    pub name: String,
}

/// A catalogue genre annotated with the user's preference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserGenre {
    #[serde(flatten)]
    pub genre: Genre,
    #[serde(rename = "isPreferred")]
    pub is_preferred: bool,
}

/// Preferred genre ids stored on a user record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPreferenceSet {
    pub preferences: Vec<i64>,
}

impl UserPreferenceSet {
    pub fn new(preferences: Vec<i64>) -> Self {
        Self { preferences }
    }

    /// Annotates every catalogue genre, keeping catalogue order
    pub fn annotate(&self, catalogue: Vec<Genre>) -> Vec<UserGenre> {
        let preferred: HashSet<i64> = self.preferences.iter().copied().collect();
        catalogue
            .into_iter()
            .map(|genre| UserGenre {
                is_preferred: preferred.contains(&genre.genre_id),
                genre,
            })
            .collect()
    }
}

/// Body accepted by the preference update endpoint: either a bare id list
/// or an object with a `preferences` key
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PreferenceUpdate {
    Ids(Vec<i64>),
    Wrapped(UserPreferenceSet),
}

impl From<PreferenceUpdate> for UserPreferenceSet {
    fn from(update: PreferenceUpdate) -> Self {
        match update {
            PreferenceUpdate::Ids(ids) => UserPreferenceSet::new(ids),
            PreferenceUpdate::Wrapped(set) => set,
        }
    }
}
