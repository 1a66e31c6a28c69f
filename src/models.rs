//! Request schemas shared between routes and services.

use serde::Deserialize;

/// User life information submitted from the frontend form.
///
/// Field names on the wire are camelCase to match the form payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeInfo {
    pub nickname: String,
    pub age: u32,
    pub gender: String,
    pub city: String,
    /// single, dating, married, complicated
    pub relationship: String,
    /// yes, no
    pub has_kids: String,
    pub occupation: String,
    /// stable, moderate, freelance, unstable
    pub job_stability: String,
    /// owned, renting, living_with_parents
    pub housing: String,
    /// regular, balanced, chaotic
    pub lifestyle: String,
    pub life_desc: String,
    #[serde(default)]
    pub dream: Option<String>,
}

impl LifeInfo {
    /// The dream field, if the user actually filled it in.
    pub fn dream_text(&self) -> Option<&str> {
        self.dream.as_deref().filter(|d| !d.trim().is_empty())
    }
}
