//! Life type analysis — scores a profile and buckets it into a life type.

use crate::models::LifeInfo;

/// Stability bucket derived from the profile score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeType {
    Stable,
    Middle,
    Drifting,
}

impl LifeType {
    /// User-facing label sent over the wire and substituted into prompts.
    pub fn label(&self) -> &'static str {
        match self {
            LifeType::Stable => "稳定型",
            LifeType::Middle => "中间型",
            LifeType::Drifting => "漂泊型",
        }
    }
}

fn relationship_score(value: &str) -> i32 {
    match value {
        "married" => 25,
        "dating" => 15,
        "single" => 5,
        "complicated" => 0,
        _ => 10,
    }
}

fn job_score(value: &str) -> i32 {
    match value {
        "stable" => 25,
        "moderate" => 15,
        "freelance" => 5,
        "unstable" => 0,
        _ => 10,
    }
}

fn housing_score(value: &str) -> i32 {
    match value {
        "owned" => 20,
        "living_with_parents" => 10,
        "renting" => 5,
        _ => 10,
    }
}

fn lifestyle_score(value: &str) -> i32 {
    match value {
        "regular" => 15,
        "balanced" => 10,
        "chaotic" => 0,
        _ => 5,
    }
}

/// Analyze a user's life type and return `(type, stability_score)`.
///
/// Higher score means more stable, lower score means more turbulent.
/// Total function: unrecognized category values fall back to the mid
/// weight of their table instead of failing.
pub fn analyze_life_type(info: &LifeInfo) -> (LifeType, i32) {
    let mut score = 0;
    score += relationship_score(&info.relationship);

    if info.has_kids == "yes" {
        score += 15;
    }

    score += job_score(&info.job_stability);
    score += housing_score(&info.housing);
    score += lifestyle_score(&info.lifestyle);

    let life_type = if score >= 60 {
        LifeType::Stable
    } else if score >= 35 {
        LifeType::Middle
    } else {
        LifeType::Drifting
    };

    (life_type, score)
}
