use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::usermodel::UserSummary;

/// Categories inserted at start-up when missing: (name, description, icon).
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Plumber", "Water pipe repairs, installations, and maintenance", "wrench"),
    ("Electrician", "Electrical repairs, wiring, and installations", "zap"),
    ("Cleaner", "House cleaning and maintenance services", "sparkles"),
    ("Tutor", "Educational tutoring and teaching services", "book"),
    ("Mechanic", "Vehicle repairs and maintenance", "settings"),
    ("Handyman", "General repairs and maintenance work", "hammer"),
];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Working hours within a single day, written as `HH:MM-HH:MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "time range start {} must be before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            ));
        }
        Ok(TimeRange { start, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid time range '{}', expected HH:MM-HH:MM", s))?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .map_err(|_| format!("invalid time '{}' in range '{}'", part.trim(), s))
        };
        TimeRange::new(parse(start)?, parse(end)?)
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Weekly availability schedule. Days without an entry are unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Availability(pub BTreeMap<Weekday, TimeRange>);

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ServiceProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(json)]
    pub skills: Vec<String>,
    pub hourly_rate: f64,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    #[sqlx(json)]
    pub availability: Availability,
    pub rating: f64,
    pub total_reviews: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider profile together with the owning user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderListing {
    #[serde(flatten)]
    pub profile: ServiceProvider,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default)]
pub struct NewProviderProfile {
    pub skills: Vec<String>,
    pub hourly_rate: f64,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    pub availability: Availability,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProviderProfileChanges {
    pub skills: Option<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    pub availability: Option<Availability>,
}

impl ProviderProfileChanges {
    pub fn apply_to(&self, profile: &mut ServiceProvider) {
        if let Some(skills) = &self.skills {
            profile.skills = skills.clone();
        }
        if let Some(rate) = self.hourly_rate {
            profile.hourly_rate = rate;
        }
        if let Some(years) = self.experience_years {
            profile.experience_years = Some(years);
        }
        if let Some(description) = &self.description {
            profile.description = Some(description.clone());
        }
        if let Some(availability) = &self.availability {
            profile.availability = availability.clone();
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Directory search predicates. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rate: Option<f64>,
    pub search: Option<String>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl ProviderFilter {
    pub fn matches(&self, profile: &ServiceProvider, user: &UserSummary) -> bool {
        if !user.is_active {
            return false;
        }

        if let Some(category) = &self.category {
            if !profile.skills.iter().any(|skill| contains_ci(skill, category)) {
                return false;
            }
        }

        if let Some(location) = &self.location {
            match &user.location {
                Some(user_location) if contains_ci(user_location, location) => {}
                _ => return false,
            }
        }

        if let Some(min_rating) = self.min_rating {
            if profile.rating < min_rating {
                return false;
            }
        }

        if let Some(max_rate) = self.max_rate {
            if profile.hourly_rate > max_rate {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let in_name = contains_ci(&user.full_name, term);
            let in_description = profile
                .description
                .as_deref()
                .map(|d| contains_ci(d, term))
                .unwrap_or(false);
            let in_skills = profile.skills.iter().any(|skill| contains_ci(skill, term));
            if !(in_name || in_description || in_skills) {
                return false;
            }
        }

        true
    }
}
