use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::userdtos::validate_skills;
use crate::models::providermodel::{Availability, NewCategory, ProviderFilter, ProviderProfileChanges};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProviderProfileDto {
    #[validate(
        length(max = 20, message = "At most 20 skills are allowed"),
        custom = "validate_skills"
    )]
    pub skills: Option<Vec<String>>,

    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate: Option<f64>,

    #[validate(range(min = 0, max = 80, message = "Experience must be between 0-80 years"))]
    pub experience_years: Option<i32>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub availability: Option<Availability>,
}

impl From<UpdateProviderProfileDto> for ProviderProfileChanges {
    fn from(dto: UpdateProviderProfileDto) -> Self {
        ProviderProfileChanges {
            skills: dto.skills,
            hourly_rate: dto.hourly_rate,
            experience_years: dto.experience_years,
            description: dto.description,
            availability: dto.availability,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProviderSearchQueryDto {
    pub category: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "min_rating must be between 0 and 5"))]
    pub min_rating: Option<f64>,
    #[validate(range(min = 0.0, message = "max_rate cannot be negative"))]
    pub max_rate: Option<f64>,
    pub search: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<ProviderSearchQueryDto> for ProviderFilter {
    fn from(query: ProviderSearchQueryDto) -> Self {
        ProviderFilter {
            category: non_blank(query.category),
            location: non_blank(query.location),
            min_rating: query.min_rating,
            max_rate: query.max_rate,
            search: non_blank(query.search),
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1-50 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: Option<String>,
}

impl From<CreateCategoryDto> for NewCategory {
    fn from(dto: CreateCategoryDto) -> Self {
        NewCategory {
            name: dto.name.trim().to_string(),
            description: dto.description,
            icon: dto.icon,
        }
    }
}
