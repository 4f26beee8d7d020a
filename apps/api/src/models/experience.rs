use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{AppError, FieldError};
use crate::ordering::dates::{self, DateSpan, DateWrite};
use crate::ordering::query::{SortField, SortKey};
use crate::ordering::validation::{
    double_option, non_negative, optional_text, required_text, Validate, MAX_DESCRIPTION_LEN,
    MAX_TEXT_LEN,
};
use crate::ordering::{cmp_nulls_last, contains_ci, Orderable, Resource};

const MAX_TECHNOLOGIES: usize = 50;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, sqlx::Type,
)]
#[sqlx(type_name = "employment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Experience {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub portfolio_id: Option<Uuid>,
    pub company: String,
    pub position: String,
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub is_featured: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExperience {
    pub owner_id: Option<Uuid>,
    pub portfolio_id: Option<Uuid>,
    pub company: String,
    pub position: String,
    #[serde(default = "default_employment_type")]
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub display_order: Option<i32>,
}

fn default_employment_type() -> EmploymentType {
    EmploymentType::FullTime
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExperience {
    #[serde(default, deserialize_with = "double_option")]
    pub portfolio_id: Option<Option<Uuid>>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub employment_type: Option<EmploymentType>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub is_current: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub technologies: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceFilter {
    pub owner_id: Option<Uuid>,
    pub portfolio_id: Option<Uuid>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub is_current: Option<bool>,
    pub is_featured: Option<bool>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub end_date_from: Option<NaiveDate>,
    pub end_date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceSortField {
    DisplayOrder,
    StartDate,
    EndDate,
    Company,
    Position,
    EmploymentType,
    IsCurrent,
    CreatedAt,
}

impl SortField for ExperienceSortField {
    const ALLOWED: &'static [&'static str] = &[
        "display_order",
        "start_date",
        "end_date",
        "company",
        "position",
        "employment_type",
        "is_current",
        "created_at",
    ];

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "display_order" => Some(Self::DisplayOrder),
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "company" => Some(Self::Company),
            "position" => Some(Self::Position),
            "employment_type" => Some(Self::EmploymentType),
            "is_current" => Some(Self::IsCurrent),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::DisplayOrder => "display_order",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::Company => "LOWER(company)",
            Self::Position => "LOWER(position)",
            Self::EmploymentType => "employment_type",
            Self::IsCurrent => "is_current",
            Self::CreatedAt => "created_at",
        }
    }
}

fn validate_technologies(errors: &mut Vec<FieldError>, technologies: &[String]) {
    if technologies.len() > MAX_TECHNOLOGIES {
        errors.push(FieldError::new(
            "technologies",
            format!("must list at most {MAX_TECHNOLOGIES} entries"),
        ));
    }
    if technologies.iter().any(|t| t.trim().is_empty()) {
        errors.push(FieldError::new("technologies", "must not contain empty entries"));
    }
}

/// Trims entries and drops case-insensitive duplicates, keeping first occurrence.
fn normalize_technologies(technologies: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(technologies.len());
    for tech in technologies {
        let tech = tech.trim().to_string();
        if !out.iter().any(|t| t.eq_ignore_ascii_case(&tech)) {
            out.push(tech);
        }
    }
    out
}

impl Validate for CreateExperience {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required_text(&mut errors, "company", &self.company, MAX_TEXT_LEN);
        required_text(&mut errors, "position", &self.position, MAX_TEXT_LEN);
        optional_text(&mut errors, "location", self.location.as_deref(), MAX_TEXT_LEN);
        optional_text(&mut errors, "description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        validate_technologies(&mut errors, &self.technologies);
        non_negative(&mut errors, "display_order", self.display_order);
        errors
    }
}

impl Validate for UpdateExperience {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        optional_text(&mut errors, "company", self.company.as_deref(), MAX_TEXT_LEN);
        optional_text(&mut errors, "position", self.position.as_deref(), MAX_TEXT_LEN);
        optional_text(
            &mut errors,
            "location",
            self.location.as_ref().and_then(|v| v.as_deref()),
            MAX_TEXT_LEN,
        );
        optional_text(
            &mut errors,
            "description",
            self.description.as_ref().and_then(|v| v.as_deref()),
            MAX_DESCRIPTION_LEN,
        );
        if let Some(technologies) = &self.technologies {
            validate_technologies(&mut errors, technologies);
        }
        non_negative(&mut errors, "display_order", self.display_order);
        errors
    }
}

impl Orderable for Experience {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
    fn collection_key(&self) -> Option<Uuid> {
        self.portfolio_id
    }
    fn display_order(&self) -> i32 {
        self.display_order
    }
    fn set_display_order(&mut self, order: i32) {
        self.display_order = order;
    }
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Resource for Experience {
    const KIND: &'static str = "experience";

    type Create = CreateExperience;
    type Patch = UpdateExperience;
    type Filter = ExperienceFilter;
    type SortField = ExperienceSortField;

    fn requested_owner(input: &CreateExperience) -> Option<Uuid> {
        input.owner_id
    }

    fn requested_order(input: &CreateExperience) -> Option<i32> {
        input.display_order
    }

    fn patched_order(patch: &UpdateExperience) -> Option<i32> {
        patch.display_order
    }

    fn from_create(
        input: CreateExperience,
        id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let span = dates::enforce(
            DateSpan {
                start_date: input.start_date,
                end_date: input.end_date,
                is_current: input.is_current,
            },
            &DateWrite::full(input.is_current, input.end_date),
        )?;
        Ok(Experience {
            id,
            owner_id,
            portfolio_id: input.portfolio_id,
            company: input.company.trim().to_string(),
            position: input.position.trim().to_string(),
            employment_type: input.employment_type,
            location: input.location,
            start_date: span.start_date,
            end_date: span.end_date,
            is_current: span.is_current,
            description: input.description,
            technologies: normalize_technologies(input.technologies),
            is_featured: input.is_featured,
            display_order: input.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    fn apply_patch(&mut self, patch: UpdateExperience) -> Result<(), AppError> {
        let write = DateWrite {
            is_current: patch.is_current,
            end_date: patch.end_date,
        };
        let merged = DateSpan {
            start_date: patch.start_date.unwrap_or(self.start_date),
            end_date: patch.end_date.unwrap_or(self.end_date),
            is_current: patch.is_current.unwrap_or(self.is_current),
        };
        let span = dates::enforce(merged, &write)?;
        self.start_date = span.start_date;
        self.end_date = span.end_date;
        self.is_current = span.is_current;

        if let Some(portfolio_id) = patch.portfolio_id {
            self.portfolio_id = portfolio_id;
        }
        if let Some(company) = patch.company {
            self.company = company.trim().to_string();
        }
        if let Some(position) = patch.position {
            self.position = position.trim().to_string();
        }
        if let Some(kind) = patch.employment_type {
            self.employment_type = kind;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(technologies) = patch.technologies {
            self.technologies = normalize_technologies(technologies);
        }
        if let Some(featured) = patch.is_featured {
            self.is_featured = featured;
        }
        if let Some(order) = patch.display_order {
            self.display_order = order;
        }
        Ok(())
    }

    fn matches(&self, f: &ExperienceFilter) -> bool {
        f.owner_id.map_or(true, |v| self.owner_id == v)
            && f.portfolio_id.map_or(true, |v| self.portfolio_id == Some(v))
            && f.company.as_deref().map_or(true, |v| contains_ci(&self.company, v))
            && f.position.as_deref().map_or(true, |v| contains_ci(&self.position, v))
            && f.employment_type.map_or(true, |v| self.employment_type == v)
            && f.is_current.map_or(true, |v| self.is_current == v)
            && f.is_featured.map_or(true, |v| self.is_featured == v)
            && dates::within(Some(self.start_date), f.start_date_from, f.start_date_to)
            && dates::within(self.end_date, f.end_date_from, f.end_date_to)
    }

    fn compare_by(&self, other: &Self, field: ExperienceSortField) -> Ordering {
        match field {
            ExperienceSortField::DisplayOrder => self.display_order.cmp(&other.display_order),
            ExperienceSortField::StartDate => self.start_date.cmp(&other.start_date),
            ExperienceSortField::EndDate => cmp_nulls_last(&self.end_date, &other.end_date),
            ExperienceSortField::Company => {
                self.company.to_lowercase().cmp(&other.company.to_lowercase())
            }
            ExperienceSortField::Position => {
                self.position.to_lowercase().cmp(&other.position.to_lowercase())
            }
            ExperienceSortField::EmploymentType => self.employment_type.cmp(&other.employment_type),
            ExperienceSortField::IsCurrent => self.is_current.cmp(&other.is_current),
            ExperienceSortField::CreatedAt => self.created_at.cmp(&other.created_at),
        }
    }

    fn default_sort() -> Vec<SortKey<ExperienceSortField>> {
        vec![
            SortKey::desc(ExperienceSortField::IsCurrent),
            SortKey::desc(ExperienceSortField::StartDate),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input() -> CreateExperience {
        serde_json::from_value(serde_json::json!({
            "company": "Acme",
            "position": "Backend Engineer",
            "start_date": "2020-02-01",
            "end_date": "2022-03-31",
            "is_current": true,
            "technologies": [" Rust ", "rust", "PostgreSQL"]
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults_and_date_consistency() {
        let input = input();
        assert_eq!(input.employment_type, EmploymentType::FullTime);
        let e = Experience::from_create(input, Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        assert!(e.is_current);
        assert_eq!(e.end_date, None);
        assert_eq!(e.technologies, vec!["Rust", "PostgreSQL"]);
    }

    #[test]
    fn test_patch_start_after_stored_end_rejected() {
        let mut input = input();
        input.is_current = false;
        let mut e = Experience::from_create(input, Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        let patch = UpdateExperience {
            start_date: Some(d(2023, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(e.apply_patch(patch), Err(AppError::InvalidDateRange(_))));
        assert_eq!(e.start_date, d(2020, 2, 1));
    }

    #[test]
    fn test_patch_clearing_end_date_keeps_flag() {
        let mut input = input();
        input.is_current = false;
        let mut e = Experience::from_create(input, Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        let patch: UpdateExperience = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        e.apply_patch(patch).unwrap();
        assert_eq!(e.end_date, None);
        assert!(!e.is_current);
    }

    #[test]
    fn test_technology_validation() {
        let mut input = input();
        input.technologies = vec!["".to_string()];
        let errors = input.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "technologies");
    }

    #[test]
    fn test_filter_on_employment_type_and_company() {
        let e = Experience::from_create(input(), Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        let filter = ExperienceFilter {
            company: Some("ACM".to_string()),
            employment_type: Some(EmploymentType::FullTime),
            is_current: Some(true),
            ..Default::default()
        };
        assert!(e.matches(&filter));
        let filter = ExperienceFilter {
            employment_type: Some(EmploymentType::Contract),
            ..Default::default()
        };
        assert!(!e.matches(&filter));
        // current roles have no end date, so any end-date bound excludes them
        let filter = ExperienceFilter {
            end_date_to: Some(d(2030, 1, 1)),
            ..Default::default()
        };
        assert!(!e.matches(&filter));
    }
}
