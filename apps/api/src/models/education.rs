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

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Education {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub portfolio_id: Option<Uuid>,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub grade: Option<String>,
    pub description: Option<String>,
    pub is_highlighted: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEducation {
    pub owner_id: Option<Uuid>,
    pub portfolio_id: Option<Uuid>,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub grade: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_highlighted: bool,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEducation {
    #[serde(default, deserialize_with = "double_option")]
    pub portfolio_id: Option<Option<Uuid>>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub field_of_study: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub is_current: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_highlighted: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationFilter {
    pub owner_id: Option<Uuid>,
    pub portfolio_id: Option<Uuid>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub is_current: Option<bool>,
    pub is_highlighted: Option<bool>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub end_date_from: Option<NaiveDate>,
    pub end_date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationSortField {
    DisplayOrder,
    StartDate,
    EndDate,
    Institution,
    Degree,
    IsCurrent,
    CreatedAt,
}

impl SortField for EducationSortField {
    const ALLOWED: &'static [&'static str] = &[
        "display_order",
        "start_date",
        "end_date",
        "institution",
        "degree",
        "is_current",
        "created_at",
    ];

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "display_order" => Some(Self::DisplayOrder),
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "institution" => Some(Self::Institution),
            "degree" => Some(Self::Degree),
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
            Self::Institution => "LOWER(institution)",
            Self::Degree => "LOWER(degree)",
            Self::IsCurrent => "is_current",
            Self::CreatedAt => "created_at",
        }
    }
}

impl Validate for CreateEducation {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required_text(&mut errors, "institution", &self.institution, MAX_TEXT_LEN);
        required_text(&mut errors, "degree", &self.degree, MAX_TEXT_LEN);
        optional_text(&mut errors, "field_of_study", self.field_of_study.as_deref(), MAX_TEXT_LEN);
        optional_text(&mut errors, "grade", self.grade.as_deref(), MAX_TEXT_LEN);
        optional_text(&mut errors, "description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        non_negative(&mut errors, "display_order", self.display_order);
        errors
    }
}

impl Validate for UpdateEducation {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        optional_text(&mut errors, "institution", self.institution.as_deref(), MAX_TEXT_LEN);
        optional_text(&mut errors, "degree", self.degree.as_deref(), MAX_TEXT_LEN);
        optional_text(
            &mut errors,
            "field_of_study",
            self.field_of_study.as_ref().and_then(|v| v.as_deref()),
            MAX_TEXT_LEN,
        );
        optional_text(
            &mut errors,
            "grade",
            self.grade.as_ref().and_then(|v| v.as_deref()),
            MAX_TEXT_LEN,
        );
        optional_text(
            &mut errors,
            "description",
            self.description.as_ref().and_then(|v| v.as_deref()),
            MAX_DESCRIPTION_LEN,
        );
        non_negative(&mut errors, "display_order", self.display_order);
        errors
    }
}

impl Education {
    fn span(&self) -> DateSpan {
        DateSpan {
            start_date: self.start_date,
            end_date: self.end_date,
            is_current: self.is_current,
        }
    }

    fn set_span(&mut self, span: DateSpan) {
        self.start_date = span.start_date;
        self.end_date = span.end_date;
        self.is_current = span.is_current;
    }
}

impl Orderable for Education {
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

impl Resource for Education {
    const KIND: &'static str = "education";

    type Create = CreateEducation;
    type Patch = UpdateEducation;
    type Filter = EducationFilter;
    type SortField = EducationSortField;

    fn requested_owner(input: &CreateEducation) -> Option<Uuid> {
        input.owner_id
    }

    fn requested_order(input: &CreateEducation) -> Option<i32> {
        input.display_order
    }

    fn patched_order(patch: &UpdateEducation) -> Option<i32> {
        patch.display_order
    }

    fn from_create(
        input: CreateEducation,
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
        Ok(Education {
            id,
            owner_id,
            portfolio_id: input.portfolio_id,
            institution: input.institution.trim().to_string(),
            degree: input.degree.trim().to_string(),
            field_of_study: input.field_of_study,
            start_date: span.start_date,
            end_date: span.end_date,
            is_current: span.is_current,
            grade: input.grade,
            description: input.description,
            is_highlighted: input.is_highlighted,
            display_order: input.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    fn apply_patch(&mut self, patch: UpdateEducation) -> Result<(), AppError> {
        let write = DateWrite {
            is_current: patch.is_current,
            end_date: patch.end_date,
        };
        let mut merged = self.span();
        if let Some(start) = patch.start_date {
            merged.start_date = start;
        }
        if let Some(end) = patch.end_date {
            merged.end_date = end;
        }
        if let Some(current) = patch.is_current {
            merged.is_current = current;
        }
        // A rejected patch must leave the row intact.
        let span = dates::enforce(merged, &write)?;
        self.set_span(span);

        if let Some(portfolio_id) = patch.portfolio_id {
            self.portfolio_id = portfolio_id;
        }
        if let Some(institution) = patch.institution {
            self.institution = institution.trim().to_string();
        }
        if let Some(degree) = patch.degree {
            self.degree = degree.trim().to_string();
        }
        if let Some(field) = patch.field_of_study {
            self.field_of_study = field;
        }
        if let Some(grade) = patch.grade {
            self.grade = grade;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(highlighted) = patch.is_highlighted {
            self.is_highlighted = highlighted;
        }
        if let Some(order) = patch.display_order {
            self.display_order = order;
        }
        Ok(())
    }

    fn matches(&self, f: &EducationFilter) -> bool {
        f.owner_id.map_or(true, |v| self.owner_id == v)
            && f.portfolio_id.map_or(true, |v| self.portfolio_id == Some(v))
            && f.institution
                .as_deref()
                .map_or(true, |v| contains_ci(&self.institution, v))
            && f.degree.as_deref().map_or(true, |v| contains_ci(&self.degree, v))
            && f.is_current.map_or(true, |v| self.is_current == v)
            && f.is_highlighted.map_or(true, |v| self.is_highlighted == v)
            && dates::within(Some(self.start_date), f.start_date_from, f.start_date_to)
            && dates::within(self.end_date, f.end_date_from, f.end_date_to)
    }

    fn compare_by(&self, other: &Self, field: EducationSortField) -> Ordering {
        match field {
            EducationSortField::DisplayOrder => self.display_order.cmp(&other.display_order),
            EducationSortField::StartDate => self.start_date.cmp(&other.start_date),
            EducationSortField::EndDate => cmp_nulls_last(&self.end_date, &other.end_date),
            EducationSortField::Institution => self
                .institution
                .to_lowercase()
                .cmp(&other.institution.to_lowercase()),
            EducationSortField::Degree => {
                self.degree.to_lowercase().cmp(&other.degree.to_lowercase())
            }
            EducationSortField::IsCurrent => self.is_current.cmp(&other.is_current),
            EducationSortField::CreatedAt => self.created_at.cmp(&other.created_at),
        }
    }

    fn default_sort() -> Vec<SortKey<EducationSortField>> {
        vec![
            SortKey::desc(EducationSortField::IsCurrent),
            SortKey::desc(EducationSortField::StartDate),
        ]
    }
}
