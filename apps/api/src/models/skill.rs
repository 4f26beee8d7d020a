use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{AppError, FieldError};
use crate::ordering::query::{SortField, SortKey};
use crate::ordering::validation::{
    double_option, in_range, non_negative, optional_text, required_text, Validate, MAX_TEXT_LEN,
};
use crate::ordering::{contains_ci, Orderable, Resource};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type,
)]
#[sqlx(type_name = "skill_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Language,
    Framework,
    Library,
    Database,
    Tool,
    Cloud,
    SoftSkill,
    Other,
}

impl SkillCategory {
    /// Display order of groups on the public portfolio.
    pub const ALL: [SkillCategory; 8] = [
        SkillCategory::Language,
        SkillCategory::Framework,
        SkillCategory::Library,
        SkillCategory::Database,
        SkillCategory::Tool,
        SkillCategory::Cloud,
        SkillCategory::SoftSkill,
        SkillCategory::Other,
    ];
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, sqlx::Type,
)]
#[sqlx(type_name = "proficiency_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Skill {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub category: SkillCategory,
    pub proficiency_level: ProficiencyLevel,
    pub years_of_experience: Option<i32>,
    pub icon: Option<String>,
    pub is_featured: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkill {
    /// Defaults to the acting user.
    pub owner_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub category: SkillCategory,
    #[serde(default = "default_proficiency")]
    pub proficiency_level: ProficiencyLevel,
    pub years_of_experience: Option<i32>,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub display_order: Option<i32>,
}

fn default_proficiency() -> ProficiencyLevel {
    ProficiencyLevel::Intermediate
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSkill {
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    pub proficiency_level: Option<ProficiencyLevel>,
    #[serde(default, deserialize_with = "double_option")]
    pub years_of_experience: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    pub is_featured: Option<bool>,
    pub display_order: Option<i32>,
}

/// `GET /skills` filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillFilter {
    pub owner_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub category: Option<SkillCategory>,
    pub proficiency_level: Option<ProficiencyLevel>,
    /// Case-insensitive substring of `name`.
    pub name: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSortField {
    DisplayOrder,
    Name,
    Category,
    ProficiencyLevel,
    YearsOfExperience,
    CreatedAt,
}

impl SortField for SkillSortField {
    const ALLOWED: &'static [&'static str] = &[
        "display_order",
        "name",
        "category",
        "proficiency_level",
        "years_of_experience",
        "created_at",
    ];

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "display_order" => Some(Self::DisplayOrder),
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "proficiency_level" => Some(Self::ProficiencyLevel),
            "years_of_experience" => Some(Self::YearsOfExperience),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::DisplayOrder => "display_order",
            Self::Name => "LOWER(name)",
            Self::Category => "category",
            Self::ProficiencyLevel => "proficiency_level",
            Self::YearsOfExperience => "years_of_experience",
            Self::CreatedAt => "created_at",
        }
    }
}

fn validate_skill_fields(
    errors: &mut Vec<FieldError>,
    years: Option<i32>,
    icon: Option<&str>,
    display_order: Option<i32>,
) {
    in_range(errors, "years_of_experience", years, 0, 80);
    optional_text(errors, "icon", icon, MAX_TEXT_LEN);
    non_negative(errors, "display_order", display_order);
}

impl Validate for CreateSkill {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required_text(&mut errors, "name", &self.name, MAX_TEXT_LEN);
        validate_skill_fields(
            &mut errors,
            self.years_of_experience,
            self.icon.as_deref(),
            self.display_order,
        );
        errors
    }
}

impl Validate for UpdateSkill {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        optional_text(&mut errors, "name", self.name.as_deref(), MAX_TEXT_LEN);
        validate_skill_fields(
            &mut errors,
            self.years_of_experience.flatten(),
            self.icon.as_ref().and_then(|i| i.as_deref()),
            self.display_order,
        );
        errors
    }
}

impl Orderable for Skill {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
    fn collection_key(&self) -> Option<Uuid> {
        self.category_id
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

impl Resource for Skill {
    const KIND: &'static str = "skill";

    type Create = CreateSkill;
    type Patch = UpdateSkill;
    type Filter = SkillFilter;
    type SortField = SkillSortField;

    fn requested_owner(input: &CreateSkill) -> Option<Uuid> {
        input.owner_id
    }

    fn requested_order(input: &CreateSkill) -> Option<i32> {
        input.display_order
    }

    fn patched_order(patch: &UpdateSkill) -> Option<i32> {
        patch.display_order
    }

    fn from_create(
        input: CreateSkill,
        id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Skill {
            id,
            owner_id,
            category_id: input.category_id,
            name: input.name.trim().to_string(),
            category: input.category,
            proficiency_level: input.proficiency_level,
            years_of_experience: input.years_of_experience,
            icon: input.icon,
            is_featured: input.is_featured,
            display_order: input.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    fn apply_patch(&mut self, patch: UpdateSkill) -> Result<(), AppError> {
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(level) = patch.proficiency_level {
            self.proficiency_level = level;
        }
        if let Some(years) = patch.years_of_experience {
            self.years_of_experience = years;
        }
        if let Some(icon) = patch.icon {
            self.icon = icon;
        }
        if let Some(featured) = patch.is_featured {
            self.is_featured = featured;
        }
        if let Some(order) = patch.display_order {
            self.display_order = order;
        }
        Ok(())
    }

    fn matches(&self, f: &SkillFilter) -> bool {
        f.owner_id.map_or(true, |v| self.owner_id == v)
            && f.category_id.map_or(true, |v| self.category_id == Some(v))
            && f.category.map_or(true, |v| self.category == v)
            && f.proficiency_level.map_or(true, |v| self.proficiency_level == v)
            && f.name.as_deref().map_or(true, |v| contains_ci(&self.name, v))
            && f.is_featured.map_or(true, |v| self.is_featured == v)
    }

    fn compare_by(&self, other: &Self, field: SkillSortField) -> Ordering {
        match field {
            SkillSortField::DisplayOrder => self.display_order.cmp(&other.display_order),
            SkillSortField::Name => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            SkillSortField::Category => self.category.cmp(&other.category),
            SkillSortField::ProficiencyLevel => self.proficiency_level.cmp(&other.proficiency_level),
            SkillSortField::YearsOfExperience => crate::ordering::cmp_nulls_last(
                &self.years_of_experience,
                &other.years_of_experience,
            ),
            SkillSortField::CreatedAt => self.created_at.cmp(&other.created_at),
        }
    }

    fn default_sort() -> Vec<SortKey<SkillSortField>> {
        vec![SortKey::asc(SkillSortField::DisplayOrder)]
    }
}

/// Skills of one category, as rendered on the public portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct SkillGroup {
    pub category: SkillCategory,
    pub skills: Vec<Skill>,
}

/// Groups skills by category in [`SkillCategory::ALL`] order, keeping the
/// incoming order inside each group. Empty categories are omitted.
pub fn group_by_category(skills: Vec<Skill>) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = SkillCategory::ALL
        .iter()
        .map(|category| SkillGroup {
            category: *category,
            skills: Vec::new(),
        })
        .collect();
    for skill in skills {
        if let Some(group) = groups.iter_mut().find(|g| g.category == skill.category) {
            group.skills.push(skill);
        }
    }
    groups.retain(|g| !g.skills.is_empty());
    groups
}
