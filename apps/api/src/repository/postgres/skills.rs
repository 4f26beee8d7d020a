use super::{push_eq, push_ilike, PgResource, Sql};
use crate::models::skill::{Skill, SkillFilter};

impl PgResource for Skill {
    const TABLE: &'static str = "skills";
    const SCOPE_COLUMN: &'static str = "category_id";
    const DATA_COLUMNS: &'static str =
        "name, category, proficiency_level, years_of_experience, icon, is_featured";

    fn push_values(&self, qb: &mut Sql) {
        let mut values = qb.separated(", ");
        values.push_bind(self.name.clone());
        values.push_bind(self.category);
        values.push_bind(self.proficiency_level);
        values.push_bind(self.years_of_experience);
        values.push_bind(self.icon.clone());
        values.push_bind(self.is_featured);
    }

    fn push_assignments(&self, qb: &mut Sql) {
        let mut set = qb.separated(", ");
        set.push("name = ").push_bind_unseparated(self.name.clone());
        set.push("category = ").push_bind_unseparated(self.category);
        set.push("proficiency_level = ")
            .push_bind_unseparated(self.proficiency_level);
        set.push("years_of_experience = ")
            .push_bind_unseparated(self.years_of_experience);
        set.push("icon = ").push_bind_unseparated(self.icon.clone());
        set.push("is_featured = ").push_bind_unseparated(self.is_featured);
    }

    fn push_filters(filter: &SkillFilter, qb: &mut Sql) {
        push_eq(qb, "owner_id", filter.owner_id);
        push_eq(qb, "category_id", filter.category_id);
        push_eq(qb, "category", filter.category);
        push_eq(qb, "proficiency_level", filter.proficiency_level);
        push_ilike(qb, "name", filter.name.as_deref());
        push_eq(qb, "is_featured", filter.is_featured);
    }
}

#[cfg(test)]
mod tests {
    use sqlx::QueryBuilder;

    use super::*;
    use crate::models::skill::SkillCategory;

    #[test]
    fn test_skill_filters_sql() {
        let mut qb: Sql = QueryBuilder::new("SELECT COUNT(*) FROM skills WHERE deleted_at IS NULL");
        let filter = SkillFilter {
            category: Some(SkillCategory::Database),
            name: Some("sql".to_string()),
            ..Default::default()
        };
        Skill::push_filters(&filter, &mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM skills WHERE deleted_at IS NULL AND category = $1 AND name ILIKE $2"
        );
    }
}
