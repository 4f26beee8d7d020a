use super::{push_date_bounds, push_eq, push_ilike, PgResource, Sql};
use crate::models::education::{Education, EducationFilter};

impl PgResource for Education {
    const TABLE: &'static str = "education";
    const SCOPE_COLUMN: &'static str = "portfolio_id";
    const DATA_COLUMNS: &'static str = "institution, degree, field_of_study, start_date, \
         end_date, is_current, grade, description, is_highlighted";

    fn push_values(&self, qb: &mut Sql) {
        let mut values = qb.separated(", ");
        values.push_bind(self.institution.clone());
        values.push_bind(self.degree.clone());
        values.push_bind(self.field_of_study.clone());
        values.push_bind(self.start_date);
        values.push_bind(self.end_date);
        values.push_bind(self.is_current);
        values.push_bind(self.grade.clone());
        values.push_bind(self.description.clone());
        values.push_bind(self.is_highlighted);
    }

    fn push_assignments(&self, qb: &mut Sql) {
        let mut set = qb.separated(", ");
        set.push("institution = ")
            .push_bind_unseparated(self.institution.clone());
        set.push("degree = ").push_bind_unseparated(self.degree.clone());
        set.push("field_of_study = ")
            .push_bind_unseparated(self.field_of_study.clone());
        set.push("start_date = ").push_bind_unseparated(self.start_date);
        set.push("end_date = ").push_bind_unseparated(self.end_date);
        set.push("is_current = ").push_bind_unseparated(self.is_current);
        set.push("grade = ").push_bind_unseparated(self.grade.clone());
        set.push("description = ")
            .push_bind_unseparated(self.description.clone());
        set.push("is_highlighted = ")
            .push_bind_unseparated(self.is_highlighted);
    }

    fn push_filters(filter: &EducationFilter, qb: &mut Sql) {
        push_eq(qb, "owner_id", filter.owner_id);
        push_eq(qb, "portfolio_id", filter.portfolio_id);
        push_ilike(qb, "institution", filter.institution.as_deref());
        push_ilike(qb, "degree", filter.degree.as_deref());
        push_eq(qb, "is_current", filter.is_current);
        push_eq(qb, "is_highlighted", filter.is_highlighted);
        push_date_bounds(qb, "start_date", filter.start_date_from, filter.start_date_to);
        push_date_bounds(qb, "end_date", filter.end_date_from, filter.end_date_to);
    }
}
