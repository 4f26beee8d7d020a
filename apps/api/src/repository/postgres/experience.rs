use super::{push_date_bounds, push_eq, push_ilike, PgResource, Sql};
use crate::models::experience::{Experience, ExperienceFilter};

impl PgResource for Experience {
    const TABLE: &'static str = "experiences";
    const SCOPE_COLUMN: &'static str = "portfolio_id";
    const DATA_COLUMNS: &'static str = "company, position, employment_type, location, \
         start_date, end_date, is_current, description, technologies, is_featured";

    fn push_values(&self, qb: &mut Sql) {
        let mut values = qb.separated(", ");
        values.push_bind(self.company.clone());
        values.push_bind(self.position.clone());
        values.push_bind(self.employment_type);
        values.push_bind(self.location.clone());
        values.push_bind(self.start_date);
        values.push_bind(self.end_date);
        values.push_bind(self.is_current);
        values.push_bind(self.description.clone());
        values.push_bind(self.technologies.clone());
        values.push_bind(self.is_featured);
    }

    fn push_assignments(&self, qb: &mut Sql) {
        let mut set = qb.separated(", ");
        set.push("company = ").push_bind_unseparated(self.company.clone());
        set.push("position = ").push_bind_unseparated(self.position.clone());
        set.push("employment_type = ")
            .push_bind_unseparated(self.employment_type);
        set.push("location = ").push_bind_unseparated(self.location.clone());
        set.push("start_date = ").push_bind_unseparated(self.start_date);
        set.push("end_date = ").push_bind_unseparated(self.end_date);
        set.push("is_current = ").push_bind_unseparated(self.is_current);
        set.push("description = ")
            .push_bind_unseparated(self.description.clone());
        set.push("technologies = ")
            .push_bind_unseparated(self.technologies.clone());
        set.push("is_featured = ").push_bind_unseparated(self.is_featured);
    }

    fn push_filters(filter: &ExperienceFilter, qb: &mut Sql) {
        push_eq(qb, "owner_id", filter.owner_id);
        push_eq(qb, "portfolio_id", filter.portfolio_id);
        push_ilike(qb, "company", filter.company.as_deref());
        push_ilike(qb, "position", filter.position.as_deref());
        push_eq(qb, "employment_type", filter.employment_type);
        push_eq(qb, "is_current", filter.is_current);
        push_eq(qb, "is_featured", filter.is_featured);
        push_date_bounds(qb, "start_date", filter.start_date_from, filter.start_date_to);
        push_date_bounds(qb, "end_date", filter.end_date_from, filter.end_date_to);
    }
}
