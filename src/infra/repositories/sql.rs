use crate::domain::{
    models::RowScope,
    services::visibility::{FilterClause, VisibilityFilter},
};

/// Event columns with the owner's email joined in. Aliases: `e` events, `u` owner.
pub const EVENT_SELECT: &str = "SELECT e.id, e.short_code, e.name, e.description, e.location, e.time_zone, \
    e.start_date, e.end_date, e.visibility, e.event_type, e.admin_id, u.email AS admin_email, \
    e.created_at, e.updated_at, e.deleted_at \
    FROM events e LEFT JOIN users u ON u.id = e.admin_id";

pub const USER_COLUMNS: &str = "id, external_uid, email, name, avatar_url, role, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }

    fn like(self) -> &'static str {
        match self {
            Dialect::Sqlite => "LIKE",
            Dialect::Postgres => "ILIKE",
        }
    }
}

/// Text parameters for a dynamically assembled statement, bound in push order.
pub struct SqlParams {
    dialect: Dialect,
    values: Vec<String>,
}

impl SqlParams {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect, values: Vec::new() }
    }

    /// Records a value and returns the placeholder to splice into the SQL.
    pub fn push(&mut self, value: impl Into<String>) -> String {
        self.values.push(value.into());
        self.dialect.placeholder(self.values.len())
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

/// Soft-delete guard for `column`. Only an explicit `IncludeDeleted` drops it.
pub fn live(column: &str, scope: RowScope) -> String {
    if scope.includes_deleted() {
        "1 = 1".to_string()
    } else {
        format!("{} IS NULL", column)
    }
}

/// Renders a visibility filter as a condition over `e` and `u`.
pub fn visibility_condition(filter: &VisibilityFilter, params: &mut SqlParams) -> String {
    if filter.clauses.is_empty() {
        return "1 = 0".to_string();
    }

    let parts: Vec<String> = filter
        .clauses
        .iter()
        .map(|clause| match clause {
            FilterClause::Visibility(v) => format!("e.visibility = {}", params.push(v.as_str())),
            FilterClause::OwnerOrMember { visibility, user_id, email } => {
                let vis = params.push(visibility.as_str());
                let mut access = vec![format!("e.admin_id = {}", params.push(user_id.as_str()))];
                if let Some(email) = email {
                    access.push(format!("LOWER(u.email) = LOWER({})", params.push(email.trim())));
                }
                access.push(format!(
                    "EXISTS (SELECT 1 FROM guest_events g WHERE g.event_id = e.id AND g.user_id = {} AND g.deleted_at IS NULL)",
                    params.push(user_id.as_str())
                ));
                format!("(e.visibility = {} AND ({}))", vis, access.join(" OR "))
            }
        })
        .collect();

    format!("({})", parts.join(" OR "))
}

/// Case-insensitive substring match on name, description and location.
pub fn search_condition(search: &str, dialect: Dialect, params: &mut SqlParams) -> String {
    let pattern = format!("%{}%", escape_like(search));
    let like = dialect.like();
    let columns: Vec<String> = ["e.name", "e.description", "e.location"]
        .iter()
        .map(|col| format!("{} {} {} ESCAPE '!'", col, like, params.push(pattern.clone())))
        .collect();
    format!("({})", columns.join(" OR "))
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '!') {
            out.push('!');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::auth::Viewer;

    #[test]
    fn test_anonymous_filter_renders_public_only() {
        let mut params = SqlParams::new(Dialect::Sqlite);
        let sql = visibility_condition(&VisibilityFilter::for_viewer(None), &mut params);
        assert_eq!(sql, "(e.visibility = ?)");
        assert_eq!(params.into_values(), vec!["PUBLIC".to_string()]);
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let viewer = Viewer::new("u1", Some("bob@x.com".into()));
        let mut params = SqlParams::new(Dialect::Postgres);
        let sql = visibility_condition(&VisibilityFilter::for_viewer(Some(&viewer)), &mut params);
        assert!(sql.contains("$1") && sql.contains("$6"));
        assert!(!sql.contains('?'));
        assert_eq!(params.into_values().len(), 6);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
    }

    #[test]
    fn test_live_guard_respects_scope() {
        assert_eq!(live("g.deleted_at", RowScope::Active), "g.deleted_at IS NULL");
        assert_eq!(live("g.deleted_at", RowScope::IncludeDeleted), "1 = 1");
    }
}
