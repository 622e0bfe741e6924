/// Owner-scoped task query composition
///
/// [`TaskFilter`] is an immutable specification parsed once from raw request
/// parameters; [`compose`] compiles it into SQL text plus ordered bind
/// values. The two are deliberately separate pure steps so both can be tested
/// without a database and the filter can never mutate mid-flight.
///
/// Every composed query is unconditionally scoped to the owning user: the
/// `user_id = $1` predicate is emitted before any other and no filter input
/// can displace it. A user can never query another user's tasks regardless
/// of filter contents.
///
/// # Example
///
/// ```
/// use taskdeck_core::query::{compose, TaskFilter};
/// use uuid::Uuid;
///
/// let filter = TaskFilter::from_raw(Some("milk"), Some("pending"), None, None, None);
/// let composed = compose(Uuid::new_v4(), &filter);
/// assert!(composed.sql.contains("user_id = $1"));
/// ```

use serde::Serialize;
use uuid::Uuid;

use crate::models::task::{Task, TaskStatus};

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest created first; the default and the fallback for unrecognized input
    #[default]
    NewestFirst,

    /// Oldest created first
    Oldest,

    /// Highest priority first
    PriorityHigh,

    /// Lowest priority first
    PriorityLow,

    /// Earliest due date first; undated tasks sort last
    DueSoon,

    /// Alphabetical by title
    Title,
}

impl SortOrder {
    /// Parses the `sort` request parameter
    ///
    /// Unrecognized or absent values fall back to newest-first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => SortOrder::Oldest,
            Some("priority-high") => SortOrder::PriorityHigh,
            Some("priority-low") => SortOrder::PriorityLow,
            Some("due-soon") => SortOrder::DueSoon,
            Some("title") => SortOrder::Title,
            _ => SortOrder::NewestFirst,
        }
    }

    /// The ORDER BY clause this sort compiles to
    fn order_clause(&self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "created_at DESC",
            SortOrder::Oldest => "created_at ASC",
            SortOrder::PriorityHigh => "priority DESC",
            SortOrder::PriorityLow => "priority ASC",
            SortOrder::DueSoon => "due_date ASC",
            SortOrder::Title => "title ASC",
        }
    }
}

/// Immutable filter specification for a task listing
///
/// Built once from raw request parameters by [`TaskFilter::from_raw`];
/// invalid or empty values are ignored rather than rejected, so a mangled
/// query string degrades to a broader listing instead of an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title or description
    pub search: Option<String>,

    /// Exact status match
    pub status: Option<TaskStatus>,

    /// Exact priority match
    pub priority: Option<i32>,

    /// Tag-set membership
    pub tag: Option<String>,

    /// Result ordering
    pub sort: SortOrder,
}

impl TaskFilter {
    /// Parses raw request parameters into a filter specification
    ///
    /// - `search`: trimmed; empty and whitespace-only values ignored
    /// - `status`: only the three valid values; anything else ignored
    /// - `priority`: parseable integers within [1,5]; anything else ignored
    /// - `tag`: trimmed; empty ignored
    /// - `sort`: recognized names map to a fixed order, otherwise newest-first
    pub fn from_raw(
        search: Option<&str>,
        status: Option<&str>,
        priority: Option<&str>,
        tag: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let status = status.and_then(TaskStatus::parse);

        let priority = priority
            .and_then(|p| p.trim().parse::<i32>().ok())
            .filter(|p| (1..=5).contains(p));

        let tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Self {
            search,
            status,
            priority,
            tag,
            sort: SortOrder::parse(sort),
        }
    }

    /// True when no filter narrows the listing (sort alone does not count)
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.status.is_none() && self.priority.is_none() && self.tag.is_none()
    }
}

/// A bind value for a composed query, in positional order
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Uuid(Uuid),
    Text(String),
    Int(i32),
}

/// Output of [`compose`]: SQL text plus its bind values
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, title, description, status, priority, due_date, \
     is_completed, tags, created_at, updated_at FROM tasks";

/// Compiles a filter specification into an owner-scoped query
///
/// Pure function: no connection, no side effects. The owner predicate is
/// always `$1`; filter predicates follow in a fixed order with sequential
/// placeholders, and the sort maps to a constant ORDER BY clause (never
/// interpolated from input).
pub fn compose(owner: Uuid, filter: &TaskFilter) -> ComposedQuery {
    let mut sql = format!("{} WHERE user_id = $1", SELECT_COLUMNS);
    let mut binds = vec![BindValue::Uuid(owner)];

    if let Some(ref search) = filter.search {
        binds.push(BindValue::Text(format!("%{}%", escape_like(search))));
        let n = binds.len();
        sql.push_str(&format!(
            " AND (title ILIKE ${n} OR description ILIKE ${n})",
            n = n
        ));
    }

    if let Some(status) = filter.status {
        binds.push(BindValue::Text(status.as_str().to_string()));
        sql.push_str(&format!(" AND status = ${}", binds.len()));
    }

    if let Some(priority) = filter.priority {
        binds.push(BindValue::Int(priority));
        sql.push_str(&format!(" AND priority = ${}", binds.len()));
    }

    if let Some(ref tag) = filter.tag {
        binds.push(BindValue::Text(tag.clone()));
        sql.push_str(&format!(" AND ${} = ANY(tags)", binds.len()));
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(filter.sort.order_clause());

    ComposedQuery { sql, binds }
}

/// Escapes LIKE/ILIKE wildcards so a search term matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Per-status task counts for the listing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    #[serde(rename = "in-progress")]
    pub in_progress: usize,
    pub completed: usize,
}

/// Listing-page aggregates computed from the owner's full task set
///
/// The counts and the distinct tag list are independent of any active
/// filter, so they are derived in memory from an unfiltered fetch rather
/// than folded into the composed query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskBoard {
    pub counts: StatusCounts,
    pub tags: Vec<String>,
}

impl TaskBoard {
    /// Aggregates counts and the sorted distinct tag list
    pub fn summarize(tasks: &[Task]) -> Self {
        let mut counts = StatusCounts::default();
        let mut tags: Vec<String> = Vec::new();

        for task in tasks {
            match TaskStatus::parse(&task.status) {
                Some(TaskStatus::Pending) => counts.pending += 1,
                Some(TaskStatus::InProgress) => counts.in_progress += 1,
                Some(TaskStatus::Completed) => counts.completed += 1,
                None => {}
            }
            for tag in &task.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }

        tags.sort();

        Self { counts, tags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(owner: Uuid, status: &str, tags: &[&str]) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: "A task".to_string(),
            description: String::new(),
            status: status.to_string(),
            priority: 3,
            due_date: None,
            is_completed: status == "completed",
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_unfiltered_scopes_to_owner() {
        let owner = Uuid::new_v4();
        let composed = compose(owner, &TaskFilter::default());

        assert!(composed.sql.contains("WHERE user_id = $1"));
        assert!(composed.sql.ends_with("ORDER BY created_at DESC"));
        assert_eq!(composed.binds, vec![BindValue::Uuid(owner)]);
    }

    #[test]
    fn test_compose_owner_predicate_always_first() {
        let owner = Uuid::new_v4();
        let filter = TaskFilter::from_raw(
            Some("milk"),
            Some("completed"),
            Some("5"),
            Some("home"),
            Some("priority-high"),
        );
        let composed = compose(owner, &filter);

        let where_pos = composed.sql.find("WHERE user_id = $1").unwrap();
        let first_and = composed.sql.find(" AND ").unwrap();
        assert!(where_pos < first_and);
        assert_eq!(composed.binds[0], BindValue::Uuid(owner));
    }

    #[test]
    fn test_compose_all_filters() {
        let owner = Uuid::new_v4();
        let filter = TaskFilter::from_raw(
            Some("milk"),
            Some("completed"),
            Some("5"),
            Some("home"),
            Some("priority-high"),
        );
        let composed = compose(owner, &filter);

        assert!(composed
            .sql
            .contains("(title ILIKE $2 OR description ILIKE $2)"));
        assert!(composed.sql.contains("status = $3"));
        assert!(composed.sql.contains("priority = $4"));
        assert!(composed.sql.contains("$5 = ANY(tags)"));
        assert!(composed.sql.ends_with("ORDER BY priority DESC"));

        assert_eq!(
            composed.binds,
            vec![
                BindValue::Uuid(owner),
                BindValue::Text("%milk%".to_string()),
                BindValue::Text("completed".to_string()),
                BindValue::Int(5),
                BindValue::Text("home".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_raw_ignores_invalid_values() {
        let filter = TaskFilter::from_raw(
            Some("   "),
            Some("archived"),
            Some("9"),
            Some(""),
            Some("by-color"),
        );

        assert!(filter.is_unfiltered());
        assert_eq!(filter.sort, SortOrder::NewestFirst);
    }

    #[test]
    fn test_from_raw_ignores_unparseable_priority() {
        assert_eq!(
            TaskFilter::from_raw(None, None, Some("high"), None, None).priority,
            None
        );
        assert_eq!(
            TaskFilter::from_raw(None, None, Some("0"), None, None).priority,
            None
        );
        assert_eq!(
            TaskFilter::from_raw(None, None, Some("6"), None, None).priority,
            None
        );
        assert_eq!(
            TaskFilter::from_raw(None, None, Some(" 4 "), None, None).priority,
            Some(4)
        );
    }

    #[test]
    fn test_from_raw_trims_search_and_tag() {
        let filter = TaskFilter::from_raw(Some("  milk "), None, None, Some(" home "), None);
        assert_eq!(filter.search.as_deref(), Some("milk"));
        assert_eq!(filter.tag.as_deref(), Some("home"));
    }

    #[test]
    fn test_sort_order_mapping() {
        assert_eq!(SortOrder::parse(Some("oldest")), SortOrder::Oldest);
        assert_eq!(SortOrder::parse(Some("priority-high")), SortOrder::PriorityHigh);
        assert_eq!(SortOrder::parse(Some("priority-low")), SortOrder::PriorityLow);
        assert_eq!(SortOrder::parse(Some("due-soon")), SortOrder::DueSoon);
        assert_eq!(SortOrder::parse(Some("title")), SortOrder::Title);
        assert_eq!(SortOrder::parse(Some("anything")), SortOrder::NewestFirst);
        assert_eq!(SortOrder::parse(None), SortOrder::NewestFirst);
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let filter = TaskFilter::from_raw(Some("50%_done"), None, None, None, None);
        let composed = compose(Uuid::new_v4(), &filter);

        assert_eq!(
            composed.binds[1],
            BindValue::Text("%50\\%\\_done%".to_string())
        );
    }

    #[test]
    fn test_summarize_counts_and_tags() {
        let owner = Uuid::new_v4();
        let tasks = vec![
            task(owner, "pending", &["home", "errand"]),
            task(owner, "pending", &["home"]),
            task(owner, "in-progress", &[]),
            task(owner, "completed", &["work"]),
        ];

        let board = TaskBoard::summarize(&tasks);

        assert_eq!(board.counts.pending, 2);
        assert_eq!(board.counts.in_progress, 1);
        assert_eq!(board.counts.completed, 1);
        assert_eq!(board.tags, vec!["errand", "home", "work"]);
    }

    #[test]
    fn test_summarize_empty() {
        let board = TaskBoard::summarize(&[]);
        assert_eq!(board.counts, StatusCounts::default());
        assert!(board.tags.is_empty());
    }
}
