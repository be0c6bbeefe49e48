//! Report aggregation and review.
//!
//! Reports are enriched with display names, post titles and comment
//! excerpts on a best-effort basis. A failed lookup leaves the affected
//! fields empty and is surfaced as an [`EnrichmentError`] warning instead of
//! failing the request.

use std::collections::{BTreeMap, HashMap, HashSet};

use facility_admin_common::{AppError, AppResult, get_metrics};
use facility_admin_db::{
    PageRequest, Paginated,
    entities::{
        ReportStatus, comment, post,
        report::{self, ReportReason, ReportTarget},
        user,
    },
    repositories::{
        CommentRepository, PostRepository, ReportFilter, ReportRepository, UserRepository,
    },
};
use futures::join;
use thiserror::Error;
use tracing::{info, warn};

/// Maximum characters of comment text shown next to a report.
pub const EXCERPT_CHARS: usize = 80;

/// A lookup that could not be completed while enriching reports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("user directory lookup failed: {0}")]
    Users(String),

    #[error("post lookup failed: {0}")]
    Posts(String),

    #[error("comment lookup failed: {0}")]
    Comments(String),
}

/// Report counts grouped by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportAggregate {
    pub reports_by_reason: BTreeMap<ReportReason, u64>,
    pub total_reports: u64,
}

/// Group reports by reason.
#[must_use]
pub fn aggregate_by_reason(reports: &[report::Model]) -> ReportAggregate {
    let mut reports_by_reason = BTreeMap::new();
    for report in reports {
        *reports_by_reason.entry(report.reason).or_insert(0) += 1;
    }
    ReportAggregate {
        reports_by_reason,
        total_reports: reports.len() as u64,
    }
}

/// A report with display data about the people and content involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedReport {
    pub report: report::Model,
    pub reporter_name: Option<String>,
    pub resolver_name: Option<String>,
    pub target_author_id: Option<String>,
    pub target_author_name: Option<String>,
    /// Post the target belongs to, for comment reports as well.
    pub post_id: Option<String>,
    pub post_title: Option<String>,
    pub comment_excerpt: Option<String>,
}

impl EnrichedReport {
    fn bare(report: report::Model) -> Self {
        Self {
            post_id: report.post_id.clone(),
            report,
            reporter_name: None,
            resolver_name: None,
            target_author_id: None,
            target_author_name: None,
            post_title: None,
            comment_excerpt: None,
        }
    }
}

/// All reports against one post or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub target: ReportTarget,
    /// Newest first.
    pub reports: Vec<EnrichedReport>,
    pub aggregate: ReportAggregate,
    pub enrichment_warnings: Vec<EnrichmentError>,
}

/// One page of the report list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub page: Paginated<EnrichedReport>,
    pub enrichment_warnings: Vec<EnrichmentError>,
}

/// Shorten comment text for display.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

fn record_failure(warnings: &mut Vec<EnrichmentError>, error: EnrichmentError) {
    warn!(error = %error, "Report enrichment incomplete");
    get_metrics().record_enrichment_failure();
    warnings.push(error);
}

fn unique<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).map(str::to_string).collect()
}

/// Service for reviewing reports.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
    comment_repo: CommentRepository,
    post_repo: PostRepository,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        user_repo: UserRepository,
        comment_repo: CommentRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            comment_repo,
            post_repo,
        }
    }

    /// Reports filed against a comment.
    pub async fn reports_for_comment(&self, comment_id: &str) -> AppResult<ReportSummary> {
        let reports = self.report_repo.find_for_comment(comment_id).await?;
        self.summarize(ReportTarget::Comment(comment_id.to_string()), reports)
            .await
    }

    /// Reports filed against a post, excluding reports on its comments.
    pub async fn reports_for_post(&self, post_id: &str) -> AppResult<ReportSummary> {
        let reports = self.report_repo.find_for_post(post_id).await?;
        self.summarize(ReportTarget::Post(post_id.to_string()), reports)
            .await
    }

    async fn summarize(
        &self,
        target: ReportTarget,
        reports: Vec<report::Model>,
    ) -> AppResult<ReportSummary> {
        let aggregate = aggregate_by_reason(&reports);
        let (reports, enrichment_warnings) = self.enrich(reports, false).await;
        Ok(ReportSummary {
            target,
            reports,
            aggregate,
            enrichment_warnings,
        })
    }

    /// A filtered page of reports, newest first.
    pub async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> AppResult<ReportPage> {
        filter.validate()?;
        let (reports, total) = self
            .report_repo
            .find_page(filter, page.offset(), page.page_size())
            .await?;
        let (reports, enrichment_warnings) = self.enrich(reports, true).await;

        Ok(ReportPage {
            page: Paginated::new(reports, page, total),
            enrichment_warnings,
        })
    }

    /// A single report with its target details.
    pub async fn get_report(&self, id: &str) -> AppResult<(EnrichedReport, Vec<EnrichmentError>)> {
        let report = self.report_repo.get(id).await?;
        let (mut reports, warnings) = self.enrich(vec![report], true).await;
        reports
            .pop()
            .map(|r| (r, warnings))
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Move a report to a new status. Resolving records `admin_id` as the
    /// resolver.
    pub async fn update_report_status(
        &self,
        id: &str,
        status: ReportStatus,
        admin_id: &str,
    ) -> AppResult<report::Model> {
        let current = self.report_repo.get(id).await?;
        let next = match current.status.transition_to(status) {
            Ok(next) => next,
            Err(e) => {
                get_metrics().record_report_transition(false);
                return Err(e);
            }
        };

        let resolved_by = (next == ReportStatus::Resolved).then_some(admin_id);
        let updated = self.report_repo.update_status(id, next, resolved_by).await?;

        get_metrics().record_report_transition(true);
        info!(report_id = %id, admin_id = %admin_id, from = %current.status, to = %next, "Report status changed");
        Ok(updated)
    }

    /// Attach display data. With `with_targets`, also resolve the reported
    /// comment or post and its author.
    async fn enrich(
        &self,
        reports: Vec<report::Model>,
        with_targets: bool,
    ) -> (Vec<EnrichedReport>, Vec<EnrichmentError>) {
        let mut warnings = Vec::new();
        let mut enriched: Vec<EnrichedReport> = reports.into_iter().map(EnrichedReport::bare).collect();
        if enriched.is_empty() {
            return (enriched, warnings);
        }

        if with_targets {
            let comment_ids = unique(
                enriched
                    .iter()
                    .filter_map(|r| r.report.comment_id.as_deref()),
            );
            match self.comment_repo.find_by_ids(&comment_ids).await {
                Ok(comments) => {
                    let comments: HashMap<&str, &comment::Model> =
                        comments.iter().map(|c| (c.id.as_str(), c)).collect();
                    for r in &mut enriched {
                        if let Some(c) = r.report.comment_id.as_deref().and_then(|id| comments.get(id)) {
                            r.target_author_id = Some(c.author_id.clone());
                            r.target_author_name.clone_from(&c.author_name);
                            r.post_id = Some(c.post_id.clone());
                            r.comment_excerpt = Some(excerpt(&c.content, EXCERPT_CHARS));
                        }
                    }
                }
                Err(e) => record_failure(&mut warnings, EnrichmentError::Comments(e.to_string())),
            }
        }

        let post_ids = if with_targets {
            unique(enriched.iter().filter_map(|r| r.post_id.as_deref()))
        } else {
            Vec::new()
        };
        let user_ids = unique(enriched.iter().flat_map(|r| {
            [
                Some(r.report.reporter_id.as_str()),
                r.report.resolved_by.as_deref(),
            ]
            .into_iter()
            .flatten()
        }));

        let (posts, users) = join!(
            self.post_repo.find_by_ids(&post_ids),
            self.user_repo.find_by_ids(&user_ids)
        );

        let mut posts_by_id: HashMap<String, post::Model> = HashMap::new();
        match posts {
            Ok(posts) => posts_by_id.extend(posts.into_iter().map(|p| (p.id.clone(), p))),
            Err(e) => record_failure(&mut warnings, EnrichmentError::Posts(e.to_string())),
        }
        let mut users_by_id: HashMap<String, user::Model> = HashMap::new();
        match users {
            Ok(users) => users_by_id.extend(users.into_iter().map(|u| (u.id.clone(), u))),
            Err(e) => record_failure(&mut warnings, EnrichmentError::Users(e.to_string())),
        }

        // Post authors are only known once posts are loaded.
        if with_targets && !posts_by_id.is_empty() {
            let author_ids = unique(
                enriched
                    .iter()
                    .filter(|r| r.report.comment_id.is_none())
                    .filter_map(|r| r.post_id.as_deref())
                    .filter_map(|id| posts_by_id.get(id))
                    .map(|p| p.author_id.as_str())
                    .filter(|id| !users_by_id.contains_key(*id)),
            );
            if !author_ids.is_empty() {
                match self.user_repo.find_by_ids(&author_ids).await {
                    Ok(users) => users_by_id.extend(users.into_iter().map(|u| (u.id.clone(), u))),
                    Err(e) => record_failure(&mut warnings, EnrichmentError::Users(e.to_string())),
                }
            }
        }

        let name_of = |id: &str| {
            users_by_id
                .get(id)
                .and_then(user::Model::display_name)
                .map(str::to_string)
        };
        for r in &mut enriched {
            r.reporter_name = name_of(&r.report.reporter_id);
            r.resolver_name = r.report.resolved_by.as_deref().and_then(name_of);

            let post = r.post_id.as_deref().and_then(|id| posts_by_id.get(id));
            if let Some(post) = post {
                r.post_title = Some(post.title.clone());
                if r.report.comment_id.is_none() {
                    r.target_author_id = Some(post.author_id.clone());
                    r.target_author_name = name_of(&post.author_id);
                }
            }
        }

        (enriched, warnings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::comment_tree::tests::comment;
    use facility_admin_db::test_utils::MockDataSource;
    use maplit::btreemap;
    use serde_json::{Value, json};

    const USERS: &str = "users";

    fn report_row(id: &str, post: Option<&str>, comment: Option<&str>, reason: &str, at: &str) -> Value {
        json!({
            "id": id,
            "reporter_id": "u1",
            "post_id": post,
            "comment_id": comment,
            "reason": reason,
            "description": null,
            "status": "pending",
            "created_at": at,
            "resolved_by": null,
        })
    }

    fn report_model(reason: &str) -> report::Model {
        serde_json::from_value(report_row("r", None, Some("c1"), reason, "2024-03-01T10:00:00Z")).unwrap()
    }

    fn seeded() -> MockDataSource {
        let mut long = comment("c1", None);
        long.content = "x".repeat(100);
        MockDataSource::new()
            .with_rows(
                report::TABLE,
                vec![
                    report_row("r1", None, Some("c1"), "spam", "2024-03-01T10:00:00Z"),
                    report_row("r2", None, Some("c1"), "spam", "2024-03-02T10:00:00Z"),
                    report_row("r3", None, Some("c1"), "other", "2024-03-03T10:00:00Z"),
                    report_row("r4", Some("p1"), None, "harassment", "2024-03-04T10:00:00Z"),
                ],
            )
            .with_rows(comment::TABLE, vec![serde_json::to_value(long).unwrap()])
            .with_rows(
                post::TABLE,
                vec![json!({
                    "id": "p1",
                    "author_id": "u2",
                    "title": "Pool closed on Mondays?",
                    "category": "question",
                    "status": "active",
                    "created_at": "2024-02-28T10:00:00Z",
                })],
            )
            .with_rows(
                USERS,
                vec![
                    json!({"id": "u1", "nickname": "Reporter", "email": "r@example.com"}),
                    json!({"id": "u2", "nickname": null, "email": "author@example.com"}),
                    json!({"id": "admin-1", "nickname": "Admin"}),
                ],
            )
    }

    fn service(db: &MockDataSource) -> ReportService {
        let shared = db.clone().into_shared();
        ReportService::new(
            ReportRepository::new(shared.clone()),
            UserRepository::new(shared.clone(), USERS),
            CommentRepository::new(shared.clone()),
            PostRepository::new(shared),
        )
    }

    #[test]
    fn test_aggregate_by_reason() {
        let reports = vec![report_model("spam"), report_model("spam"), report_model("other")];

        let aggregate = aggregate_by_reason(&reports);
        assert_eq!(
            aggregate.reports_by_reason,
            btreemap! { ReportReason::Spam => 2, ReportReason::Other => 1 }
        );
        assert_eq!(aggregate.total_reports, 3);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("  short  ", 80), "short");
        assert_eq!(excerpt("abcdef", 3), "abc…");
        assert_eq!(excerpt("가나다라", 2), "가나…");
    }

    #[tokio::test]
    async fn test_reports_for_comment() {
        let summary = service(&seeded()).reports_for_comment("c1").await.unwrap();

        assert_eq!(summary.target, ReportTarget::Comment("c1".to_string()));
        let ids: Vec<&str> = summary.reports.iter().map(|r| r.report.id.as_str()).collect();
        assert_eq!(ids, ["r3", "r2", "r1"]);
        assert_eq!(summary.aggregate.total_reports, 3);
        assert_eq!(summary.aggregate.reports_by_reason[&ReportReason::Spam], 2);
        assert_eq!(summary.reports[0].reporter_name.as_deref(), Some("Reporter"));
        assert!(summary.enrichment_warnings.is_empty());
    }

    #[tokio::test]
    async fn test_user_lookup_failure_leaves_names_empty() {
        let db = seeded().fail_table(USERS);

        let summary = service(&db).reports_for_comment("c1").await.unwrap();

        assert_eq!(summary.reports.len(), 3);
        assert!(summary.reports.iter().all(|r| r.reporter_name.is_none()));
        assert!(matches!(
            summary.enrichment_warnings.as_slice(),
            [EnrichmentError::Users(_)]
        ));
    }

    #[tokio::test]
    async fn test_deleted_users_and_targets_resolve_to_none() {
        let db = seeded();
        db.insert(
            report::TABLE,
            json!({
                "id": "r9",
                "reporter_id": "deleted-user",
                "post_id": null,
                "comment_id": "c-removed",
                "reason": "spam",
                "description": null,
                "status": "resolved",
                "created_at": "2024-03-05T10:00:00Z",
                "resolved_by": "former-admin",
            }),
        );
        let service = service(&db);

        let summary = service.reports_for_comment("c-removed").await.unwrap();
        assert_eq!(summary.aggregate.total_reports, 1);
        assert_eq!(summary.reports[0].reporter_name, None);
        assert_eq!(summary.reports[0].resolver_name, None);
        assert!(summary.enrichment_warnings.is_empty());

        let (report, warnings) = service.get_report("r9").await.unwrap();
        assert_eq!(report.reporter_name, None);
        assert_eq!(report.resolver_name, None);
        assert_eq!(report.target_author_id, None);
        assert_eq!(report.comment_excerpt, None);
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_list_reports_enriches_targets() {
        let service = service(&seeded());
        let page = PageRequest::new(1, 2, 100).unwrap();

        let result = service
            .list_reports(&ReportFilter::default(), page)
            .await
            .unwrap();
        let meta = result.page.pagination;
        assert_eq!(meta.total_count, 4);
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next);

        let post_report = &result.page.items[0];
        assert_eq!(post_report.report.id, "r4");
        assert_eq!(post_report.post_title.as_deref(), Some("Pool closed on Mondays?"));
        assert_eq!(post_report.target_author_name.as_deref(), Some("author@example.com"));

        let comment_report = &result.page.items[1];
        assert_eq!(comment_report.target_author_id.as_deref(), Some("u1"));
        assert_eq!(comment_report.post_id.as_deref(), Some("p1"));
        assert_eq!(comment_report.post_title.as_deref(), Some("Pool closed on Mondays?"));
        assert!(comment_report.comment_excerpt.as_deref().unwrap().ends_with('…'));
    }

    #[tokio::test]
    async fn test_get_missing_report() {
        let err = service(&seeded()).get_report("nope").await.unwrap_err();
        assert!(matches!(err, AppError::ReportNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_report_status() {
        let db = seeded();
        let service = service(&db);

        let reviewed = service
            .update_report_status("r1", ReportStatus::Reviewed, "admin-1")
            .await
            .unwrap();
        assert_eq!(reviewed.resolved_by, None);

        let resolved = service
            .update_report_status("r1", ReportStatus::Resolved, "admin-1")
            .await
            .unwrap();
        assert_eq!(resolved.resolved_by.as_deref(), Some("admin-1"));

        let err = service
            .update_report_status("r1", ReportStatus::Pending, "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let (report, _) = service.get_report("r1").await.unwrap();
        assert_eq!(report.resolver_name.as_deref(), Some("Admin"));
    }
}
