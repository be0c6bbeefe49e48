//! Category statistics and dashboard counts.

use std::collections::BTreeMap;

use facility_admin_common::AppResult;
use facility_admin_db::{
    entities::{ReportStatus, post},
    repositories::{PostRepository, ReportRepository},
};
use futures::try_join;

/// Activity of one post category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub post_count: u64,
    pub comment_count: u64,
    pub like_count: u64,
    pub view_count: u64,
    pub avg_comments_per_post: f64,
    pub avg_likes_per_post: f64,
    /// Fraction of all posts in this category.
    pub share_of_posts: f64,
}

/// Per-category statistics with overall totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatsReport {
    /// Sorted by post count descending, then by name.
    pub categories: Vec<CategoryStats>,
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    pub total_views: u64,
    /// Per-category averages weighted by post count.
    pub avg_comments_per_post: f64,
    pub avg_likes_per_post: f64,
}

/// Counters shown on the moderation dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub pending_reports: u64,
    pub reviewed_reports: u64,
    pub resolved_reports: u64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// `Σ value·weight / Σ weight`, or 0 when there is no weight.
fn weighted_average(pairs: impl Iterator<Item = (f64, u64)>) -> f64 {
    let (sum, weight) = pairs.fold((0.0, 0_u64), |(sum, weight), (value, w)| {
        (value.mul_add(w as f64, sum), weight + w)
    });
    if weight == 0 { 0.0 } else { sum / weight as f64 }
}

/// Aggregate posts by category.
#[must_use]
pub fn summarize_categories(posts: &[post::Model]) -> CategoryStatsReport {
    #[derive(Default)]
    struct Totals {
        posts: u64,
        comments: u64,
        likes: u64,
        views: u64,
    }

    let mut by_category: BTreeMap<&str, Totals> = BTreeMap::new();
    for post in posts {
        let totals = by_category.entry(post.category.as_str()).or_default();
        totals.posts += 1;
        totals.comments += post.comment_count;
        totals.likes += post.like_count;
        totals.views += post.view_count;
    }

    let total_posts = posts.len() as u64;
    let mut categories: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, t)| CategoryStats {
            category: category.to_string(),
            post_count: t.posts,
            comment_count: t.comments,
            like_count: t.likes,
            view_count: t.views,
            avg_comments_per_post: ratio(t.comments, t.posts),
            avg_likes_per_post: ratio(t.likes, t.posts),
            share_of_posts: ratio(t.posts, total_posts),
        })
        .collect();
    categories.sort_by(|a, b| {
        b.post_count
            .cmp(&a.post_count)
            .then_with(|| a.category.cmp(&b.category))
    });

    CategoryStatsReport {
        total_posts,
        total_comments: categories.iter().map(|c| c.comment_count).sum(),
        total_likes: categories.iter().map(|c| c.like_count).sum(),
        total_views: categories.iter().map(|c| c.view_count).sum(),
        avg_comments_per_post: weighted_average(
            categories.iter().map(|c| (c.avg_comments_per_post, c.post_count)),
        ),
        avg_likes_per_post: weighted_average(
            categories.iter().map(|c| (c.avg_likes_per_post, c.post_count)),
        ),
        categories,
    }
}

/// Service for community statistics.
#[derive(Clone)]
pub struct CommunityStatsService {
    post_repo: PostRepository,
    report_repo: ReportRepository,
}

impl CommunityStatsService {
    /// Create a new statistics service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, report_repo: ReportRepository) -> Self {
        Self {
            post_repo,
            report_repo,
        }
    }

    /// Statistics over every post that is not deleted.
    pub async fn category_stats(&self) -> AppResult<CategoryStatsReport> {
        let posts = self.post_repo.find_all_for_stats().await?;
        Ok(summarize_categories(&posts))
    }

    /// Report counts by status.
    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        let (pending_reports, reviewed_reports, resolved_reports) = try_join!(
            self.report_repo.count_by_status(ReportStatus::Pending),
            self.report_repo.count_by_status(ReportStatus::Reviewed),
            self.report_repo.count_by_status(ReportStatus::Resolved),
        )?;
        Ok(AdminStats {
            pending_reports,
            reviewed_reports,
            resolved_reports,
        })
    }
}
