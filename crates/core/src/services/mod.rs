//! Business logic services.

pub mod comment;
pub mod comment_tree;
pub mod post;
pub mod report;
pub mod stats;

pub use comment::{CommentService, CommentThread, annotate_likes};
pub use comment_tree::{
    CommentForest, CommentTreeNode, CommentWithStats, build_forest, build_tree, count_nodes,
};
pub use post::PostService;
pub use report::{
    EnrichedReport, EnrichmentError, ReportAggregate, ReportPage, ReportService, ReportSummary,
    aggregate_by_reason,
};
pub use stats::{AdminStats, CategoryStats, CategoryStatsReport, CommunityStatsService};
