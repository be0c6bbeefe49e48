//! Comment thread reconstruction.
//!
//! Comments arrive as a flat list ordered by creation time, each naming its
//! parent. [`build_forest`] nests them under their parents. Every input
//! comment appears exactly once in the output: replies whose parent is not
//! in the list are promoted to the top level and flagged as orphaned, and
//! comments caught in a parent cycle are promoted as well.
//!
//! Construction uses explicit stacks, so thread depth is not limited by the
//! call stack.

use std::collections::HashMap;

use facility_admin_db::entities::comment;

/// A comment with its like count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWithStats {
    pub comment: comment::Model,
    pub likes_count: u64,
}

impl CommentWithStats {
    #[must_use]
    pub const fn new(comment: comment::Model, likes_count: u64) -> Self {
        Self {
            comment,
            likes_count,
        }
    }
}

/// A comment and its replies.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentTreeNode {
    pub comment: CommentWithStats,
    /// Distance from the top level; top-level comments have depth 0.
    pub depth: usize,
    /// Set on replies placed at the top level because their parent is
    /// missing from the thread.
    pub orphaned: bool,
    /// Replies in input order.
    pub children: Vec<CommentTreeNode>,
}

impl CommentTreeNode {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.comment.comment.id
    }

    /// Indentation level for display, capped at `max_depth`.
    #[must_use]
    pub fn indent(&self, max_depth: usize) -> usize {
        self.depth.min(max_depth)
    }
}

// The derived drop would recurse once per reply level.
impl Drop for CommentTreeNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Result of nesting one thread.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommentForest {
    /// Top-level comments in input order.
    pub roots: Vec<CommentTreeNode>,
    /// Replies promoted because their parent was not in the input.
    pub orphans_promoted: usize,
    /// Comments promoted to break a parent cycle.
    pub cycles_broken: usize,
}

/// Nest comments under their parents. See [`build_forest`].
#[must_use]
pub fn build_tree(comments: Vec<CommentWithStats>) -> Vec<CommentTreeNode> {
    build_forest(comments).roots
}

/// Nest comments under their parents, reporting how many were promoted.
///
/// When two comments share an ID, replies attach to the first one.
#[must_use]
pub fn build_forest(comments: Vec<CommentWithStats>) -> CommentForest {
    let n = comments.len();

    let mut position: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, c) in comments.iter().enumerate() {
        position.entry(c.comment.id.as_str()).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    let mut orphaned = vec![false; n];
    for (i, c) in comments.iter().enumerate() {
        match c.comment.parent_comment_id.as_deref() {
            None => roots.push(i),
            Some(parent) => match position.get(parent) {
                Some(&p) => children[p].push(i),
                None => {
                    orphaned[i] = true;
                    roots.push(i);
                }
            },
        }
    }
    let orphans_promoted = orphaned.iter().filter(|o| **o).count();

    // Each comment is claimed by the first parent that reaches it. Comments
    // left unclaimed sit on a cycle and are promoted in input order.
    let mut claimed = vec![false; n];
    let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut claim_from = |start: usize, claimed: &mut [bool]| {
        claimed[start] = true;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &child in &children[node] {
                if !claimed[child] {
                    claimed[child] = true;
                    tree_children[node].push(child);
                    stack.push(child);
                }
            }
        }
    };

    for &root in &roots {
        claim_from(root, &mut claimed);
    }
    let mut cycles_broken = 0;
    for i in 0..n {
        if !claimed[i] {
            cycles_broken += 1;
            roots.push(i);
            claim_from(i, &mut claimed);
        }
    }
    roots.sort_unstable();

    // Pre-order walk to assign depths, then assemble bottom-up.
    let mut order: Vec<(usize, usize)> = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&r| (r, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        order.push((node, depth));
        stack.extend(tree_children[node].iter().rev().map(|&c| (c, depth + 1)));
    }

    let mut pending: Vec<Option<CommentWithStats>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentTreeNode>> = (0..n).map(|_| None).collect();
    for &(node, depth) in order.iter().rev() {
        let kids = tree_children[node]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        if let Some(comment) = pending[node].take() {
            built[node] = Some(CommentTreeNode {
                comment,
                depth,
                orphaned: orphaned[node],
                children: kids,
            });
        }
    }

    CommentForest {
        roots: roots.iter().filter_map(|&r| built[r].take()).collect(),
        orphans_promoted,
        cycles_broken,
    }
}

/// Total number of nodes in a forest.
#[must_use]
pub fn count_nodes(nodes: &[CommentTreeNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentTreeNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children.iter());
    }
    count
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use facility_admin_db::entities::ContentStatus;

    pub(crate) fn comment(id: &str, parent: Option<&str>) -> comment::Model {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().unwrap_or_default();
        comment::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            parent_comment_id: parent.map(str::to_string),
            author_id: "u1".to_string(),
            author_name: Some("Kim".to_string()),
            content: format!("comment {id}"),
            status: ContentStatus::Active,
            created_at: created + Duration::minutes(id.len() as i64),
            updated_at: created,
        }
    }

    fn input(pairs: &[(&str, Option<&str>)]) -> Vec<CommentWithStats> {
        pairs
            .iter()
            .map(|(id, parent)| CommentWithStats::new(comment(id, *parent), 0))
            .collect()
    }

    fn shape(nodes: &[CommentTreeNode]) -> Vec<(String, Vec<String>)> {
        let mut out = Vec::new();
        let mut stack: Vec<&CommentTreeNode> = nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push((
                node.id().to_string(),
                node.children.iter().map(|c| c.id().to_string()).collect(),
            ));
            stack.extend(node.children.iter().rev());
        }
        out
    }

    #[test]
    fn test_empty_input() {
        let forest = build_forest(Vec::new());
        assert!(forest.roots.is_empty());
        assert_eq!(forest.orphans_promoted, 0);
    }

    #[test]
    fn test_nests_replies() {
        let roots = build_tree(input(&[
            ("a", None),
            ("b", Some("a")),
            ("c", Some("b")),
            ("d", None),
        ]));

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].id(), "a");
        assert_eq!(roots[0].children[0].id(), "b");
        assert_eq!(roots[0].children[0].children[0].id(), "c");
        assert_eq!(roots[0].children[0].children[0].depth, 2);
        assert_eq!(roots[1].id(), "d");
    }

    #[test]
    fn test_every_comment_appears_once() {
        let comments = input(&[
            ("a", None),
            ("b", Some("a")),
            ("c", Some("missing")),
            ("d", Some("b")),
            ("e", Some("e")),
            ("f", Some("g")),
            ("g", Some("f")),
            ("a", Some("d")),
        ]);
        let n = comments.len();

        let roots = build_tree(comments);
        assert_eq!(count_nodes(&roots), n);
    }

    #[test]
    fn test_orphan_is_promoted() {
        let forest = build_forest(input(&[("a", None), ("b", Some("missing"))]));

        assert_eq!(
            shape(&forest.roots),
            vec![("a".to_string(), vec![]), ("b".to_string(), vec![])]
        );
        assert!(!forest.roots[0].orphaned);
        assert!(forest.roots[1].orphaned);
        assert_eq!(forest.roots[1].depth, 0);
        assert_eq!(forest.orphans_promoted, 1);
    }

    #[test]
    fn test_siblings_keep_input_order() {
        let roots = build_tree(input(&[
            ("root", None),
            ("x", Some("root")),
            ("y", Some("root")),
            ("z", Some("root")),
        ]));

        let ids: Vec<&str> = roots[0].children.iter().map(CommentTreeNode::id).collect();
        assert_eq!(ids, ["x", "y", "z"]);
    }

    #[test]
    fn test_reply_before_parent_in_input() {
        let roots = build_tree(input(&[("b", Some("a")), ("a", None)]));

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id(), "a");
        assert_eq!(roots[0].children[0].id(), "b");
        assert!(!roots[0].children[0].orphaned);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let comments = input(&[
            ("a", None),
            ("b", Some("a")),
            ("c", Some("a")),
            ("d", Some("c")),
            ("e", Some("gone")),
        ]);

        let first = build_tree(comments.clone());
        let second = build_tree(comments);
        assert_eq!(first, second);
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn test_cycles_are_broken() {
        let forest = build_forest(input(&[
            ("a", None),
            ("self", Some("self")),
            ("x", Some("y")),
            ("y", Some("x")),
        ]));

        assert_eq!(forest.cycles_broken, 2);
        assert_eq!(
            shape(&forest.roots),
            vec![
                ("a".to_string(), vec![]),
                ("self".to_string(), vec![]),
                ("x".to_string(), vec!["y".to_string()]),
                ("y".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn test_duplicate_id_first_owns_replies() {
        let roots = build_tree(input(&[("a", None), ("a", None), ("b", Some("a"))]));

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children.len(), 1);
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn test_deep_thread_and_indent_cap() {
        let ids: Vec<String> = (0..10_000).map(|i| format!("c{i}")).collect();
        let comments: Vec<CommentWithStats> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let parent = i.checked_sub(1).map(|p| ids[p].as_str());
                CommentWithStats::new(comment(id, parent), 0)
            })
            .collect();

        let roots = build_tree(comments);
        assert_eq!(count_nodes(&roots), 10_000);

        let mut node = &roots[0];
        for _ in 0..6 {
            node = &node.children[0];
        }
        assert_eq!(node.depth, 6);
        assert_eq!(node.indent(4), 4);
        assert_eq!(roots[0].children[0].indent(4), 1);
    }

    #[test]
    fn test_deep_thread_drops_without_recursion() {
        let ids: Vec<String> = (0..200_000).map(|i| format!("c{i}")).collect();
        let comments: Vec<CommentWithStats> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let parent = i.checked_sub(1).map(|p| ids[p].as_str());
                CommentWithStats::new(comment(id, parent), 0)
            })
            .collect();

        let forest = build_forest(comments);
        assert_eq!(forest.roots.len(), 1);
        drop(forest);
    }
}
