//! Comment forest reconciler.
//!
//! The server hands out flat pages; this reconciler maintains the forest
//! incrementally in an arena (comments keyed by id plus a parent→children
//! index) instead of rebuilding a tree on every read. Ordering invariants:
//! top-level comments descending by create time, each reply list ascending.
//! Every comment is reachable from exactly one place.
//!
//! A reply whose parent is not loaded is attached at the top level and
//! flagged; it is re-parented the moment the parent arrives.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use astral_shared::model::Comment;
use astral_shared::types::{CommentId, CommentScope, CommentStatus};

use crate::pager::PageCursor;

/// Materialized view node: a comment with its reply subtree.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

#[derive(Debug, Default)]
pub struct CommentForest {
    scope: Option<CommentScope>,
    nodes: HashMap<CommentId, Comment>,
    /// Reply ids per parent, ascending by create time.
    children: HashMap<CommentId, Vec<CommentId>>,
    /// Top-level ids, descending by create time.
    roots: Vec<CommentId>,
    /// Orphan replies parked at the top level until their parent loads.
    pending_reparent: HashSet<CommentId>,
    cursor: PageCursor,
    /// Server-reported total for the scope, when known.
    total: u64,
}

impl CommentForest {
    pub fn new(page_size: u32) -> Self {
        Self {
            cursor: PageCursor::new(page_size),
            ..Default::default()
        }
    }

    pub fn scope(&self) -> Option<&CommentScope> {
        self.scope.as_ref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.nodes.get(&id)
    }

    /// Whether a comment sits at the top level only because its parent has
    /// not been fetched yet.
    pub fn needs_reparent(&self, id: CommentId) -> bool {
        self.pending_reparent.contains(&id)
    }

    // ------------------------------------------------------------------
    // Page merge
    // ------------------------------------------------------------------

    /// Merge a fetched page of the given scope. Switching scope or
    /// fetching page 1 rebuilds the forest; later pages merge-insert.
    pub fn apply_page(
        &mut self,
        scope: CommentScope,
        page: u32,
        total: Option<u64>,
        flat: Vec<Comment>,
    ) {
        if self.scope.as_ref() != Some(&scope) || page <= 1 {
            self.clear();
            self.scope = Some(scope);
        }

        let returned = flat.len();
        for comment in flat {
            self.insert(comment);
        }
        self.cursor.record(page.max(1), returned);
        if let Some(total) = total {
            self.total = total;
        } else {
            self.total = self.total.max(self.nodes.len() as u64);
        }
    }

    /// Optimistic local insertion (own comment posted).
    pub fn add_local(&mut self, comment: Comment) -> bool {
        let inserted = self.insert(comment);
        if inserted {
            self.total += 1;
        }
        inserted
    }

    fn insert(&mut self, comment: Comment) -> bool {
        let id = comment.comment_id;
        if self.nodes.contains_key(&id) {
            debug!(id = %id, "Skipping duplicate comment");
            return false;
        }

        let parent = comment.parent_id;
        self.nodes.insert(id, comment);

        if parent.is_top_level() || parent == id {
            self.insert_root(id, false);
        } else if self.nodes.contains_key(&parent) {
            self.insert_child(parent, id);
        } else {
            // Parent page not loaded: park at the top level, flagged.
            self.insert_root(id, true);
        }

        self.adopt_orphans(id);
        true
    }

    /// Move any parked orphans of the newly inserted comment under it.
    fn adopt_orphans(&mut self, parent: CommentId) {
        let orphans: Vec<CommentId> = self
            .pending_reparent
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .map(|c| c.parent_id == parent)
                    .unwrap_or(false)
            })
            .collect();

        for orphan in orphans {
            self.roots.retain(|id| *id != orphan);
            self.pending_reparent.remove(&orphan);
            self.insert_child(parent, orphan);
            debug!(id = %orphan, parent = %parent, "Re-parented orphan reply");
        }
    }

    fn insert_root(&mut self, id: CommentId, orphan: bool) {
        let Some(time) = self.nodes.get(&id).map(|c| c.create_time) else {
            return;
        };
        let index = self.roots.partition_point(|other| {
            self.nodes
                .get(other)
                .map(|c| c.create_time >= time)
                .unwrap_or(false)
        });
        self.roots.insert(index, id);
        if orphan {
            self.pending_reparent.insert(id);
        }
    }

    fn insert_child(&mut self, parent: CommentId, id: CommentId) {
        let Some(time) = self.nodes.get(&id).map(|c| c.create_time) else {
            return;
        };
        let siblings = self.children.entry(parent).or_default();
        let index = {
            let nodes = &self.nodes;
            siblings.partition_point(|other| {
                nodes
                    .get(other)
                    .map(|c| c.create_time <= time)
                    .unwrap_or(false)
            })
        };
        siblings.insert(index, id);
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Optimistic like adjustment; the count never goes negative.
    /// Returns the new count.
    pub fn apply_like(&mut self, id: CommentId, delta: i64) -> Option<u64> {
        let comment = self.nodes.get_mut(&id)?;
        comment.like_count = if delta.is_negative() {
            comment.like_count.saturating_sub(delta.unsigned_abs())
        } else {
            comment.like_count + delta as u64
        };
        Some(comment.like_count)
    }

    /// Server-authoritative like count.
    pub fn set_like_count(&mut self, id: CommentId, count: u64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(comment) => {
                comment.like_count = count;
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, id: CommentId, status: CommentStatus) -> bool {
        match self.nodes.get_mut(&id) {
            Some(comment) => {
                comment.status = status;
                true
            }
            None => false,
        }
    }

    /// Remove one comment. Children are not cascaded locally: they are
    /// re-rooted at the top level, flagged for re-parenting, so each stays
    /// reachable from exactly one place.
    pub fn remove(&mut self, id: CommentId) -> bool {
        let Some(removed) = self.nodes.remove(&id) else {
            return false;
        };

        if removed.parent_id.is_top_level()
            || self.pending_reparent.remove(&id)
            || !self.detach_from_parent(removed.parent_id, id)
        {
            self.roots.retain(|other| *other != id);
        }

        for child in self.children.remove(&id).unwrap_or_default() {
            self.insert_root(child, true);
        }

        self.total = self.total.saturating_sub(1);
        true
    }

    fn detach_from_parent(&mut self, parent: CommentId, id: CommentId) -> bool {
        match self.children.get_mut(&parent) {
            Some(siblings) => {
                let before = siblings.len();
                siblings.retain(|other| *other != id);
                before != siblings.len()
            }
            None => false,
        }
    }

    /// Drop the whole forest (scope deleted or switched away).
    pub fn clear(&mut self) {
        self.scope = None;
        self.nodes.clear();
        self.children.clear();
        self.roots.clear();
        self.pending_reparent.clear();
        self.cursor.reset();
        self.total = 0;
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Top-level comments, newest first.
    pub fn top_level(&self) -> Vec<&Comment> {
        self.roots
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Replies of one comment, oldest first.
    pub fn replies(&self, id: CommentId) -> Vec<&Comment> {
        self.children
            .get(&id)
            .map(|kids| kids.iter().filter_map(|k| self.nodes.get(k)).collect())
            .unwrap_or_default()
    }

    /// Materialize the full forest.
    pub fn tree(&self) -> Vec<CommentNode> {
        self.roots
            .iter()
            .filter_map(|id| self.subtree(*id))
            .collect()
    }

    fn subtree(&self, id: CommentId) -> Option<CommentNode> {
        let comment = self.nodes.get(&id)?.clone();
        let replies = self
            .children
            .get(&id)
            .map(|kids| kids.iter().filter_map(|k| self.subtree(*k)).collect())
            .unwrap_or_default();
        Some(CommentNode { comment, replies })
    }

    /// Every comment reachable from exactly one place: test support.
    pub fn reachability_consistent(&self) -> bool {
        let mut seen: HashSet<CommentId> = HashSet::new();
        for id in self
            .roots
            .iter()
            .chain(self.children.values().flatten())
        {
            if !seen.insert(*id) {
                return false;
            }
        }
        seen.len() == self.nodes.len() && seen.iter().all(|id| self.nodes.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astral_shared::types::UserId;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn planet() -> CommentScope {
        CommentScope::Planet("p-1".to_string())
    }

    fn comment(id: i64, parent: i64, secs: i64) -> Comment {
        Comment {
            comment_id: CommentId(id),
            planet_id: Some("p-1".to_string()),
            galaxy_id: None,
            user_id: UserId(1),
            user_name: None,
            content: format!("comment {id}"),
            parent_id: CommentId(parent),
            level: if parent == 0 { 1 } else { 2 },
            like_count: 0,
            status: CommentStatus::Normal,
            create_time: at(secs),
            update_time: None,
        }
    }

    #[test]
    fn test_ordering_top_level_desc_replies_asc() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(
            planet(),
            1,
            Some(3),
            vec![comment(1, 0, 10), comment(2, 1, 20), comment(3, 0, 30)],
        );

        let top: Vec<i64> = forest.top_level().iter().map(|c| c.comment_id.0).collect();
        assert_eq!(top, vec![3, 1]);

        let replies: Vec<i64> = forest
            .replies(CommentId(1))
            .iter()
            .map(|c| c.comment_id.0)
            .collect();
        assert_eq!(replies, vec![2]);
        assert!(forest.reachability_consistent());
    }

    #[test]
    fn test_reply_order_is_ascending() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(
            planet(),
            1,
            None,
            vec![comment(1, 0, 10), comment(3, 1, 30), comment(2, 1, 20)],
        );
        let replies: Vec<i64> = forest
            .replies(CommentId(1))
            .iter()
            .map(|c| c.comment_id.0)
            .collect();
        assert_eq!(replies, vec![2, 3]);
    }

    #[test]
    fn test_orphan_reply_falls_back_to_top_level_then_reparents() {
        let mut forest = CommentForest::new(10);
        // Reply arrives before its parent's page.
        forest.apply_page(planet(), 1, None, vec![comment(9, 4, 90)]);
        assert!(forest.needs_reparent(CommentId(9)));
        assert_eq!(forest.top_level().len(), 1);

        // Parent shows up on a later page: orphan is adopted.
        forest.apply_page(planet(), 2, None, vec![comment(4, 0, 40)]);
        assert!(!forest.needs_reparent(CommentId(9)));
        let replies: Vec<i64> = forest
            .replies(CommentId(4))
            .iter()
            .map(|c| c.comment_id.0)
            .collect();
        assert_eq!(replies, vec![9]);
        assert!(forest.reachability_consistent());
    }

    #[test]
    fn test_add_local_reply_finds_nested_parent() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(
            planet(),
            1,
            None,
            vec![comment(1, 0, 10), comment(2, 1, 20)],
        );

        // Reply to a reply: the parent lives deep in the forest.
        forest.add_local(comment(3, 2, 30));
        let replies: Vec<i64> = forest
            .replies(CommentId(2))
            .iter()
            .map(|c| c.comment_id.0)
            .collect();
        assert_eq!(replies, vec![3]);

        let tree = forest.tree();
        assert_eq!(tree[0].replies[0].replies[0].comment.comment_id, CommentId(3));
    }

    #[test]
    fn test_like_count_never_negative() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(planet(), 1, None, vec![comment(1, 0, 10)]);

        assert_eq!(forest.apply_like(CommentId(1), 1), Some(1));
        assert_eq!(forest.apply_like(CommentId(1), -1), Some(0));
        assert_eq!(forest.apply_like(CommentId(1), -1), Some(0));
    }

    #[test]
    fn test_remove_does_not_cascade_children() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(
            planet(),
            1,
            Some(3),
            vec![comment(1, 0, 10), comment(2, 1, 20), comment(3, 1, 30)],
        );

        assert!(forest.remove(CommentId(1)));
        assert!(forest.get(CommentId(2)).is_some());
        assert!(forest.get(CommentId(3)).is_some());
        assert!(forest.needs_reparent(CommentId(2)));
        assert_eq!(forest.top_level().len(), 2);
        assert_eq!(forest.total(), 2);
        assert!(forest.reachability_consistent());
    }

    #[test]
    fn test_duplicate_insert_skipped() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(planet(), 1, None, vec![comment(1, 0, 10)]);
        forest.apply_page(planet(), 2, None, vec![comment(1, 0, 10)]);
        assert_eq!(forest.len(), 1);
        assert!(forest.reachability_consistent());
    }

    #[test]
    fn test_scope_switch_rebuilds() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(planet(), 1, None, vec![comment(1, 0, 10)]);
        forest.apply_page(CommentScope::Galaxy(7), 1, None, vec![comment(5, 0, 50)]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest.scope(), Some(&CommentScope::Galaxy(7)));
        assert!(forest.get(CommentId(1)).is_none());
    }

    #[test]
    fn test_invariants_hold_after_every_mutation() {
        let mut forest = CommentForest::new(10);
        forest.apply_page(
            planet(),
            1,
            None,
            vec![comment(2, 0, 20), comment(1, 0, 10), comment(4, 2, 40)],
        );
        assert!(forest.reachability_consistent());

        forest.add_local(comment(5, 2, 50));
        assert!(forest.reachability_consistent());

        forest.apply_like(CommentId(2), 3);
        forest.set_status(CommentId(1), CommentStatus::Hidden);
        assert!(forest.reachability_consistent());

        forest.remove(CommentId(2));
        assert!(forest.reachability_consistent());

        let top: Vec<i64> = forest.top_level().iter().map(|c| c.comment_id.0).collect();
        // 4 and 5 re-rooted by the delete, 1 remains; descending by time.
        assert_eq!(top, vec![5, 4, 1]);
    }
}
