//! The commit graph and its traversal algorithms.
//!
//! [`CommitGraph`] stores finalized commits keyed by id. Parent links are
//! plain ids resolved through that index, so walks never follow embedded
//! pointers and no ownership cycle can form.
//!
//! # Invariants
//!
//! - Every parent reference resolves to a commit in the graph.
//! - Commit ids are unique; re-inserting a known commit is a no-op.
//! - The graph is acyclic (a commit's id covers its parents' ids).

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use sprig_types::ObjectId;

use crate::commit::Commit;
use crate::error::{DagError, DagResult};

/// How the common ancestor of two commits is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AncestorStrategy {
    /// Intersect full multi-parent ancestor sets and pick the best common
    /// ancestor: one that is not itself an ancestor of another common
    /// ancestor, latest timestamp first.
    #[default]
    Lineage,
    /// Walk the first-parent chain of one side until it meets the
    /// first-parent ancestry of the other. Ignores second parents.
    FirstParent,
}

/// Index of every known commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitGraph {
    commits: BTreeMap<ObjectId, Commit>,
}

impl CommitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Returns `true` if the graph holds no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Add a finalized commit.
    ///
    /// Every parent must already be present. Returns `false` if the commit
    /// was already known.
    pub fn insert(&mut self, commit: Commit) -> DagResult<bool> {
        if self.commits.contains_key(&commit.id()) {
            return Ok(false);
        }
        for parent in commit.parents() {
            if !self.commits.contains_key(&parent) {
                return Err(DagError::DanglingParent {
                    commit: commit.id(),
                    parent,
                });
            }
        }

        debug!(commit = %commit.id().short_hex(), merge = commit.is_merge(), "added commit");
        self.commits.insert(commit.id(), commit);
        Ok(true)
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    pub fn get(&self, id: &ObjectId) -> Option<&Commit> {
        self.commits.get(id)
    }

    /// Look up a commit that must exist.
    pub fn require(&self, id: &ObjectId) -> DagResult<&Commit> {
        self.commits.get(id).ok_or(DagError::CommitNotFound(*id))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.commits.contains_key(id)
    }

    /// All commits, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.values()
    }

    /// Resolve a full or abbreviated hex id.
    pub fn resolve_prefix(&self, prefix: &str) -> DagResult<&Commit> {
        let mut matches = self.commits.values().filter(|c| c.id().matches_prefix(prefix));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit),
            (None, _) => Err(DagError::NoMatch(prefix.to_string())),
            (Some(_), Some(_)) => Err(DagError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count: 2 + matches.count(),
            }),
        }
    }

    /// Every commit whose message equals `message` exactly, newest first.
    pub fn find_by_message(&self, message: &str) -> Vec<&Commit> {
        let mut found: Vec<&Commit> = self
            .commits
            .values()
            .filter(|c| c.message() == message)
            .collect();
        found.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()).then(a.id().cmp(&b.id())));
        found
    }

    // ---------------------------------------------------------------
    // Ancestry
    // ---------------------------------------------------------------

    /// Walk first-parent links from `tip` back to the root, newest first.
    pub fn log(&self, tip: ObjectId) -> FirstParentIter<'_> {
        FirstParentIter {
            graph: self,
            next: Some(tip),
        }
    }

    /// Every ancestor of `id` through both parents, including `id` itself.
    ///
    /// Empty if `id` is unknown.
    pub fn ancestors(&self, id: &ObjectId) -> HashSet<ObjectId> {
        let mut visited = HashSet::new();
        if !self.commits.contains_key(id) {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited.insert(*id);
        queue.push_back(*id);

        while let Some(current) = queue.pop_front() {
            if let Some(commit) = self.commits.get(&current) {
                for parent in commit.parents() {
                    if visited.insert(parent) {
                        queue.push_back(parent);
                    }
                }
            }
        }

        visited
    }

    /// Returns `true` if `ancestor` is reachable from `descendant` (or equal).
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> bool {
        if ancestor == descendant {
            return self.commits.contains_key(ancestor);
        }
        self.ancestors(descendant).contains(ancestor)
    }

    /// Find the common ancestor of `a` and `b` under `strategy`.
    ///
    /// Returns `None` if either commit is unknown or the histories are
    /// unrelated.
    pub fn common_ancestor(
        &self,
        a: &ObjectId,
        b: &ObjectId,
        strategy: AncestorStrategy,
    ) -> Option<&Commit> {
        if !self.commits.contains_key(a) || !self.commits.contains_key(b) {
            return None;
        }
        if a == b {
            return self.commits.get(a);
        }

        let found = match strategy {
            AncestorStrategy::Lineage => self.best_common_ancestor(a, b),
            AncestorStrategy::FirstParent => self.first_parent_meeting(a, b),
        };
        debug!(
            a = %a.short_hex(),
            b = %b.short_hex(),
            ?strategy,
            ancestor = ?found.map(|c| c.id().short_hex()),
            "common ancestor"
        );
        found
    }

    fn best_common_ancestor(&self, a: &ObjectId, b: &ObjectId) -> Option<&Commit> {
        let ancestors_a = self.ancestors(a);
        let ancestors_b = self.ancestors(b);
        let common: HashSet<ObjectId> = ancestors_a.intersection(&ancestors_b).copied().collect();

        // The common set is closed under ancestry, so every proper ancestor
        // of a common commit is a parent of some common commit.
        let dominated: HashSet<ObjectId> = common
            .iter()
            .filter_map(|id| self.commits.get(id))
            .flat_map(|c| c.parents())
            .collect();

        common
            .iter()
            .filter(|id| !dominated.contains(*id))
            .filter_map(|id| self.commits.get(id))
            .max_by(|x, y| {
                x.timestamp()
                    .cmp(&y.timestamp())
                    .then_with(|| x.id().cmp(&y.id()))
            })
    }

    fn first_parent_meeting(&self, a: &ObjectId, b: &ObjectId) -> Option<&Commit> {
        let line_a: HashSet<ObjectId> = self.log(*a).map(|c| c.id()).collect();
        self.log(*b).find(|c| line_a.contains(&c.id()))
    }

    /// Ancestry of `tip` not yet known on the other side, parents first.
    ///
    /// Traversal stops at any commit for which `known` returns `true`; those
    /// commits and their ancestry are left out.
    pub fn missing_ancestry<F>(&self, tip: &ObjectId, known: F) -> DagResult<Vec<&Commit>>
    where
        F: Fn(&ObjectId) -> bool,
    {
        let mut ordered = Vec::new();
        let mut emitted = HashSet::new();
        let mut stack = vec![(*tip, false)];

        while let Some((id, expanded)) = stack.pop() {
            if emitted.contains(&id) || known(&id) {
                continue;
            }
            let commit = self.require(&id)?;
            if expanded {
                emitted.insert(id);
                ordered.push(commit);
                continue;
            }
            stack.push((id, true));
            for parent in commit.parents() {
                if !emitted.contains(&parent) {
                    stack.push((parent, false));
                }
            }
        }

        Ok(ordered)
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Validate structural integrity.
    ///
    /// Checks that every commit still hashes to its id and that every parent
    /// reference resolves.
    pub fn validate(&self) -> DagResult<()> {
        for (id, commit) in &self.commits {
            if *id != commit.id() {
                return Err(DagError::IdMismatch {
                    expected: *id,
                    computed: commit.id(),
                });
            }
            commit.verify()?;
            for parent in commit.parents() {
                if !self.commits.contains_key(&parent) {
                    return Err(DagError::DanglingParent {
                        commit: *id,
                        parent,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Iterator over a first-parent chain, newest first.
pub struct FirstParentIter<'a> {
    graph: &'a CommitGraph,
    next: Option<ObjectId>,
}

impl<'a> Iterator for FirstParentIter<'a> {
    type Item = &'a Commit;

    fn next(&mut self) -> Option<Self::Item> {
        let commit = self.graph.get(&self.next?)?;
        self.next = commit.parent();
        Some(commit)
    }
}
