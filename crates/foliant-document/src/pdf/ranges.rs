// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expressions such as "1-3, 5, 9-12".
//
// Parsing is best-effort: terms that don't parse, reversed ranges, and page
// numbers outside the document are dropped silently. The only failure is an
// expression that leaves nothing selected.

use std::collections::BTreeSet;

use foliant_core::error::{FoliantError, Result};
use tracing::debug;

/// Ascending, de-duplicated zero-based page indices, each below the page
/// count they were parsed against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndexSet(BTreeSet<usize>);

impl PageIndexSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a PageIndexSet {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Parse a 1-based page-range expression against a document of
/// `total_pages` pages.
///
/// Grammar: `expr := term (',' term)*`, `term := N | N '-' M`, inclusive,
/// whitespace allowed around every token.
pub fn parse_ranges(expression: &str, total_pages: usize) -> Result<PageIndexSet> {
    let mut selected = BTreeSet::new();
    let in_document = |page: usize| (1..=total_pages).contains(&page);

    for term in expression.split(',') {
        let term = term.trim();
        match term.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) =
                    (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                else {
                    debug!(term, "dropping unparseable range term");
                    continue;
                };
                // Clamp before iterating so "1-4000000000" stays cheap.
                let (first, last) = (start.max(1), end.min(total_pages));
                selected.extend((first..=last).map(|page| page - 1));
            }
            None => match term.parse::<usize>() {
                Ok(page) if in_document(page) => {
                    selected.insert(page - 1);
                }
                Ok(page) => debug!(page, total_pages, "dropping out-of-range page"),
                Err(_) => debug!(term, "dropping unparseable page term"),
            },
        }
    }

    if selected.is_empty() {
        return Err(FoliantError::InvalidRange {
            expression: expression.to_string(),
            total_pages,
        });
    }

    Ok(PageIndexSet(selected))
}
