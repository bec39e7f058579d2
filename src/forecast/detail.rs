// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use crate::models::ForecastDetailEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLeaf {
    pub amount: i64,
    pub related_id: Option<i64>,
    pub related_table: Option<String>,
    pub is_excluded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailNode {
    Leaf(DetailLeaf),
    Branch(BTreeMap<String, DetailNode>),
}

impl DetailNode {
    fn flatten(nodes: &BTreeMap<String, DetailNode>) -> Vec<ForecastDetailEntry> {
        nodes
            .iter()
            .map(|(name, node)| match node {
                DetailNode::Leaf(leaf) => ForecastDetailEntry {
                    name: name.clone(),
                    amount: Some(leaf.amount),
                    related_id: leaf.related_id,
                    related_table: leaf.related_table.clone(),
                    is_excluded: leaf.is_excluded,
                    children: Vec::new(),
                },
                DetailNode::Branch(children) => ForecastDetailEntry {
                    name: name.clone(),
                    amount: None,
                    related_id: None,
                    related_table: None,
                    is_excluded: false,
                    children: DetailNode::flatten(children),
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Revenue,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Related<'a> {
    pub id: Option<i64>,
    pub table: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailTree {
    revenue: BTreeMap<String, DetailNode>,
    expense: BTreeMap<String, DetailNode>,
}

impl DetailTree {
    /// Adds `amount` to the leaf at `path`, creating branches on the way.
    ///
    /// Repeated postings to one leaf accumulate; the exclusion flag reflects
    /// the latest posting. A path that collides with an existing node of the
    /// other kind replaces it.
    pub fn record(
        &mut self,
        side: Side,
        path: &[&str],
        amount: i64,
        related: Related<'_>,
        is_excluded: bool,
    ) {
        let Some((leaf_name, branches)) = path.split_last() else {
            return;
        };
        let mut level = match side {
            Side::Revenue => &mut self.revenue,
            Side::Expense => &mut self.expense,
        };
        for name in branches {
            let node = level
                .entry((*name).to_string())
                .or_insert_with(|| DetailNode::Branch(BTreeMap::new()));
            if let DetailNode::Leaf(_) = node {
                *node = DetailNode::Branch(BTreeMap::new());
            }
            let DetailNode::Branch(children) = node else {
                return;
            };
            level = children;
        }

        let empty = || {
            DetailNode::Leaf(DetailLeaf {
                amount: 0,
                related_id: related.id,
                related_table: Some(related.table.to_string()),
                is_excluded,
            })
        };
        let node = level.entry((*leaf_name).to_string()).or_insert_with(empty);
        if let DetailNode::Branch(_) = node {
            *node = empty();
        }
        if let DetailNode::Leaf(leaf) = node {
            leaf.amount += amount;
            leaf.is_excluded = is_excluded;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.revenue.is_empty() && self.expense.is_empty()
    }

    pub fn flatten(&self) -> (Vec<ForecastDetailEntry>, Vec<ForecastDetailEntry>) {
        (
            DetailNode::flatten(&self.revenue),
            DetailNode::flatten(&self.expense),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i64) -> Related<'static> {
        Related {
            id: Some(id),
            table: "transactions",
        }
    }

    #[test]
    fn postings_to_one_leaf_accumulate() {
        let mut tree = DetailTree::default();
        tree.record(Side::Expense, &["Rent", "Office"], -1_000, tx(1), false);
        tree.record(Side::Expense, &["Rent", "Office"], -500, tx(1), false);
        let (_, expense) = tree.flatten();
        assert_eq!(expense.len(), 1);
        assert_eq!(expense[0].name, "Rent");
        assert_eq!(expense[0].amount, None);
        assert_eq!(expense[0].children[0].amount, Some(-1_500));
        assert_eq!(expense[0].children[0].related_id, Some(1));
    }

    #[test]
    fn flattening_is_key_sorted_regardless_of_insert_order() {
        let mut a = DetailTree::default();
        a.record(Side::Revenue, &["Sales", "b"], 2, tx(2), false);
        a.record(Side::Revenue, &["Consulting", "x"], 3, tx(3), false);
        a.record(Side::Revenue, &["Sales", "a"], 1, tx(1), false);

        let mut b = DetailTree::default();
        b.record(Side::Revenue, &["Sales", "a"], 1, tx(1), false);
        b.record(Side::Revenue, &["Sales", "b"], 2, tx(2), false);
        b.record(Side::Revenue, &["Consulting", "x"], 3, tx(3), false);

        assert_eq!(a.flatten(), b.flatten());
        let (revenue, _) = a.flatten();
        let names: Vec<_> = revenue.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Consulting", "Sales"]);
        let sales: Vec<_> = revenue[1].children.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(sales, ["a", "b"]);
    }

    #[test]
    fn excluded_flag_follows_latest_posting() {
        let mut tree = DetailTree::default();
        tree.record(Side::Revenue, &["Sales", "Deal"], 0, tx(1), true);
        let (revenue, _) = tree.flatten();
        assert!(revenue[0].children[0].is_excluded);
        assert_eq!(revenue[0].children[0].amount, Some(0));

        tree.record(Side::Revenue, &["Sales", "Deal"], 10, tx(1), false);
        let (revenue, _) = tree.flatten();
        assert!(!revenue[0].children[0].is_excluded);
        assert_eq!(revenue[0].children[0].amount, Some(10));
    }

    #[test]
    fn sides_are_kept_apart() {
        let mut tree = DetailTree::default();
        assert!(tree.is_empty());
        tree.record(Side::Expense, &["Salaries", "Ada"], -100, tx(1), false);
        let (revenue, expense) = tree.flatten();
        assert!(revenue.is_empty());
        assert_eq!(expense.len(), 1);
        assert!(!tree.is_empty());
    }
}
