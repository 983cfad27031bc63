//! Majority vote over per-tree labels.

use std::collections::HashMap;

use crate::node::Label;

/// Outcome of a majority vote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Vote {
    label: Label,
    tally: Vec<(Label, usize)>,
}

impl Vote {
    /// Return the winning label.
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Consume the vote and return the winning label.
    #[must_use]
    pub fn into_label(self) -> Label {
        self.label
    }

    /// Return `(label, count)` pairs in the order labels were first seen.
    #[must_use]
    pub fn tally(&self) -> &[(Label, usize)] {
        &self.tally
    }

    /// Return the number of votes cast for `label`.
    #[must_use]
    pub fn count(&self, label: &Label) -> usize {
        self.tally
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |&(_, c)| c)
    }

    /// Return the total number of votes cast.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tally.iter().map(|&(_, c)| c).sum()
    }
}

/// Tally `labels` in order and pick the winner.
///
/// The leader changes only when a label's running count becomes strictly
/// greater than the leader's count, so on a tie the label that reached the
/// shared maximum first wins. Returns `None` for an empty input.
pub(crate) fn tally<'a, I>(labels: I) -> Option<Vote>
where
    I: IntoIterator<Item = &'a Label>,
{
    let mut counts: Vec<(&Label, usize)> = Vec::new();
    let mut slots: HashMap<&Label, usize> = HashMap::new();
    let mut best: Option<(usize, usize)> = None;

    for label in labels {
        let slot = *slots.entry(label).or_insert_with(|| {
            counts.push((label, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
        let count = counts[slot].1;
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((slot, count));
        }
    }

    let (winner, _) = best?;
    Some(Vote {
        label: counts[winner].0.clone(),
        tally: counts.into_iter().map(|(l, c)| (l.clone(), c)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<Label> {
        names.iter().map(|&n| Label::from(n)).collect()
    }

    #[test]
    fn majority_wins() {
        let ls = labels(&["A", "A", "B"]);
        let vote = tally(&ls).unwrap();
        assert_eq!(vote.label().as_str(), "A");
        assert_eq!(vote.count(&Label::from("A")), 2);
        assert_eq!(vote.count(&Label::from("B")), 1);
        assert_eq!(vote.total(), 3);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let ls = labels(&["A", "B"]);
        assert_eq!(tally(&ls).unwrap().label().as_str(), "A");
        let ls = labels(&["B", "A"]);
        assert_eq!(tally(&ls).unwrap().label().as_str(), "B");
    }

    #[test]
    fn late_overtake_requires_strict_lead() {
        // A reaches 2 first; B catches up to 2 but never exceeds it.
        let ls = labels(&["A", "B", "A", "B"]);
        assert_eq!(tally(&ls).unwrap().label().as_str(), "A");
        // B exceeds A on the last vote.
        let ls = labels(&["A", "B", "A", "B", "B"]);
        assert_eq!(tally(&ls).unwrap().label().as_str(), "B");
    }

    #[test]
    fn tie_goes_to_first_to_reach_max_not_first_seen() {
        // B is seen first, but A reaches 2 before B does.
        let ls = labels(&["B", "A", "A", "B"]);
        let vote = tally(&ls).unwrap();
        assert_eq!(vote.label().as_str(), "A");
        assert_eq!(vote.tally()[0].0.as_str(), "B");
    }

    #[test]
    fn tally_keeps_first_seen_order() {
        let ls = labels(&["C", "A", "C", "B"]);
        let vote = tally(&ls).unwrap();
        let order: Vec<(&str, usize)> = vote.tally().iter().map(|(l, c)| (l.as_str(), *c)).collect();
        assert_eq!(order, vec![("C", 2), ("A", 1), ("B", 1)]);
    }

    #[test]
    fn empty_input_has_no_winner() {
        assert!(tally(std::iter::empty()).is_none());
    }

    #[test]
    fn unseen_label_counts_zero() {
        let ls = labels(&["A"]);
        assert_eq!(tally(&ls).unwrap().count(&Label::from("Z")), 0);
    }
}
