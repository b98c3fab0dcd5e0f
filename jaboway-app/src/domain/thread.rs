use super::actor::ActorId;
use super::post::Post;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reports at which a post is removed and a thread enters the admin queue.
pub const REPORT_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ThreadCategory {
    #[default]
    Umum,
    Kuliner,
    Transportasi,
    #[serde(rename = "Lowongan Kerja")]
    LowonganKerja,
    Hiburan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Green,
    Yellow,
    Red,
}

impl VoteType {
    pub const ALL: [VoteType; 3] = [VoteType::Green, VoteType::Yellow, VoteType::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustStatus {
    Trusted,
    Questionable,
    Danger,
}

impl TrustStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trusted => "Diskusi Terpercaya",
            Self::Questionable => "Diskusi Meragukan",
            Self::Danger => "Diskusi Berisiko",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub trusted: usize,
    pub questionable: usize,
    pub danger: usize,
}

impl VoteTally {
    /// Sole maximum wins; no votes or a tie at the top reads as questionable.
    pub fn status(&self) -> TrustStatus {
        let counts = [
            (TrustStatus::Trusted, self.trusted),
            (TrustStatus::Questionable, self.questionable),
            (TrustStatus::Danger, self.danger),
        ];
        let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if max == 0 {
            return TrustStatus::Questionable;
        }
        let mut top = counts.iter().filter(|(_, n)| *n == max);
        match (top.next(), top.next()) {
            (Some((status, _)), None) => *status,
            _ => TrustStatus::Questionable,
        }
    }
}

/// One vote per actor per thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteLedger(BTreeMap<ActorId, VoteType>);

impl VoteLedger {
    pub fn vote_of(&self, actor: &ActorId) -> Option<VoteType> {
        self.0.get(actor).copied()
    }

    /// Same type again retracts, a different type switches. Returns the actor's vote afterwards.
    pub fn cast(&mut self, actor: &ActorId, vote: VoteType) -> Option<VoteType> {
        match self.0.remove(actor) {
            Some(previous) if previous == vote => None,
            _ => {
                self.0.insert(actor.clone(), vote);
                Some(vote)
            }
        }
    }

    /// Record a vote without toggling. Used when rebuilding from stored arrays.
    pub fn set(&mut self, actor: ActorId, vote: VoteType) {
        self.0.insert(actor, vote);
    }

    pub fn voters(&self, vote: VoteType) -> Vec<ActorId> {
        self.0
            .iter()
            .filter(|(_, v)| **v == vote)
            .map(|(actor, _)| actor.clone())
            .collect()
    }

    pub fn tally(&self) -> VoteTally {
        self.0.values().fold(VoteTally::default(), |mut tally, vote| {
            match vote {
                VoteType::Green => tally.trusted += 1,
                VoteType::Yellow => tally.questionable += 1,
                VoteType::Red => tally.danger += 1,
            }
            tally
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Append-only set of reporters, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportLedger(Vec<ActorId>);

impl ReportLedger {
    pub fn from_actors(actors: impl IntoIterator<Item = ActorId>) -> Self {
        let mut ledger = Self::default();
        for actor in actors {
            ledger.insert(actor);
        }
        ledger
    }

    pub fn contains(&self, actor: &ActorId) -> bool {
        self.0.contains(actor)
    }

    /// Returns false when the actor had already reported.
    pub fn insert(&mut self, actor: ActorId) -> bool {
        if self.contains(&actor) {
            return false;
        }
        self.0.push(actor);
        true
    }

    /// The ledger as it would look after `actor` reports, or `None` if nothing changes.
    pub fn with_report(&self, actor: &ActorId) -> Option<ReportLedger> {
        let mut next = self.clone();
        next.insert(actor.clone()).then_some(next)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn reached_threshold(&self) -> bool {
        self.0.len() >= REPORT_THRESHOLD
    }

    pub fn actors(&self) -> &[ActorId] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: uuid::Uuid,
    pub title: String,
    pub category: ThreadCategory,
    pub posts: Vec<Post>,
    pub views: u64,
    pub votes: VoteLedger,
    pub reports: ReportLedger,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Thread {
    pub fn status(&self) -> TrustStatus {
        self.votes.tally().status()
    }

    pub fn post(&self, post_id: uuid::Uuid) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn post_mut(&mut self, post_id: uuid::Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    pub fn opening_post(&self) -> Option<&Post> {
        self.posts.first()
    }

    /// Threads over the report threshold are hidden from everyone but admins.
    pub fn is_visible_to(&self, is_admin: bool) -> bool {
        is_admin || !self.reports.reached_threshold()
    }
}

/// A thread as presented to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    #[serde(flatten)]
    pub thread: Thread,
    pub status: TrustStatus,
    pub tally: VoteTally,
    pub my_vote: Option<VoteType>,
    pub has_reported: bool,
}

impl ThreadView {
    pub fn new(thread: Thread, viewer: &ActorId) -> Self {
        let tally = thread.votes.tally();
        Self {
            status: tally.status(),
            tally,
            my_vote: thread.votes.vote_of(viewer),
            has_reported: thread.reports.contains(viewer),
            thread,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadForm {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub category: ThreadCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(trusted: usize, questionable: usize, danger: usize) -> VoteTally {
        VoteTally {
            trusted,
            questionable,
            danger,
        }
    }

    #[test]
    fn test_status_tie_break() {
        assert_eq!(tally(3, 3, 1).status(), TrustStatus::Questionable);
        assert_eq!(tally(0, 0, 0).status(), TrustStatus::Questionable);
        assert_eq!(tally(5, 2, 1).status(), TrustStatus::Trusted);
        assert_eq!(tally(1, 0, 2).status(), TrustStatus::Danger);
        assert_eq!(tally(4, 0, 4).status(), TrustStatus::Questionable);
        assert_eq!(tally(0, 1, 0).status(), TrustStatus::Questionable);
    }

    #[test]
    fn test_vote_switch_and_retract() {
        let actor = ActorId::new("guest_1_1");
        let mut ledger = VoteLedger::default();
        assert_eq!(ledger.cast(&actor, VoteType::Green), Some(VoteType::Green));
        assert_eq!(ledger.cast(&actor, VoteType::Red), Some(VoteType::Red));
        assert_eq!(ledger.voters(VoteType::Green), Vec::<ActorId>::new());
        assert_eq!(ledger.voters(VoteType::Red), vec![actor.clone()]);
        assert_eq!(ledger.cast(&actor, VoteType::Red), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_vote_exclusivity_over_sequences() {
        let actor = ActorId::new("acct");
        let other = ActorId::new("other");
        let mut ledger = VoteLedger::default();
        ledger.cast(&other, VoteType::Yellow);
        let sequence = [
            VoteType::Green,
            VoteType::Green,
            VoteType::Yellow,
            VoteType::Red,
            VoteType::Yellow,
            VoteType::Yellow,
            VoteType::Red,
        ];
        for vote in sequence {
            ledger.cast(&actor, vote);
            let appearances = VoteType::ALL
                .iter()
                .filter(|v| ledger.voters(**v).contains(&actor))
                .count();
            assert!(appearances <= 1);
            assert_eq!(ledger.vote_of(&other), Some(VoteType::Yellow));
        }
        assert_eq!(ledger.vote_of(&actor), Some(VoteType::Red));
    }

    #[test]
    fn test_tally_counts_each_color() {
        let mut ledger = VoteLedger::default();
        ledger.cast(&ActorId::new("a"), VoteType::Green);
        ledger.cast(&ActorId::new("b"), VoteType::Green);
        ledger.cast(&ActorId::new("c"), VoteType::Red);
        assert_eq!(ledger.tally(), tally(2, 0, 1));
    }

    #[test]
    fn test_report_ledger_is_idempotent() {
        let mut reports = ReportLedger::default();
        assert!(reports.insert(ActorId::new("a")));
        assert!(!reports.insert(ActorId::new("a")));
        assert_eq!(reports.len(), 1);
        assert!(reports.with_report(&ActorId::new("a")).is_none());
        assert_eq!(reports.with_report(&ActorId::new("b")).map(|r| r.len()), Some(2));
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_report_threshold() {
        let nine = ReportLedger::from_actors((0..9).map(|i| ActorId::new(format!("r{i}"))));
        assert!(!nine.reached_threshold());
        let ten = nine.with_report(&ActorId::new("r9")).unwrap();
        assert!(ten.reached_threshold());
    }

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&ThreadCategory::LowonganKerja).unwrap();
        assert_eq!(json, "\"Lowongan Kerja\"");
        let vote: VoteType = serde_json::from_str("\"yellow\"").unwrap();
        assert_eq!(vote, VoteType::Yellow);
    }
}
