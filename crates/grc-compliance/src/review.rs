//! # Mapping Review Workflow
//!
//! Every mapping passes through human review before it is trusted.
//!
//! ```text
//! Unreviewed ──▶ InReview ──▶ Approved
//!                   │    ◀──────┘ (reopen)
//!                   ▼
//!                Rejected
//!                   └──────▶ InReview (reopen)
//! ```
//!
//! Transitions are validated at runtime and appended to an ordered log.
//! Verification is a separate sign-off that is only possible on an
//! approved mapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grc_core::{GrcError, ReviewStatus, Timestamp, UserId};

/// Record of a review state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTransitionRecord {
    pub from_state: ReviewStatus,
    pub to_state: ReviewStatus,
    pub actor: UserId,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Review state of a mapping plus its transition history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewWorkflow {
    status: ReviewStatus,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<Timestamp>,
    review_notes: Option<String>,
    verified_by: Option<UserId>,
    verification_date: Option<NaiveDate>,
    transitions: Vec<ReviewTransitionRecord>,
}

impl ReviewWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    /// Last reviewer to approve or reject.
    pub fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }

    pub fn reviewed_at(&self) -> Option<Timestamp> {
        self.reviewed_at
    }

    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
    }

    pub fn verified_by(&self) -> Option<UserId> {
        self.verified_by
    }

    pub fn verification_date(&self) -> Option<NaiveDate> {
        self.verification_date
    }

    pub fn transitions(&self) -> &[ReviewTransitionRecord] {
        &self.transitions
    }

    /// UNREVIEWED → IN_REVIEW.
    pub fn start_review(&mut self, actor: UserId) -> Result<(), GrcError> {
        self.require(&[ReviewStatus::Unreviewed], ReviewStatus::InReview)?;
        self.do_transition(ReviewStatus::InReview, actor, None);
        Ok(())
    }

    /// IN_REVIEW → APPROVED.
    pub fn approve(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.require(&[ReviewStatus::InReview], ReviewStatus::Approved)?;
        self.conclude(ReviewStatus::Approved, actor, notes);
        Ok(())
    }

    /// IN_REVIEW → REJECTED.
    pub fn reject(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.require(&[ReviewStatus::InReview], ReviewStatus::Rejected)?;
        self.conclude(ReviewStatus::Rejected, actor, notes);
        Ok(())
    }

    /// APPROVED | REJECTED → IN_REVIEW. Clears any verification.
    pub fn reopen(&mut self, actor: UserId, notes: Option<String>) -> Result<(), GrcError> {
        self.require(
            &[ReviewStatus::Approved, ReviewStatus::Rejected],
            ReviewStatus::InReview,
        )?;
        self.verified_by = None;
        self.verification_date = None;
        self.do_transition(ReviewStatus::InReview, actor, notes);
        Ok(())
    }

    /// Independent sign-off on an approved mapping.
    pub fn verify(&mut self, actor: UserId, date: NaiveDate) -> Result<(), GrcError> {
        if self.status != ReviewStatus::Approved {
            return Err(GrcError::InvalidTransition {
                from: self.status.to_string(),
                to: "verified".to_string(),
            });
        }
        self.verified_by = Some(actor);
        self.verification_date = Some(date);
        Ok(())
    }

    fn conclude(&mut self, to: ReviewStatus, actor: UserId, notes: Option<String>) {
        self.reviewed_by = Some(actor);
        self.reviewed_at = Some(Timestamp::now());
        self.review_notes = notes.clone();
        self.do_transition(to, actor, notes);
    }

    fn require(&self, allowed: &[ReviewStatus], target: ReviewStatus) -> Result<(), GrcError> {
        if !allowed.contains(&self.status) {
            return Err(GrcError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: ReviewStatus, actor: UserId, notes: Option<String>) {
        tracing::debug!(from = %self.status, to = %to, "mapping review transition");
        self.transitions.push(ReviewTransitionRecord {
            from_state: self.status,
            to_state: to,
            actor,
            timestamp: Timestamp::now(),
            notes,
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_review() -> (ReviewWorkflow, UserId) {
        let user = UserId::new();
        let mut wf = ReviewWorkflow::new();
        wf.start_review(user).unwrap();
        (wf, user)
    }

    #[test]
    fn test_new_workflow_is_unreviewed() {
        let wf = ReviewWorkflow::new();
        assert_eq!(wf.status(), ReviewStatus::Unreviewed);
        assert!(wf.transitions().is_empty());
    }

    #[test]
    fn test_approve_records_reviewer() {
        let (mut wf, user) = in_review();
        wf.approve(user, Some("matches Annex A".into())).unwrap();
        assert_eq!(wf.status(), ReviewStatus::Approved);
        assert_eq!(wf.reviewed_by(), Some(user));
        assert!(wf.reviewed_at().is_some());
        assert_eq!(wf.review_notes(), Some("matches Annex A"));
        assert_eq!(wf.transitions().len(), 2);
        assert_eq!(wf.transitions()[1].from_state, ReviewStatus::InReview);
        assert_eq!(wf.transitions()[1].to_state, ReviewStatus::Approved);
    }

    #[test]
    fn test_reject_then_reopen() {
        let (mut wf, user) = in_review();
        wf.reject(user, None).unwrap();
        wf.reopen(user, Some("new evidence".into())).unwrap();
        assert_eq!(wf.status(), ReviewStatus::InReview);
        assert_eq!(wf.transitions().len(), 3);
    }

    #[test]
    fn test_cannot_approve_unreviewed() {
        let mut wf = ReviewWorkflow::new();
        let err = wf.approve(UserId::new(), None).unwrap_err();
        assert_eq!(err.to_string(), "invalid transition from unreviewed to approved");
    }

    #[test]
    fn test_cannot_start_review_twice() {
        let (mut wf, user) = in_review();
        assert!(wf.start_review(user).is_err());
        assert_eq!(wf.transitions().len(), 1);
    }

    #[test]
    fn test_cannot_reopen_in_review() {
        let (mut wf, user) = in_review();
        assert!(wf.reopen(user, None).is_err());
    }

    #[test]
    fn test_verify_requires_approval() {
        let (mut wf, user) = in_review();
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(wf.verify(user, date).is_err());
        wf.approve(user, None).unwrap();
        wf.verify(user, date).unwrap();
        assert_eq!(wf.verified_by(), Some(user));
        assert_eq!(wf.verification_date(), Some(date));
    }

    #[test]
    fn test_reopen_clears_verification() {
        let (mut wf, user) = in_review();
        wf.approve(user, None).unwrap();
        wf.verify(user, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()).unwrap();
        wf.reopen(user, None).unwrap();
        assert!(wf.verified_by().is_none());
        assert!(wf.verification_date().is_none());
    }
}
