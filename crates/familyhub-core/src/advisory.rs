//! Leave / delete / transfer advice for a member stepping away from a family.
//!
//! Pure and synchronous: the caller supplies the roster and who is asking.

use serde::Serialize;

use crate::auth::AuthProvider;
use crate::models::{AgeGroup, MemberRecord};

/// Largest family (counting the leaving member) a teen may be left to manage.
pub const TEEN_MANAGED_FAMILY_MAX_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Leave,
    Delete,
    TransferFirst,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: Action,
    pub reason: String,
    pub eligible_transfer_targets: Vec<MemberRecord>,
}

impl Recommendation {
    fn new(action: Action, reason: &str) -> Self {
        Self {
            action,
            reason: reason.to_string(),
            eligible_transfer_targets: Vec::new(),
        }
    }

    fn transfer_to(targets: Vec<MemberRecord>, reason: &str) -> Self {
        Self {
            action: Action::TransferFirst,
            reason: reason.to_string(),
            eligible_transfer_targets: targets,
        }
    }
}

/// Recommend what `current_user_id` should do before leaving the family.
///
/// Checks run in a fixed order: another admin beats another adult, which
/// beats the teen/child make-up of the rest of the roster.
pub fn recommend(members: &[MemberRecord], current_user_id: &str) -> Recommendation {
    let others: Vec<&MemberRecord> = members
        .iter()
        .filter(|m| m.user_id != current_user_id)
        .collect();

    if others.is_empty() {
        return Recommendation::new(Action::Delete, "only member");
    }

    if others.iter().any(|m| m.is_admin) {
        return Recommendation::new(Action::Leave, "other admins can manage the family");
    }

    let of_age = |group: AgeGroup| -> Vec<MemberRecord> {
        others
            .iter()
            .filter(|m| m.age_group == group)
            .map(|m| (*m).clone())
            .collect()
    };

    let adults = of_age(AgeGroup::Adult);
    if !adults.is_empty() {
        return Recommendation::transfer_to(adults, "transfer to an adult before leaving");
    }

    // The leaving member counts toward the roster even if the list omitted them.
    let roster_size = others.len() + 1;
    let teens = of_age(AgeGroup::Teen);
    if !teens.is_empty() && roster_size <= TEEN_MANAGED_FAMILY_MAX_SIZE {
        if others.iter().any(|m| m.age_group == AgeGroup::Child) {
            return Recommendation::new(Action::Delete, "teens managing children is not recommended");
        }
        return Recommendation::transfer_to(teens, "transfer to a teen before leaving");
    }

    Recommendation::new(
        Action::Delete,
        "children cannot manage families, or family too large for teen management",
    )
}

/// [`recommend`] for whoever is signed in; `Blocked` when nobody is.
pub fn advise(members: &[MemberRecord], auth: &impl AuthProvider) -> Recommendation {
    match auth.current_user_id() {
        Some(user_id) => recommend(members, &user_id),
        None => Recommendation::new(Action::Blocked, "sign in to manage family membership"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: &str = "me";

    fn me(age_group: AgeGroup) -> MemberRecord {
        MemberRecord::new(ME, age_group, true)
    }

    fn member(id: &str, age_group: AgeGroup, is_admin: bool) -> MemberRecord {
        MemberRecord::new(id, age_group, is_admin)
    }

    struct Anonymous;

    impl AuthProvider for Anonymous {
        fn current_user_id(&self) -> Option<String> {
            None
        }
        fn current_user_age_group(&self) -> Option<AgeGroup> {
            None
        }
    }

    struct SignedIn;

    impl AuthProvider for SignedIn {
        fn current_user_id(&self) -> Option<String> {
            Some(ME.to_string())
        }
        fn current_user_age_group(&self) -> Option<AgeGroup> {
            Some(AgeGroup::Adult)
        }
    }

    #[test]
    fn test_other_admin_means_leave() {
        let rec = recommend(&[member("a", AgeGroup::Adult, true)], ME);
        assert_eq!(rec.action, Action::Leave);
        assert!(rec.eligible_transfer_targets.is_empty());
    }

    #[test]
    fn test_non_admin_adult_means_transfer() {
        let adult = member("a", AgeGroup::Adult, false);
        let rec = recommend(&[me(AgeGroup::Adult), adult.clone()], ME);
        assert_eq!(rec.action, Action::TransferFirst);
        assert_eq!(rec.eligible_transfer_targets, vec![adult]);
    }

    #[test]
    fn test_empty_roster_means_delete() {
        let rec = recommend(&[], ME);
        assert_eq!(rec.action, Action::Delete);
        assert_eq!(rec.reason, "only member");
    }

    #[test]
    fn test_sole_member_means_delete() {
        let rec = recommend(&[me(AgeGroup::Adult)], ME);
        assert_eq!(rec.action, Action::Delete);
        assert_eq!(rec.reason, "only member");
    }

    #[test]
    fn test_only_child_left_means_delete() {
        let rec = recommend(&[member("c", AgeGroup::Child, false)], ME);
        assert_eq!(rec.action, Action::Delete);
        assert!(rec.reason.starts_with("children cannot manage families"));
    }

    #[test]
    fn test_admin_teen_dominates_adult() {
        let rec = recommend(
            &[
                member("t", AgeGroup::Teen, true),
                member("a", AgeGroup::Adult, false),
            ],
            ME,
        );
        assert_eq!(rec.action, Action::Leave);
    }

    #[test]
    fn test_adults_listed_but_not_teens() {
        let rec = recommend(
            &[
                member("a1", AgeGroup::Adult, false),
                member("t", AgeGroup::Teen, false),
                member("a2", AgeGroup::Adult, false),
            ],
            ME,
        );
        let ids: Vec<&str> = rec
            .eligible_transfer_targets
            .iter()
            .map(|m| m.user_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn test_teens_without_children_can_take_over() {
        let rec = recommend(
            &[
                me(AgeGroup::Adult),
                member("t1", AgeGroup::Teen, false),
                member("t2", AgeGroup::Teen, false),
            ],
            ME,
        );
        assert_eq!(rec.action, Action::TransferFirst);
        assert_eq!(rec.eligible_transfer_targets.len(), 2);
    }

    #[test]
    fn test_teens_with_children_means_delete() {
        let rec = recommend(
            &[
                member("t", AgeGroup::Teen, false),
                member("c", AgeGroup::Child, false),
            ],
            ME,
        );
        assert_eq!(rec.action, Action::Delete);
        assert_eq!(rec.reason, "teens managing children is not recommended");
    }

    #[test]
    fn test_teen_family_size_threshold() {
        // Four teens plus the leaving member: five, still manageable
        let mut roster: Vec<MemberRecord> = (0..4)
            .map(|i| member(&format!("t{}", i), AgeGroup::Teen, false))
            .collect();
        assert_eq!(recommend(&roster, ME).action, Action::TransferFirst);

        // Six with the leaving member: too large
        roster.push(member("t4", AgeGroup::Teen, false));
        let rec = recommend(&roster, ME);
        assert_eq!(rec.action, Action::Delete);
        assert!(rec.eligible_transfer_targets.is_empty());
    }

    #[test]
    fn test_advise_uses_signed_in_user() {
        let roster = [me(AgeGroup::Adult), member("a", AgeGroup::Adult, true)];
        assert_eq!(advise(&roster, &SignedIn).action, Action::Leave);
        assert_eq!(advise(&roster, &Anonymous).action, Action::Blocked);
    }

    #[test]
    fn test_action_json() {
        assert_eq!(serde_json::to_string(&Action::TransferFirst).unwrap(), r#""transfer-first""#);
    }
}
