//! The permission matrix as pure predicates.
//!
//! Every predicate takes the acting user and, for object-level checks, the
//! owner context of the entity (owning contact and their organisation).
//! Default is deny: anything not granted here is refused.

use super::AuthUser;

/// Owner context of an offer/request aggregate: the owning contact and the
/// organisation that contact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerCtx {
    pub contact_id: i32,
    pub organisation_id: Option<i32>,
}

/// Actor owns the entity: they are the owning contact, or they share its
/// organisation.
pub fn owns(actor: &AuthUser, owner: &OwnerCtx) -> bool {
    if actor.contact_id == owner.contact_id {
        return true;
    }
    match (actor.organisation_id, owner.organisation_id) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// Offer items: requesters browse the offered pool; owners manage their own.

pub fn can_view_offer_items(actor: &AuthUser) -> bool {
    actor.is_superuser || actor.is_requester
}

pub fn can_view_offer_item(actor: &AuthUser, owner: &OwnerCtx) -> bool {
    actor.is_superuser || actor.is_requester || owns(actor, owner)
}

pub fn can_add_offer_item(actor: &AuthUser) -> bool {
    actor.is_superuser
}

pub fn can_change_offer_item(actor: &AuthUser, owner: Option<&OwnerCtx>) -> bool {
    match owner {
        None => actor.is_superuser,
        Some(owner) => actor.is_superuser || owns(actor, owner),
    }
}

pub fn can_delete_offer_item(actor: &AuthUser, owner: Option<&OwnerCtx>) -> bool {
    can_change_offer_item(actor, owner)
}

// Request items: donors browse the requested pool; owners manage their own.

pub fn can_view_request_items(actor: &AuthUser) -> bool {
    actor.is_superuser || actor.is_donor
}

pub fn can_view_request_item(actor: &AuthUser, owner: &OwnerCtx) -> bool {
    actor.is_superuser || actor.is_donor || owns(actor, owner)
}

pub fn can_add_request_item(actor: &AuthUser) -> bool {
    actor.is_superuser
}

pub fn can_change_request_item(actor: &AuthUser, owner: Option<&OwnerCtx>) -> bool {
    match owner {
        None => actor.is_superuser,
        Some(owner) => actor.is_superuser || owns(actor, owner),
    }
}

pub fn can_delete_request_item(actor: &AuthUser, owner: Option<&OwnerCtx>) -> bool {
    can_change_request_item(actor, owner)
}

// Aggregates: non-superusers only reach their own offers/requests.

pub fn can_view_aggregate(actor: &AuthUser, owner: &OwnerCtx) -> bool {
    actor.is_superuser || owns(actor, owner)
}

pub fn can_change_aggregate(actor: &AuthUser, owner: &OwnerCtx) -> bool {
    actor.is_superuser || owns(actor, owner)
}

/// Bulk actions (set-type, move-to) stay staff-only.
pub fn can_run_bulk_actions(actor: &AuthUser) -> bool {
    actor.is_superuser
}

/// Internal notes are a staff-only surface.
pub fn sees_internal_notes(actor: &AuthUser) -> bool {
    actor.is_superuser
}

/// Donor identity columns on offers are hidden from non-donors.
pub fn sees_donor_identity(actor: &AuthUser) -> bool {
    actor.is_superuser || actor.is_donor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(superuser: bool, donor: bool, requester: bool, org: Option<i32>) -> AuthUser {
        AuthUser {
            contact_id: 1,
            name: None,
            email: None,
            organisation_id: org,
            is_superuser: superuser,
            is_donor: donor,
            is_requester: requester,
        }
    }

    #[test]
    fn ownership_matches_contact_or_organisation() {
        let actor = user(false, false, false, Some(7));
        assert!(owns(
            &actor,
            &OwnerCtx {
                contact_id: 1,
                organisation_id: None
            }
        ));
        assert!(owns(
            &actor,
            &OwnerCtx {
                contact_id: 99,
                organisation_id: Some(7)
            }
        ));
        assert!(!owns(
            &actor,
            &OwnerCtx {
                contact_id: 99,
                organisation_id: Some(8)
            }
        ));
        // No organisation on either side never matches via organisation.
        let lone = user(false, false, false, None);
        assert!(!owns(
            &lone,
            &OwnerCtx {
                contact_id: 99,
                organisation_id: None
            }
        ));
    }

    #[test]
    fn offer_items_collection_is_requester_or_staff() {
        assert!(can_view_offer_items(&user(true, false, false, None)));
        assert!(can_view_offer_items(&user(false, false, true, None)));
        assert!(!can_view_offer_items(&user(false, true, false, None)));
    }

    #[test]
    fn request_items_collection_is_donor_or_staff() {
        assert!(can_view_request_items(&user(true, false, false, None)));
        assert!(can_view_request_items(&user(false, true, false, None)));
        assert!(!can_view_request_items(&user(false, false, true, None)));
    }

    #[test]
    fn owners_can_edit_their_items_without_roles() {
        let actor = user(false, false, false, Some(3));
        let own = OwnerCtx {
            contact_id: 1,
            organisation_id: Some(3),
        };
        let foreign = OwnerCtx {
            contact_id: 2,
            organisation_id: Some(4),
        };
        assert!(can_change_offer_item(&actor, Some(&own)));
        assert!(!can_change_offer_item(&actor, Some(&foreign)));
        assert!(can_delete_request_item(&actor, Some(&own)));
        assert!(!can_delete_request_item(&actor, Some(&foreign)));
    }

    #[test]
    fn collection_level_mutation_is_staff_only() {
        let actor = user(false, true, true, Some(3));
        assert!(!can_change_offer_item(&actor, None));
        assert!(!can_add_offer_item(&actor));
        assert!(!can_add_request_item(&actor));
        assert!(!can_run_bulk_actions(&actor));
    }

    #[test]
    fn redaction_flags_follow_roles() {
        assert!(sees_internal_notes(&user(true, false, false, None)));
        assert!(!sees_internal_notes(&user(false, true, true, None)));
        assert!(sees_donor_identity(&user(false, true, false, None)));
        assert!(!sees_donor_identity(&user(false, false, true, None)));
    }
}
