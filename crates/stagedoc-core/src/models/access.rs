use crate::error::AppError;

/// The requesting user, as established by the session collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub is_admin: bool,
}

/// Owner candidates resolved by following the relation chain
/// document → scheduled act → scheduled day → stage → event.
///
/// Both sides are optional: a document need not be linked to an act, and the
/// owner column is deployment-optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentOwners {
    pub event_owner_id: Option<i64>,
    pub document_owner_id: Option<i64>,
}

/// On what basis access was granted; recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBasis {
    Admin,
    EventOwner,
    DocumentOwner,
}

impl AccessBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessBasis::Admin => "admin",
            AccessBasis::EventOwner => "event_owner",
            AccessBasis::DocumentOwner => "document_owner",
        }
    }
}

/// Decide whether `caller` may view the document whose resolved owners are
/// `owners` (`None` when no row exists for the identifier at all).
///
/// Granted iff the caller is elevated, or matches the resolved event owner,
/// or matches the resolved document owner. A missing row denies with
/// `NotFound`; an existing row with no identity match denies with
/// `Forbidden`. Elevated callers pass even with no row - the record locator
/// then reports its own benign 404.
pub fn authorize(caller: &Caller, owners: Option<&DocumentOwners>) -> Result<AccessBasis, AppError> {
    if caller.is_admin {
        return Ok(AccessBasis::Admin);
    }

    let owners = match owners {
        Some(o) => o,
        None => return Err(AppError::NotFound("no authorization row".to_string())),
    };

    if owners.event_owner_id == Some(caller.user_id) {
        return Ok(AccessBasis::EventOwner);
    }
    if owners.document_owner_id == Some(caller.user_id) {
        return Ok(AccessBasis::DocumentOwner);
    }

    Err(AppError::Forbidden(format!(
        "user {} matches no permitted identity",
        caller.user_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: Caller = Caller {
        user_id: 10,
        is_admin: false,
    };
    const ADMIN: Caller = Caller {
        user_id: 1,
        is_admin: true,
    };

    #[test]
    fn test_admin_always_granted() {
        assert_eq!(authorize(&ADMIN, None).unwrap(), AccessBasis::Admin);
        let owners = DocumentOwners::default();
        assert_eq!(authorize(&ADMIN, Some(&owners)).unwrap(), AccessBasis::Admin);
    }

    #[test]
    fn test_event_owner_granted() {
        let owners = DocumentOwners {
            event_owner_id: Some(10),
            document_owner_id: None,
        };
        assert_eq!(
            authorize(&USER, Some(&owners)).unwrap(),
            AccessBasis::EventOwner
        );
    }

    #[test]
    fn test_document_owner_granted() {
        let owners = DocumentOwners {
            event_owner_id: Some(99),
            document_owner_id: Some(10),
        };
        assert_eq!(
            authorize(&USER, Some(&owners)).unwrap(),
            AccessBasis::DocumentOwner
        );
    }

    #[test]
    fn test_stranger_forbidden() {
        let owners = DocumentOwners {
            event_owner_id: Some(99),
            document_owner_id: Some(7),
        };
        assert!(matches!(
            authorize(&USER, Some(&owners)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_row_is_not_found() {
        assert!(matches!(authorize(&USER, None), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_unlinked_document_denies_non_owner() {
        // No act chain and no owner column: nothing to match against
        let owners = DocumentOwners::default();
        assert!(matches!(
            authorize(&USER, Some(&owners)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_idempotent_decision() {
        let owners = DocumentOwners {
            event_owner_id: Some(10),
            document_owner_id: None,
        };
        let first = authorize(&USER, Some(&owners)).unwrap();
        let second = authorize(&USER, Some(&owners)).unwrap();
        assert_eq!(first, second);
    }
}
