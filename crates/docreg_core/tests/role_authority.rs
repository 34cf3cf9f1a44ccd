use docreg_core::access::capability::{
    CAN_CREATE_RECORD_ROLE, CAN_INVALIDATE_RECORD_ROLE, DEFAULT_ADMIN_ROLE,
};
use docreg_core::{
    parse_capability, CallContext, Capability, CapabilityParseError, DocumentHash, Identity,
    NewRecord, Registry, RegistryError, RoleAuthority, RoleError,
};

#[test]
fn capability_identifiers_are_stable_and_parseable() {
    assert_eq!(Capability::Admin.as_str(), DEFAULT_ADMIN_ROLE);
    assert_eq!(Capability::CreateRecord.as_str(), CAN_CREATE_RECORD_ROLE);
    assert_eq!(
        Capability::InvalidateRecord.as_str(),
        CAN_INVALIDATE_RECORD_ROLE
    );
    for capability in Capability::ALL {
        assert_eq!(parse_capability(capability.as_str()).unwrap(), capability);
    }
    assert_eq!(parse_capability("  "), Err(CapabilityParseError::Empty));
    assert!(matches!(
        parse_capability("CAN_DELETE_RECORD_ROLE"),
        Err(CapabilityParseError::Unsupported(_))
    ));
}

#[test]
fn grant_is_idempotent_and_admin_only() {
    let admin = Identity::generate();
    let member = Identity::generate();
    let mut roles = RoleAuthority::with_admin(admin).unwrap();

    assert!(roles.grant(admin, Capability::CreateRecord, member).unwrap());
    assert!(!roles.grant(admin, Capability::CreateRecord, member).unwrap());
    assert!(roles.check(Capability::CreateRecord, member));

    let err = roles
        .grant(member, Capability::InvalidateRecord, member)
        .unwrap_err();
    assert_eq!(
        err,
        RoleError::Unauthorized {
            capability: Capability::Admin,
            caller: member,
        }
    );
    assert!(!roles.check(Capability::InvalidateRecord, member));
}

#[test]
fn revoke_and_renounce_drop_membership() {
    let admin = Identity::generate();
    let member = Identity::generate();
    let mut roles = RoleAuthority::with_admin(admin).unwrap();
    roles
        .grant(admin, Capability::InvalidateRecord, member)
        .unwrap();

    assert!(roles
        .revoke(admin, Capability::InvalidateRecord, member)
        .unwrap());
    assert!(!roles
        .revoke(admin, Capability::InvalidateRecord, member)
        .unwrap());
    assert!(!roles.check(Capability::InvalidateRecord, member));

    assert!(roles.renounce(admin, Capability::CreateRecord));
    assert!(!roles.check(Capability::CreateRecord, admin));
    assert!(roles.check(Capability::Admin, admin));
}

#[test]
fn zero_identity_cannot_receive_or_lose_capabilities() {
    let admin = Identity::generate();
    let mut roles = RoleAuthority::with_admin(admin).unwrap();

    assert_eq!(
        roles.grant(admin, Capability::CreateRecord, Identity::ZERO),
        Err(RoleError::InvalidAccount)
    );
    assert_eq!(
        roles.revoke(admin, Capability::CreateRecord, Identity::ZERO),
        Err(RoleError::InvalidAccount)
    );
    assert!(!roles.check(Capability::CreateRecord, Identity::ZERO));
}

#[test]
fn members_are_listed_in_stable_order() {
    let admin = Identity::generate();
    let first = Identity::generate();
    let second = Identity::generate();
    let mut roles = RoleAuthority::with_admin(admin).unwrap();
    roles.grant(admin, Capability::CreateRecord, second).unwrap();
    roles.grant(admin, Capability::CreateRecord, first).unwrap();

    let mut expected = vec![admin, first, second];
    expected.sort();
    assert_eq!(roles.members(Capability::CreateRecord), expected);
    assert_eq!(roles.members(Capability::Admin), vec![admin]);
}

#[test]
fn revoked_creator_loses_access_to_registry() {
    let admin = Identity::generate();
    let author = Identity::generate();
    let mut registry = Registry::new(admin, Identity::generate(), "registry").unwrap();
    registry
        .grant_role(admin, Capability::CreateRecord, author)
        .unwrap();
    registry
        .create_record(
            &CallContext::new(author, 10),
            &NewRecord::new(DocumentHash::from_bytes([1; 32]), "a", "b"),
        )
        .unwrap();

    registry
        .revoke_role(admin, Capability::CreateRecord, author)
        .unwrap();
    let err = registry
        .create_record(
            &CallContext::new(author, 20),
            &NewRecord::new(DocumentHash::from_bytes([2; 32]), "a", "b"),
        )
        .unwrap_err();

    assert!(matches!(err, RegistryError::Unauthorized { caller, .. } if caller == author));
    assert_eq!(registry.record_count().unwrap(), 1);
}
