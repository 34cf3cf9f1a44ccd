use docreg_core::{
    CallContext, Capability, DirectoryError, DirectoryEvent, DocumentHash, Identity, NewRecord,
    OrganisationDirectory,
};

#[test]
fn owner_deploys_distinct_registers_bound_to_organisation() {
    let owner = Identity::generate();
    let mut directory = OrganisationDirectory::new("Acme Ltd", owner).unwrap();

    let (first, first_event) = directory.deploy_register(owner, "contracts").unwrap();
    let (second, second_event) = directory.deploy_register(owner, "invoices").unwrap();

    assert_eq!(
        first_event,
        DirectoryEvent::RegisterDeployed {
            index: 0,
            registry_id: first.id(),
        }
    );
    assert_eq!(second_event.name(), "RegisterDeployed");
    assert_eq!(directory.register_count(), 2);

    let at_zero = directory.registers(0).unwrap();
    let at_one = directory.registers(1).unwrap();
    assert_eq!(at_zero, first);
    assert_eq!(at_one, second);
    assert_ne!(at_zero, at_one);
    assert_eq!(at_zero.organisation(), directory.identity());
    assert_eq!(at_one.organisation(), directory.identity());
    assert_eq!(at_zero.metadata(), "contracts");
    assert_eq!(at_one.metadata(), "invoices");
    assert!(directory.registers(2).is_none());
}

#[test]
fn owner_administers_deployed_registers() {
    let owner = Identity::generate();
    let author = Identity::generate();
    let mut directory = OrganisationDirectory::new("Acme Ltd", owner).unwrap();
    let (register, _) = directory.deploy_register(owner, "contracts").unwrap();

    for capability in Capability::ALL {
        assert!(register.has_role(capability, owner));
    }
    register
        .grant_role(owner, Capability::CreateRecord, author)
        .unwrap();
    register
        .create_record(
            &CallContext::new(author, 10),
            &NewRecord::new(DocumentHash::from_bytes([3; 32]), "a", "b"),
        )
        .unwrap();

    let same_register = directory.registers(0).unwrap();
    assert_eq!(same_register.record_count().unwrap(), 1);
}

#[test]
fn non_owner_cannot_edit_metadata_or_deploy() {
    let owner = Identity::generate();
    let intruder = Identity::generate();
    let mut directory = OrganisationDirectory::new("Acme Ltd", owner).unwrap();

    let err = directory
        .edit_metadata(intruder, "Hijacked")
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthorized { caller } if caller == intruder));
    assert_eq!(directory.metadata(), "Acme Ltd");

    let err = directory.deploy_register(intruder, "rogue").unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthorized { .. }));
    assert_eq!(directory.register_count(), 0);
}

#[test]
fn owner_edits_metadata() {
    let owner = Identity::generate();
    let organisation = Identity::generate();
    let mut directory =
        OrganisationDirectory::with_identity(organisation, "Acme Ltd", owner).unwrap();

    let event = directory.edit_metadata(owner, "Acme Group").unwrap();

    assert_eq!(event, DirectoryEvent::OrganisationMetadataEdited);
    assert_eq!(directory.metadata(), "Acme Group");
    assert_eq!(directory.identity(), organisation);
    assert_eq!(directory.owner(), owner);
}
