//! Attribute mutators, the commit state machine and USN bookkeeping.

mod common;

use common::*;
use ditkit_core::ObjectIdentifier;
use ditkit_store::attributes;

fn current_usn(agent: &ditkit_agent::DirectoryAgent) -> i64 {
    agent.context().header().highest_committed_usn
}

#[test]
fn test_disable_account_by_sam() {
    let mut agent = ds_agent();
    let changed = agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap();
    assert!(changed);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::USER_ACCOUNT_CONTROL)
            .unwrap(),
        Some(0x0202)
    );
    assert_eq!(current_usn(&agent), INITIAL_USN + 1);
}

#[test]
fn test_disable_is_idempotent() {
    let mut agent = ds_agent();
    assert!(agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap());
    let usn_after_first = current_usn(&agent);

    let changed = agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap();
    assert!(!changed);
    assert_eq!(current_usn(&agent), usn_after_first);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::USER_ACCOUNT_CONTROL)
            .unwrap(),
        Some(0x0202)
    );
}

#[test]
fn test_enable_clears_the_disable_bit() {
    let mut agent = ds_agent();
    agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap();
    assert!(agent
        .set_account_status(&ObjectIdentifier::sam("alice"), true, false)
        .unwrap());
    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::USER_ACCOUNT_CONTROL)
            .unwrap(),
        Some(0x0200)
    );
}

#[test]
fn test_commit_writes_replication_metadata() {
    let mut agent = ds_agent();
    agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap();
    let header_usn = current_usn(&agent);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    let meta = view
        .attribute_meta(attributes::USER_ACCOUNT_CONTROL)
        .unwrap()
        .expect("metadata must be written");
    assert_eq!(meta.local_usn, header_usn);
    assert_eq!(meta.originating_usn, header_usn);
    assert_eq!(meta.version, 1);
    assert_eq!(meta.originating_time, fixed_time());
}

#[test]
fn test_skip_meta_update_burns_no_usn() {
    let mut agent = ds_agent();
    let changed = agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, true)
        .unwrap();
    assert!(changed);
    assert_eq!(current_usn(&agent), INITIAL_USN);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::USER_ACCOUNT_CONTROL)
            .unwrap(),
        Some(0x0202)
    );
    assert!(view
        .attribute_meta(attributes::USER_ACCOUNT_CONTROL)
        .unwrap()
        .is_none());
}

#[test]
fn test_set_account_status_requires_user_account_control() {
    let mut agent = ds_agent();
    let err = agent
        .set_account_status(&ObjectIdentifier::tag(USERS_OU), false, false)
        .unwrap_err();
    assert_eq!(err.error_code(), "OBJECT_OPERATION");
    assert!(err.to_string().contains("not an account"));
    assert_eq!(current_usn(&agent), INITIAL_USN);
}

#[test]
fn test_set_primary_group_id() {
    let mut agent = ds_agent();
    let changed = agent
        .set_primary_group_id(&ObjectIdentifier::sam("alice"), 513, false)
        .unwrap();
    assert!(changed);
    assert_eq!(current_usn(&agent), INITIAL_USN + 1);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::PRIMARY_GROUP_ID)
            .unwrap(),
        Some(513)
    );
}

#[test]
fn test_set_primary_group_id_same_value_is_noop() {
    let mut agent = ds_agent();
    agent
        .set_primary_group_id(&ObjectIdentifier::sam("alice"), 513, false)
        .unwrap();
    let usn = current_usn(&agent);
    assert!(!agent
        .set_primary_group_id(&ObjectIdentifier::sam("alice"), 513, false)
        .unwrap());
    assert_eq!(current_usn(&agent), usn);
}

#[test]
fn test_set_primary_group_id_on_non_account() {
    let mut agent = ds_agent();
    let err = agent
        .set_primary_group_id(&ObjectIdentifier::tag(USERS_OU), 513, false)
        .unwrap_err();
    assert_eq!(err.error_code(), "OBJECT_OPERATION");
    assert_eq!(current_usn(&agent), INITIAL_USN);
    // No edit was accepted.
    let view = agent.find_object(&ObjectIdentifier::tag(USERS_OU)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::PRIMARY_GROUP_ID)
            .unwrap(),
        None
    );
}

#[test]
fn test_set_primary_group_id_accepts_out_of_range_rid() {
    // Range enforcement is a documented open question: the value is
    // accepted, with a warning.
    let mut agent = ds_agent();
    assert!(agent
        .set_primary_group_id(&ObjectIdentifier::sam("alice"), -7, false)
        .unwrap());
    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    assert_eq!(
        view.read_attribute::<i32>(attributes::PRIMARY_GROUP_ID)
            .unwrap(),
        Some(-7)
    );
}

#[test]
fn test_add_sid_history() {
    let mut agent = ds_agent();
    let changed = agent
        .add_sid_history(
            &ObjectIdentifier::sam("alice"),
            &[migrated_sid()],
            false,
        )
        .unwrap();
    assert!(changed);
    assert_eq!(current_usn(&agent), INITIAL_USN + 1);

    let view = agent.find_object(&ObjectIdentifier::tag(ALICE)).unwrap();
    let history: Vec<ditkit_core::SecurityIdentifier> = view
        .read_attribute_multi(attributes::SID_HISTORY)
        .unwrap();
    assert_eq!(history, vec![migrated_sid()]);
}

#[test]
fn test_add_sid_history_merge_is_idempotent() {
    let mut agent = ds_agent();
    agent
        .add_sid_history(&ObjectIdentifier::sam("alice"), &[migrated_sid()], false)
        .unwrap();
    let usn = current_usn(&agent);

    let changed = agent
        .add_sid_history(&ObjectIdentifier::sam("alice"), &[migrated_sid()], false)
        .unwrap();
    assert!(!changed);
    assert_eq!(current_usn(&agent), usn);
}

#[test]
fn test_add_sid_history_on_group() {
    // Groups are security principals without an account role.
    let mut agent = ds_agent();
    assert!(agent
        .add_sid_history(&ObjectIdentifier::sam("staff"), &[migrated_sid()], false)
        .unwrap());
}

#[test]
fn test_add_sid_history_rejects_non_principal() {
    let mut agent = ds_agent();
    let err = agent
        .add_sid_history(&ObjectIdentifier::tag(USERS_OU), &[migrated_sid()], false)
        .unwrap_err();
    assert_eq!(err.error_code(), "OBJECT_OPERATION");
    assert!(err.to_string().contains("not a security principal"));
}

#[test]
fn test_remove_object() {
    let mut agent = ds_agent();
    agent.remove_object(&ObjectIdentifier::sam("bob$")).unwrap();
    let err = agent
        .find_object(&ObjectIdentifier::sam("bob$"))
        .unwrap_err();
    assert_eq!(err.error_code(), "OBJECT_NOT_FOUND");
    // Deletion bypasses the attribute pipeline.
    assert_eq!(current_usn(&agent), INITIAL_USN);
}

#[test]
fn test_remove_object_unknown() {
    let mut agent = ds_agent();
    let err = agent
        .remove_object(&ObjectIdentifier::sam("carol"))
        .unwrap_err();
    assert_eq!(err.error_code(), "OBJECT_NOT_FOUND");
}

#[test]
fn test_set_epoch() {
    let mut agent = ds_agent();
    agent.set_epoch(42).unwrap();
    assert_eq!(agent.context().header().epoch, 42);
}

#[test]
fn test_set_usn() {
    let mut agent = ds_agent();
    agent.set_usn(INITIAL_USN + 1000).unwrap();
    assert_eq!(current_usn(&agent), INITIAL_USN + 1000);
    // The next metadata-maintaining commit continues from the new value.
    agent
        .set_account_status(&ObjectIdentifier::sam("alice"), false, false)
        .unwrap();
    assert_eq!(current_usn(&agent), INITIAL_USN + 1001);
}

#[test]
fn test_authoritative_restore_is_a_stub() {
    let mut agent = ds_agent();
    let err = agent
        .authoritative_restore_by_guid(alice_guid(), &["userAccountControl"])
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_IMPLEMENTED");
    let err = agent
        .authoritative_restore_by_dn(&ditkit_core::Dn::new(ALICE_DN), &["userAccountControl"])
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_IMPLEMENTED");
}

#[test]
fn test_mutation_after_abandoned_enumeration() {
    // Abandoning a lazy enumeration leaves the cursor position undefined;
    // the next mutation must still succeed on its own lookup.
    let mut agent = ds_agent();
    {
        let mut accounts = agent.get_accounts(None).unwrap();
        let first = accounts.next();
        assert!(first.is_some());
    }
    assert!(agent
        .set_account_status(&ObjectIdentifier::sam("bob$"), false, false)
        .unwrap());
}
