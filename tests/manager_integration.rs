// Integration tests for the permission manager contract over the
// in-memory reference backend.

pub mod common;

use std::collections::HashSet;

use common::{Post, User, fixture};
use permbase::prelude::*;
use quickcheck::{QuickCheck, TestResult};

fn labels(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn grant_check_list_round_trip() {
    let fx = fixture();
    let (manager, user, post) = (&fx.manager, &fx.user, &fx.post);

    assert!(!manager.has_permission(user, post, "read").unwrap());
    assert!(!manager.has_permission(user, post, "write").unwrap());
    assert!(manager.get_permissions(user, post).unwrap().is_empty());

    manager.add_permission(user, post, "read").unwrap();
    manager.add_permission(user, post, "write").unwrap();

    assert!(manager.has_permission(user, post, "read").unwrap());
    assert!(manager.has_permission(user, post, "write").unwrap());
    assert_eq!(
        manager.get_permissions(user, post).unwrap(),
        labels(&["read", "write"])
    );

    manager.remove_permission(user, post, "write").unwrap();

    assert!(manager.has_permission(user, post, "read").unwrap());
    assert!(!manager.has_permission(user, post, "write").unwrap());
    assert_eq!(
        manager.get_permissions(user, post).unwrap(),
        labels(&["read"])
    );

    let missing = manager.remove_permission(user, post, "write").unwrap_err();
    assert!(matches!(missing, PermbaseError::PermissionNotFound(_)));

    let duplicate = manager.add_permission(user, post, "read").unwrap_err();
    assert!(matches!(duplicate, PermbaseError::PermissionExists(_)));
}

#[test]
fn duplicate_grant_leaves_state_unchanged() {
    let fx = fixture();
    let schema = fx.registry.schema_for(&fx.user, &fx.post).unwrap();

    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();
    let err = fx
        .manager
        .add_permission(&fx.user, &fx.post, "read")
        .unwrap_err();
    assert!(matches!(err, PermbaseError::PermissionExists(_)));

    assert_eq!(fx.store.grant_count(schema).unwrap(), 1);
    assert_eq!(
        fx.manager.get_permissions(&fx.user, &fx.post).unwrap(),
        labels(&["read"])
    );
}

#[test]
fn revoke_of_absent_grant_leaves_state_unchanged() {
    let fx = fixture();
    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();

    let err = fx
        .manager
        .remove_permission(&fx.user, &fx.post, "write")
        .unwrap_err();
    assert!(matches!(err, PermbaseError::PermissionNotFound(_)));
    assert_eq!(
        fx.manager.get_permissions(&fx.user, &fx.post).unwrap(),
        labels(&["read"])
    );
}

#[test]
fn grants_are_scoped_to_the_exact_pair() {
    let fx = fixture();
    let other_user = User {
        id: Some(2),
        name: "brian".to_string(),
    };
    let other_post = Post {
        id: Some(2),
        title: "39".to_string(),
    };
    fx.store.put(other_user.clone()).unwrap();
    fx.store.put(other_post.clone()).unwrap();

    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();

    assert!(!fx
        .manager
        .has_permission(&other_user, &fx.post, "read")
        .unwrap());
    assert!(!fx
        .manager
        .has_permission(&fx.user, &other_post, "read")
        .unwrap());
    assert!(fx
        .manager
        .get_permissions(&other_user, &other_post)
        .unwrap()
        .is_empty());
}

#[test]
fn agent_delete_cascades_grants() {
    let fx = fixture();
    let schema = fx.registry.schema_for(&fx.user, &fx.post).unwrap();

    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();
    assert_eq!(fx.store.grant_count(schema).unwrap(), 1);

    fx.store.delete::<User>(&RecordId::Int(1)).unwrap();
    assert_eq!(fx.store.grant_count(schema).unwrap(), 0);
    assert!(fx
        .manager
        .get_permissions(&fx.user, &fx.post)
        .unwrap()
        .is_empty());
}

#[test]
fn target_delete_cascades_grants() {
    let fx = fixture();
    let schema = fx.registry.schema_for(&fx.user, &fx.post).unwrap();

    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();
    assert_eq!(fx.store.grant_count(schema).unwrap(), 1);

    fx.store.delete::<Post>(&RecordId::Int(1)).unwrap();
    assert_eq!(fx.store.grant_count(schema).unwrap(), 0);
    assert!(fx
        .manager
        .get_permissions(&fx.user, &fx.post)
        .unwrap()
        .is_empty());
}

#[test]
fn unsaved_records_are_rejected() {
    let fx = fixture();
    let unsaved = User {
        id: None,
        name: "draft".to_string(),
    };

    let err = fx
        .manager
        .has_permission(&unsaved, &fx.post, "read")
        .unwrap_err();
    assert!(matches!(err, PermbaseError::RecordNotSaved(_)));

    let err = fx
        .manager
        .add_permission(&fx.user, &Post { id: None, title: String::new() }, "read")
        .unwrap_err();
    assert!(matches!(err, PermbaseError::RecordNotSaved(_)));
}

#[test]
fn unregistered_pair_is_rejected() {
    #[derive(Debug, Clone)]
    struct Tag {
        id: i64,
    }

    impl Record for Tag {
        fn record_id(&self) -> Option<RecordId> {
            Some(self.id.into())
        }
    }

    impl Entity for Tag {
        const NAME: &'static str = "Tag";
        const STORAGE_NAME: &'static str = "tag";
    }

    let fx = fixture();
    let tag = Tag { id: 1 };
    let err = fx.manager.has_permission(&fx.user, &tag, "read").unwrap_err();
    assert!(matches!(err, PermbaseError::SchemaNotFound { .. }));
}

#[test]
fn type_level_scope_matches_any_agent() {
    let fx = fixture();
    let other_user = User {
        id: Some(2),
        name: "brian".to_string(),
    };
    fx.store.put(other_user.clone()).unwrap();
    fx.manager
        .add_permission(&other_user, &fx.post, "moderate")
        .unwrap();

    // The exact pair has no grant, but some user does.
    assert!(!fx
        .manager
        .has_permission(&fx.user, &fx.post, "moderate")
        .unwrap());
    assert!(fx
        .manager
        .has_permission_scoped(&fx.user, &fx.post, "moderate", &CheckScope::any_agent())
        .unwrap());
}

#[test]
fn refined_scope_filters_candidate_rows() {
    let fx = fixture();
    let other_user = User {
        id: Some(2),
        name: "brian".to_string(),
    };
    fx.store.put(other_user.clone()).unwrap();
    fx.manager.add_permission(&fx.user, &fx.post, "read").unwrap();
    fx.manager
        .add_permission(&other_user, &fx.post, "write")
        .unwrap();

    let only_second = |grant: &Grant| grant.agent_id == RecordId::Int(2);
    let scope = CheckScope {
        any_agent: true,
        refine: Some(&only_second),
        ..CheckScope::default()
    };
    assert_eq!(
        fx.manager
            .get_permissions_scoped(&fx.user, &fx.post, &scope)
            .unwrap(),
        labels(&["write"])
    );
}

#[test]
fn round_trip_holds_for_arbitrary_labels() {
    fn prop(label: String) -> TestResult {
        if label.is_empty() {
            return TestResult::discard();
        }
        let fx = fixture();
        let before = fx.manager.has_permission(&fx.user, &fx.post, &label).unwrap();
        fx.manager.add_permission(&fx.user, &fx.post, &label).unwrap();
        let after = fx.manager.has_permission(&fx.user, &fx.post, &label).unwrap();
        let listed = fx
            .manager
            .get_permissions(&fx.user, &fx.post)
            .unwrap()
            .contains(&label);
        fx.manager.remove_permission(&fx.user, &fx.post, &label).unwrap();
        let removed = fx.manager.has_permission(&fx.user, &fx.post, &label).unwrap();
        TestResult::from_bool(!before && after && listed && !removed)
    }

    QuickCheck::new()
        .tests(50)
        .quickcheck(prop as fn(String) -> TestResult);
}
