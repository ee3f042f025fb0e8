use amanah_core::db::open_db_in_memory;
use amanah_core::model::group::MemberStatus;
use amanah_core::model::invite::InviteRejection;
use amanah_core::repo::keys;
use amanah_core::store::KvAccess;
use amanah_core::{
    AuthError, AuthService, GroupService, InviteError, InviteRequest, InviteService, NewGroup,
    ProfileUpdate, SeedMode, SqliteKvStore, UserProfile, UserRole,
};
use rusqlite::Connection;

fn store(conn: &Connection) -> SqliteKvStore<'_> {
    SqliteKvStore::try_new(conn).unwrap()
}

fn invite_request(expiry_days: Option<u32>, group_id: Option<String>) -> InviteRequest {
    InviteRequest {
        created_by: "Layla".to_string(),
        expiry_days,
        group_id,
    }
}

#[test]
fn first_user_is_admin_and_register_logs_in() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(store(&conn));

    let first = auth.register(" layla@x.io ", "secret1", "Layla").unwrap();
    assert_eq!(first.email, "layla@x.io");
    assert_eq!(first.role, Some(UserRole::Admin));
    assert_eq!(auth.current_user().unwrap(), Some(first.clone()));

    let second = auth.register("omar@x.io", "secret2", "Omar").unwrap();
    assert_eq!(second.role, Some(UserRole::Member));
    assert_eq!(auth.current_user().unwrap().unwrap().id, second.id);
    assert_eq!(auth.list_users().unwrap().len(), 2);
}

#[test]
fn register_validates_input() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(store(&conn));
    auth.register("layla@x.io", "secret1", "Layla").unwrap();

    let err = auth.register("LAYLA@x.io", "secret1", "Other").unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
    assert_eq!(err.to_string(), "Email already registered");
    assert!(matches!(
        auth.register("not-an-email", "secret1", "X").unwrap_err(),
        AuthError::InvalidEmail(_)
    ));
    assert!(matches!(
        auth.register("x@y.io", "12345", "X").unwrap_err(),
        AuthError::PasswordTooShort
    ));
    assert!(matches!(
        auth.register("x@y.io", "123456", "  ").unwrap_err(),
        AuthError::Validation(_)
    ));
    assert_eq!(auth.list_users().unwrap().len(), 1);
}

#[test]
fn login_and_logout_manage_the_session() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(store(&conn));
    let user = auth.register("layla@x.io", "secret1", "Layla").unwrap();
    auth.logout().unwrap();
    assert!(!auth.is_authenticated().unwrap());

    let err = auth.login("layla@x.io", "wrong-pass").unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!auth.is_authenticated().unwrap());

    let logged_in = auth.login("Layla@X.io", "secret1").unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(auth.is_authenticated().unwrap());

    let session = store(&conn).get(keys::CURRENT_USER).unwrap().unwrap();
    assert!(!session.contains("secret1"));
}

#[test]
fn profile_updates_refresh_session_and_enforce_unique_email() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(store(&conn));
    let omar = auth.register("omar@x.io", "secret2", "Omar").unwrap();
    let layla = auth.register("layla@x.io", "secret1", "Layla").unwrap();

    let updated = auth
        .update_profile(
            &layla.id,
            &ProfileUpdate {
                name: Some("Layla H.".to_string()),
                email: None,
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Layla H.");
    assert_eq!(auth.current_user().unwrap().unwrap().name, "Layla H.");

    let err = auth
        .update_profile(
            &layla.id,
            &ProfileUpdate {
                name: None,
                email: Some(omar.email.clone()),
            },
        )
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));

    auth.change_password(&layla.id, "secret1", "newsecret").unwrap();
    assert!(matches!(
        auth.change_password(&layla.id, "secret1", "another").unwrap_err(),
        AuthError::IncorrectPassword
    ));
    auth.logout().unwrap();
    auth.login("layla@x.io", "newsecret").unwrap();

    let promoted = auth.update_user_role(&omar.id, UserRole::Admin).unwrap();
    assert_eq!(promoted.role, Some(UserRole::Admin));
    assert!(matches!(
        auth.update_user_role("missing", UserRole::Member).unwrap_err(),
        AuthError::UserNotFound(_)
    ));
}

#[test]
fn profile_extension_defaults_to_empty() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(store(&conn));

    assert_eq!(auth.get_profile("u1").unwrap(), UserProfile::default());
    let profile = UserProfile {
        phone: Some("+46700000000".to_string()),
        bio: Some("Aunt".to_string()),
        avatar: None,
    };
    auth.save_profile("u1", &profile).unwrap();
    assert_eq!(auth.get_profile("u1").unwrap(), profile);
    assert!(store(&conn).get(&keys::profile_key("u1")).unwrap().is_some());
}

#[test]
fn invite_code_is_single_use() {
    let conn = open_db_in_memory().unwrap();
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);
    let auth = AuthService::new(store(&conn));

    let invite = invites.create_invite(&invite_request(Some(7), None)).unwrap();
    assert_eq!(invite.code.len(), 8);
    assert!(invites
        .validate_invite(&invite.code.to_ascii_lowercase())
        .is_ok());

    let registration = invites
        .register_with_invite(&invite.code, "sara@x.io", "secret1", "Sara")
        .unwrap();
    assert_eq!(registration.invite.used_by.as_deref(), Some(registration.user.id.as_str()));
    assert!(registration.joined_group.is_none());
    assert_eq!(auth.current_user().unwrap().unwrap().id, registration.user.id);

    let err = invites
        .register_with_invite(&invite.code, "omar@x.io", "secret1", "Omar")
        .unwrap_err();
    assert!(matches!(err, InviteError::Rejected(InviteRejection::AlreadyUsed)));
    assert_eq!(auth.list_users().unwrap().len(), 1);
}

#[test]
fn expired_deactivated_and_unknown_codes_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);

    let expired = invites.create_invite(&invite_request(Some(0), None)).unwrap();
    assert!(matches!(
        invites.validate_invite(&expired.code).unwrap_err(),
        InviteError::Rejected(InviteRejection::Expired)
    ));

    let deactivated = invites.create_invite(&invite_request(None, None)).unwrap();
    assert!(invites
        .deactivate_invite(&deactivated.code.to_ascii_lowercase())
        .unwrap());
    assert!(!invites.deactivate_invite("ZZZZ9999").unwrap());
    assert!(matches!(
        invites
            .register_with_invite(&deactivated.code, "x@y.io", "secret1", "X")
            .unwrap_err(),
        InviteError::Rejected(InviteRejection::Deactivated)
    ));

    let err = invites.validate_invite("NOPE0000").unwrap_err();
    assert!(matches!(err, InviteError::InvalidCode(_)));
    assert_eq!(err.to_string(), "Invalid invite code");
    assert_eq!(invites.list_invites().unwrap().len(), 2);
}

#[test]
fn group_scoped_invite_joins_group() {
    let conn = open_db_in_memory().unwrap();
    let groups = GroupService::with_seed_mode(store(&conn), SeedMode::Empty);
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);
    let group = groups
        .create_group(
            &NewGroup {
                name: "Cousins".to_string(),
                description: None,
                invites: Vec::new(),
            },
            "Layla",
        )
        .unwrap();

    let invite = invites
        .create_invite(&invite_request(None, Some(group.id.clone())))
        .unwrap();
    let registration = invites
        .register_with_invite(&invite.code, "sara@x.io", "secret1", "Sara")
        .unwrap();
    assert_eq!(registration.joined_group.as_deref(), Some(group.id.as_str()));

    let stored = groups.get_group(&group.id).unwrap().unwrap();
    assert_eq!(stored.members, 2);
    let member = &stored.member_list()[1];
    assert_eq!(member.contact, "sara@x.io");
    assert_eq!(member.status, MemberStatus::Active);
}

#[test]
fn failed_invite_registration_leaves_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);
    let auth = AuthService::new(store(&conn));
    let existing = auth.register("sara@x.io", "secret1", "Sara").unwrap();
    auth.logout().unwrap();

    let invite = invites.create_invite(&invite_request(None, None)).unwrap();
    let err = invites
        .register_with_invite(&invite.code, "SARA@x.io", "secret2", "Other Sara")
        .unwrap_err();
    assert!(matches!(err, InviteError::Auth(AuthError::EmailTaken)));

    let users = auth.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, existing.id);
    assert!(auth.current_user().unwrap().is_none());
    let stored = invites.get_invite_by_code(&invite.code).unwrap().unwrap();
    assert!(stored.used_by.is_none());
    assert!(stored.is_active);
}

#[test]
fn deleting_group_retires_its_invite_codes() {
    let conn = open_db_in_memory().unwrap();
    let groups = GroupService::with_seed_mode(store(&conn), SeedMode::Empty);
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);
    let auth = AuthService::new(store(&conn));
    let group = groups
        .create_group(
            &NewGroup {
                name: "Cousins".to_string(),
                description: None,
                invites: Vec::new(),
            },
            "Layla",
        )
        .unwrap();
    let scoped = invites
        .create_invite(&invite_request(None, Some(group.id.clone())))
        .unwrap();
    let open = invites.create_invite(&invite_request(None, None)).unwrap();

    let deletion = groups.delete_group(&group.id).unwrap();
    assert_eq!(deletion.invites_deactivated, 1);

    assert!(matches!(
        invites.validate_invite(&scoped.code).unwrap_err(),
        InviteError::Rejected(InviteRejection::Deactivated)
    ));
    assert!(matches!(
        invites
            .register_with_invite(&scoped.code, "sara@x.io", "secret1", "Sara")
            .unwrap_err(),
        InviteError::Rejected(InviteRejection::Deactivated)
    ));
    assert!(auth.list_users().unwrap().is_empty());

    assert!(invites.validate_invite(&open.code).is_ok());
}

#[test]
fn invite_for_vanished_group_registers_without_joining() {
    let conn = open_db_in_memory().unwrap();
    let invites = InviteService::with_seed_mode(store(&conn), SeedMode::Empty);
    let auth = AuthService::new(store(&conn));

    let invite = invites
        .create_invite(&invite_request(None, Some("missing-group".to_string())))
        .unwrap();
    assert!(invites.validate_invite(&invite.code).is_ok());

    let registration = invites
        .register_with_invite(&invite.code, "sara@x.io", "secret1", "Sara")
        .unwrap();
    assert!(registration.joined_group.is_none());
    assert_eq!(registration.invite.used_by.as_deref(), Some(registration.user.id.as_str()));
    assert_eq!(auth.current_user().unwrap().unwrap().id, registration.user.id);
}
