use warbler_db::{Constraint, Database, NewUser, Table};

use crate::{AuthError, CredentialManager, HashingConfig};

fn setup() -> (Database, CredentialManager) {
    let db = Database::open_in_memory().unwrap();

    // Start every case from empty tables
    db.transaction(|s| {
        s.delete_all(Table::Users)?;
        s.delete_all(Table::Messages)?;
        s.delete_all(Table::Follows)
    })
    .unwrap();

    let manager = CredentialManager::new(HashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();

    (db, manager)
}

#[test]
fn signup_hashes_the_password() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    let u = manager
        .signup(
            &mut session,
            Some("test@test.com"),
            Some("testuser"),
            "HASHED_PASSWORD",
            None,
        )
        .unwrap();
    session.commit().unwrap();

    assert_eq!(u.username.as_deref(), Some("testuser"));
    assert_eq!(u.image_url, "/static/images/default-pic.png");
    assert_ne!(u.password, "HASHED_PASSWORD");

    let stored = session.user_by_username("testuser").unwrap().unwrap();
    assert_eq!(stored.password, u.password);
    assert_ne!(stored.password, "HASHED_PASSWORD");
    assert_eq!(stored.header_image_url, "/static/images/warbler-hero.jpg");
    assert!(session.messages_for(stored.id).unwrap().is_empty());
    assert!(session.followers_of(stored.id).unwrap().is_empty());
}

#[test]
fn signup_keeps_a_supplied_image_url() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, Some("a@test.com"), Some("a"), "pw", Some("/me.png"))
        .unwrap();
    session.commit().unwrap();

    let stored = session.user_by_username("a").unwrap().unwrap();
    assert_eq!(stored.image_url, "/me.png");
}

#[test]
fn direct_construction_does_not_hash() {
    let (db, _manager) = setup();
    let mut session = db.session().unwrap();

    session
        .add_user(NewUser::new("test@test.com", "testuser", "UNHASHED_PASSWORD"))
        .unwrap();
    session.commit().unwrap();

    let stored = session.user_by_username("testuser").unwrap().unwrap();
    assert_eq!(stored.password, "UNHASHED_PASSWORD");
}

#[test]
fn signup_duplicate_email_fails_at_commit() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, Some("test@test.com"), Some("testuser"), "pw", None)
        .unwrap();
    session.commit().unwrap();

    // Staging the duplicate succeeds
    manager
        .signup(&mut session, Some("test@test.com"), Some("testuser2"), "pw", None)
        .unwrap();
    let err = session.commit().unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::Unique));

    session.rollback().unwrap();
    let users = session.users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "testuser");
}

#[test]
fn signup_duplicate_username_fails_at_commit() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, Some("test@test.com"), Some("testuser"), "pw", None)
        .unwrap();
    session.commit().unwrap();

    manager
        .signup(&mut session, Some("test2@test.com"), Some("testuser"), "pw", None)
        .unwrap();
    let err = session.commit().unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::Unique));
}

#[test]
fn signup_without_email_or_username_fails_at_commit() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, None, Some("testuser"), "pw", None)
        .unwrap();
    let err = session.commit().unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::NotNull));
    session.rollback().unwrap();

    manager
        .signup(&mut session, Some("test@test.com"), None, "pw", None)
        .unwrap();
    let err = session.commit().unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::NotNull));
    session.rollback().unwrap();
}

#[test]
fn signup_on_poisoned_session_is_rejected() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, None, Some("testuser"), "pw", None)
        .unwrap();
    assert!(session.commit().is_err());

    let result = manager.signup(&mut session, Some("a@b.c"), Some("a"), "pw", None);
    assert!(matches!(result, Err(AuthError::Db(_))));
}

#[test]
fn authenticate() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    let u = manager
        .signup(
            &mut session,
            Some("test@test.com"),
            Some("testuser"),
            "HASHED_PASSWORD",
            None,
        )
        .unwrap();
    session.commit().unwrap();

    let wrong = manager
        .authenticate(&mut session, "testuser", "hash_it_up")
        .unwrap();
    assert!(wrong.is_none());

    let ok = manager
        .authenticate(&mut session, "testuser", "HASHED_PASSWORD")
        .unwrap()
        .unwrap();
    assert_ne!(ok.password, "HASHED_PASSWORD");
    assert_eq!(ok.password, u.password);

    // Stable across repeated logins
    let again = manager
        .authenticate(&mut session, "testuser", "HASHED_PASSWORD")
        .unwrap()
        .unwrap();
    assert_eq!(again, ok);
}

#[test]
fn unknown_user_looks_like_wrong_password() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, Some("test@test.com"), Some("testuser"), "pw", None)
        .unwrap();
    session.commit().unwrap();

    let unknown = manager
        .authenticate(&mut session, "nobody", "pw")
        .unwrap();
    let wrong = manager
        .authenticate(&mut session, "testuser", "nope")
        .unwrap();
    assert_eq!(unknown, wrong);
    assert_eq!(unknown, None);
}

#[test]
fn unhashed_user_cannot_log_in() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    session
        .add_user(NewUser::new("test@test.com", "testuser", "UNHASHED_PASSWORD"))
        .unwrap();
    session.commit().unwrap();

    let result = manager
        .authenticate(&mut session, "testuser", "UNHASHED_PASSWORD")
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn authenticate_on_poisoned_session_is_an_error() {
    let (db, manager) = setup();
    let mut session = db.session().unwrap();

    manager
        .signup(&mut session, None, None, "pw", None)
        .unwrap();
    assert!(session.flush().is_err());

    let result = manager.authenticate(&mut session, "testuser", "pw");
    assert!(matches!(result, Err(AuthError::Db(_))));
}
