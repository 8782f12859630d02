//! Integration test: identity lifecycle.
//!
//! 1. An anonymous visitor builds a list and reserves a friend's wish
//! 2. They claim an email that already belongs to a verified account
//! 3. Resolving the challenge merges the visitor into that account
//! 4. The merged account keeps the list, the follows and valid reservations

use souhaits_integration_tests::{challenge_token, Harness};
use souhaits_types::IdentityState;

#[test]
fn anonymous_to_verified_scenario() {
    let h = Harness::new();
    let (anon, session) = h.service.create_anonymous_session().expect("session");
    assert_eq!(
        h.service.identity_state(&anon).expect("state"),
        IdentityState::Anonymous
    );

    h.service
        .issue_challenge(&anon, "Pierre@Example.org")
        .expect("challenge");
    assert_eq!(
        h.service.identity_state(&anon).expect("state"),
        IdentityState::Pending {
            email: "pierre@example.org".into()
        }
    );

    let token = challenge_token(&h.last_mail_to("pierre@example.org"));
    let verified = h
        .service
        .resolve_challenge(&token, Some(session.as_str()))
        .expect("resolve");
    assert_eq!(verified.id, anon.id);
    assert_eq!(
        h.service.user_by_email("pierre@example.org").expect("lookup"),
        Some(verified.clone())
    );
    assert_eq!(h.service.lookup_session(&session).expect("session"), verified);
}

#[test]
fn merge_moves_data_and_drops_self_reservations() {
    let h = Harness::new();
    let (victor, _) = h.sign_up("victor@test.com");
    let victor_list = h
        .service
        .create_wishlist(&victor, "Victor's birthday", None)
        .expect("list");
    let watch = h
        .service
        .add_item(&victor_list, "Watch", "", "")
        .expect("item");

    let (olga, _) = h.sign_up("olga@test.com");
    let olga_list = h.service.create_wishlist(&olga, "Olga", None).expect("list");
    let scarf = h.service.add_item(&olga_list, "Scarf", "", "").expect("item");

    // Victor, logged out on another device, acts anonymously.
    let (pending, session) = h.service.create_anonymous_session().expect("session");
    let pending_list = h
        .service
        .create_wishlist(&pending, "Christmas", None)
        .expect("list");
    assert!(h.service.reserve(&pending, &watch).expect("reserve own wish unknowingly"));
    assert!(h.service.reserve(&pending, &scarf).expect("reserve"));
    h.service.follow(&pending, &olga_list).expect("follow");
    h.service.follow(&pending, &victor_list).expect("follow");

    h.service
        .issue_challenge(&pending, "victor@test.com")
        .expect("challenge");
    let token = challenge_token(&h.last_mail_to("victor@test.com"));
    let resolved = h
        .service
        .resolve_challenge(&token, Some(session.as_str()))
        .expect("resolve");

    assert_eq!(resolved, victor);
    assert!(h.service.user_by_id(pending.id).expect("lookup").is_none());
    assert_eq!(h.service.lookup_session(&session).expect("session"), victor);

    let owned: Vec<_> = h
        .service
        .wishlists_owned_by(&victor)
        .expect("owned")
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert!(owned.contains(&victor_list.id) && owned.contains(&pending_list.id));

    // The reservation on Victor's own wish is gone; the other one moved.
    assert!(!h.service.is_reserved(&watch).expect("reserved"));
    let held = h.service.list_reservations(&olga_list).expect("held");
    assert_eq!(held.get(&scarf.id).map(|h| h.id), Some(victor.id));

    let followed: Vec<_> = h
        .service
        .followed_lists(&victor)
        .expect("followed")
        .into_iter()
        .map(|f| f.list.id)
        .collect();
    assert!(followed.contains(&olga_list.id));
    assert!(!followed.contains(&victor_list.id));
}

#[test]
fn login_link_is_reusable_and_reminded() {
    let h = Harness::new();
    let (anna, first_session) = h.sign_up("anna@test.com");
    let token = challenge_token(&h.last_mail_to("anna@test.com"));

    let (_, second_session) = h.service.create_anonymous_session().expect("session");
    let again = h
        .service
        .resolve_challenge(&token, Some(second_session.as_str()))
        .expect("reuse link");
    assert_eq!(again, anna);
    assert_eq!(h.service.lookup_session(&first_session).expect("session"), anna);
    assert_eq!(h.service.lookup_session(&second_session).expect("session"), anna);

    let reminder = h.service.login_reminder(&anna).expect("reminder");
    assert_eq!(
        reminder.as_deref(),
        Some(format!("http://localhost:7707/challenge/{token}").as_str())
    );

    assert!(h.service.destroy_session(&second_session).expect("logout"));
    assert!(h.service.lookup_session(&second_session).is_err());
}

#[test]
fn invitation_folds_into_existing_account() {
    let h = Harness::new();
    let (anna, _) = h.sign_up("anna@test.com");
    let (ben, ben_session) = h.sign_up("ben@test.com");
    let list = h.service.create_wishlist(&anna, "Noël", None).expect("list");

    h.service
        .invite_friend("Anna", &anna, std::slice::from_ref(&list), "ben@test.com", "Coucou")
        .expect("invite");
    let mail = h.last_mail_to("ben@test.com");
    assert_eq!(mail.reply_to.as_deref(), Some("anna@test.com"));
    assert!(mail.body.contains("Coucou"));

    let resolved = h
        .service
        .resolve_challenge(&challenge_token(&mail), Some(ben_session.as_str()))
        .expect("resolve");
    assert_eq!(resolved, ben);
    let followed = h.service.followed_lists(&ben).expect("followed");
    assert_eq!(followed.len(), 1);
    assert_eq!(followed[0].list.id, list.id);
}
