//! Auth provider driven through a full session: registration, sign-in, route guards,
//! admin promotion and the admin user directory.
use lifeleveler::auth::{
    authorize, change_plan, load_directory, notice_channel, plan_counts, Access, AuthBackend,
    AuthError, AuthEvent, AuthProvider, LocalAuthBackend, Metadata, Role, Route, Sorting,
};
use lifeleveler::config::{Argon2Config, AuthConfig};

fn fast_backend() -> LocalAuthBackend {
    LocalAuthBackend::with_config(&AuthConfig {
        argon2: Some(Argon2Config {
            memory_kib: Some(1024),
            time_cost: Some(1),
            parallelism: Some(1),
        }),
        ..AuthConfig::default()
    })
}

fn named(username: &str) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("username".to_string(), username.to_string());
    meta
}

#[tokio::test]
async fn test_guards_follow_session_lifecycle() {
    let (tx, mut notices) = notice_channel();
    let provider = AuthProvider::new(fast_backend(), tx);

    // Before the session lookup finishes, protected pages wait
    let loading = provider.snapshot().await;
    assert_eq!(authorize(Route::Dashboard, &loading), Access::Pending);
    assert_eq!(authorize(Route::Landing, &loading), Access::Allow);

    provider.initialize().await;
    let anon = provider.snapshot().await;
    assert_eq!(authorize(Route::from_path("/quests"), &anon), Access::RedirectToAuth);
    assert_eq!(authorize(Route::Admin, &anon), Access::RedirectToAuth);

    provider
        .sign_up("player@example.com", "levelup!", named("player"))
        .await
        .unwrap();
    assert_eq!(notices.try_recv().unwrap().title, "Registration successful");

    provider.sign_in("player@example.com", "levelup!").await.unwrap();
    let signed_in = provider.snapshot().await;
    for route in [Route::Dashboard, Route::Quests, Route::Missions, Route::SideHustle, Route::Rewards] {
        assert_eq!(authorize(route, &signed_in), Access::Allow);
    }
    assert_eq!(authorize(Route::Admin, &signed_in), Access::RedirectToDashboard);

    provider.sign_out().await;
    let out = provider.snapshot().await;
    assert_eq!(authorize(Route::Rewards, &out), Access::RedirectToAuth);
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_admin_promotion_and_directory() {
    let backend = fast_backend();
    let admin = backend
        .sign_up("admin@example.com", "supersecret", named("admin"))
        .await
        .unwrap();
    backend
        .sign_up("zoe@example.com", "supersecret", named("zoe"))
        .await
        .unwrap();
    let beth = backend
        .sign_up("beth@example.com", "supersecret", named("beth"))
        .await
        .unwrap();
    backend.grant_role(admin.id, Role::Admin).await.unwrap();

    // Plan changes need a signed-in admin
    assert_eq!(
        backend.update_plan(beth.id, "pro").await,
        Err(AuthError::NotAuthenticated)
    );

    let (tx, mut notices) = notice_channel();
    let provider = AuthProvider::new(backend, tx.clone());
    let mut events = provider.subscribe();
    provider.initialize().await;

    provider.sign_in("admin@example.com", "supersecret").await.unwrap();
    let state = provider.snapshot().await;
    assert!(state.is_admin);
    assert_eq!(authorize(Route::Admin, &state), Access::Allow);

    let mut directory = load_directory(provider.backend(), &tx).await.unwrap();
    assert_eq!(directory.len(), 3);
    assert!(directory.iter().all(|u| u.email.is_some()));

    change_plan(provider.backend(), &tx, &mut directory, beth.id, "pro")
        .await
        .unwrap();
    assert_eq!(notices.try_recv().unwrap().title, "Plan updated");

    let counts = plan_counts(&directory);
    assert_eq!(counts.get("pro"), Some(&1));
    assert_eq!(counts.get("free"), Some(&2));

    let hits = lifeleveler::auth::filter_and_sort(&directory, "EXAMPLE.COM", Sorting::default());
    assert_eq!(hits.len(), 3);
    let pro = lifeleveler::auth::filter_and_sort(&directory, "pro", Sorting::default());
    assert_eq!(pro.len(), 1);
    assert_eq!(pro[0].profile.username, "beth");

    // The backend's own event stream replays the same sign-in
    assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));
}

#[tokio::test]
async fn test_regular_user_cannot_change_plans() {
    let backend = fast_backend();
    let victim = backend
        .sign_up("victim@example.com", "supersecret", named("victim"))
        .await
        .unwrap();
    backend
        .sign_up("pleb@example.com", "supersecret", named("pleb"))
        .await
        .unwrap();

    let (tx, mut notices) = notice_channel();
    let provider = AuthProvider::new(backend, tx.clone());
    provider.initialize().await;
    provider.sign_in("pleb@example.com", "supersecret").await.unwrap();
    assert_eq!(authorize(Route::Admin, &provider.snapshot().await), Access::RedirectToDashboard);

    assert_eq!(
        provider.backend().list_users().await,
        Err(AuthError::Backend("User not allowed".to_string()))
    );
    let mut directory = load_directory(provider.backend(), &tx).await.unwrap();
    let refused = change_plan(provider.backend(), &tx, &mut directory, victim.id, "pro").await;
    assert_eq!(refused, Err(AuthError::Backend("User not allowed".to_string())));
    assert_eq!(notices.try_recv().unwrap().title, "Error updating plan");

    let profile = provider.backend().fetch_profile(victim.id).await.unwrap();
    assert_eq!(profile.plan, "free");
}

#[tokio::test]
async fn test_bad_credentials_surface_as_notice() {
    let (tx, mut notices) = notice_channel();
    let provider = AuthProvider::new(fast_backend(), tx);
    provider.initialize().await;

    assert!(provider.sign_in("nobody@example.com", "whatever").await.is_err());
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.title, "Login failed");

    assert!(provider.sign_up("bad-email", "whatever", Metadata::new()).await.is_err());
    assert_eq!(notices.try_recv().unwrap().title, "Registration failed");

    let state = provider.snapshot().await;
    assert!(!state.is_signed_in());
    assert!(provider.get_profile().await.is_none());
}
