// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
// self
use credential_cache::{
	cache::AsyncTokenCache,
	config::AuthTokenSettings,
	error::FetchError,
	ext::AsyncBearerTokenProvider,
	store::TokenStore,
	url::Url,
};

fn build_settings(server: &MockServer) -> AuthTokenSettings {
	AuthTokenSettings::builder(
		Url::parse(&server.url("/oauth/token")).expect("Mock token endpoint should parse."),
	)
	.credentials("asyncUser", "asyncPass")
	.app_name("asyncApp")
	.secret_name("asyncSecret")
	.redirect_url("https://myapp.example.com/callback")
	.vault_config_path("/vault/async")
	.build()
	.expect("Mock settings should validate.")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_share_one_http_fetch() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.delay(StdDuration::from_millis(100))
				.header("content-type", "application/json")
				.body("{\"access_token\":\"async-token\"}");
		})
		.await;
	let cache = Arc::new(
		AsyncTokenCache::from_settings(Arc::new(TokenStore::new()), &build_settings(&server))
			.expect("Async HTTP cache should build."),
	);
	let handles = (0..10)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.bearer_token().await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let token = handle
			.await
			.expect("Caller task should not panic.")
			.expect("Every caller should receive a token.");

		assert_eq!(token.expose(), "async-token");
	}

	mock.assert_calls_async(1).await;

	assert_eq!(cache.metrics().fetch_successes(), 1);
}

#[tokio::test]
async fn failed_refresh_is_retried_by_next_caller() {
	let server = MockServer::start_async().await;
	let mut failing = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500).body("boom");
		})
		.await;
	let store = Arc::new(TokenStore::new());
	let cache = AsyncTokenCache::from_settings(store.clone(), &build_settings(&server))
		.expect("Async HTTP cache should build.");
	let err = cache.get_token().await.expect_err("500 responses must fail the lookup.");

	assert!(matches!(err, FetchError::Status { status: 500, .. }), "Unexpected error: {err:?}.");
	assert!(store.current().is_empty());

	failing.assert_calls_async(1).await;
	failing.delete_async().await;

	let recovered = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"recovered\"}");
		})
		.await;
	let token = cache.get_token().await.expect("Recovered endpoint should issue a token.");

	assert_eq!(token.expose(), "recovered");
	assert!(!store.current().is_empty());

	recovered.assert_calls_async(1).await;
}

#[tokio::test]
async fn cleared_cache_fetches_again() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh\"}");
		})
		.await;
	let cache =
		AsyncTokenCache::from_settings(Arc::new(TokenStore::new()), &build_settings(&server))
			.expect("Async HTTP cache should build.");

	cache.get_token().await.expect("Initial lookup should fetch.");
	cache.get_token().await.expect("Second lookup should hit the cache.");
	cache.clear();
	cache.get_token().await.expect("Lookup after clear should fetch again.");

	mock.assert_calls_async(2).await;
}
