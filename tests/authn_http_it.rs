#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use conjur_authn::{
	client::{Client, ReqwestAuthnClient, kind},
	config::ClientConfig,
	credential::{ConstantJwtProvider, JwtCredential},
	error::{Error, ProtocolError},
	id::{HostId, Login, ServiceId},
};

const ACCOUNT: &str = "acme";
const AUTHORIZATION: &str = "Token token=\"dG9rZW4x\"";

fn build_config(server: &MockServer) -> ClientConfig {
	ClientConfig::builder(server.base_url(), ACCOUNT)
		.build()
		.expect("Client config should build against the mock server.")
}

fn login() -> Login {
	Login::new("admin").expect("Login fixture should be valid.")
}

fn jwt_client(server: &MockServer, host_id: Option<&str>) -> ReqwestAuthnClient {
	let service_id = ServiceId::new("sid").expect("Service identifier should be valid.");
	let credential = JwtCredential::new(ConstantJwtProvider::new("this is a nice provider"), service_id);
	let credential = match host_id {
		Some(host_id) =>
			credential.with_host_id(HostId::new(host_id).expect("Host identifier should be valid.")),
		None => credential,
	};

	Client::new(build_config(server), Arc::new(credential)).expect("JWT client should build.")
}

#[tokio::test]
async fn api_key_posts_raw_key_and_caches() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/authn/acme/admin/authenticate").body("api-key");
			then.status(200).body("token1");
		})
		.await;
	let client = Client::with_api_key(build_config(&server), login(), "api-key")?;
	let first = client.authenticator().token().await?;
	let second = client.authenticator().token().await?;

	assert_eq!(first.expose(), "token1");
	assert_eq!(second.expose(), "token1");

	mock.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn jwt_posts_form_encoded_assertion() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/authn-jwt/sid/acme/authenticate")
				.header("content-type", "application/x-www-form-urlencoded")
				.body("jwt=this+is+a+nice+provider");
			then.status(200).body("token1");
		})
		.await;
	let client = jwt_client(&server, None);
	let token = client.authenticator().token().await.expect("JWT authentication should succeed.");

	assert_eq!(token.expose(), "token1");

	mock.assert_async().await;
}

#[tokio::test]
async fn jwt_with_host_id_targets_identity_route() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/authn-jwt/sid/acme/hid/authenticate")
				.body("jwt=this+is+a+nice+provider");
			then.status(200).body("token1");
		})
		.await;
	let client = jwt_client(&server, Some("hid"));
	let token = client.authenticator().token().await.expect("JWT authentication should succeed.");

	assert_eq!(token.expose(), "token1");

	mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_maps_to_rejection() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/authn/acme/admin/authenticate");
			then.status(401);
		})
		.await;
	let client = Client::with_api_key(build_config(&server), login(), "wrong")
		.expect("Client should build.");
	let err = client.authenticator().token().await.expect_err("401 should surface as an error.");

	assert!(matches!(err, Error::AuthenticationRejected { status: 401 }));
	assert!(client.authenticator().status().await.token.is_none());

	mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_map_to_protocol_errors() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/authn/acme/admin/authenticate");
			then.status(503).body("maintenance");
		})
		.await;
	let client =
		Client::with_api_key(build_config(&server), login(), "api-key").expect("Client should build.");
	let err = client.authenticator().token().await.expect_err("503 should surface as an error.");

	assert!(matches!(err, Error::Protocol(ProtocolError::UnexpectedStatus { status: 503 })));
	assert_eq!(err.kind(), "protocol");
}

#[test]
fn blocking_fetch_and_permission_check() {
	let server = MockServer::start();
	let authn = server.mock(|when, then| {
		when.method(POST).path("/authn/acme/admin/authenticate").body("api-key");
		then.status(200).body("token1");
	});
	let allowed = server.mock(|when, then| {
		when.method(GET)
			.path("/resources/acme/variable/db-password/")
			.query_param("check", "true")
			.query_param("privilege", "execute")
			.header("authorization", AUTHORIZATION);
		then.status(204);
	});
	let denied = server.mock(|when, then| {
		when.method(GET)
			.path("/resources/acme/variable/db-password/")
			.query_param("check", "true")
			.query_param("privilege", "update")
			.header("authorization", AUTHORIZATION);
		then.status(403);
	});
	let client =
		Client::with_api_key(build_config(&server), login(), "api-key").expect("Client should build.");
	let resource = client.resource(kind::VARIABLE, "db-password");

	assert_eq!(resource.id(), "acme:variable:db-password");
	assert!(resource.check_blocking("execute").expect("Permitted check should succeed."));
	assert!(!resource.check_blocking("update").expect("Denied check should succeed."));

	authn.assert_calls(1);
	allowed.assert();
	denied.assert();
}

#[tokio::test]
async fn async_permission_check_reuses_token() {
	let server = MockServer::start_async().await;
	let authn = server
		.mock_async(|when, then| {
			when.method(POST).path("/authn/acme/admin/authenticate");
			then.status(200).body("token1");
		})
		.await;
	let check = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/resources/acme/host/app/")
				.query_param("privilege", "read")
				.header("authorization", AUTHORIZATION);
			then.status(200);
		})
		.await;
	let client =
		Client::with_api_key(build_config(&server), login(), "api-key").expect("Client should build.");
	let resource = client.resource(kind::HOST, "app");

	for _ in 0..3 {
		assert!(resource.check("read").await.expect("Permission check should succeed."));
	}

	authn.assert_calls_async(1).await;
	check.assert_calls_async(3).await;
}
