use super::{create_live_server, create_test_server, object};
use crate::{
    ComputeError, Credentials, DEFAULT_FLAVOR_ID, Flavor, Image, MockConnection,
    MockShellTransport, RebootType, Server, ValidationError,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_new_server_has_default_flavor() {
    let server = create_test_server(MockConnection::new(), MockShellTransport::new());
    assert_eq!(server.flavor_id(), Some(DEFAULT_FLAVOR_ID));
    assert_eq!(server.id(), None);
}

#[test]
fn test_from_attributes_preserves_supplied_flavor() {
    let server = Server::from_attributes(
        Arc::new(MockConnection::new()),
        Arc::new(MockShellTransport::new()),
        object(json!({"flavor_id": "custom-flavor", "hostname": "web-1"})),
    )
    .unwrap();

    assert_eq!(server.flavor_id(), Some("custom-flavor"));
    assert_eq!(server.hostname(), Some("web-1"));
}

#[test]
fn test_from_attributes_without_flavor_gets_default() {
    let server = Server::from_attributes(
        Arc::new(MockConnection::new()),
        Arc::new(MockShellTransport::new()),
        object(json!({"image_id": "img-1", "location": "seattle"})),
    )
    .unwrap();

    assert_eq!(server.flavor_id(), Some(DEFAULT_FLAVOR_ID));
    assert_eq!(server.image_id(), Some("img-1"));
    assert_eq!(server.attributes().extra["location"], "seattle");
}

#[test]
fn test_from_attributes_product_sets_flavor() {
    let server = Server::from_attributes(
        Arc::new(MockConnection::new()),
        Arc::new(MockShellTransport::new()),
        object(json!({"product": {"id": "product-7", "cost": "0.15"}})),
    )
    .unwrap();

    assert_eq!(server.flavor_id(), Some("product-7"));
    assert!(!server.attributes().extra.contains_key("product"));
}

#[test]
fn test_from_attributes_sets_credentials() {
    let server = Server::from_attributes(
        Arc::new(MockConnection::new()),
        Arc::new(MockShellTransport::new()),
        object(json!({"password": "secret", "username": "ops"})),
    )
    .unwrap();

    assert_eq!(server.password(), Some("secret"));
    assert_eq!(server.username(), "ops");
    assert!(server.attributes().extra.is_empty());
}

#[test]
fn test_is_ready_only_when_running() {
    let mut server = create_test_server(MockConnection::new(), MockShellTransport::new());
    assert!(!server.is_ready());

    for status in ["queued", "stopped", "Running", ""] {
        server.attributes_mut().status = Some(status.to_string());
        assert!(!server.is_ready(), "status {status:?} must not be ready");
    }

    server.attributes_mut().status = Some("running".to_string());
    assert!(server.is_ready());
}

#[test]
fn test_username_defaults_to_deploy() {
    let mut server = create_test_server(MockConnection::new(), MockShellTransport::new());
    assert_eq!(server.username(), "deploy");

    server.set_username("admin");
    assert_eq!(server.username(), "admin");
}

#[test]
#[allow(deprecated)]
fn test_user_alias_shares_username() {
    let mut server = create_test_server(MockConnection::new(), MockShellTransport::new());
    assert_eq!(server.user(), "deploy");

    server.set_user("legacy");
    assert_eq!(server.username(), "legacy");

    server.set_username("modern");
    assert_eq!(server.user(), "modern");
}

#[tokio::test]
async fn test_save_without_credentials_fails_before_network() {
    let mut server = create_test_server(MockConnection::new(), MockShellTransport::new());
    server.set_image_id("img-1");

    let result = server.save().await;
    assert!(matches!(
        result,
        Err(ComputeError::Validation {
            source: ValidationError::Argument(_),
            ..
        })
    ));
    assert_eq!(server.id(), None);
}

#[tokio::test]
async fn test_save_requires_image_id() {
    let mut server = create_test_server(MockConnection::new(), MockShellTransport::new());
    server.set_password("secret");

    let result = server.save().await;
    assert!(matches!(
        result,
        Err(ComputeError::Validation {
            source: ValidationError::Field { ref field, .. },
            ..
        }) if field == "image_id"
    ));
}

#[tokio::test]
async fn test_save_prefers_public_key_over_password() {
    let mut connection = MockConnection::new();
    connection
        .expect_create_block()
        .times(1)
        .withf(|flavor_id, image_id, options| {
            flavor_id == DEFAULT_FLAVOR_ID
                && image_id == "img-1"
                && options.ssh_public_key.as_deref() == Some("ssh-rsa AAAA")
                && options.password.is_none()
                && options.username == "deploy"
        })
        .returning(|_, _, _| {
            Ok(object(json!({
                "id": "b-42",
                "hostname": "b-42.bluebox.net",
                "status": "queued",
                "ips": [{"address": "10.0.0.42"}]
            })))
        });

    let mut server = create_test_server(connection, MockShellTransport::new());
    server.set_image_id("img-1");
    server.set_password("secret");
    server.set_public_key("ssh-rsa AAAA");
    server.attributes_mut().hostname = Some("local-name".to_string());

    server.save().await.unwrap();

    assert_eq!(server.id(), Some("b-42"));
    assert_eq!(server.hostname(), Some("b-42.bluebox.net"));
    assert_eq!(server.status(), Some("queued"));
    assert_eq!(server.ips()[0].address, "10.0.0.42");
    assert!(!server.is_ready());
}

#[tokio::test]
async fn test_save_with_password_sends_username() {
    let mut connection = MockConnection::new();
    connection
        .expect_create_block()
        .times(1)
        .withf(|_, _, options| {
            options.password.as_deref() == Some("secret")
                && options.ssh_public_key.is_none()
                && options.username == "ops"
        })
        .returning(|_, _, _| {
            Ok(object(json!({
                "id": "b-7",
                "product": {"id": "product-2"},
                "lb_applications": []
            })))
        });

    let mut server = create_test_server(connection, MockShellTransport::new());
    server.set_image_id("img-1");
    server.set_password("secret");
    server.set_username("ops");

    server.save().await.unwrap();

    assert_eq!(server.id(), Some("b-7"));
    assert_eq!(server.flavor_id(), Some("product-2"));
    assert_eq!(server.attributes().extra["lb_applications"], json!([]));
}

#[tokio::test]
async fn test_save_reads_configured_public_key() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("id_rsa.pub");
    std::fs::write(&key_path, "ssh-ed25519 CONFIGURED\n").unwrap();

    let mut connection = MockConnection::new();
    connection
        .expect_create_block()
        .times(1)
        .withf(|_, _, options| {
            options.ssh_public_key.as_deref() == Some("ssh-ed25519 CONFIGURED\n")
        })
        .returning(|_, _, _| Ok(object(json!({"id": "b-9"}))));

    let mut server = Server::new(Arc::new(connection), Arc::new(MockShellTransport::new()))
        .with_credentials(Credentials {
            private_key_path: None,
            public_key_path: Some(key_path),
        });
    server.set_image_id("img-1");

    server.save().await.unwrap();
    assert_eq!(server.id(), Some("b-9"));
}

#[tokio::test]
async fn test_save_propagates_provider_error() {
    let mut connection = MockConnection::new();
    connection
        .expect_create_block()
        .times(1)
        .returning(|_, _, _| Err(ComputeError::Connection("quota exceeded".to_string())));

    let mut server = create_test_server(connection, MockShellTransport::new());
    server.set_image_id("img-1");
    server.set_password("secret");

    let result = server.save().await;
    assert!(matches!(result, Err(ComputeError::Connection(ref msg)) if msg == "quota exceeded"));
    assert_eq!(server.id(), None);
}

#[tokio::test]
async fn test_save_with_malformed_response_leaves_attributes() {
    let mut connection = MockConnection::new();
    connection
        .expect_create_block()
        .times(1)
        .returning(|_, _, _| Ok(object(json!({"id": "b-1", "memory": "a lot"}))));

    let mut server = create_test_server(connection, MockShellTransport::new());
    server.set_image_id("img-1");
    server.set_password("secret");

    let result = server.save().await;
    assert!(matches!(result, Err(ComputeError::Serialization(_))));
    assert_eq!(server.id(), None);
}

#[tokio::test]
async fn test_destroy_requires_id() {
    let server = create_test_server(MockConnection::new(), MockShellTransport::new());
    let result = server.destroy().await;
    assert!(result.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_destroy_delegates_with_id() {
    let mut connection = MockConnection::new();
    connection
        .expect_destroy_block()
        .times(1)
        .withf(|id| id == "b-1")
        .returning(|_| Ok(()));

    let server = create_live_server(connection, MockShellTransport::new());
    server.destroy().await.unwrap();
    assert_eq!(server.id(), Some("b-1"));
}

#[tokio::test]
async fn test_reboot_requires_id() {
    let server = create_test_server(MockConnection::new(), MockShellTransport::new());
    let result = server.reboot(RebootType::default()).await;
    assert!(result.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_reboot_defaults_to_soft() {
    let mut connection = MockConnection::new();
    connection
        .expect_reboot_block()
        .times(1)
        .withf(|id, reboot_type| id == "b-1" && *reboot_type == RebootType::Soft)
        .returning(|_, _| Ok(()));
    connection
        .expect_reboot_block()
        .times(1)
        .withf(|_, reboot_type| *reboot_type == RebootType::Hard)
        .returning(|_, _| Ok(()));

    let server = create_live_server(connection, MockShellTransport::new());
    server.reboot(RebootType::default()).await.unwrap();
    server.reboot(RebootType::Hard).await.unwrap();
}

#[tokio::test]
async fn test_flavor_lookup() {
    let mut connection = MockConnection::new();
    connection
        .expect_get_flavor()
        .times(1)
        .withf(|id| id == DEFAULT_FLAVOR_ID)
        .returning(|id| {
            let mut flavor = Flavor::new(id);
            flavor.name = Some("1GB".to_string());
            Ok(Some(flavor))
        });

    let server = create_test_server(connection, MockShellTransport::new());
    let flavor = server.flavor().await.unwrap().unwrap();
    assert_eq!(flavor.id, DEFAULT_FLAVOR_ID);
    assert_eq!(flavor.name.as_deref(), Some("1GB"));
}

#[tokio::test]
async fn test_image_lookup_not_found() {
    let mut connection = MockConnection::new();
    connection
        .expect_get_image()
        .times(1)
        .withf(|id| id == "missing")
        .returning(|_| Ok(None));

    let mut server = create_test_server(connection, MockShellTransport::new());
    server.set_image_id("missing");
    assert_eq!(server.image().await.unwrap(), None);
}

#[tokio::test]
async fn test_image_lookup() {
    let mut connection = MockConnection::new();
    connection
        .expect_get_image()
        .times(1)
        .returning(|id| Ok(Some(Image::new(id))));

    let mut server = create_test_server(connection, MockShellTransport::new());
    assert!(server.image().await.unwrap_err().is_validation());

    server.set_image_id("img-1");
    assert_eq!(server.image().await.unwrap(), Some(Image::new("img-1")));
}
