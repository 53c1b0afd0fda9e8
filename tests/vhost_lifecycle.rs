mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{fqdn, RecordingWebServer, TestEngine};
use vhost_engine::domain::{
    HttpStatus, Mapping, MappingPath, MappingTarget, MatchPattern, ServiceName, VhostKind,
    VirtualHost,
};

fn primary(host: &str) -> VirtualHost {
    VirtualHost::primary(fqdn(host))
}

fn alias(host: &str, parent: &str) -> VirtualHost {
    VirtualHost::alias(fqdn(host), fqdn(parent)).unwrap()
}

fn status_mapping(host: &str, path: &str, code: u16) -> Mapping {
    Mapping::new(
        fqdn(host),
        MappingPath::new(path).unwrap(),
        MatchPattern::Equals,
        MappingTarget::ResponseCode(HttpStatus::new(code).unwrap()),
    )
}

fn service_mapping(host: &str, path: &str, service: &str) -> Mapping {
    Mapping::new(
        fqdn(host),
        MappingPath::new(path).unwrap(),
        MatchPattern::BeginsWith,
        MappingTarget::Service(ServiceName::new(service).unwrap()),
    )
}

#[tokio::test]
async fn test_add_primary_creates_artifacts_and_reloads_once() {
    let engine = TestEngine::new();
    let host = fqdn("shop.example.com");

    engine.manager.add(&primary("shop.example.com")).await.unwrap();

    for path in engine.layout.owned_artifacts(&host) {
        assert!(path.exists(), "missing {}", path.display());
    }
    assert!(engine.layout.public_dir(&host).is_dir());
    assert_eq!(engine.read(&engine.layout.mapping_path(&host)), "");

    let conf = engine.read(&engine.layout.server_block_path(&host));
    assert!(conf.contains("    server_name shop.example.com www.shop.example.com;\n"));
    assert!(conf.contains(&format!(
        "    include {};\n",
        engine.layout.mapping_path(&host).display()
    )));

    assert_eq!(engine.web.calls(), ["validate", "apply"]);

    let chowns: Vec<_> = engine
        .runner
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("chown -R nobody:nogroup"))
        .collect();
    assert_eq!(chowns.len(), 3);
}

#[tokio::test]
async fn test_add_mapping_appends_and_preserves_prior_blocks() {
    let engine = TestEngine::new();
    let host = fqdn("shop.example.com");
    engine.manager.add(&primary("shop.example.com")).await.unwrap();

    engine
        .manager
        .add_mapping(&status_mapping("shop.example.com", "/status", 200))
        .await
        .unwrap();
    engine
        .manager
        .add_mapping(&service_mapping("shop.example.com", "/app", "node"))
        .await
        .unwrap();

    assert_eq!(
        engine.read(&engine.layout.mapping_path(&host)),
        "location = /status {\n    return 200;\n}\n\
         location /app {\n    proxy_pass http://localhost:3000;\n}\n"
    );
    assert_eq!(engine.web.calls().len(), 6);
}

#[tokio::test]
async fn test_alias_round_trip_is_byte_identical() {
    let engine = TestEngine::new();
    let conf_path = engine.layout.server_block_path(&fqdn("shop.example.com"));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    let before = std::fs::read(&conf_path).unwrap();

    engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap();
    assert!(engine
        .read(&conf_path)
        .contains("server_name shop.example.com www.shop.example.com a.example.com www.a.example.com;"));

    engine
        .manager
        .delete(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&conf_path).unwrap(), before);
}

#[tokio::test]
async fn test_alias_mapping_lands_in_parent_artifact() {
    let engine = TestEngine::new();
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap();

    engine
        .manager
        .add_mapping(&status_mapping("a.example.com", "/ping", 204))
        .await
        .unwrap();

    assert_eq!(
        engine.read(&engine.layout.mapping_path(&fqdn("shop.example.com"))),
        "location = /ping {\n    return 204;\n}\n"
    );
}

#[tokio::test]
async fn test_unknown_service_writes_nothing() {
    let engine = TestEngine::new();
    let mapping_path = engine.layout.mapping_path(&fqdn("shop.example.com"));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine
        .manager
        .add_mapping(&status_mapping("shop.example.com", "/status", 200))
        .await
        .unwrap();
    let before = std::fs::read(&mapping_path).unwrap();
    let reloads = engine.web.calls().len();

    let err = engine
        .manager
        .add_mapping(&service_mapping("shop.example.com", "/app", "ghost"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "service-not-found");
    assert_eq!(std::fs::read(&mapping_path).unwrap(), before);
    assert_eq!(engine.web.calls().len(), reloads);
}

#[tokio::test]
async fn test_rejected_config_is_restored_and_never_applied() {
    let engine = TestEngine::new();
    let conf_path = engine.layout.server_block_path(&fqdn("shop.example.com"));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    let before = std::fs::read(&conf_path).unwrap();

    engine.web.reject_validation(true);
    let err = engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "config-validation-failed");
    assert_eq!(engine.web.calls(), ["validate", "apply", "validate"]);
    assert_eq!(std::fs::read(&conf_path).unwrap(), before);
}

#[tokio::test]
async fn test_rejected_mapping_is_restored() {
    let engine = TestEngine::new();
    let mapping_path = engine.layout.mapping_path(&fqdn("shop.example.com"));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();

    engine.web.reject_validation(true);
    let err = engine
        .manager
        .add_mapping(&status_mapping("shop.example.com", "/status", 200))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "config-validation-failed");
    assert_eq!(engine.read(&mapping_path), "");
}

#[tokio::test]
async fn test_delete_primary_removes_exactly_its_artifacts() {
    let engine = TestEngine::new();
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine.manager.add(&primary("blog.example.com")).await.unwrap();

    engine.manager.delete(&primary("shop.example.com")).await.unwrap();

    for path in engine.layout.owned_artifacts(&fqdn("shop.example.com")) {
        assert!(!path.exists(), "left behind {}", path.display());
    }
    for path in engine.layout.owned_artifacts(&fqdn("blog.example.com")) {
        assert!(path.exists(), "removed {}", path.display());
    }
    assert!(engine.config.paths.nginx_conf_dir.is_dir());
    assert!(engine.config.paths.pki_dir.is_dir());
    assert_eq!(engine.web.calls().len(), 6);
}

#[tokio::test]
async fn test_duplicate_primary_is_rejected_before_mutation() {
    let engine = TestEngine::new();
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    let runs = engine.runner.calls().len();

    let err = engine.manager.add(&primary("shop.example.com")).await.unwrap_err();

    assert_eq!(err.code(), "vhost-already-exists");
    assert_eq!(engine.runner.calls().len(), runs);
    assert_eq!(engine.web.calls().len(), 2);
}

#[tokio::test]
async fn test_duplicate_alias_is_rejected() {
    let engine = TestEngine::new();
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap();

    let err = engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "alias-already-exists");
}

#[tokio::test]
async fn test_alias_of_designated_primary_uses_shared_artifact() {
    let engine = TestEngine::with_primary_domain();
    engine.seed_shared_primary();

    engine
        .manager
        .add(&alias("b.example.com", "panel.example.com"))
        .await
        .unwrap();

    assert_eq!(
        engine.read(&engine.layout.shared_primary_path()),
        "server {\n    listen 80;\n    server_name panel.example.com www.panel.example.com b.example.com www.b.example.com;\n}\n"
    );

    let vhosts = engine.manager.list().await.unwrap();
    assert!(vhosts
        .iter()
        .any(|v| v.hostname().as_str() == "b.example.com" && v.kind() == VhostKind::Alias));
}

#[tokio::test]
async fn test_designated_primary_cannot_be_deleted() {
    let engine = TestEngine::with_primary_domain();
    engine.seed_shared_primary();

    let err = engine.manager.delete(&primary("panel.example.com")).await.unwrap_err();

    assert_eq!(err.code(), "primary-domain-protected");
    assert!(engine.layout.shared_primary_path().exists());
    assert!(engine.web.calls().is_empty());
}

#[tokio::test]
async fn test_alias_without_parent_artifact_fails() {
    let engine = TestEngine::new();

    let err = engine
        .manager
        .add(&alias("a.example.com", "missing.example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "alias-config-not-found");
    assert!(engine.web.calls().is_empty());
}

#[tokio::test]
async fn test_deleting_unlisted_alias_is_a_no_op() {
    let engine = TestEngine::new();
    engine.manager.add(&primary("shop.example.com")).await.unwrap();

    engine
        .manager
        .delete(&alias("ghost.example.com", "shop.example.com"))
        .await
        .unwrap();

    assert_eq!(engine.web.calls(), ["validate", "apply"]);
}

#[tokio::test]
async fn test_mapping_for_unknown_host_fails() {
    let engine = TestEngine::new();

    let err = engine
        .manager
        .add_mapping(&status_mapping("nowhere.example.com", "/", 200))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "mapping-path-resolution-failed");
}

#[tokio::test]
async fn test_concurrent_mappings_serialize() {
    let engine = TestEngine::with_web_server(RecordingWebServer::with_delay(Duration::from_millis(5)));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let manager = engine.manager.clone();
            tokio::spawn(async move {
                manager
                    .add_mapping(&status_mapping("shop.example.com", &format!("/p{i}"), 200))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let text = engine.read(&engine.layout.mapping_path(&fqdn("shop.example.com")));
    assert_eq!(text.matches("location = /p").count(), 8);
    for i in 0..8 {
        assert!(text.contains(&format!("location = /p{i} {{\n    return 200;\n}}\n")));
    }
    assert_eq!(engine.web.max_in_flight(), 1);
    assert_eq!(engine.web.calls().len(), 18);
}

#[tokio::test]
async fn test_broken_edit_does_not_reject_concurrent_valid_edit() {
    let dir = tempfile::tempdir().unwrap();
    let shop_mapping = TestEngine::paths(dir.path())
        .mapping_dir
        .join("shop.example.com.conf");
    let judged = shop_mapping.clone();
    let web = RecordingWebServer::rejecting_when(Duration::from_millis(5), move || {
        std::fs::read_to_string(&judged).is_ok_and(|text| text.contains("/bad"))
    });
    let engine = TestEngine::in_dir(dir, web);
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine.manager.add(&primary("blog.example.com")).await.unwrap();

    for round in 0..5 {
        let bad = {
            let manager = engine.manager.clone();
            tokio::spawn(async move {
                manager
                    .add_mapping(&status_mapping("shop.example.com", &format!("/bad{round}"), 200))
                    .await
            })
        };
        let ok = {
            let manager = engine.manager.clone();
            tokio::spawn(async move {
                manager
                    .add_mapping(&status_mapping("blog.example.com", &format!("/ok{round}"), 200))
                    .await
            })
        };

        let bad = bad.await.unwrap().unwrap_err();
        assert_eq!(bad.code(), "config-validation-failed");
        ok.await.unwrap().unwrap();
    }

    assert_eq!(engine.read(&shop_mapping), "");
    let blog = engine.read(&engine.layout.mapping_path(&fqdn("blog.example.com")));
    assert_eq!(blog.matches("location = /ok").count(), 5);
    assert_eq!(engine.web.max_in_flight(), 1);
}

#[tokio::test]
async fn test_rejected_alias_delete_is_restored_and_never_applied() {
    let engine = TestEngine::new();
    let conf_path = engine.layout.server_block_path(&fqdn("shop.example.com"));
    engine.manager.add(&primary("shop.example.com")).await.unwrap();
    engine
        .manager
        .add(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap();
    let before = std::fs::read(&conf_path).unwrap();

    engine.web.reject_validation(true);
    let err = engine
        .manager
        .delete(&alias("a.example.com", "shop.example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "config-validation-failed");
    assert_eq!(std::fs::read(&conf_path).unwrap(), before);
    assert_eq!(
        engine.web.calls(),
        ["validate", "apply", "validate", "apply", "validate"]
    );
}

#[tokio::test]
async fn test_failed_certificate_keeps_earlier_artifacts() {
    let engine = TestEngine::with_failing_certificates();
    let host = fqdn("shop.example.com");

    let err = engine.manager.add(&primary("shop.example.com")).await.unwrap_err();

    assert_eq!(err.code(), "certificate-generation-failed");
    assert!(engine.layout.server_block_path(&host).is_file());
    assert!(engine.layout.mapping_path(&host).is_file());
    assert!(engine.layout.public_dir(&host).is_dir());

    let certificate = engine.layout.certificate(&host);
    assert!(!certificate.certificate_path.exists());
    assert!(!certificate.key_path.exists());

    assert!(engine.runner.calls().iter().all(|c| !c.starts_with("chown")));
    assert!(engine.web.calls().is_empty());
}
