use request_session::{
    create_session_driver, DriverKind, RequestMeta, SessionConfig, SessionError, SessionValue,
};
use std::collections::HashMap;

#[test]
fn factory_returns_memory_driver() {
    let driver = create_session_driver(&SessionConfig::default())
        .expect("factory should build memory driver");
    let req = RequestMeta::new("10.0.0.5");

    driver
        .set(&req, "username", "pep".into())
        .expect("set succeeds");
    assert_eq!(
        driver.get(&req, "username").expect("get succeeds"),
        Some(SessionValue::from("pep"))
    );
}

#[test]
fn factory_reads_environment_style_config() {
    let vars: HashMap<&str, &str> = [("SESSION_DRIVER", "memory"), ("SESSION_TTL_SECS", "60")]
        .into_iter()
        .collect();
    let config = SessionConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("config parses");
    assert_eq!(config.driver, DriverKind::Memory);

    let driver = create_session_driver(&config).expect("memory driver");
    let req = RequestMeta::new("10.0.0.6");
    driver.flash(&req, "msg", "saved".into()).expect("flash");
    assert!(driver.has(&req, "msg").expect("has"));
}

#[cfg(not(feature = "redis"))]
#[test]
fn redis_driver_is_unavailable_without_feature() {
    let config = SessionConfig::default().with_driver(DriverKind::Redis);
    let err = match create_session_driver(&config) {
        Ok(_) => panic!("redis driver should be unavailable"),
        Err(err) => err,
    };
    match err {
        SessionError::DriverUnavailable { ref driver, ref hint } => {
            assert_eq!(*driver, "redis");
            assert!(hint.contains("redis"));
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_store_error());
}

#[cfg(feature = "redis")]
#[test]
fn unreachable_redis_is_reported_as_unavailable() {
    let mut config = SessionConfig::default().with_driver(DriverKind::Redis);
    // port 1 is reserved and never serves redis
    config.redis.host = "127.0.0.1".into();
    config.redis.port = 1;
    let err = match create_session_driver(&config) {
        Ok(_) => panic!("nothing listens on port 1"),
        Err(err) => err,
    };
    assert!(
        matches!(err, SessionError::DriverUnavailable { driver: "redis", .. }),
        "unexpected error: {err}"
    );
    assert!(!err.is_store_error());
}
