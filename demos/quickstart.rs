use request_session::{
    create_session_driver, RequestMeta, RequestSession, SessionConfig, SessionResult, SessionValue,
};
use serde_json::json;

fn run_demo() -> SessionResult<()> {
    let config = SessionConfig::from_env()?;
    println!("== Session demo ({} driver) ==", config.driver.as_str());
    let driver = create_session_driver(&config)?;

    let request = RequestMeta::new("10.0.0.1").with_header("X-Forwarded-For", "203.0.113.9");
    let session = RequestSession::new(driver.as_ref(), &request);

    session.set("user_id", "42")?;
    session.set(
        "prefs",
        SessionValue::structured(&json!({"theme": "dark"}))?,
    )?;
    session.flash("notice", "Profile saved")?;

    if let Some(notice) = session.get("notice")? {
        println!("Flash message: {notice}");
    }
    println!("Session contents: {:?}", session.all()?);

    session.reset_flash()?;
    println!("After flash reset, has notice: {}", session.has("notice")?);

    session.reset()?;
    println!("Session cleared");
    Ok(())
}

fn main() -> SessionResult<()> {
    run_demo()
}
