//! Login, registration and logout. The session token returned by the
//! backend is persisted on disk and attached as a bearer token by every
//! later command.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use super::ui;
use crate::api::{ApiClient, token};
use crate::core::config::AppConfig;

pub async fn login(config: &AppConfig, name: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(&config.base_url, None)?;
    let session = client.login(name, password).await?;
    token::save(&config.token_path()?, &session.token)?;
    info!("Logged in as {}", session.user.name);
    println!("Logged in as {}.", session.user.name);
    Ok(())
}

pub async fn register(
    config: &AppConfig,
    name: &str,
    password: &str,
    age: Option<u32>,
    place: Option<String>,
) -> Result<()> {
    let client = ApiClient::new(&config.base_url, None)?;
    let mut payload = json!({"name": name, "password": password});
    if let Some(age) = age {
        payload["age"] = json!(age);
    }
    if let Some(place) = place {
        payload["place"] = json!(place);
    }
    let session = client.register(payload).await?;
    token::save(&config.token_path()?, &session.token)?;
    println!("Registered and logged in as {}.", session.user.name);
    Ok(())
}

pub fn logout(config: &AppConfig) -> Result<()> {
    token::clear(&config.token_path()?)?;
    println!(
        "{}",
        ui::style_text("Logged out.", ui::StyleType::Subtle)
    );
    Ok(())
}
