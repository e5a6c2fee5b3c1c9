//! HTTP client for the finance backend.
//!
//! One method per (entity, operation) pair. Response envelopes are
//! inconsistent across endpoints (`{"data": ...}` or bare payloads);
//! they are normalized exactly once here, never at call sites. Non-2xx
//! responses become errors carrying the backend's structured message
//! when one is present.

pub mod token;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::fetch::TransactionFeed;
use crate::core::model::{Asset, Bank, CreditCard, Saving, SourceKind, User};
use crate::core::transaction;

/// Fields the backend derives itself; sending them in an update is a
/// client bug, so it is rejected before any request goes out.
const CARD_CALCULATED_FIELDS: [&str; 4] =
    ["used", "available_limit", "billed_unpaid", "unbilled_spends"];

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanDelete {
    pub can_delete: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankBalance {
    pub balance: f64,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent("pft/0.1").build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request failed: {url}"))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status} from {path}"));
            return Err(anyhow!(message));
        }

        Ok(unwrap_envelope(payload))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        match self.get(path).await? {
            Value::Null => Ok(Vec::new()),
            value => serde_json::from_value(value)
                .with_context(|| format!("Unexpected response shape from {path}")),
        }
    }

    /// Transaction feed for one entity type, for use with the bounded
    /// fetcher.
    pub fn feed(&self, source: SourceKind) -> EntityTransactions<'_> {
        EntityTransactions {
            client: self,
            source,
        }
    }

    // Auth

    pub async fn login(&self, name: &str, password: &str) -> Result<Session> {
        let value = self
            .post("/login", json!({"name": name, "password": password}))
            .await?;
        serde_json::from_value(value).context("Unexpected login response")
    }

    pub async fn register(&self, payload: Value) -> Result<Session> {
        let value = self.post("/register", payload).await?;
        serde_json::from_value(value).context("Unexpected register response")
    }

    pub async fn me(&self) -> Result<User> {
        let value = self.get("/me").await?;
        serde_json::from_value(value).context("Unexpected user response")
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_list("/users").await
    }

    pub async fn update_user(&self, id: u64, fields: Value) -> Result<Value> {
        self.put(&format!("/users/{id}"), fields).await
    }

    pub async fn can_delete_user(&self, id: u64) -> Result<CanDelete> {
        let value = self.get(&format!("/users/{id}/can_delete")).await?;
        serde_json::from_value(value).context("Unexpected can_delete response")
    }

    pub async fn delete_user(&self, id: u64) -> Result<()> {
        self.delete(&format!("/users/{id}")).await?;
        Ok(())
    }

    // Assets

    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.get_list("/assets").await
    }

    pub async fn create_asset(&self, fields: Value) -> Result<Value> {
        self.post("/assets", fields).await
    }

    /// Updates an asset. The balance field is stripped if present: it is
    /// backend-computed and must only move through transactions.
    pub async fn update_asset(&self, id: u64, mut fields: Value) -> Result<Value> {
        if let Some(map) = fields.as_object_mut() {
            map.remove("balance");
        }
        self.put(&format!("/assets/{id}"), fields).await
    }

    pub async fn delete_asset(&self, id: u64) -> Result<()> {
        self.delete(&format!("/assets/{id}")).await?;
        Ok(())
    }

    pub async fn add_asset_transaction(&self, id: u64, fields: Value) -> Result<Value> {
        self.post(&format!("/assets/{id}/transactions"), fields).await
    }

    // Banks

    pub async fn list_banks(&self) -> Result<Vec<Bank>> {
        self.get_list("/banks").await
    }

    pub async fn banks_dropdown(&self) -> Result<Vec<Bank>> {
        self.get_list("/banks/dropdown").await
    }

    pub async fn create_bank(&self, name: &str) -> Result<Value> {
        self.post("/banks", json!({"name": name, "balance": 0})).await
    }

    pub async fn update_bank(&self, id: u64, name: &str) -> Result<Value> {
        self.put(&format!("/banks/{id}"), json!({"name": name})).await
    }

    pub async fn delete_bank(&self, id: u64) -> Result<()> {
        self.delete(&format!("/banks/{id}")).await?;
        Ok(())
    }

    pub async fn add_bank_transaction(&self, id: u64, fields: Value) -> Result<Value> {
        self.post(&format!("/banks/{id}/transactions"), fields).await
    }

    pub async fn bank_balance(&self, bank_id: u64) -> Result<BankBalance> {
        let value = self.get(&format!("/bank_balance?bank_id={bank_id}")).await?;
        serde_json::from_value(value).context("Unexpected bank balance response")
    }

    // Savings

    pub async fn list_savings(&self) -> Result<Vec<Saving>> {
        self.get_list("/savings").await
    }

    pub async fn create_saving(&self, fields: Value) -> Result<Value> {
        self.post("/savings", fields).await
    }

    /// Updates a saving account. Balances move only through transactions,
    /// so a payload naming `balance` is refused locally.
    pub async fn update_saving(&self, id: u64, fields: Value) -> Result<Value> {
        if fields.get("balance").is_some() {
            bail!("Cannot update balance directly. Use transactions instead.");
        }
        self.put(&format!("/savings/{id}"), fields).await
    }

    pub async fn delete_saving(&self, id: u64) -> Result<()> {
        self.delete(&format!("/savings/{id}")).await?;
        Ok(())
    }

    pub async fn add_saving_transaction(&self, id: u64, fields: Value) -> Result<Value> {
        self.post(&format!("/savings/{id}/transactions"), fields).await
    }

    // Credit cards

    pub async fn list_credit_cards(&self) -> Result<Vec<CreditCard>> {
        self.get_list("/credit_cards").await
    }

    pub async fn get_credit_card(&self, id: u64) -> Result<CreditCard> {
        let value = self.get(&format!("/credit_cards/{id}")).await?;
        serde_json::from_value(value).context("Unexpected credit card response")
    }

    pub async fn create_credit_card(&self, fields: Value) -> Result<Value> {
        self.post("/credit_cards", fields).await
    }

    /// Updates a credit card, refusing backend-calculated fields.
    pub async fn update_credit_card(&self, id: u64, fields: Value) -> Result<Value> {
        for field in CARD_CALCULATED_FIELDS {
            if fields.get(field).is_some() {
                bail!("Cannot update calculated field: {field}");
            }
        }
        self.put(&format!("/credit_cards/{id}"), fields).await
    }

    pub async fn delete_credit_card(&self, id: u64) -> Result<()> {
        self.delete(&format!("/credit_cards/{id}")).await?;
        Ok(())
    }

    /// Records a credit card transaction. Amount and date are mandatory;
    /// the date goes over the wire as DDMMYYYY.
    pub async fn add_card_transaction(
        &self,
        id: u64,
        amount: f64,
        date: NaiveDate,
        mut fields: Value,
    ) -> Result<Value> {
        if let Some(map) = fields.as_object_mut() {
            map.insert("amount".to_string(), json!(amount));
            map.insert("date".to_string(), json!(transaction::to_wire_date(date)));
        }
        self.post(&format!("/credit_cards/{id}/transactions"), fields)
            .await
    }

    pub async fn process_billing(&self, id: u64) -> Result<Value> {
        self.post(&format!("/credit_cards/{id}/process_billing"), json!({}))
            .await
    }
}

/// Raw transaction records for one entity type.
pub struct EntityTransactions<'a> {
    client: &'a ApiClient,
    source: SourceKind,
}

#[async_trait]
impl TransactionFeed for EntityTransactions<'_> {
    async fn transactions(&self, entity_id: u64, since: Option<NaiveDate>) -> Result<Vec<Value>> {
        let mut path = format!("/{}/{entity_id}/transactions", self.source.collection());
        if let Some(since) = since {
            // Hint only; older backends ignore the parameter.
            path.push_str(&format!("?since={since}"));
        }
        match self.client.get(&path).await? {
            Value::Array(records) => Ok(records),
            _ => Ok(Vec::new()),
        }
    }
}

/// Backend envelopes are inconsistently wrapped: some endpoints return
/// `{"data": ...}`, some the payload itself.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
