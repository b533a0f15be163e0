pub mod cloudflare;

/// The only record type this client manages.
pub const RECORD_TYPE: &str = "A";

/// TTL value that lets the provider pick the TTL itself.
pub const TTL_AUTO: u32 = 1;

/// Local copy of a provider-owned DNS record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Provider-assigned identifier, empty for records not yet created.
    pub id: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
}

#[cfg_attr(test, mockall::automock(type Error = MockError;))]
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn zone_id(&self, zone: &str) -> Result<String, Self::Error>;
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<Record>, Self::Error>;
    async fn create_record(&self, zone_id: &str, record: &Record) -> Result<Record, Self::Error>;
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<Record, Self::Error>;
}

#[cfg(test)]
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);
