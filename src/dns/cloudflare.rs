use std::net::{AddrParseError, Ipv4Addr};

use cloudflare::endpoints::dns::{
    CreateDnsRecord, CreateDnsRecordParams, DnsContent, DnsRecord, ListDnsRecords,
    ListDnsRecordsParams, UpdateDnsRecord, UpdateDnsRecordParams,
};
use cloudflare::endpoints::zone::{ListZones, ListZonesParams};
use cloudflare::framework::async_api::{ApiClient, Client};
use cloudflare::framework::auth::Credentials;
use cloudflare::framework::response::ApiFailure;
use cloudflare::framework::{Environment, HttpApiClientConfig};
use thiserror::Error;
use tracing::debug;

use super::Record;

const PER_PAGE: u32 = 100;

pub struct CloudflareProvider {
    client: Client,
}

impl CloudflareProvider {
    pub fn new(token: String) -> Result<Self, CloudflareError> {
        Self::with_environment(token, Environment::Production)
    }

    /// Builds a provider talking to a non-production API base, e.g. a local mock server.
    pub fn with_environment(token: String, environment: Environment) -> Result<Self, CloudflareError> {
        let client = Client::new(
            Credentials::UserAuthToken { token },
            HttpApiClientConfig::default(),
            environment,
        )
        .map_err(|e| match e.downcast::<reqwest::Error>() {
            Ok(e) => CloudflareError::NewClientError(e),
            Err(e) => CloudflareError::Client(e.to_string()),
        })?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl super::Provider for CloudflareProvider {
    type Error = CloudflareError;

    #[tracing::instrument(skip(self))]
    async fn zone_id(&self, zone: &str) -> Result<String, Self::Error> {
        let request = ListZones {
            params: ListZonesParams {
                name: Some(zone.to_owned()),
                ..Default::default()
            },
        };
        self.client
            .request(&request)
            .await?
            .result
            .into_iter()
            .next()
            .map(|z| z.id)
            .ok_or_else(|| CloudflareError::ZoneNotFound(zone.to_owned()))
    }

    #[tracing::instrument(skip(self))]
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<Record>, Self::Error> {
        // Filtering on record_type would also filter on its content, so only
        // the name goes to the API and the type is checked here.
        let request = ListDnsRecords {
            zone_identifier: zone_id,
            params: ListDnsRecordsParams {
                record_type: None,
                name: Some(name.to_owned()),
                page: None,
                per_page: Some(PER_PAGE),
                order: None,
                direction: None,
                search_match: None,
            },
        };
        let records: Vec<_> = self
            .client
            .request(&request)
            .await?
            .result
            .into_iter()
            .filter_map(to_a_record)
            .collect();

        debug!(?records, "got {} A records from Cloudflare", records.len());

        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    async fn create_record(&self, zone_id: &str, record: &Record) -> Result<Record, Self::Error> {
        let request = CreateDnsRecord {
            zone_identifier: zone_id,
            params: CreateDnsRecordParams {
                ttl: Some(record.ttl),
                priority: None,
                proxied: Some(record.proxied),
                name: &record.name,
                content: a_content(&record.content)?,
            },
        };
        let created = self.client.request(&request).await?.result;

        to_a_record(created).ok_or_else(|| CloudflareError::UnexpectedContent(record.name.clone()))
    }

    #[tracing::instrument(skip(self))]
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<Record, Self::Error> {
        let request = UpdateDnsRecord {
            zone_identifier: zone_id,
            identifier: record_id,
            params: UpdateDnsRecordParams {
                ttl: Some(record.ttl),
                proxied: Some(record.proxied),
                name: &record.name,
                content: a_content(&record.content)?,
            },
        };
        let updated = self.client.request(&request).await?.result;

        to_a_record(updated).ok_or_else(|| CloudflareError::UnexpectedContent(record.name.clone()))
    }
}

/// Converts a Cloudflare record, dropping anything that is not an A record.
fn to_a_record(record: DnsRecord) -> Option<Record> {
    match record.content {
        DnsContent::A { content } => Some(Record {
            id: record.id,
            name: record.name,
            content: content.to_string(),
            proxied: record.proxied,
            ttl: record.ttl,
        }),
        _ => None,
    }
}

fn a_content(content: &str) -> Result<DnsContent, CloudflareError> {
    let content = content
        .parse::<Ipv4Addr>()
        .map_err(|source| CloudflareError::InvalidAddress {
            content: content.to_owned(),
            source,
        })?;
    Ok(DnsContent::A { content })
}

#[derive(Debug, Error)]
pub enum CloudflareError {
    #[error(transparent)]
    NewClientError(#[from] reqwest::Error),
    #[error("failed to build cloudflare client: {0}")]
    Client(String),
    #[error(transparent)]
    ApiError(#[from] ApiFailure),
    #[error("zone `{0}` not found")]
    ZoneNotFound(String),
    #[error("cloudflare returned a non-A record for `{0}`")]
    UnexpectedContent(String),
    #[error("`{content}` is not a valid IPv4 address")]
    InvalidAddress {
        content: String,
        #[source]
        source: AddrParseError,
    },
}
