use thiserror::Error;
use tracing::{debug, info};

use crate::dns::{Provider, Record, RECORD_TYPE, TTL_AUTO};

/// What a reconciliation pass did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Unchanged,
    Updated,
}

#[derive(Debug)]
pub struct Updater<D: Provider> {
    provider: D,
}

impl<D: Provider> Updater<D> {
    pub fn new(provider: D) -> Self {
        Self { provider }
    }

    /// Makes the A record `name` in `zone` point at `ip`.
    ///
    /// Only the first record returned for the name is considered. A record
    /// whose content already matches is left alone without a write.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn reconcile(&self, zone: &str, name: &str, ip: &str) -> Result<Outcome, UpdateError<D::Error>> {
        let zone_id = self.provider.zone_id(zone)
            .await
            .map_err(|source| UpdateError::ZoneLookup { zone: zone.to_owned(), source })?;
        info!(%zone_id, "zone id for {}", zone);

        let records = self.provider.list_records(&zone_id, name)
            .await
            .map_err(|source| UpdateError::List { name: name.to_owned(), source })?;

        let Some(mut record) = records.into_iter().next() else {
            info!("no {} record found, creating", RECORD_TYPE);
            let record = Record {
                id: String::new(),
                name: name.to_owned(),
                content: ip.to_owned(),
                proxied: true,
                ttl: TTL_AUTO,
            };
            let created = self.provider.create_record(&zone_id, &record)
                .await
                .map_err(|source| UpdateError::Create { name: name.to_owned(), source })?;
            debug!(?created, "created record");
            return Ok(Outcome::Created);
        };

        if record.content == ip {
            info!(content = %record.content, "record already up to date");
            return Ok(Outcome::Unchanged);
        }

        info!(old = %record.content, new = %ip, "updating record");
        record.content = ip.to_owned();
        self.provider.update_record(&zone_id, &record.id, &record)
            .await
            .map_err(|source| UpdateError::Update { name: name.to_owned(), source })?;

        Ok(Outcome::Updated)
    }
}

#[derive(Debug, Error)]
pub enum UpdateError<E: std::error::Error + 'static> {
    #[error("unable to resolve zone id for {zone}: {source}")]
    ZoneLookup { zone: String, source: E },
    #[error("unable to list records for {name}: {source}")]
    List { name: String, source: E },
    #[error("unable to create record {name}: {source}")]
    Create { name: String, source: E },
    #[error("unable to update record {name}: {source}")]
    Update { name: String, source: E },
}
