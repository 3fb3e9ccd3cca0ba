//! REST client for the map service.

use std::time::Duration;

use mw_core::{KnownRoom, ZoneInfo};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{MapStore, NewExit, NewRoom};

#[derive(Deserialize)]
struct Created {
    id: i64,
}

/// [`MapStore`] backed by the REST service.
pub struct HttpStore {
    client: Client,
    config: StoreConfig,
}

impl HttpStore {
    /// Build a client for the configured service.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn checked(resp: Response) -> StoreResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().to_string();
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            url,
            body,
        })
    }
}

impl MapStore for HttpStore {
    fn zones(&self) -> StoreResult<Vec<ZoneInfo>> {
        let resp = self.client.get(self.config.endpoint("zones")).send()?;
        Ok(Self::checked(resp)?.json()?)
    }

    fn find_rooms_by_portal_key(&self, portal_key: &str) -> StoreResult<Vec<KnownRoom>> {
        let resp = self
            .client
            .get(self.config.endpoint("rooms"))
            .query(&[("portal_key", portal_key)])
            .send()?;
        Ok(Self::checked(resp)?.json()?)
    }

    fn create_room(&self, room: &NewRoom) -> StoreResult<i64> {
        let resp = self
            .client
            .post(self.config.endpoint("rooms"))
            .json(room)
            .send()?;
        let created: Created = Self::checked(resp)?.json()?;
        Ok(created.id)
    }

    fn create_exit(&self, exit: &NewExit) -> StoreResult<i64> {
        let resp = self
            .client
            .post(self.config.endpoint("exits"))
            .json(exit)
            .send()?;
        let created: Created = Self::checked(resp)?.json()?;
        Ok(created.id)
    }
}
