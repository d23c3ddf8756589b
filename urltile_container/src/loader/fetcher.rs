//! Transport seam for tile bytes.
//!
//! The loader hands a fully resolved [`TileLocation`] to a [`TileFetcher`]; a missing
//! tile is `Ok(None)`, anything else that goes wrong is an error.

use crate::TileLocation;
use anyhow::{Result, bail, ensure};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, io::ErrorKind, path::Path, time::Duration};
use urltile_core::Blob;
use urltile_derive::context;

#[async_trait]
pub trait TileFetcher: Debug + Send + Sync {
	async fn fetch(&self, location: &TileLocation) -> Result<Option<Blob>>;
}

/// Reads tiles from the local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl FileFetcher {
	#[context("reading tile file {:?}", path)]
	async fn read(path: &Path) -> Result<Option<Blob>> {
		match tokio::fs::read(path).await {
			Ok(bytes) => Ok(Some(Blob::from(bytes))),
			Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
			Err(error) => Err(error.into()),
		}
	}
}

#[async_trait]
impl TileFetcher for FileFetcher {
	async fn fetch(&self, location: &TileLocation) -> Result<Option<Blob>> {
		match location {
			TileLocation::File(path) => FileFetcher::read(path).await,
			TileLocation::Url(url) => bail!("file fetcher can not load url '{url}'"),
		}
	}
}

/// Downloads tiles over HTTP(S) and delegates local locations to [`FileFetcher`].
#[derive(Clone, Debug)]
pub struct HttpFetcher {
	client: Client,
}

impl HttpFetcher {
	pub fn new() -> Result<HttpFetcher> {
		let client = Client::builder()
			.user_agent(concat!("urltile/", env!("CARGO_PKG_VERSION")))
			.timeout(Duration::from_secs(30))
			.build()?;
		Ok(HttpFetcher { client })
	}

	#[context("downloading tile '{url}'")]
	async fn download(&self, url: &str) -> Result<Option<Blob>> {
		log::trace!("GET {url}");
		let response = self.client.get(url).send().await?;
		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		ensure!(status.is_success(), "server responded with {status}");
		Ok(Some(Blob::from(response.bytes().await?.to_vec())))
	}
}

#[async_trait]
impl TileFetcher for HttpFetcher {
	async fn fetch(&self, location: &TileLocation) -> Result<Option<Blob>> {
		match location {
			TileLocation::Url(url) => self.download(url).await,
			TileLocation::File(_) => FileFetcher.fetch(location).await,
		}
	}
}
