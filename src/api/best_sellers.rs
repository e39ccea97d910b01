//! Best sellers adapter: `GET /api/v1/products/best-sellers`.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::cache::TtlCache;
use crate::http::{FetchClient, FetchError, FetchRequest};

pub const BEST_SELLERS_PATH: &str = "/api/v1/products/best-sellers";

const RESOURCE: &str = "best sellers";

/// Product identifier; the backend sends either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(n) => write!(f, "{}", n),
            ProductId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSellerProduct {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    /// Image URL
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Either `{ "data": [...], "total"?: n }` or a bare product array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BestSellersResponse {
    Paged {
        data: Vec<BestSellerProduct>,
        #[serde(default)]
        total: Option<u64>,
    },
    List(Vec<BestSellerProduct>),
}

impl BestSellersResponse {
    pub fn products(&self) -> &[BestSellerProduct] {
        match self {
            BestSellersResponse::Paged { data, .. } => data,
            BestSellersResponse::List(products) => products,
        }
    }

    /// Total reported by the server, or the number of products returned.
    pub fn total(&self) -> u64 {
        match self {
            BestSellersResponse::Paged {
                total: Some(total), ..
            } => *total,
            _ => self.products().len() as u64,
        }
    }

    pub fn into_products(self) -> Vec<BestSellerProduct> {
        match self {
            BestSellersResponse::Paged { data, .. } => data,
            BestSellersResponse::List(products) => products,
        }
    }
}

/// Joins a base URL and the best sellers path.
pub fn best_sellers_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), BEST_SELLERS_PATH)
}

/// Something that can fetch the raw best sellers payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BestSellersSource: Send + Sync {
    async fn get_best_sellers(&self, retries: u32) -> Result<Value, FetchError>;
    fn endpoint(&self) -> &str;
}

#[derive(Clone)]
pub struct BestSellersApi {
    client: FetchClient,
    endpoint: String,
}

impl BestSellersApi {
    pub fn new(client: FetchClient, base_url: &str) -> Self {
        Self {
            client,
            endpoint: best_sellers_url(base_url),
        }
    }

    /// Fetches best sellers and decodes them into the typed response.
    #[tracing::instrument(skip(self))]
    pub async fn get_best_seller_products(
        &self,
        retries: u32,
    ) -> Result<BestSellersResponse, FetchError> {
        let data = self.get_best_sellers(retries).await?;

        serde_json::from_value(data).map_err(|e| {
            debug!("Unexpected best sellers payload: {}", e);
            FetchError::format(RESOURCE)
        })
    }
}

#[async_trait]
impl BestSellersSource for BestSellersApi {
    #[tracing::instrument(skip(self))]
    async fn get_best_sellers(&self, retries: u32) -> Result<Value, FetchError> {
        self.client
            .get_json(&FetchRequest::new(&self.endpoint, RESOURCE), retries)
            .await
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Serves best sellers from `cache` when fresh, otherwise fetches and stores
/// them under the endpoint URL. Failures are never cached.
#[tracing::instrument(skip(source, cache))]
pub async fn cached_best_sellers<S>(
    source: &S,
    cache: &TtlCache<Value>,
    retries: u32,
) -> Result<Value, FetchError>
where
    S: BestSellersSource + ?Sized,
{
    let key = source.endpoint().to_string();

    if let Some(hit) = cache.get(&key) {
        debug!("cache hit for {}", key);
        return Ok(hit);
    }

    debug!("cache miss for {}", key);
    let data = source.get_best_sellers(retries).await?;
    cache.set(key, data.clone());
    Ok(data)
}
