//! REST adapters for the storefront backend.
//!
//! Each adapter knows one endpoint and hands the request to the shared
//! [`FetchClient`](crate::http::FetchClient), so every call gets the same
//! timeout, retry and error classification.

mod best_sellers;
mod users;

#[cfg(test)]
pub use best_sellers::MockBestSellersSource;
pub use best_sellers::{
    BEST_SELLERS_PATH, BestSellerProduct, BestSellersApi, BestSellersResponse, BestSellersSource,
    ProductId, best_sellers_url, cached_best_sellers,
};
pub use users::{USERS_PATH, UsersApi};
