//! CLI command implementations.

use anyhow::{Context, Result};
use log::info;
use std::io::Write;

use crate::api::BestSellersSource;
use crate::config::Config;

/// Prints best sellers, one `id<TAB>name<TAB>price` line each, or the raw JSON.
#[tracing::instrument(skip(config, out))]
pub async fn best_sellers<W: Write>(config: &Config, raw_json: bool, out: &mut W) -> Result<()> {
    let api = config.best_sellers_api()?;

    if raw_json {
        let data = api.get_best_sellers(config.retries).await?;
        writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
        return Ok(());
    }

    let response = api.get_best_seller_products(config.retries).await?;
    for product in response.products() {
        writeln!(out, "{}\t{}\t{:.2}", product.id, product.name, product.price)
            .context("Failed to write output")?;
    }
    info!(
        "Listed {} of {} best sellers",
        response.products().len(),
        response.total()
    );

    Ok(())
}

/// Prints all users, or the one with `id`, as pretty JSON.
#[tracing::instrument(skip(config, out))]
pub async fn users<W: Write>(config: &Config, id: Option<&str>, out: &mut W) -> Result<()> {
    let api = config.users_api()?;

    let data = match id {
        Some(id) => api.get_user_by_id(id, config.retries).await?,
        None => api.get_all_users(config.retries).await?,
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&data)?).context("Failed to write output")?;
    Ok(())
}
