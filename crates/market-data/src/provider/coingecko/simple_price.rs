use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tracing::debug;

use super::{CoinGeckoClient, PROVIDER_ID};
use crate::errors::MarketDataError;
use crate::models::CryptoPrice;
use crate::provider::{CryptoPriceProvider, Provider};

/// `{"bitcoin": {"usd": 42000.0, "inr": 3500000.0}}`
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

/// Simple-price endpoint: prices only, no name or 24h figures.
pub struct CoinGeckoPriceProvider {
    client: CoinGeckoClient,
}

impl CoinGeckoPriceProvider {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self { client }
    }
}

impl Provider for CoinGeckoPriceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }
}

#[async_trait]
impl CryptoPriceProvider for CoinGeckoPriceProvider {
    async fn prices(
        &self,
        ids: &[String],
        currencies: &[String],
    ) -> Result<Vec<CryptoPrice>, MarketDataError> {
        let ids_param = ids.join(",");
        let currencies_param = currencies.join(",");
        let params = [
            ("ids", ids_param.as_str()),
            ("vs_currencies", currencies_param.as_str()),
        ];
        let mut response: SimplePriceResponse =
            self.client.get_json("/simple/price", &params).await?;

        // Keep request order; unknown ids are simply absent from the answer.
        let prices: Vec<CryptoPrice> = ids
            .iter()
            .filter_map(|id| {
                let table = response.remove(id)?;
                let prices: BTreeMap<String, f64> = table
                    .into_iter()
                    .filter_map(|(currency, price)| Some((currency.to_lowercase(), price?)))
                    .collect();
                if prices.is_empty() {
                    return None;
                }
                Some(CryptoPrice {
                    id: id.clone(),
                    symbol: id.clone(),
                    name: id.clone(),
                    prices,
                    change_percent_24h: None,
                    volume_24h: None,
                    market_cap: None,
                })
            })
            .collect();

        debug!(
            "CoinGecko simple price: {} of {} ids answered",
            prices.len(),
            ids.len()
        );
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn provider(server: &mockito::ServerGuard, key: Option<&str>) -> CoinGeckoPriceProvider {
        CoinGeckoPriceProvider::new(CoinGeckoClient::with_base_url(
            key.map(str::to_string),
            server.url(),
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn test_simple_price_request_order_and_nulls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "ethereum,bitcoin,nope".into()),
                Matcher::UrlEncoded("vs_currencies".into(), "usd,inr".into()),
            ]))
            .match_header("x-cg-demo-api-key", "demo")
            .with_body(
                r#"{"bitcoin": {"usd": 42000.0, "inr": 3500000.0},
                    "ethereum": {"usd": 2250.0, "inr": null}}"#,
            )
            .create_async()
            .await;

        let ids: Vec<String> = ["ethereum", "bitcoin", "nope"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let currencies = vec!["usd".to_string(), "inr".to_string()];
        let prices = provider(&server, Some("demo"))
            .prices(&ids, &currencies)
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].id, "ethereum");
        assert_eq!(prices[0].price_in("usd"), Some(2250.0));
        assert_eq!(prices[0].price_in("inr"), None);
        assert_eq!(prices[1].price_in("inr"), Some(3_500_000.0));
        assert!(prices[1].change_percent_24h.is_none());
    }

    #[tokio::test]
    async fn test_simple_price_empty_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_body("{}")
            .create_async()
            .await;

        let prices = provider(&server, None)
            .prices(&["nope".to_string()], &["usd".to_string()])
            .await
            .unwrap();
        assert!(prices.is_empty());
        assert!(!provider(&server, None).is_market_data());
    }
}
