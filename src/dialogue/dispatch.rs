//! 任务分发与错误归类
//!
//! 槽位齐备后恰好发起一次外部数据调用；服务层的类型化失败在此收拢为
//! 面向用户的固定类别。原始错误只写日志，绝不透出给用户。

use std::sync::Arc;

use crate::dialogue::Intent;
use crate::nlu::SlotMap;
use crate::services::{StockError, StockProvider, StockQuote, WeatherError, WeatherProvider, WeatherReport};

/// 查不到的资源种类（决定 NotFound 用哪条固定话术）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    City,
    Symbol,
}

/// 面向用户的失败类别，每类对应唯一固定话术
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 城市或股票代码无法解析
    NotFound(Resource),
    /// 当前数据档位不支持该市场
    UnsupportedTier,
    /// 上游服务失败（含超时）
    Provider,
    /// 未预期的其它情况
    Unexpected,
}

/// 分发结果：成功记录或已归类的失败
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Weather(WeatherReport),
    Stock(StockQuote),
    Failed(FailureKind),
}

/// 任务分发器：每个任务对应一个数据提供方
pub struct TaskDispatcher {
    weather: Arc<dyn WeatherProvider>,
    stocks: Arc<dyn StockProvider>,
}

impl TaskDispatcher {
    pub fn new(weather: Arc<dyn WeatherProvider>, stocks: Arc<dyn StockProvider>) -> Self {
        Self { weather, stocks }
    }

    /// 分发一次已校验完整的任务；槽位缺失走 Unexpected 兜底而非 panic
    pub async fn dispatch(&self, intent: Intent, slots: &SlotMap) -> DispatchOutcome {
        match intent {
            Intent::Weather => {
                let Some(city) = slots.get("location") else {
                    tracing::error!("weather dispatch without location slot");
                    return DispatchOutcome::Failed(FailureKind::Unexpected);
                };
                match self.weather.lookup(city).await {
                    Ok(report) => DispatchOutcome::Weather(report),
                    Err(WeatherError::CityNotFound(city)) => {
                        tracing::warn!(%city, "weather lookup: city not found");
                        DispatchOutcome::Failed(FailureKind::NotFound(Resource::City))
                    }
                    Err(e) => {
                        tracing::error!("weather provider failure: {e}");
                        DispatchOutcome::Failed(FailureKind::Provider)
                    }
                }
            }
            Intent::Stock => {
                let (Some(symbol), Some(exchange)) = (slots.get("symbol"), slots.get("exchange"))
                else {
                    tracing::error!("stock dispatch without symbol/exchange slots");
                    return DispatchOutcome::Failed(FailureKind::Unexpected);
                };
                match self.stocks.quote(symbol, exchange).await {
                    Ok(quote) => DispatchOutcome::Stock(quote),
                    Err(StockError::NotFound { symbol, exchange }) => {
                        tracing::warn!(%symbol, %exchange, "stock lookup: symbol not found");
                        DispatchOutcome::Failed(FailureKind::NotFound(Resource::Symbol))
                    }
                    Err(StockError::FreeTierLimit(exchange)) => {
                        tracing::warn!(%exchange, "stock lookup: exchange not on current plan");
                        DispatchOutcome::Failed(FailureKind::UnsupportedTier)
                    }
                    Err(e) => {
                        tracing::error!("stock provider failure: {e}");
                        DispatchOutcome::Failed(FailureKind::Provider)
                    }
                }
            }
            Intent::Unknown => {
                tracing::error!("dispatch called with unknown intent");
                DispatchOutcome::Failed(FailureKind::Unexpected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubWeather {
        found: bool,
    }

    #[async_trait]
    impl WeatherProvider for StubWeather {
        async fn lookup(&self, city: &str) -> Result<WeatherReport, WeatherError> {
            if !self.found {
                return Err(WeatherError::CityNotFound(city.to_string()));
            }
            Ok(WeatherReport {
                city: city.to_string(),
                country: "FR".to_string(),
                condition: "Clear".to_string(),
                description: "clear sky".to_string(),
                temperature: 21.0,
                feels_like: 20.5,
                humidity: 40,
                wind_speed: 2.1,
            })
        }
    }

    struct StubStocks {
        error: Option<fn() -> StockError>,
    }

    #[async_trait]
    impl StockProvider for StubStocks {
        async fn quote(&self, symbol: &str, exchange: &str) -> Result<StockQuote, StockError> {
            if let Some(make) = self.error {
                return Err(make());
            }
            Ok(StockQuote {
                symbol: symbol.to_string(),
                name: "Tesla Inc".to_string(),
                exchange: exchange.to_string(),
                price: 248.5,
                currency: "USD".to_string(),
                change: -3.2,
                percent_change: -1.27,
                market_open: true,
            })
        }
    }

    fn slots(pairs: &[(&str, &str)]) -> SlotMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dispatcher(weather_found: bool, stock_error: Option<fn() -> StockError>) -> TaskDispatcher {
        TaskDispatcher::new(
            Arc::new(StubWeather {
                found: weather_found,
            }),
            Arc::new(StubStocks { error: stock_error }),
        )
    }

    #[tokio::test]
    async fn test_dispatch_weather_success() {
        let d = dispatcher(true, None);
        let outcome = d
            .dispatch(Intent::Weather, &slots(&[("location", "Paris")]))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Weather(r) if r.city == "Paris"));
    }

    #[tokio::test]
    async fn test_dispatch_weather_not_found() {
        let d = dispatcher(false, None);
        let outcome = d
            .dispatch(Intent::Weather, &slots(&[("location", "Nowhereistan")]))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Failed(FailureKind::NotFound(Resource::City))
        );
    }

    #[tokio::test]
    async fn test_dispatch_stock_unsupported_tier() {
        let d = dispatcher(true, Some(|| StockError::FreeTierLimit("NSE".to_string())));
        let outcome = d
            .dispatch(
                Intent::Stock,
                &slots(&[("symbol", "RELIANCE"), ("exchange", "NSE")]),
            )
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed(FailureKind::UnsupportedTier));
    }

    #[tokio::test]
    async fn test_dispatch_stock_timeout_is_provider() {
        let d = dispatcher(true, Some(|| StockError::Timeout));
        let outcome = d
            .dispatch(
                Intent::Stock,
                &slots(&[("symbol", "TSLA"), ("exchange", "NASDAQ")]),
            )
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed(FailureKind::Provider));
    }

    #[tokio::test]
    async fn test_dispatch_missing_slot_is_unexpected() {
        let d = dispatcher(true, None);
        let outcome = d.dispatch(Intent::Stock, &slots(&[("symbol", "TSLA")])).await;
        assert_eq!(outcome, DispatchOutcome::Failed(FailureKind::Unexpected));
    }
}
