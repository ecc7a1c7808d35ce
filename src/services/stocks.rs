//! 行情服务（TwelveData）
//!
//! 单次 quote 查询。TwelveData 在 HTTP 200 里也会返回
//! `{"status": "error", ...}`，需要按 message / code 归类为
//! 免费档不支持、代码不存在或一般服务错误。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::TwelveDataSection;

/// 行情服务失败的封闭集合
#[derive(Error, Debug)]
pub enum StockError {
    #[error("stock '{symbol}' not found on {exchange}")]
    NotFound { symbol: String, exchange: String },

    #[error("exchange {0} not available on the current data plan")]
    FreeTierLimit(String),

    #[error("stock service timeout")]
    Timeout,

    #[error("stock api request failed: {0}")]
    Api(String),

    #[error("invalid stock api response: {0}")]
    BadResponse(String),
}

/// 归一化后的行情记录
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub price: f64,
    pub currency: String,
    pub change: f64,
    pub percent_change: f64,
    pub market_open: bool,
}

/// 行情数据提供方；测试时用桩实现替换
#[async_trait]
pub trait StockProvider: Send + Sync {
    async fn quote(&self, symbol: &str, exchange: &str) -> Result<StockQuote, StockError>;
}

/// TwelveData 客户端
pub struct TwelveDataClient {
    http: reqwest::Client,
    api_key: String,
    quote_url: String,
    timeout: Duration,
}

impl TwelveDataClient {
    pub fn new(cfg: &TwelveDataSection, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: cfg.api_key.clone(),
            quote_url: cfg.quote_url.clone(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl StockProvider for TwelveDataClient {
    async fn quote(&self, symbol: &str, exchange: &str) -> Result<StockQuote, StockError> {
        let response = self
            .http
            .get(&self.quote_url)
            .query(&[
                ("symbol", symbol.to_uppercase()),
                ("exchange", exchange.to_uppercase()),
                ("apikey", self.api_key.clone()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?;

        let data: Value = response.json().await.map_err(map_reqwest_error)?;
        parse_quote(symbol, exchange, &data)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> StockError {
    if e.is_timeout() {
        StockError::Timeout
    } else {
        StockError::Api(e.to_string())
    }
}

/// 解析 quote 响应；error 状态按 TwelveData 的约定归类
fn parse_quote(symbol: &str, exchange: &str, data: &Value) -> Result<StockQuote, StockError> {
    if data.get("status").and_then(Value::as_str) == Some("error") {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let code = data.get("code").and_then(Value::as_i64).unwrap_or(500);

        // 免费档不支持的市场会在 message 里提示升级套餐
        if message.contains("Grow") || message.to_lowercase().contains("plan") {
            return Err(StockError::FreeTierLimit(exchange.to_uppercase()));
        }
        if code == 404 || message.to_lowercase().contains("not found") {
            return Err(StockError::NotFound {
                symbol: symbol.to_uppercase(),
                exchange: exchange.to_uppercase(),
            });
        }
        return Err(StockError::Api(format!("api error {code}: {message}")));
    }

    Ok(StockQuote {
        symbol: str_or(data, "symbol", &symbol.to_uppercase()),
        name: str_or(data, "name", "Unknown"),
        exchange: str_or(data, "exchange", &exchange.to_uppercase()),
        price: num_or_zero(data, "close"),
        currency: str_or(data, "currency", "USD"),
        change: num_or_zero(data, "change"),
        percent_change: num_or_zero(data, "percent_change"),
        market_open: data
            .get("is_market_open")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// TwelveData 的数值字段以字符串返回，两种形式都接受
fn num_or_zero(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(v) => v.as_f64().unwrap_or(0.0),
        None => 0.0,
    }
}
