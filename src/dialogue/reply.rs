//! 回复文本
//!
//! 成功结果用确定性模板格式化（不过 NLU），失败类别对应固定话术；
//! 输出统一转成逐词的惰性流，消费一次即耗尽。

use std::pin::Pin;

use futures_util::stream::{self, Stream};

use crate::dialogue::dispatch::{FailureKind, Resource};
use crate::services::{StockQuote, WeatherReport};

/// 编排器产出的回复流：有限、不可重放，由传输层按序消费
pub type ReplyStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// 把整段回复拆成逐词片段：除最后一个词外都带尾随空格
pub fn word_stream(text: String) -> ReplyStream {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let last = words.len().saturating_sub(1);
    Box::pin(stream::iter(words.into_iter().enumerate().map(
        move |(i, word)| {
            if i < last {
                word + " "
            } else {
                word
            }
        },
    )))
}

pub fn format_weather(report: &WeatherReport) -> String {
    format!(
        "Weather in {}, {}:\n\
         • Condition: {}\n\
         • Temperature: {}°C (feels like {}°C)\n\
         • Humidity: {}%\n\
         • Wind speed: {} m/s",
        report.city,
        report.country,
        report.condition,
        report.temperature,
        report.feels_like,
        report.humidity,
        report.wind_speed
    )
}

pub fn format_stock(quote: &StockQuote) -> String {
    let sign = if quote.change >= 0.0 { "+" } else { "" };
    let market_status = if quote.market_open { "Open" } else { "Closed" };
    format!(
        "{} ({}) is trading at ${:.2} {} on {}.\n\
         Today's change: {sign}{:.2}%.\n\
         Market status: {market_status}.",
        quote.name, quote.symbol, quote.price, quote.currency, quote.exchange, quote.percent_change
    )
}

/// 失败类别 -> 固定话术（1:1，无原始错误细节）
pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::NotFound(Resource::City) => {
            "I couldn't find weather data for that location. \
             Could you check the spelling or specify a nearby city?"
        }
        FailureKind::NotFound(Resource::Symbol) => {
            "I couldn't find that stock symbol. \
             Please check the symbol or try specifying the exchange (e.g., \"TSLA on NASDAQ\")."
        }
        FailureKind::UnsupportedTier => {
            "I can't fetch live prices for NSE/BSE stocks with the free data plan. \
             I can provide US markets like NASDAQ or NYSE instead — \
             would you like to try a US exchange?"
        }
        FailureKind::Provider => {
            "I encountered an error processing your request. Please try again."
        }
        FailureKind::Unexpected => {
            "I encountered an unexpected error. Please try again."
        }
    }
}
