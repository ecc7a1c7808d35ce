//! 槽位模式、确定性校验、澄清问题与归一化
//!
//! 校验是纯 Rust 逻辑：同样的 (slots, intent) 必须永远得到同样的结果，
//! 对话推进完全以此为准，绝不把完整性判断交给 NLU。

use std::sync::Arc;

use crate::dialogue::Intent;
use crate::nlu::{NluClient, SlotMap};

/// 各任务的必填参数（声明顺序即提问顺序），只读
pub fn required_slots(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Weather => &["location"],
        Intent::Stock => &["symbol", "exchange"],
        Intent::Unknown => &[],
    }
}

/// 校验结果：valid 当且仅当 missing 为空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub missing: Vec<String>,
}

/// 确定性槽位校验：缺失 = 键不存在，或去除首尾空白后为空串
pub fn validate_slots(slots: &SlotMap, intent: Intent) -> ValidationResult {
    let mut missing = Vec::new();
    for name in required_slots(intent) {
        match slots.get(*name) {
            Some(value) if !value.trim().is_empty() => {}
            _ => missing.push((*name).to_string()),
        }
    }
    ValidationResult {
        valid: missing.is_empty(),
        missing,
    }
}

/// 澄清问题：每轮只针对第一个缺失参数提问，绝不问复合问题
pub fn clarification(missing: &[String], intent: Intent) -> String {
    let Some(slot) = missing.first() else {
        return String::new();
    };

    match (intent, slot.as_str()) {
        (Intent::Weather, "location") => "Which city would you like the weather for?",
        (Intent::Stock, "symbol") => {
            "Which stock would you like to check? Please provide the symbol (e.g., TSLA for Tesla)."
        }
        (Intent::Stock, "exchange") => "Which exchange? (e.g., NASDAQ, NYSE)",
        _ => "Could you provide more information?",
    }
    .to_string()
}

/// 股票代码归一化：常见公司名映射为代码，其余转大写并去掉非字母数字字符
pub fn normalize_symbol(symbol: &str) -> String {
    let mappings = [
        ("tesla", "TSLA"),
        ("apple", "AAPL"),
        ("microsoft", "MSFT"),
        ("google", "GOOGL"),
        ("amazon", "AMZN"),
        ("meta", "META"),
        ("facebook", "META"),
        ("nvidia", "NVDA"),
        ("netflix", "NFLX"),
    ];

    let key = symbol.trim().to_lowercase();
    if let Some((_, ticker)) = mappings.iter().find(|(name, _)| *name == key) {
        return (*ticker).to_string();
    }

    symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// 交易所归一化：大写去空白；已知交易所按标准名返回，其余原样透传
pub fn normalize_exchange(exchange: &str) -> String {
    let upper = exchange.trim().to_uppercase();
    let known = ["NASDAQ", "NYSE", "NSE", "BSE", "LSE", "HKEX"];
    match known.iter().find(|e| **e == upper) {
        Some(e) => (*e).to_string(),
        None => upper,
    }
}

/// 槽位抽取适配器：调 NLU 抽取、归一化、裁剪到该意图模式内的参数；
/// 抽取失败降级为「本轮无新槽位」，已有槽位保持不动
pub struct SlotExtractor {
    nlu: Arc<dyn NluClient>,
}

impl SlotExtractor {
    pub fn new(nlu: Arc<dyn NluClient>) -> Self {
        Self { nlu }
    }

    pub async fn extract(&self, message: &str, intent: Intent, known: &SlotMap) -> SlotMap {
        let mut slots = match self.nlu.extract(message, intent, known).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!("slot extraction failed, keeping previous slots: {e}");
                SlotMap::new()
            }
        };

        if intent == Intent::Stock {
            if let Some(symbol) = slots.get("symbol") {
                let normalized = normalize_symbol(symbol);
                slots.insert("symbol".to_string(), normalized);
            }
            if let Some(exchange) = slots.get("exchange") {
                let normalized = normalize_exchange(exchange);
                slots.insert("exchange".to_string(), normalized);
            }
        }

        // 模式之外的键在此丢弃，保证会话槽位永远不含别的任务的参数
        let schema = required_slots(intent);
        slots.retain(|key, _| schema.contains(&key.as_str()));
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::ScriptedNlu;

    fn slots(pairs: &[(&str, &str)]) -> SlotMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_empty_reports_all_missing() {
        let result = validate_slots(&SlotMap::new(), Intent::Stock);
        assert!(!result.valid);
        assert_eq!(result.missing, vec!["symbol", "exchange"]);
    }

    #[test]
    fn test_validate_partial() {
        let result = validate_slots(&slots(&[("symbol", "TSLA")]), Intent::Stock);
        assert!(!result.valid);
        assert_eq!(result.missing, vec!["exchange"]);
    }

    #[test]
    fn test_validate_complete() {
        let result = validate_slots(
            &slots(&[("symbol", "TSLA"), ("exchange", "NASDAQ")]),
            Intent::Stock,
        );
        assert!(result.valid);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_validate_blank_value_is_missing() {
        let result = validate_slots(&slots(&[("location", "   ")]), Intent::Weather);
        assert!(!result.valid);
        assert_eq!(result.missing, vec!["location"]);
    }

    #[test]
    fn test_validate_unknown_intent_always_valid() {
        let result = validate_slots(&slots(&[("anything", "x")]), Intent::Unknown);
        assert!(result.valid);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_validate_is_deterministic() {
        let input = slots(&[("symbol", "TSLA")]);
        let first = validate_slots(&input, Intent::Stock);
        for _ in 0..10 {
            assert_eq!(validate_slots(&input, Intent::Stock), first);
        }
    }

    #[test]
    fn test_clarification_asks_first_missing_only() {
        let missing = vec!["symbol".to_string(), "exchange".to_string()];
        let question = clarification(&missing, Intent::Stock);
        assert!(question.contains("symbol"));
        assert!(!question.contains("exchange?"));
    }

    #[test]
    fn test_clarification_exchange() {
        let missing = vec!["exchange".to_string()];
        assert_eq!(
            clarification(&missing, Intent::Stock),
            "Which exchange? (e.g., NASDAQ, NYSE)"
        );
    }

    #[test]
    fn test_clarification_fallback_nonempty() {
        let missing = vec!["frequency".to_string()];
        let question = clarification(&missing, Intent::Weather);
        assert!(!question.is_empty());
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("Tesla"), "TSLA");
        assert_eq!(normalize_symbol("aapl"), "AAPL");
        assert_eq!(normalize_symbol("brk.b"), "BRKB");
    }

    #[test]
    fn test_normalize_exchange() {
        assert_eq!(normalize_exchange("nasdaq"), "NASDAQ");
        assert_eq!(normalize_exchange(" nyse "), "NYSE");
        assert_eq!(normalize_exchange("Euronext"), "EURONEXT");
    }

    #[tokio::test]
    async fn test_extractor_normalizes_and_filters() {
        let nlu = ScriptedNlu::new(Intent::Stock).push_extraction(&[
            ("symbol", "tesla"),
            ("exchange", "nasdaq"),
            ("mood", "curious"),
        ]);
        let extractor = SlotExtractor::new(Arc::new(nlu));
        let extracted = extractor
            .extract("Tesla on nasdaq", Intent::Stock, &SlotMap::new())
            .await;
        assert_eq!(extracted.get("symbol").map(String::as_str), Some("TSLA"));
        assert_eq!(extracted.get("exchange").map(String::as_str), Some("NASDAQ"));
        assert!(!extracted.contains_key("mood"));
    }

    #[tokio::test]
    async fn test_extractor_degrades_to_empty_on_failure() {
        let extractor = SlotExtractor::new(Arc::new(crate::nlu::FailingNlu));
        let extracted = extractor
            .extract("Weather in Paris", Intent::Weather, &SlotMap::new())
            .await;
        assert!(extracted.is_empty());
    }
}
