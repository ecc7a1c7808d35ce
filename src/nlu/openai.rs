//! OpenAI 兼容 NLU 后端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url，
//! 本地 Ollama 亦可）。低温度 + JSON 输出约束，解析失败按 NluError::Parse 处理，
//! 由上游决定降级策略。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde::Deserialize;

use crate::dialogue::Intent;
use crate::nlu::{NluClient, NluError, SlotMap};

const CLASSIFY_PROMPT: &str = r#"You are an intent classifier. Classify user messages into one of these intents:

- weather: User wants weather information for a location
- stock: User wants stock price or market data
- unknown: Anything else

Examples:
- "Weather in Chennai" -> weather
- "What's the temperature in London?" -> weather
- "Tesla stock price" -> stock
- "How is AAPL doing?" -> stock
- "Tell me a joke" -> unknown
- "Hello" -> unknown

Respond ONLY with valid JSON: {"intent": "weather|stock|unknown"}"#;

const WEATHER_SLOT_PROMPT: &str = r#"Extract the LOCATION (city name) from the message.
If no location is mentioned, return null for location.

Examples:
- "Weather in Chennai" -> {"location": "Chennai"}
- "What's the weather like in New York?" -> {"location": "New York"}
- "How's the weather?" -> {"location": null}

Respond ONLY with valid JSON."#;

const STOCK_SLOT_PROMPT: &str = r#"Extract the SYMBOL (stock ticker) and EXCHANGE from the message.
If not mentioned, return null.

Common exchanges: NASDAQ, NYSE, NSE, BSE

Examples:
- "Tesla stock price" -> {"symbol": "TSLA", "exchange": null}
- "AAPL on NASDAQ" -> {"symbol": "AAPL", "exchange": "NASDAQ"}
- "Reliance on NSE" -> {"symbol": "RELIANCE", "exchange": "NSE"}
- "Stock price" -> {"symbol": null, "exchange": null}

Respond ONLY with valid JSON."#;

const SMALL_TALK_PROMPT: &str = r#"You are a friendly and helpful assistant.
Engage in natural conversation with the user. Be concise, warm, and helpful.

You also have specialized capabilities for weather forecasts and stock prices,
but just respond naturally to the user's message without pushing these features."#;

/// 分类输出（confidence 若有则丢弃）
#[derive(Debug, Deserialize)]
struct IntentLabel {
    intent: String,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherSlots {
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StockSlots {
    symbol: Option<String>,
    exchange: Option<String>,
}

/// OpenAI 兼容 NLU 客户端：持有 Client 与 model 名
pub struct OpenAiNlu {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiNlu {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, NluError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.to_string())
                    .build()
                    .map_err(|e| NluError::Api(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user.to_string())
                    .build()
                    .map_err(|e| NluError::Api(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.1)
            .build()
            .map_err(|e| NluError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| NluError::Api(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait]
impl NluClient for OpenAiNlu {
    async fn classify(&self, message: &str) -> Result<Intent, NluError> {
        let content = self.complete(CLASSIFY_PROMPT, message).await?;
        let label: IntentLabel = parse_json(&content)?;
        Ok(Intent::from_label(&label.intent))
    }

    async fn extract(
        &self,
        message: &str,
        intent: Intent,
        known: &SlotMap,
    ) -> Result<SlotMap, NluError> {
        let base_prompt = match intent {
            Intent::Weather => WEATHER_SLOT_PROMPT,
            Intent::Stock => STOCK_SLOT_PROMPT,
            Intent::Unknown => return Ok(SlotMap::new()),
        };

        // 已知槽位作为上下文附在提示后，让用户不必重复已说过的参数
        let system = if known.is_empty() {
            base_prompt.to_string()
        } else {
            let mut pairs: Vec<String> = known.iter().map(|(k, v)| format!("{k}={v}")).collect();
            pairs.sort();
            format!("{base_prompt}\n\nPreviously extracted slots: {}", pairs.join(", "))
        };

        let content = self.complete(&system, message).await?;
        let mut slots = SlotMap::new();
        match intent {
            Intent::Weather => {
                let parsed: WeatherSlots = parse_json(&content)?;
                if let Some(location) = parsed.location {
                    slots.insert("location".to_string(), location);
                }
            }
            Intent::Stock => {
                let parsed: StockSlots = parse_json(&content)?;
                if let Some(symbol) = parsed.symbol {
                    slots.insert("symbol".to_string(), symbol);
                }
                if let Some(exchange) = parsed.exchange {
                    slots.insert("exchange".to_string(), exchange);
                }
            }
            Intent::Unknown => {}
        }
        Ok(slots)
    }

    async fn small_talk(&self, message: &str) -> Result<String, NluError> {
        let content = self.complete(SMALL_TALK_PROMPT, message).await?;
        Ok(content.trim().to_string())
    }
}

/// 从模型输出中解出 JSON：容忍代码围栏与前后缀文字，取第一个 '{' 到最后一个 '}'
fn parse_json<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, NluError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => return Err(NluError::Parse(format!("no JSON object in: {content}"))),
    };
    serde_json::from_str(json).map_err(|e| NluError::Parse(format!("{e}: {json}")))
}
