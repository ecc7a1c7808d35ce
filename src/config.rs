//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WREN__*` 覆盖
//! （双下划线表示嵌套，如 `WREN__SERVER__PORT=9000`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub providers: ProvidersSection,
    pub server: ServerSection,
}

/// [app] 段：应用名
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：NLU 所用的 OpenAI 兼容端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 端点地址；默认指向本地 Ollama 的 OpenAI 兼容接口
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// 未设置时回退到环境变量 OPENAI_API_KEY
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: Some("http://localhost:11434/v1".to_string()),
            model: default_model(),
            api_key: None,
        }
    }
}

fn default_model() -> String {
    "llama3.2".to_string()
}

/// [providers] 段：外部数据服务的密钥、端点与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersSection {
    pub openweather: OpenWeatherSection,
    pub twelvedata: TwelveDataSection,
    /// 单次数据请求超时（秒）
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            openweather: OpenWeatherSection::default(),
            twelvedata: TwelveDataSection::default(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_provider_timeout_secs() -> u64 {
    10
}

/// [providers.openweather] 段：地理编码 + 当前天气两个端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenWeatherSection {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
}

impl Default for OpenWeatherSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            geo_url: default_geo_url(),
            weather_url: default_weather_url(),
        }
    }
}

fn default_geo_url() -> String {
    "http://api.openweathermap.org/geo/1.0/direct".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

/// [providers.twelvedata] 段：行情端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwelveDataSection {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
}

impl Default for TwelveDataSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            quote_url: default_quote_url(),
        }
    }
}

fn default_quote_url() -> String {
    "https://api.twelvedata.com/quote".to_string()
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// 从 config 目录加载配置，环境变量 WREN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WREN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WREN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
