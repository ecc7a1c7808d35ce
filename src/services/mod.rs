//! 外部数据服务：OpenWeather 天气查询与 TwelveData 行情查询
//!
//! 每个服务都以 trait 暴露给分发器，失败是封闭的类型化变体集合；
//! 原始响应细节只写日志，不进入用户可见文案。

pub mod stocks;
pub mod weather;

pub use stocks::{StockError, StockProvider, StockQuote, TwelveDataClient};
pub use weather::{OpenWeatherClient, WeatherError, WeatherProvider, WeatherReport};
