pub use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeatherError>;

/// Classified failure of a single weather lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Город '{0}' не найден")]
    CityNotFound(String),

    /// The provider rejected the configured API key. Never carries the key itself.
    #[error("Неверный API токен")]
    InvalidCredential,

    /// The provider answered with success but the payload does not fit the record schema.
    #[error("Некорректный ответ провайдера: {0}")]
    Mapping(String),

    #[error("Провайдер вернул статус {status}: {body}")]
    Provider { status: StatusCode, body: String },

    #[error("Провайдер не ответил вовремя")]
    Timeout,

    #[error("Не удалось связаться с провайдером: {0}")]
    Transport(#[source] reqwest::Error),
}

impl WeatherError {
    pub fn missing_field(field: &str) -> Self {
        WeatherError::Mapping(format!("отсутствует поле `{field}`"))
    }

    /// Short stable name of the variant, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound(_) => "city_not_found",
            WeatherError::InvalidCredential => "invalid_credential",
            WeatherError::Mapping(_) => "mapping",
            WeatherError::Provider { .. } => "provider",
            WeatherError::Timeout => "timeout",
            WeatherError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else {
            // The request URL holds the API key in its query string.
            WeatherError::Transport(err.without_url())
        }
    }
}
