use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Thunderstorm severity derived from the WMO code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThunderstormState {
    #[default]
    None,
    /// Code 95: thunderstorm without hail
    Moderate,
    /// Codes 96, 97, 99: thunderstorm with hail or heavy
    Severe,
}

impl ThunderstormState {
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            95 => Self::Moderate,
            96 | 97 | 99 => Self::Severe,
            _ => Self::None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Current precipitation at one coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationReading {
    /// Precipitation rate in mm/h
    pub precipitation_mmh: f64,
    /// WMO weather code
    pub weather_code: i32,
    pub observed_at: DateTime<Utc>,
}

impl PrecipitationReading {
    pub fn is_precipitating(&self) -> bool {
        self.precipitation_mmh > 0.0
    }

    pub fn thunderstorm(&self) -> ThunderstormState {
        ThunderstormState::from_wmo_code(self.weather_code)
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Weather lookup errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather service returned HTTP {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(_) => "Weather service unreachable.",
            WeatherError::Status(_) => "Weather service unavailable.",
            WeatherError::Parse(_) => "Weather service sent an unexpected response.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(mmh: f64, code: i32) -> PrecipitationReading {
        PrecipitationReading {
            precipitation_mmh: mmh,
            weather_code: code,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_wmo_code_rain() {
        assert_eq!(WeatherCondition::from_wmo_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(65), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(51), WeatherCondition::Drizzle);
    }

    #[test]
    fn test_wmo_code_thunderstorm_family() {
        for code in [95, 96, 97, 99] {
            assert_eq!(WeatherCondition::from_wmo_code(code), WeatherCondition::Thunderstorm);
        }
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_thunderstorm_severity() {
        assert_eq!(ThunderstormState::from_wmo_code(95), ThunderstormState::Moderate);
        assert_eq!(ThunderstormState::from_wmo_code(96), ThunderstormState::Severe);
        assert_eq!(ThunderstormState::from_wmo_code(97), ThunderstormState::Severe);
        assert_eq!(ThunderstormState::from_wmo_code(99), ThunderstormState::Severe);
        assert_eq!(ThunderstormState::from_wmo_code(98), ThunderstormState::None);
        assert_eq!(ThunderstormState::from_wmo_code(63), ThunderstormState::None);
        assert!(!ThunderstormState::None.is_active());
        assert!(ThunderstormState::Moderate.is_active());
    }

    #[test]
    fn test_precipitating_threshold() {
        assert!(!reading(0.0, 61).is_precipitating());
        assert!(reading(0.1, 3).is_precipitating());
    }

    #[test]
    fn test_thunderstorm_state_serializes_lowercase() {
        let json = serde_json::to_string(&ThunderstormState::Severe).unwrap();
        assert_eq!(json, "\"severe\"");
    }

    #[test]
    fn test_condition_description() {
        assert_eq!(reading(0.4, 61).condition().description(), "Rain");
        assert_eq!(WeatherCondition::Thunderstorm.description(), "Thunderstorm");
    }
}
