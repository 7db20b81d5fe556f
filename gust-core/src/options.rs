use crate::{parse_duration, ConfigError, ScenarioConfig};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::time::Duration;

/// Declarative run options, as written at the top of a load script or in a JSON config file.
///
/// Every field is optional; only the fields that are set are applied on top of a
/// [`ScenarioConfig`]. Durations are human readable strings.
///
/// ```
/// # use gust_core::Options;
/// let options = Options::from_json_str(r#"{ "vus": 10, "duration": "3000s" }"#).unwrap();
/// assert_eq!(options.vus, Some(10));
/// ```
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vus: Option<usize>,

    #[serde_as(as = "Option<HumanDuration>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<u32>,

    #[serde_as(as = "Option<HumanDuration>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_stop: Option<Duration>,
}

impl Options {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Combine two sets of options. Fields set in `other` take precedence.
    pub fn merge(self, other: Options) -> Options {
        Options {
            vus: other.vus.or(self.vus),
            duration: other.duration.or(self.duration),
            iterations: other.iterations.or(self.iterations),
            rps: other.rps.or(self.rps),
            graceful_stop: other.graceful_stop.or(self.graceful_stop),
        }
    }

    /// Overlay the set fields onto `config`.
    pub fn apply(&self, config: &mut ScenarioConfig) -> Result<(), ConfigError> {
        if let Some(vus) = self.vus {
            config.vus = NonZeroUsize::new(vus).ok_or(ConfigError::ZeroVus)?;
        }

        if let Some(duration) = self.duration {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration);
            }
            config.duration = Some(duration);
        }

        if let Some(iterations) = self.iterations {
            config.iterations = Some(NonZeroU64::new(iterations).ok_or(ConfigError::ZeroIterations)?);
        }

        if let Some(rps) = self.rps {
            config.rps = Some(NonZeroU32::new(rps).ok_or(ConfigError::ZeroRps)?);
        }

        if let Some(graceful_stop) = self.graceful_stop {
            config.graceful_stop = graceful_stop;
        }

        Ok(())
    }
}

struct HumanDuration;

impl<'de> DeserializeAs<'de, Duration> for HumanDuration {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = String::deserialize(deserializer)?;
        parse_duration(&input).map_err(serde::de::Error::custom)
    }
}

impl SerializeAs<Duration> for HumanDuration {
    fn serialize_as<S>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_options() {
        let options = Options::from_json_str(r#"{ "vus": 10, "duration": "3000s" }"#).unwrap();
        assert_eq!(options.vus, Some(10));
        assert_eq!(options.duration, Some(Duration::from_secs(3000)));
        assert_eq!(options.iterations, None);
        assert_eq!(options.graceful_stop, None);
    }

    #[test]
    fn parses_camel_case_fields() {
        let options =
            Options::from_json_str(r#"{ "iterations": 40, "rps": 5, "gracefulStop": "2s" }"#)
                .unwrap();
        assert_eq!(options.iterations, Some(40));
        assert_eq!(options.rps, Some(5));
        assert_eq!(options.graceful_stop, Some(Duration::from_secs(2)));
    }

    #[test]
    fn rejects_numeric_durations() {
        let res = Options::from_json_str(r#"{ "duration": 3000 }"#);
        assert!(matches!(res, Err(ConfigError::Json(_))));
    }

    #[test]
    fn rejects_unknown_fields() {
        let res = Options::from_json_str(r#"{ "users": 10 }"#);
        assert!(matches!(res, Err(ConfigError::Json(_))));
    }

    #[test]
    fn serializes_only_set_fields() {
        let options = Options {
            vus: Some(10),
            duration: Some(Duration::from_secs(3000)),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"vus":10,"duration":"50m"}"#);
        assert_eq!(Options::from_json_str(&json).unwrap(), options);
    }

    #[test]
    fn later_options_take_precedence() {
        let script = Options {
            vus: Some(10),
            duration: Some(Duration::from_secs(3000)),
            ..Default::default()
        };
        let cli = Options {
            duration: Some(Duration::from_secs(5)),
            rps: Some(2),
            ..Default::default()
        };

        let merged = script.merge(cli);
        assert_eq!(merged.vus, Some(10));
        assert_eq!(merged.duration, Some(Duration::from_secs(5)));
        assert_eq!(merged.rps, Some(2));
    }

    #[test]
    fn apply_overlays_set_fields() {
        let mut config = ScenarioConfig::new("smoke");
        let options = Options {
            vus: Some(10),
            duration: Some(Duration::from_secs(3000)),
            ..Default::default()
        };
        options.apply(&mut config).unwrap();

        assert_eq!(config.vus.get(), 10);
        assert_eq!(config.duration, Some(Duration::from_secs(3000)));
        assert_eq!(config.iterations, None);
        assert_eq!(config.rps, None);
    }

    #[test]
    fn apply_rejects_zero_values() {
        let mut config = ScenarioConfig::new("smoke");

        let zero_vus = Options {
            vus: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_vus.apply(&mut config), Err(ConfigError::ZeroVus)));

        let zero_duration = Options {
            duration: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            zero_duration.apply(&mut config),
            Err(ConfigError::ZeroDuration)
        ));

        let zero_iterations = Options {
            iterations: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            zero_iterations.apply(&mut config),
            Err(ConfigError::ZeroIterations)
        ));
    }
}
