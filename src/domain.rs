use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// one sensor sample as kept in the history ring
///
/// serialized with the short keys the dashboard and the `/get_history`
/// consumers already use: `{time, temp, humidity, light}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// seconds since the unix epoch (fractional)
    #[serde(rename = "time")]
    pub timestamp: f64,
    /// temperature in celsius
    #[serde(rename = "temp")]
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
    /// ambient light in lux
    pub light: i64,
}

/// the single "latest value" slot served by `/get_data`
///
/// zeroed at startup; `update_time == 0.0` means nothing was uploaded yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestState {
    pub temp: f64,
    pub humidity: f64,
    pub light: i64,
    pub update_time: f64,
}

impl From<Reading> for LatestState {
    fn from(r: Reading) -> Self {
        Self {
            temp: r.temperature,
            humidity: r.humidity,
            light: r.light,
            update_time: r.timestamp,
        }
    }
}

/// validated values of one upload, not yet timestamped
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub temperature: f64,
    pub humidity: f64,
    pub light: i64,
}

impl Sample {
    pub fn at(self, timestamp: f64) -> Reading {
        Reading {
            timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            light: self.light,
        }
    }
}

/// raw `/upload` query string, exactly as the device sent it
///
/// the firmware builds `?temp=..&humi=..&light=..`; any of them may be
/// missing, in which case it counts as "0".
#[derive(Clone, Debug, Default)]
pub struct UploadParams {
    pub temp: Option<String>,
    pub humi: Option<String>,
    pub light: Option<String>,
}

impl UploadParams {
    /// build from the raw query string; a repeated key keeps its first value
    pub fn from_query(raw: Option<&str>) -> Result<Self, IngestError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw.unwrap_or(""))
            .map_err(|e| IngestError::MalformedQuery(e.to_string()))?;

        let mut params = UploadParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "temp" => &mut params.temp,
                "humi" => &mut params.humi,
                "light" => &mut params.light,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        Ok(params)
    }

    /// parse all three fields; the first bad one (temp, humi, light) wins
    pub fn parse(&self) -> Result<Sample, IngestError> {
        Ok(Sample {
            temperature: parse_decimal("temp", self.temp.as_deref())?,
            humidity: parse_decimal("humi", self.humi.as_deref())?,
            light: parse_integer("light", self.light.as_deref())?,
        })
    }
}

fn parse_decimal(field: &'static str, raw: Option<&str>) -> Result<f64, IngestError> {
    let Some(raw) = raw else { return Ok(0.0) };
    match raw.trim().parse::<f64>() {
        // nan/inf would not survive the json responses
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IngestError::invalid(field, raw, "a decimal number")),
    }
}

fn parse_integer(field: &'static str, raw: Option<&str>) -> Result<i64, IngestError> {
    let Some(raw) = raw else { return Ok(0) };
    raw.trim()
        .parse::<i64>()
        .map_err(|_| IngestError::invalid(field, raw, "an integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(temp: Option<&str>, humi: Option<&str>, light: Option<&str>) -> UploadParams {
        UploadParams {
            temp: temp.map(str::to_string),
            humi: humi.map(str::to_string),
            light: light.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_device_upload() {
        let sample = params(Some("23.5"), Some("55"), Some("1200")).parse().unwrap();
        assert_eq!(
            sample,
            Sample { temperature: 23.5, humidity: 55.0, light: 1200 }
        );
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let sample = UploadParams::default().parse().unwrap();
        assert_eq!(sample, Sample { temperature: 0.0, humidity: 0.0, light: 0 });
    }

    #[test]
    fn test_empty_value_is_malformed_not_missing() {
        let err = params(Some(""), None, None).parse().unwrap_err();
        assert_eq!(err.field(), "temp");
    }

    #[test]
    fn test_whitespace_and_sign_accepted() {
        let sample = params(Some(" -4.25 "), Some("1e1"), Some("+7")).parse().unwrap();
        assert_eq!(sample.temperature, -4.25);
        assert_eq!(sample.humidity, 10.0);
        assert_eq!(sample.light, 7);
    }

    #[test]
    fn test_first_bad_field_reported() {
        let err = params(Some("1"), Some("wet"), Some("dark")).parse().unwrap_err();
        assert_eq!(
            err,
            IngestError::invalid("humi", "wet", "a decimal number")
        );
    }

    #[test]
    fn test_query_keeps_first_of_repeated_keys() {
        let params = UploadParams::from_query(Some("temp=1&temp=2&humi=3&light=4&foo=x")).unwrap();
        assert_eq!(params.temp.as_deref(), Some("1"));
        assert_eq!(params.parse().unwrap(), Sample { temperature: 1.0, humidity: 3.0, light: 4 });
    }

    #[test]
    fn test_query_decoding() {
        let params = UploadParams::from_query(Some("temp=%2B21.5&humi=&light")).unwrap();
        assert_eq!(params.temp.as_deref(), Some("+21.5"));
        assert_eq!(params.humi.as_deref(), Some(""));
        assert_eq!(params.light.as_deref(), Some(""));

        let params = UploadParams::from_query(None).unwrap();
        assert!(params.temp.is_none() && params.humi.is_none() && params.light.is_none());
    }

    #[test]
    fn test_light_rejects_fraction() {
        let err = params(None, None, Some("12.5")).parse().unwrap_err();
        assert_eq!(err.field(), "light");
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(params(Some("nan"), None, None).parse().is_err());
        assert!(params(None, Some("inf"), None).parse().is_err());
    }

    #[test]
    fn test_json_shapes() {
        let reading = Sample { temperature: 21.0, humidity: 40.0, light: 300 }.at(1_700_000_000.5);
        let v = serde_json::to_value(reading).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"time": 1_700_000_000.5, "temp": 21.0, "humidity": 40.0, "light": 300})
        );

        let latest = serde_json::to_value(LatestState::from(reading)).unwrap();
        assert_eq!(
            latest,
            serde_json::json!({"temp": 21.0, "humidity": 40.0, "light": 300, "update_time": 1_700_000_000.5})
        );
    }
}
