use geodat::{LookupError, LookupResult};
use log::LevelFilter;
use serde_json::json;

/// Initialize env_logger
///
/// `RUST_LOG` is honored; an explicit `--log-level` takes precedence over it.
/// Without either, only warnings and errors are shown.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.parse_default_env();
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None);
    // A second init (e.g. in tests) is harmless
    let _ = builder.try_init();
}

/// JSON for one lookup, successful or not
///
/// Failed lookups keep the input so batch output lines up with input lines.
pub fn lookup_json(
    input: &str,
    outcome: &Result<LookupResult, LookupError>,
) -> serde_json::Result<serde_json::Value> {
    let value = match outcome {
        Ok(result) => {
            let mut value = serde_json::to_value(result)?;
            if let serde_json::Value::Object(ref mut map) = value {
                map.insert("cidr".to_string(), json!(result.cidr()));
            }
            value
        }
        Err(LookupError::Decode(e)) if e.partial_record().is_some() => json!({
            "input": input,
            "error": e.to_string(),
            "partial": serde_json::to_value(e.partial_record())?,
        }),
        Err(e) => json!({
            "input": input,
            "error": e.to_string(),
        }),
    };
    Ok(value)
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn format_qps(qps: f64) -> String {
    if qps >= 1_000_000.0 {
        format!("{:.2}M", qps / 1_000_000.0)
    } else if qps >= 1_000.0 {
        format!("{:.2}K", qps / 1_000.0)
    } else {
        format!("{:.2}", qps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodat::{CityResult, CountryResult, DecodeError};
    use std::net::Ipv4Addr;

    #[test]
    fn test_lookup_json_adds_cidr() {
        let ip = Ipv4Addr::new(10, 1, 2, 3);
        let outcome = Ok(LookupResult::Country(CountryResult::new(ip, 8, Some(224))));
        let value = lookup_json("10.1.2.3", &outcome).unwrap();
        assert_eq!(value["kind"], "country");
        assert_eq!(value["country_code"], "US");
        assert_eq!(value["cidr"], "10.0.0.0/8");
    }

    #[test]
    fn test_lookup_json_errors_keep_input() {
        let outcome = Err(LookupError::InvalidAddress("bogus".to_string()));
        let value = lookup_json("bogus", &outcome).unwrap();
        assert_eq!(value["input"], "bogus");
        assert!(value["error"].as_str().unwrap().contains("not an IPv4 address"));
        assert!(value.get("partial").is_none());
    }

    #[test]
    fn test_lookup_json_partial_record() {
        let ip = Ipv4Addr::new(81, 2, 69, 160);
        let mut partial = CityResult::new(CountryResult::new(ip, 8, Some(76)));
        partial.city = Some("London".to_string());
        let outcome = Err(LookupError::Decode(DecodeError::PartialRecord {
            field: "latitude",
            partial: Box::new(partial),
        }));
        let value = lookup_json("81.2.69.160", &outcome).unwrap();
        assert!(value["error"].as_str().unwrap().contains("latitude"));
        assert_eq!(value["partial"]["city"], "London");
        assert_eq!(value["partial"]["country_code"], "GB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
