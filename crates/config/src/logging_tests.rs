use super::*;

#[test]
fn parses_known_formats() {
    assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
    assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
    assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
}

#[test]
fn rejects_unknown_format() {
    assert!("xml".parse::<LogFormat>().is_err());
}
