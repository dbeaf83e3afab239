// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


//! Conversions between primitive values and JSON literal text, shared by the
//! streaming and tree decoders and the encoder.

use std::borrow::Cow;

type Parsed<T> = Result<T, Cow<'static, str>>;

pub(crate) fn parse_bool(text: &str) -> Parsed<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("Expected valid boolean literal, but had '{text}'").into()),
    }
}

pub(crate) fn parse_integer<T: TryFrom<i64>>(text: &str, type_name: &'static str) -> Parsed<T> {
    let wide: i64 = text
        .parse()
        .map_err(|_| format!("Failed to parse type '{type_name}' for input '{text}'"))?;
    T::try_from(wide).map_err(|_| format!("Numeric value {wide} is out of range for type '{type_name}'").into())
}

pub(crate) fn parse_u64(text: &str) -> Parsed<u64> {
    text.parse()
        .map_err(|_| format!("Failed to parse type 'u64' for input '{text}'").into())
}

fn special_float(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

pub(crate) fn special_float_message(value: f64) -> String {
    format!(
        "Unexpected special floating-point value {}. By default, non-finite floating point values \
         are prohibited because they are not valid JSON numbers (RFC 8259). \
         Enable 'allow_special_floats' to accept them",
        float_text(value)
    )
}

fn starts_like_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

pub(crate) fn parse_f64(text: &str, allow_special: bool) -> Parsed<f64> {
    let value = match special_float(text) {
        Some(v) => v,
        None if starts_like_number(text) => text
            .parse()
            .map_err(|_| format!("Failed to parse type 'f64' for input '{text}'"))?,
        None => return Err(format!("Failed to parse type 'f64' for input '{text}'").into()),
    };
    if !value.is_finite() && !allow_special {
        return Err(special_float_message(value).into());
    }
    Ok(value)
}

pub(crate) fn parse_f32(text: &str, allow_special: bool) -> Parsed<f32> {
    let value = match special_float(text) {
        Some(v) => v as f32,
        None if starts_like_number(text) => text
            .parse()
            .map_err(|_| format!("Failed to parse type 'f32' for input '{text}'"))?,
        None => return Err(format!("Failed to parse type 'f32' for input '{text}'").into()),
    };
    if !value.is_finite() && !allow_special {
        return Err(special_float_message(value as f64).into());
    }
    Ok(value)
}

pub(crate) fn parse_char(text: &str) -> Parsed<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("Expected single char, but got '{text}'").into()),
    }
}

/// JSON text of a float. Non-finite values use the `NaN`/`Infinity` literals.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value:?}")
    }
}

pub(crate) fn f32_text(value: f32) -> String {
    if value.is_finite() {
        format!("{value:?}")
    } else {
        float_text(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_check_range() {
        assert_eq!(parse_integer::<i8>("-128", "i8").unwrap(), -128);
        assert!(parse_integer::<i8>("128", "i8").is_err());
        assert!(parse_integer::<i32>("1.5", "i32").is_err());
        assert_eq!(parse_u64("18446744073709551615").unwrap(), u64::MAX);
    }

    #[test]
    fn special_floats_are_gated() {
        assert!(parse_f64("NaN", false).is_err());
        assert!(parse_f64("NaN", true).unwrap().is_nan());
        assert_eq!(parse_f64("-Infinity", true).unwrap(), f64::NEG_INFINITY);
        assert!(parse_f64("inf", true).is_err());
        assert!(parse_f64(".5", false).is_err());
        assert_eq!(parse_f64("1e3", false).unwrap(), 1000.0);
    }

    #[test]
    fn float_text_is_valid_json() {
        assert_eq!(float_text(1.0), "1.0");
        assert_eq!(float_text(-0.0), "-0.0");
        assert_eq!(f32_text(0.1), "0.1");
        assert_eq!(float_text(f64::INFINITY), "Infinity");
    }
}
