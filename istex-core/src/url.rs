//! Query strings for service calls, encoded like JavaScript's `encodeURIComponent`

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone by JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Build a GET url: `url?k1=v1&k2=v2`, values encoded, keys kept verbatim
pub fn add_parameters<K, V>(url: &str, parameters: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let query = parameters
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), encode_component(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&");
    format!("{url}?{query}")
}
