//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};

/// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Path of a post's detail page
///
/// # Examples
/// ```ignore
/// post_path("hello-world") // -> "/post/hello-world"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/post/{}", utf8_percent_encode(slug, PATH_SEGMENT))
}

/// Encode a value for use in a query string
pub fn encode_url(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}
