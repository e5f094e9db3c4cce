use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("launchkit/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Metadata documents are small; bound the whole request.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared client for metadata calls and streamed downloads.
///
/// `prefer_ipv4` binds outgoing sockets to `0.0.0.0`, which keeps resolution
/// on A records only.
pub fn build_http_client(prefer_ipv4: bool) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let mut builder = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT);

    if prefer_ipv4 {
        builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    builder.build()
}
