use std::time::Duration;

use reqwest::{Client, Error};

const USER_AGENT: &str = concat!("plexporter/", env!("CARGO_PKG_VERSION"));

pub struct HttpClient;

impl HttpClient {
    pub fn user_agent() -> &'static str {
        USER_AGENT
    }

    pub fn new(timeout: Duration, skip_tls_verification: bool) -> Result<Client, Error> {
        Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_tls_verification)
            .build()
    }
}
