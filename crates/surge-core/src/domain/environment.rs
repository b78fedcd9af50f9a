/// Backend origin used during local development.
pub const LOCAL_API_ORIGIN: &str = "http://localhost:5000";

/// Backend origin used everywhere else.
pub const REMOTE_API_ORIGIN: &str = "https://fwe80ww96b.execute-api.us-east-1.amazonaws.com/prod";

const LOCAL_HOSTNAMES: [&str; 2] = ["localhost", "127.0.0.1"];

/// Which backend the application talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Local,
    Remote,
}

impl ApiEnvironment {
    /// Pick the environment from the hostname the application is served from.
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.trim().to_ascii_lowercase();
        if LOCAL_HOSTNAMES.contains(&host.as_str()) {
            ApiEnvironment::Local
        } else {
            ApiEnvironment::Remote
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            ApiEnvironment::Local => LOCAL_API_ORIGIN,
            ApiEnvironment::Remote => REMOTE_API_ORIGIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hostnames_resolve_to_local_origin() {
        assert_eq!(
            ApiEnvironment::from_hostname("localhost").base_url(),
            LOCAL_API_ORIGIN
        );
        assert_eq!(
            ApiEnvironment::from_hostname("127.0.0.1"),
            ApiEnvironment::Local
        );
        assert_eq!(
            ApiEnvironment::from_hostname(" LocalHost "),
            ApiEnvironment::Local
        );
    }

    #[test]
    fn test_other_hostnames_resolve_to_remote_origin() {
        for host in ["pluggedtogit.github.io", "localhost.evil.test", ""] {
            assert_eq!(
                ApiEnvironment::from_hostname(host).base_url(),
                REMOTE_API_ORIGIN
            );
        }
    }
}
