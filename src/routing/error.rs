/// Errors returned while fetching a route from the upstream routing service.
#[derive(Debug)]
pub enum RoutingError {
    /// The upstream returned a non-`Ok` status code.
    Upstream(String),
    /// Transport-level failure (DNS, connection, timeout, ...).
    #[cfg(feature = "osrm")]
    Http(reqwest::Error),
    /// The payload didn't deserialize into the shape we expect.
    MalformedResponse(String),
    /// The upstream returned fewer than two geometry points.
    EmptyRoute,
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::Upstream(code) => write!(f, "routing upstream returned {code}"),
            #[cfg(feature = "osrm")]
            RoutingError::Http(err) => write!(f, "routing http error: {err}"),
            RoutingError::MalformedResponse(msg) => {
                write!(f, "routing response malformed: {msg}")
            }
            RoutingError::EmptyRoute => write!(f, "routing upstream returned an empty route"),
        }
    }
}

impl std::error::Error for RoutingError {}

#[cfg(feature = "osrm")]
impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::Http(err)
    }
}
