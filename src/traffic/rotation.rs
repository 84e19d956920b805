//! Round-robin endpoint selection.

/// Endpoints the generator cycles through, in order.
pub const DEFAULT_ENDPOINTS: [&str; 5] = ["/", "/api/data", "/api/slow", "/api/error", "/health"];

/// Round-robin selector over a fixed, ordered endpoint list.
///
/// Stateless: the caller owns the counter, so request `i` always targets
/// endpoint `i mod len`.
#[derive(Debug, Clone)]
pub struct EndpointRotation {
    endpoints: Vec<String>,
}

impl EndpointRotation {
    /// Returns `None` for an empty list.
    pub fn new<I, S>(endpoints: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(Into::into).collect();
        if endpoints.is_empty() {
            return None;
        }
        Some(Self { endpoints })
    }

    /// Endpoint for the request with zero-based index `index`.
    pub fn select(&self, index: u64) -> &str {
        let len = self.endpoints.len() as u64;
        &self.endpoints[(index % len) as usize]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

impl Default for EndpointRotation {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let rotation = EndpointRotation::default();

        assert_eq!(rotation.select(0), "/");
        assert_eq!(rotation.select(1), "/api/data");
        assert_eq!(rotation.select(4), "/health");
        assert_eq!(rotation.select(5), "/");
    }

    #[test]
    fn test_index_always_maps_to_index_mod_len() {
        let rotation = EndpointRotation::new(["/a", "/b", "/c"]).unwrap();
        for i in 0..100u64 {
            assert_eq!(rotation.select(i), rotation.endpoints()[(i % 3) as usize]);
        }
        // Large counters do not overflow the selection.
        assert_eq!(rotation.select(u64::MAX), "/a");
    }

    #[test]
    fn test_empty_rejected() {
        assert!(EndpointRotation::new(Vec::<String>::new()).is_none());
    }
}
