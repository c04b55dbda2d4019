#[derive(Debug, Clone)]
pub struct ClinicUrl(String);

impl AsRef<str> for ClinicUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ClinicUrl {
    pub fn new(base: &str) -> Self {
        Self(base.trim_end_matches('/').to_string())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}
