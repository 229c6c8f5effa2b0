/// Service version as reported by `/info/version`.
pub struct Version;

impl Version {
    const VALUE: &'static str = concat!("v", env!("CARGO_PKG_VERSION"));

    pub fn value() -> &'static str {
        Self::VALUE
    }
}

pub fn version() -> &'static str {
    Version::value()
}
