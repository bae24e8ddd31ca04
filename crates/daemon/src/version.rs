use serde::Serialize;

/// Compile-time build metadata exported by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
    pub build_host: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        version: env!("REPO_VERSION"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        build_target: option_env!("BUILD_TARGET"),
        build_host: option_env!("BUILD_HOST"),
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "depot {} ({})", self.version, self.build_profile)?;
        writeln!(f, "  built:    {}", self.build_timestamp)?;
        writeln!(f, "  rustc:    {}", self.rust_version)?;
        writeln!(f, "  features: {}", self.build_features)?;
        write!(f, "  target:   {}", self.build_target.unwrap_or("unknown"))
    }
}
