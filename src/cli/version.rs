//! Version command handler

/// Version information as printed by `kubelinks version`
pub fn version_text() -> String {
    format!(
        "kubelinks {}\n  {}\n  {}\n  License: {}\n  Built-in rules: {}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_AUTHORS"),
        env!("CARGO_PKG_LICENSE"),
        crate::links::LinkRegistry::builtin().len(),
    )
}

/// Display version information
pub fn display_version() {
    println!("{}", version_text());
}
